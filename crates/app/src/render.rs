use chrono::{DateTime, Utc};

use prep_core::ProgressStore;
use prep_core::model::{Question, QuestionId, ScheduleEntry, SessionRecord};
use services::Submission;

fn date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn status(entry: Option<&ScheduleEntry>, now: DateTime<Utc>) -> String {
    match entry {
        None => "new".to_owned(),
        Some(e) if e.is_mastered() => format!("mastered, next {}", date(e.next_review)),
        Some(e) if e.is_due(now) => "due".to_owned(),
        Some(e) => format!("next {}", date(e.next_review)),
    }
}

pub fn question_list<'a>(store: &ProgressStore, questions: impl Iterator<Item = &'a Question>) {
    let now = store.now();
    let mut shown = 0;
    for q in questions {
        println!(
            "{:>4}  {:<6}  {:<19}  {}  [{}]",
            q.id,
            q.difficulty,
            q.category,
            q.title,
            status(store.entry(&q.id), now)
        );
        shown += 1;
    }
    if shown == 0 {
        println!("no questions match");
    }
}

pub fn question_detail(store: &ProgressStore, question: &Question) {
    println!("{} ({}, {})", question.title, question.category, question.difficulty);
    println!();
    println!("{}", question.description);

    if !question.hints.is_empty() {
        println!();
        println!("Hints:");
        for hint in &question.hints {
            println!("  - {hint}");
        }
    }
    if !question.expected_components.is_empty() {
        println!();
        println!("Expected components: {}", question.expected_components.join(", "));
    }
    if !question.companies.is_empty() {
        println!("Asked at: {}", question.companies.join(", "));
    }

    println!();
    match store.entry(&question.id) {
        None => println!("Not practiced yet."),
        Some(entry) => {
            println!(
                "Practiced {} time(s), best score {}, ease {:.2}, interval {} day(s), next review {}",
                entry.times_practiced,
                entry.best_score,
                entry.ease_factor,
                entry.interval,
                date(entry.next_review)
            );
        }
    }
}

pub fn due(store: &ProgressStore) {
    let due = store.due_questions();
    if due.is_empty() {
        println!("Nothing due. Upcoming:");
        for (id, entry) in store.upcoming(5) {
            println!("{id:>4}  {}", date(entry.next_review));
        }
        return;
    }
    println!("{} question(s) due:", due.len());
    question_list(store, due.into_iter());
}

pub fn stats(store: &ProgressStore) {
    let stats = store.stats();
    println!("Practiced:     {}/{}", stats.total_practiced, stats.total_questions);
    println!("Average score: {}", stats.average_score);
    println!("Mastered:      {}", stats.mastered);
    println!("Streak:        {} day(s)", stats.streak);
    println!("Due now:       {}", store.due_questions().len());

    println!();
    println!("{:<19}  {:>9}  {:>8}  {:>7}", "category", "practiced", "mastered", "average");
    for row in store.category_breakdown() {
        let average = row
            .average_best_score
            .map_or_else(|| "-".to_owned(), |s| s.to_string());
        println!(
            "{:<19}  {:>5}/{:<3}  {:>8}  {:>7}",
            row.category, row.practiced, row.total, row.mastered, average
        );
    }

    println!();
    println!("{:<19}  {:>9}  {:>7}", "difficulty", "practiced", "average");
    for row in store.difficulty_breakdown() {
        let average = row
            .average_best_score
            .map_or_else(|| "-".to_owned(), |s| s.to_string());
        println!(
            "{:<19}  {:>5}/{:<3}  {:>7}",
            row.difficulty, row.practiced, row.total, average
        );
    }
}

fn session_line(store: &ProgressStore, session: &SessionRecord) {
    let title = store
        .catalog()
        .get(&session.question_id)
        .map_or("(removed question)", |q| q.title.as_str());
    println!(
        "{}  {:>3}  {:>4}  {}",
        session.ended_at.format("%Y-%m-%d %H:%M"),
        session.score,
        session.question_id,
        title
    );
}

pub fn history(store: &ProgressStore, id: Option<&QuestionId>) {
    let mut shown = 0;
    for session in store.history() {
        if id.is_some_and(|id| id != &session.question_id) {
            continue;
        }
        session_line(store, session);
        shown += 1;
    }
    if shown == 0 {
        println!("no sessions recorded");
    }
}

pub fn reviewed(store: &ProgressStore, id: &QuestionId) {
    if let Some(entry) = store.entry(id) {
        println!(
            "Scheduled {id}: interval {} day(s), ease {:.2}, next review {}",
            entry.interval,
            entry.ease_factor,
            date(entry.next_review)
        );
    }
    println!("Streak: {} day(s)", store.streak());
}

pub fn submission(store: &ProgressStore, submission: &Submission) {
    let feedback = &submission.feedback;
    println!("Score: {}/100", feedback.score);

    let sections = [
        ("Strengths", &feedback.strengths),
        ("Improvements", &feedback.improvements),
        ("Suggestions", &feedback.suggestions),
        ("Missing components", &feedback.missing_components),
        ("Follow-up questions", &submission.follow_ups),
    ];
    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{heading}:");
        for item in items {
            println!("  - {item}");
        }
    }

    println!();
    println!("Trade-offs:");
    for trade_off in &feedback.trade_offs {
        println!("  {}: {}", trade_off.topic, trade_off.analysis);
    }

    println!();
    reviewed(store, &submission.question_id);
}
