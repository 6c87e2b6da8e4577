use serde::{Deserialize, Serialize};

use prep_core::model::{Question, Score};

//
// ─── ANSWER & FEEDBACK ─────────────────────────────────────────────────────────
//

/// A written answer to a question, optionally with diagram markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    #[serde(default)]
    pub diagram: Option<String>,
}

impl Answer {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            diagram: None,
        }
    }

    #[must_use]
    pub fn with_diagram(mut self, markup: impl Into<String>) -> Self {
        self.diagram = Some(markup.into());
        self
    }

    #[must_use]
    pub fn has_diagram(&self) -> bool {
        self.diagram.as_deref().is_some_and(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOff {
    pub topic: String,
    pub analysis: String,
}

/// Evaluation of an answer. `score` feeds the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub score: Score,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub missing_components: Vec<String>,
    pub trade_offs: Vec<TradeOff>,
}

/// Produces feedback and follow-up prompts for an answer.
pub trait FeedbackGenerator: Send + Sync {
    fn evaluate(&self, question: &Question, answer: &Answer) -> Feedback;

    fn follow_ups(&self, question: &Question, answer: &Answer) -> Vec<String>;
}

//
// ─── KEYWORD HEURISTIC ─────────────────────────────────────────────────────────
//

const BASE_SCORE: u32 = 50;
const DIAGRAM_BONUS: u32 = 20;
const KEYWORD_POINTS: u32 = 2;
const DIAGRAM_STRENGTH: &str = "Includes visual diagram which helps explain the architecture";
const MISSING_COMPONENTS_SHOWN: usize = 5;
const MAX_FOLLOW_UPS: usize = 2;

/// Keyword groups; a keyword listed in two groups scores twice.
const CONCEPT_KEYWORDS: [&[&str]; 5] = [
    &[
        "scale",
        "horizontal",
        "vertical",
        "load balancer",
        "sharding",
        "replication",
        "partition",
        "cache",
        "cdn",
    ],
    &[
        "database",
        "schema",
        "index",
        "sql",
        "nosql",
        "acid",
        "transaction",
        "replication",
        "sharding",
    ],
    &[
        "api",
        "rest",
        "graphql",
        "endpoint",
        "authentication",
        "authorization",
        "rate limit",
        "gateway",
    ],
    &[
        "microservice",
        "service",
        "container",
        "orchestration",
        "kubernetes",
        "docker",
        "message queue",
        "event",
    ],
    &[
        "distributed",
        "consensus",
        "raft",
        "paxos",
        "byzantine",
        "fault tolerance",
        "consistency",
    ],
];

/// Offline scorer based on answer length, diagram presence, and keyword hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordFeedback;

impl KeywordFeedback {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn length_bonus(chars: usize) -> u32 {
    match chars {
        n if n > 500 => 15,
        n if n > 200 => 10,
        n if n > 100 => 5,
        _ => 0,
    }
}

fn mentions_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn missing_components(question: &Question, lower: &str) -> Vec<String> {
    question
        .expected_components
        .iter()
        .filter(|component| {
            let component = component.to_lowercase();
            let head = component.split(' ').next().unwrap_or_default();
            !lower.contains(&component) && !lower.contains(head)
        })
        .cloned()
        .collect()
}

fn default_trade_offs() -> Vec<TradeOff> {
    vec![
        TradeOff {
            topic: "Consistency vs Availability".into(),
            analysis: "For this type of system, consider whether CP (Consistency over \
                       Availability) or AP (Availability over Consistency) is more important \
                       based on your use case."
                .into(),
        },
        TradeOff {
            topic: "Latency vs Cost".into(),
            analysis: "Adding more caching layers improves latency but increases cost. \
                       Balance based on traffic patterns."
                .into(),
        },
    ]
}

impl FeedbackGenerator for KeywordFeedback {
    fn evaluate(&self, question: &Question, answer: &Answer) -> Feedback {
        let length = answer.text.chars().count();
        let has_diagram = answer.has_diagram();
        let lower = answer.text.to_lowercase();

        let mut found: Vec<&str> = Vec::new();
        let mut keyword_points = 0;
        for &keyword in CONCEPT_KEYWORDS.iter().flat_map(|group| group.iter()) {
            if lower.contains(keyword) {
                keyword_points += KEYWORD_POINTS;
                if !found.contains(&keyword) {
                    found.push(keyword);
                }
            }
        }

        let mut raw = BASE_SCORE + length_bonus(length) + keyword_points;
        if has_diagram {
            raw += DIAGRAM_BONUS;
        }
        let score = Score::saturating(raw);

        let mut strengths = Vec::new();
        if length > 500 {
            strengths.push("Comprehensive answer with good detail".to_owned());
        }
        if has_diagram {
            strengths.push(DIAGRAM_STRENGTH.to_owned());
        }
        if found.len() > 5 {
            strengths.push("Demonstrates good understanding of system design concepts".to_owned());
        }
        if lower.contains("scalability") {
            strengths.push("Addresses scalability considerations".to_owned());
        }
        if lower.contains("database") {
            strengths.push("Considers data storage aspects".to_owned());
        }

        let mut improvements = Vec::new();
        if length < 200 {
            improvements.push("Answer could be more detailed".to_owned());
        }
        if !has_diagram {
            improvements.push("Adding a diagram would strengthen your answer".to_owned());
        }
        if !mentions_any(&lower, &["database", "storage"]) {
            improvements.push("Consider including data storage strategy".to_owned());
        }
        if !mentions_any(&lower, &["api", "endpoint"]) {
            improvements.push("Think about API design".to_owned());
        }
        if !lower.contains("cache") {
            improvements.push("Consider caching strategies".to_owned());
        }
        if !mentions_any(&lower, &["monitor", "logging"]) {
            improvements.push("Include monitoring and observability".to_owned());
        }

        let missing = missing_components(question, &lower);

        let mut suggestions = Vec::new();
        if !missing.is_empty() {
            let head: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
            suggestions.push(format!("Consider adding: {}", head.join(", ")));
        }
        if !has_diagram {
            suggestions
                .push("Draw a high-level architecture diagram to illustrate your design".to_owned());
        }
        if let Some(first) = improvements.first() {
            suggestions.push(first.clone());
        }

        if mentions_any(&lower, &["tradeoff", "trade-off", "versus", "vs"]) {
            strengths.push("Good consideration of trade-offs".to_owned());
        } else {
            suggestions.push(
                "Discuss trade-offs between different approaches (e.g., SQL vs NoSQL, sync vs async)"
                    .to_owned(),
            );
        }

        Feedback {
            score,
            strengths,
            improvements,
            suggestions,
            missing_components: missing.into_iter().take(MISSING_COMPONENTS_SHOWN).collect(),
            trade_offs: default_trade_offs(),
        }
    }

    fn follow_ups(&self, _question: &Question, answer: &Answer) -> Vec<String> {
        let lower = answer.text.to_lowercase();
        let mut prompts: Vec<&str> = Vec::new();

        if mentions_any(&lower, &["database", "sql", "nosql"]) {
            prompts.push("How would you handle database migrations?");
            prompts.push("What indexing strategy would you use?");
        }
        if mentions_any(&lower, &["scale", "load balancer"]) {
            prompts.push("How would you handle a 10x increase in traffic?");
            prompts.push("What happens when a server goes down?");
        }
        if mentions_any(&lower, &["cache", "redis"]) {
            prompts.push("How would you handle cache invalidation?");
            prompts.push("What would be your cache hit ratio target?");
        }
        if mentions_any(&lower, &["microservice", "service"]) {
            prompts.push("How would services communicate with each other?");
            prompts.push("How do you handle distributed transactions?");
        }
        if prompts.is_empty() {
            prompts.push("How would you handle failure in your system?");
            prompts.push("What metrics would you monitor?");
            prompts.push("How would you secure this system?");
        }

        prompts
            .into_iter()
            .take(MAX_FOLLOW_UPS)
            .map(str::to_owned)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{Category, Difficulty, QuestionId};

    fn question() -> Question {
        let mut q = Question::new(
            QuestionId::new("2").unwrap(),
            "Design a URL Shortener",
            Category::Scalability,
            Difficulty::Medium,
        );
        q.expected_components = vec![
            "Load Balancer".into(),
            "Hash Function".into(),
            "Database".into(),
        ];
        q
    }

    #[test]
    fn short_answer_without_keywords_scores_base() {
        let feedback = KeywordFeedback.evaluate(&question(), &Answer::new("I would build it."));

        assert_eq!(feedback.score.value(), 50);
        assert!(feedback.strengths.is_empty());
        assert_eq!(feedback.improvements[0], "Answer could be more detailed");
        assert_eq!(
            feedback.suggestions[0],
            "Consider adding: Load Balancer, Hash Function, Database"
        );
        assert_eq!(feedback.missing_components.len(), 3);
        assert_eq!(feedback.trade_offs.len(), 2);
    }

    #[test]
    fn diagram_and_keywords_raise_score() {
        let answer = Answer::new("Put a load balancer in front and a cache before the database.")
            .with_diagram("graph LR; lb-->app");
        let feedback = KeywordFeedback.evaluate(&question(), &answer);

        // base 50 + diagram 20 + load balancer, cache, database = 3 hits
        assert_eq!(feedback.score.value(), 76);
        assert!(
            feedback
                .strengths
                .contains(&DIAGRAM_STRENGTH.to_owned())
        );
        assert_eq!(feedback.missing_components, vec!["Hash Function".to_owned()]);
    }

    #[test]
    fn repeated_group_keywords_count_per_group() {
        // "sharding" and "replication" each appear in two groups
        let feedback =
            KeywordFeedback.evaluate(&question(), &Answer::new("sharding and replication"));
        assert_eq!(feedback.score.value(), 58);
    }

    #[test]
    fn score_is_capped_at_one_hundred() {
        let text = "scale horizontal vertical load balancer sharding replication partition cache \
                    cdn database schema index sql nosql acid transaction api rest graphql endpoint \
                    authentication authorization rate limit gateway microservice container \
                    orchestration kubernetes docker message queue event distributed consensus raft \
                    paxos byzantine fault tolerance consistency monitor tradeoff "
            .repeat(2);
        let feedback =
            KeywordFeedback.evaluate(&question(), &Answer::new(text).with_diagram("graph"));
        assert_eq!(feedback.score.value(), 100);
        assert!(
            feedback
                .strengths
                .contains(&"Good consideration of trade-offs".to_owned())
        );
    }

    #[test]
    fn blank_diagram_is_not_a_diagram() {
        let answer = Answer::new("text").with_diagram("   ");
        assert!(!answer.has_diagram());
        assert_eq!(KeywordFeedback.evaluate(&question(), &answer).score.value(), 50);
    }

    #[test]
    fn follow_ups_match_topics_and_are_limited() {
        let answer = Answer::new("Store it in a database behind a cache");
        assert_eq!(
            KeywordFeedback.follow_ups(&question(), &answer),
            vec![
                "How would you handle database migrations?".to_owned(),
                "What indexing strategy would you use?".to_owned(),
            ]
        );
    }

    #[test]
    fn generic_follow_ups_when_nothing_matches() {
        let prompts = KeywordFeedback.follow_ups(&question(), &Answer::new("hmm"));
        assert_eq!(
            prompts,
            vec![
                "How would you handle failure in your system?".to_owned(),
                "What metrics would you monitor?".to_owned(),
            ]
        );
    }
}
