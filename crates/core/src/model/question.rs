use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate question id in catalog: {0}")]
    DuplicateId(QuestionId),

    #[error("question {0} has an empty title")]
    EmptyTitle(QuestionId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {raw}")]
pub struct ParseLabelError {
    kind: &'static str,
    raw: String,
}

//
// ─── LABELS ────────────────────────────────────────────────────────────────────
//

/// Topic area a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Scalability,
    Database,
    Api,
    Caching,
    Microservices,
    DistributedSystems,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Scalability,
        Category::Database,
        Category::Api,
        Category::Caching,
        Category::Microservices,
        Category::DistributedSystems,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Scalability => "scalability",
            Category::Database => "database",
            Category::Api => "api",
            Category::Caching => "caching",
            Category::Microservices => "microservices",
            Category::DistributedSystems => "distributed-systems",
        }
    }
}

impl FromStr for Category {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| ParseLabelError {
                kind: "category",
                raw: s.to_owned(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == needle)
            .ok_or_else(|| ParseLabelError {
                kind: "difficulty",
                raw: s.to_owned(),
            })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A static interview question.
///
/// Only `id`, `category` and `difficulty` matter to scheduling; the remaining
/// fields are content for presentation and feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub evaluation_criteria: Vec<String>,
    #[serde(default)]
    pub expected_components: Vec<String>,
    #[serde(default)]
    pub sample_answer: String,
    #[serde(default)]
    pub companies: Vec<String>,
}

impl Question {
    /// Minimal question with no content beyond the title.
    #[must_use]
    pub fn new(
        id: QuestionId,
        title: impl Into<String>,
        category: Category,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            category,
            difficulty,
            hints: Vec::new(),
            evaluation_criteria: Vec::new(),
            expected_components: Vec::new(),
            sample_answer: String::new(),
            companies: Vec::new(),
        }
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Read-only, ordered question catalog with id lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionCatalog {
    /// Build a catalog, preserving the given order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two questions share an id, or
    /// `CatalogError::EmptyTitle` for a question without a title.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            if question.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle(question.id.clone()));
            }
            if index.insert(question.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
        }
        Ok(Self { questions, index })
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.index.get(id).map(|&pos| &self.questions[pos])
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.category == category)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.difficulty == difficulty)
    }

    /// Case-insensitive substring match over title and description.
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<&Question> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.questions.iter().collect();
        }
        self.questions
            .iter()
            .filter(|q| {
                q.title.to_lowercase().contains(&needle)
                    || q.description.to_lowercase().contains(&needle)
            })
            .collect()
    }
}
