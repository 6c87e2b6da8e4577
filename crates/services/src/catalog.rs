use serde::Deserialize;

use prep_core::model::{Question, QuestionCatalog};

use crate::error::ServiceError;

const BUILTIN_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Deserialize)]
struct CatalogFile {
    questions: Vec<Question>,
}

/// The bundled set of system design questions.
///
/// # Errors
///
/// Returns `ServiceError` only if the bundled data is malformed.
pub fn builtin_catalog() -> Result<QuestionCatalog, ServiceError> {
    catalog_from_json(BUILTIN_QUESTIONS)
}

/// Parse a catalog from `{ "questions": [...] }` JSON, keeping file order.
///
/// # Errors
///
/// Returns `ServiceError::CatalogData` for malformed JSON and
/// `ServiceError::Catalog` for duplicate ids or empty titles.
pub fn catalog_from_json(raw: &str) -> Result<QuestionCatalog, ServiceError> {
    let file: CatalogFile = serde_json::from_str(raw)?;
    Ok(QuestionCatalog::new(file.questions)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{Category, Difficulty, QuestionId};

    #[test]
    fn builtin_catalog_loads_in_order() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.len(), 25);

        let first = catalog.iter().next().unwrap();
        assert_eq!(first.id, QuestionId::new("1").unwrap());
        assert_eq!(first.title, "Design Twitter");
        assert_eq!(first.category, Category::Scalability);
        assert_eq!(first.difficulty, Difficulty::Hard);
        assert!(!first.expected_components.is_empty());
    }

    #[test]
    fn builtin_catalog_covers_every_category() {
        let catalog = builtin_catalog().unwrap();
        for category in Category::ALL {
            assert!(
                catalog.by_category(category).next().is_some(),
                "no question for {category}"
            );
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{"questions": [
            {"id": "a", "title": "One", "category": "api", "difficulty": "easy"},
            {"id": "a", "title": "Two", "category": "api", "difficulty": "easy"}
        ]}"#;
        assert!(matches!(
            catalog_from_json(raw),
            Err(ServiceError::Catalog(_))
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            catalog_from_json("{\"questions\": [{}]}"),
            Err(ServiceError::CatalogData(_))
        ));
    }
}
