use serde::{Deserialize, Serialize};

/// Maximum length of a concept name, in characters.
pub const MAX_CONCEPT_NAME_CHARS: usize = 80;

/// A catalog item the user can schedule into timeframe slots.
///
/// Concepts form the read-only library on the day page. Their `id` is a
/// stable integer; placements reference it as `concept_id`. Inactive
/// concepts are hidden from the library and cannot be placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Concept {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

/// Input for adding a concept to the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConceptInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
