use serde::{Deserialize, Serialize};

/// The three-way label assigned to every incoming question. Routing is a
/// pure function of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Products,
    Returns,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Returns => "returns",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexed unit of catalog text, stored with its embedding vector.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub doc_id: String,
    pub chunk_index: u32,
    pub source: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub indexed_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Products).unwrap(), "\"products\"");
        assert_eq!(serde_json::to_string(&Category::Returns).unwrap(), "\"returns\"");
        assert_eq!(serde_json::to_string(&Category::General).unwrap(), "\"general\"");
    }

    #[test]
    fn category_display_matches_as_str() {
        assert_eq!(Category::Products.to_string(), "products");
        assert_eq!(Category::General.as_str(), "general");
    }
}
