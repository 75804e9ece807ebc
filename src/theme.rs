use serde::{Deserialize, Serialize};

use crate::model::NodeKind;

/// Semantic colors the engine falls back to when an entity has no color of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub story_edge: String,
    pub character: String,
    pub item: String,
    pub location: String,
    pub status: String,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            story_edge: "#ffffff".to_string(),
            character: "#3b82f6".to_string(),
            item: "#f59e0b".to_string(),
            location: "#a855f7".to_string(),
            status: "#f472b6".to_string(),
        }
    }

    pub fn fallback_for(&self, kind: NodeKind) -> &str {
        match kind {
            NodeKind::Character => &self.character,
            NodeKind::Item => &self.item,
            NodeKind::Location => &self.location,
            NodeKind::Status => &self.status,
            NodeKind::Story | NodeKind::Group => &self.story_edge,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}
