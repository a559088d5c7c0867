use serde::{Deserialize, Serialize};

/// A domain type: a named, constrained refinement of a base type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub base_type: String,
    pub default: Option<String>,
    pub check: Option<String>,
    pub comment: Option<String>,
    pub created_in: u32,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
