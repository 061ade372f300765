#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} '{name}' not found")]
    NotFound { entity: &'static str, name: String },

    #[error("{entity} '{name}' already exists")]
    AlreadyExists { entity: &'static str, name: String },

    #[error("{0}")]
    Validation(String),
}

impl CoreError {
    /// Shorthand for a missing script.
    pub fn script_not_found(name: &str) -> Self {
        Self::NotFound {
            entity: "Script",
            name: name.to_string(),
        }
    }

    /// Shorthand for a duplicate script.
    pub fn script_exists(name: &str) -> Self {
        Self::AlreadyExists {
            entity: "Script",
            name: name.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
