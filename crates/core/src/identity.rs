use crate::error::ValidationError;
use std::fmt;

/// A player's stage name, trimmed and guaranteed non-empty.
///
/// There is no setter: a new session needs a fresh identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity(String);

impl PlayerIdentity {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
