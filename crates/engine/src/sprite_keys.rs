use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key must not contain '\\\\'")]
    Backslash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Validated asset key, e.g. `customer-3` or `icons/clock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteKey(String);

impl SpriteKey {
    pub fn parse(raw: &str) -> Result<Self, SpriteKeyError> {
        validate_sprite_key(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset keys are lowercase relative paths: `[a-z0-9_/-]`, no traversal.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(SpriteKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(SpriteKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}
