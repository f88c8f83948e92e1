use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Validated document path: `collection/doc[/collection/doc...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn new(path: impl Into<String>) -> Result<Self, ValidationError> {
        let path = path.into();
        let segments: Vec<&str> = path.split('/').collect();

        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ValidationError::invalid(format!(
                "document path '{}' has an empty segment",
                path
            )));
        }
        if segments.len() % 2 != 0 {
            return Err(ValidationError::invalid(format!(
                "document path '{}' must alternate collection/document",
                path
            )));
        }

        Ok(Self(path))
    }

    pub fn from_segments(segments: &[&str]) -> Result<Self, ValidationError> {
        if let Some(bad) = segments.iter().find(|s| s.contains('/')) {
            return Err(ValidationError::invalid(format!(
                "path segment '{}' must not contain '/'",
                bad
            )));
        }
        Self::new(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the collection holding this document.
    pub fn collection(&self) -> &str {
        self.0.rsplit_once('/').map(|(c, _)| c).unwrap_or_default()
    }

    /// The document's own id (last segment).
    pub fn id(&self) -> &str {
        self.0.rsplit_once('/').map(|(_, id)| id).unwrap_or(&self.0)
    }
}

impl FromStr for DocPath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_collection_and_id() {
        let path = DocPath::new("artifacts/app/public/data/plants/u1").unwrap();
        assert_eq!(path.collection(), "artifacts/app/public/data/plants");
        assert_eq!(path.id(), "u1");
    }

    #[test]
    fn rejects_odd_segment_counts() {
        assert!(DocPath::new("plants").is_err());
        assert!(DocPath::new("a/b/c").is_err());
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(DocPath::new("").is_err());
        assert!(DocPath::new("plants//u1/x").is_err());
        assert!(DocPath::new("plants/ ").is_err());
    }

    #[test]
    fn segments_cannot_smuggle_slashes() {
        assert!(DocPath::from_segments(&["plants", "u1/evil"]).is_err());
        assert!(DocPath::from_segments(&["plants", "u1"]).is_ok());
    }
}
