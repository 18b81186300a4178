/// Structural diff between two CR instances, queryable by path.
///
/// A [`crate::ResourceDescriptor`] computes one of these for a given pair of
/// `desired`/`latest` resources; the engine only ever asks whether a
/// particular top-level path (`"Spec"`, `"Metadata"`, ...) differs, never
/// inspects the raw list itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    differences: Vec<String>,
}

impl Delta {
    pub fn new(differences: Vec<String>) -> Self {
        Delta { differences }
    }

    pub fn empty() -> Self {
        Delta::default()
    }

    pub fn differences(&self) -> &[String] {
        &self.differences
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// `true` iff any recorded difference lies at or under `path`.
    pub fn different_at(&self, path: &str) -> bool {
        self.differences.iter().any(|d| d == path || d.starts_with(&format!("{path}.")))
    }
}
