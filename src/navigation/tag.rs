use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one pushed screen instance, `<kind>:<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenTag(String);

impl ScreenTag {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn compose(kind: &str, suffix: &str) -> Self {
        Self(format!("{kind}:{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Screen kind the tag was generated for.
    pub fn kind(&self) -> &str {
        self.0
            .rsplit_once(':')
            .map(|(kind, _)| kind)
            .unwrap_or(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScreenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScreenTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScreenTag {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ScreenTag {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Source of unique tag suffixes.
pub trait TagSource {
    fn next_suffix(&mut self) -> String;

    fn next_tag(&mut self, kind: &str) -> ScreenTag {
        let suffix = self.next_suffix();
        ScreenTag::compose(kind, &suffix)
    }
}

/// Random v4 UUID suffixes.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTagSource;

impl TagSource for UuidTagSource {
    fn next_suffix(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Counting suffixes (`1`, `2`, ...) for reproducible runs.
#[derive(Debug, Clone)]
pub struct SequentialTagSource {
    next: u64,
}

impl SequentialTagSource {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialTagSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TagSource for SequentialTagSource {
    fn next_suffix(&mut self) -> String {
        let value = self.next;
        self.next = self.next.saturating_add(1);
        value.to_string()
    }
}
