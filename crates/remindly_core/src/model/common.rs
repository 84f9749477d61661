//! Shared value types for task and reminder records.
//!
//! # Responsibility
//! - Define priority/category vocabularies and their stable storage strings.
//! - Normalize free-text titles before validation and persistence.
//!
//! # Invariants
//! - `as_str()` output is the only representation written to storage.
//! - Parsing accepts legacy category aliases but never writes them back.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Owner identifier supplied by the authentication provider.
///
/// Every persisted row is scoped to exactly one owner.
pub type OwnerId = String;

/// Importance level shared by tasks and reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Fixed category set for tasks and reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Personal,
    Study,
    Sport,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Study,
        Category::Sport,
        Category::Other,
    ];

    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Study => "study",
            Self::Sport => "sport",
            Self::Other => "other",
        }
    }

    /// Parses a category, including the aliases written by earlier app builds.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "work" | "ish" => Some(Self::Work),
            "personal" | "shaxsiy" => Some(Self::Personal),
            "study" | "o'qish" => Some(Self::Study),
            "sport" => Some(Self::Sport),
            "other" | "boshqa" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Collapses whitespace runs and trims both ends.
pub fn normalize_title(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Category, Priority};

    #[test]
    fn category_parse_accepts_legacy_aliases() {
        assert_eq!(Category::parse("ish"), Some(Category::Work));
        assert_eq!(Category::parse("o'qish"), Some(Category::Study));
        assert_eq!(Category::parse(" Sport "), Some(Category::Sport));
        assert_eq!(Category::parse("gardening"), None);
    }

    #[test]
    fn storage_strings_roundtrip() {
        for priority in Priority::ALL {
            assert_eq!(Priority::parse(priority.as_str()), Some(priority));
        }
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn normalize_title_collapses_whitespace() {
        assert_eq!(normalize_title("  pay\t\nrent   now "), "pay rent now");
        assert_eq!(normalize_title(" \n "), "");
    }
}
