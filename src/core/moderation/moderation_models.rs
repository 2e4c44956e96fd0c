// Moderation domain models - the values the engine hands back to callers.
//
// These are pure data types. Nothing here knows about chat screens,
// journals or uploads; the gate service maps them onto those surfaces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class of disallowed content. One input may trigger several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Profanity,
    SelfHarm,
    Violence,
    Sexual,
    Drugs,
    Hate,
    Dangerous,
}

impl Category {
    /// Every category, in the order the pattern matchers run.
    pub const ALL: [Category; 7] = [
        Category::Profanity,
        Category::SelfHarm,
        Category::Violence,
        Category::Sexual,
        Category::Drugs,
        Category::Hate,
        Category::Dangerous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Profanity => "profanity",
            Category::SelfHarm => "self-harm",
            Category::Violence => "violence",
            Category::Sexual => "sexual",
            Category::Drugs => "drugs",
            Category::Hate => "hate",
            Category::Dangerous => "dangerous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered risk level: `None < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Severity::None),
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single moderation check.
///
/// Built fresh for every call and never mutated afterwards. Serializes with
/// the camelCase field names the web front end expects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    /// True iff no category was triggered.
    pub is_clean: bool,
    /// De-duplicated, in first-detection order.
    pub blocked_categories: Vec<Category>,
    /// De-duplicated matched substrings. Diagnostic data only: never echo
    /// these back to the person who wrote them.
    pub flagged_content: Vec<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ModerationResult {
    /// The neutral result returned for empty or non-text input.
    pub fn clean() -> Self {
        Self {
            is_clean: true,
            ..Default::default()
        }
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.blocked_categories.contains(&category)
    }
}

/// A crisis-support contact shown alongside self-harm blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportResource {
    pub name: &'static str,
    pub contact: &'static str,
    pub description: &'static str,
}
