use crate::detection::Category;
use serde::{Serialize, Serializer};
use std::fmt;

pub const NO_EVIDENCE: &str = "None";
pub const NO_RULES_BROKEN: &str = "None implicated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::Medium => "MEDIUM",
            ConfidenceTier::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Ignore,
    Warn,
    Delete,
    RemoveUser,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecommendedAction::Ignore => "IGNORE",
            RecommendedAction::Warn => "WARN",
            RecommendedAction::Delete => "DELETE",
            RecommendedAction::RemoveUser => "REMOVE USER",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Flagged(Category),
    Spam,
    Safe,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Flagged(category) => write!(f, "{category}"),
            Classification::Spam => f.write_str("SPAM"),
            Classification::Safe => f.write_str("SAFE"),
        }
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One line of flagged evidence. Keywords are shown quoted, notes verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    Keyword(String),
    Note(String),
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::Keyword(keyword) => write!(f, "\"{keyword}\""),
            Evidence::Note(note) => f.write_str(note),
        }
    }
}

impl Serialize for Evidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub classification: Classification,
    pub confidence: ConfidenceTier,
    pub action: RecommendedAction,
    pub flagged_excerpts: Vec<Evidence>,
    pub rule_analysis: Vec<String>,
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        self.classification == Classification::Safe
    }

    pub fn excerpts_line(&self) -> String {
        if self.flagged_excerpts.is_empty() {
            return NO_EVIDENCE.to_string();
        }
        self.flagged_excerpts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn rules_line(&self) -> String {
        if self.rule_analysis.is_empty() {
            return NO_RULES_BROKEN.to_string();
        }
        self.rule_analysis.join(" ")
    }

    /// The five-line moderation report.
    pub fn report(&self) -> String {
        format!(
            "Classification: {}\nFlagged excerpts: {}\nRule analysis: {}\nConfidence level: {}\nAdmin action recommendation: {}",
            self.classification,
            self.excerpts_line(),
            self.rules_line(),
            self.confidence,
            self.action
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}
