use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ScamPhishing,
    Impersonation,
    PolicyViolation,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::ScamPhishing => "SCAM / PHISHING",
            Category::Impersonation => "IMPERSONATION",
            Category::PolicyViolation => "POLICY VIOLATION",
        }
    }

    /// Categories whose high-confidence hits warrant removing the sender.
    pub fn removes_user(&self) -> bool {
        matches!(self, Category::ScamPhishing | Category::Impersonation)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn weight(&self) -> u32 {
        match self {
            Severity::High => 3,
            Severity::Medium => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub category: Category,
    pub keywords: Vec<String>,
    pub description: String,
    pub severity: Severity,
}

impl Rule {
    pub fn new(category: Category, keywords: &[&str], description: &str, severity: Severity) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
            severity,
        }
    }

    /// Keywords contained in `lowered`, in declaration order. Plain substring
    /// containment, the caller is responsible for lowercasing.
    pub fn matched_keywords<'a>(&'a self, lowered: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Ordered rule table. Order only matters for choosing the reported category.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self> {
        if rules.is_empty() {
            bail!("rule set must contain at least one rule");
        }

        for (i, rule) in rules.iter().enumerate() {
            if rule.description.trim().is_empty() {
                bail!("rule {} has an empty description", i + 1);
            }
            if rule.keywords.is_empty() {
                bail!("rule {} ({}) has no keywords", i + 1, rule.description);
            }
            for keyword in &rule.keywords {
                if keyword.is_empty() {
                    bail!("rule {} ({}) contains an empty keyword", i + 1, rule.description);
                }
                if keyword.to_lowercase() != *keyword {
                    bail!(
                        "rule {} ({}) keyword '{}' must be lowercase",
                        i + 1,
                        rule.description,
                        keyword
                    );
                }
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn all_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = self
            .rules
            .iter()
            .flat_map(|rule| rule.keywords.iter().cloned())
            .collect();
        keywords.sort();
        keywords.dedup();
        keywords
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: vec![
                Rule::new(
                    Category::ScamPhishing,
                    &[
                        "crypto",
                        "investment",
                        "bitcoin",
                        "usdt",
                        "forex",
                        "profit",
                        "return on investment",
                        "doubling",
                        "mining",
                        "binance",
                        "wallet",
                    ],
                    "No unsolicited investment or crypto schemes.",
                    Severity::High,
                ),
                Rule::new(
                    Category::ScamPhishing,
                    &[
                        "verification code",
                        "otp",
                        "send me the code",
                        "account access",
                        "login",
                        "password",
                        "click the link",
                        "verify your account",
                    ],
                    "No requests for OTPs or account access.",
                    Severity::High,
                ),
                Rule::new(
                    Category::ScamPhishing,
                    &[
                        "urgent",
                        "hurry",
                        "act now",
                        "immediate help",
                        "emergency",
                        "hospital",
                        "money transfer",
                        "wired",
                    ],
                    "No urgent financial requests.",
                    Severity::Medium,
                ),
                Rule::new(
                    Category::Impersonation,
                    &[
                        "whatsapp support",
                        "admin team",
                        "official staff",
                        "customer service",
                        "group admin",
                        "moderator",
                    ],
                    "No impersonation of authority.",
                    Severity::High,
                ),
                Rule::new(
                    Category::PolicyViolation,
                    &["t.me/", "chat.whatsapp.com/"],
                    "No unauthorized external group links.",
                    Severity::Medium,
                ),
            ],
        }
    }
}
