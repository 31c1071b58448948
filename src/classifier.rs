use crate::detection::{Category, RuleSet, Severity};
use crate::verdict::{Classification, ConfidenceTier, Evidence, RecommendedAction, Verdict};
use serde::{Deserialize, Serialize};

/// Messages longer than this (in UTF-16 code units) with no rule hits are treated as flooding.
pub const SPAM_LENGTH_THRESHOLD: usize = 500;
/// Minimum aggregate score for a HIGH confidence verdict.
pub const HIGH_CONFIDENCE_SCORE: u32 = 3;

const SPAM_EVIDENCE: &str = "Excessive message length";
const SPAM_RULE: &str = "Potential spam or flooding.";

/// How a HIGH-severity hit interacts with a category already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Every HIGH hit overwrites the category, so the last HIGH rule wins.
    #[default]
    LastHigh,
    /// A HIGH hit only overwrites a category recorded by a MEDIUM hit.
    FirstHigh,
}

/// Insertion-ordered collection that ignores repeated values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSet<T> {
    items: Vec<T>,
}

impl<T: PartialEq> OrderedSet<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Returns false if the value was already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.items.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialEq> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationResult {
    pub matched: OrderedSet<Evidence>,
    pub broken_rules: OrderedSet<String>,
    pub score: u32,
    pub hit_count: u32,
    pub dominant_category: Option<Category>,
    dominant_severity: Option<Severity>,
}

impl EvaluationResult {
    fn record_category(&mut self, category: Category, severity: Severity, tie_break: TieBreak) {
        let replace = match (self.dominant_severity, severity, tie_break) {
            (None, _, _) => true,
            (Some(_), Severity::High, TieBreak::LastHigh) => true,
            (Some(Severity::Medium), Severity::High, TieBreak::FirstHigh) => true,
            _ => false,
        };
        if replace {
            self.dominant_category = Some(category);
            self.dominant_severity = Some(severity);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: RuleSet,
    tie_break: TieBreak,
}

impl Classifier {
    pub fn new(rules: RuleSet, tie_break: TieBreak) -> Self {
        Self { rules, tie_break }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Folds the rule table over `text`, recording hits in declaration order.
    pub fn evaluate(&self, text: &str) -> EvaluationResult {
        let lowered = text.to_lowercase();

        self.rules
            .rules()
            .iter()
            .fold(EvaluationResult::default(), |mut result, rule| {
                let hits = rule.matched_keywords(&lowered);
                if hits.is_empty() {
                    return result;
                }

                log::debug!(
                    "Rule '{}' ({}, {:?}) matched: {:?}",
                    rule.description,
                    rule.category,
                    rule.severity,
                    hits
                );

                for keyword in hits {
                    result.matched.insert(Evidence::Keyword(keyword.to_string()));
                }
                result.hit_count += 1;
                result.broken_rules.insert(rule.description.clone());
                result.score += rule.severity.weight();
                result.record_category(rule.category, rule.severity, self.tie_break);
                result
            })
    }

    pub fn classify(&self, text: &str) -> Verdict {
        let mut result = self.evaluate(text);

        let mut classification = Classification::Safe;
        let mut confidence = ConfidenceTier::Low;
        let mut action = RecommendedAction::Ignore;

        if result.hit_count > 0 {
            if let Some(category) = result.dominant_category {
                classification = Classification::Flagged(category);
                if result.score >= HIGH_CONFIDENCE_SCORE {
                    confidence = ConfidenceTier::High;
                    action = if category.removes_user() {
                        RecommendedAction::RemoveUser
                    } else {
                        RecommendedAction::Delete
                    };
                } else {
                    confidence = ConfidenceTier::Medium;
                    action = RecommendedAction::Warn;
                }
            }
        } else if text.encode_utf16().count() > SPAM_LENGTH_THRESHOLD {
            classification = Classification::Spam;
            result.matched.insert(Evidence::Note(SPAM_EVIDENCE.to_string()));
            result.broken_rules.insert(SPAM_RULE.to_string());
            confidence = ConfidenceTier::Low;
            action = RecommendedAction::Warn;
        }

        // Without evidence nothing else in the partial state is trusted.
        if result.matched.is_empty() {
            classification = Classification::Safe;
            action = RecommendedAction::Ignore;
            result.broken_rules = OrderedSet::new();
        }

        let verdict = Verdict {
            classification,
            confidence,
            action,
            flagged_excerpts: result.matched.into_vec(),
            rule_analysis: result.broken_rules.into_vec(),
        };

        log::debug!(
            "Verdict: {} (score {}, hits {}, confidence {}, action {})",
            verdict.classification,
            result.score,
            result.hit_count,
            verdict.confidence,
            verdict.action
        );

        verdict
    }
}

/// Classifies `text` with the built-in rule table.
pub fn classify(text: &str) -> Verdict {
    Classifier::default().classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Rule;

    #[test]
    fn test_plain_message_is_safe() {
        let verdict = classify("See you at the meetup on Friday!");
        assert_eq!(verdict.classification, Classification::Safe);
        assert_eq!(verdict.action, RecommendedAction::Ignore);
        assert_eq!(verdict.confidence, ConfidenceTier::Low);
        assert_eq!(verdict.excerpts_line(), "None");
        assert_eq!(verdict.rules_line(), "None implicated.");
    }

    #[test]
    fn test_long_message_is_spam() {
        let text = "la ".repeat(200);
        let verdict = classify(&text);
        assert_eq!(verdict.classification, Classification::Spam);
        assert_eq!(verdict.confidence, ConfidenceTier::Low);
        assert_eq!(verdict.action, RecommendedAction::Warn);
        assert_eq!(verdict.excerpts_line(), "Excessive message length");
        assert_eq!(verdict.rules_line(), "Potential spam or flooding.");
    }

    #[test]
    fn test_length_threshold_is_strict() {
        assert!(classify(&"a".repeat(500)).is_safe());
        assert_eq!(classify(&"a".repeat(501)).classification, Classification::Spam);
        // 300 two-byte characters are 600 bytes but only 300 UTF-16 units.
        assert!(classify(&"é".repeat(300)).is_safe());
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // Each emoji is a surrogate pair.
        let flood = "😀".repeat(300);
        assert_eq!(flood.encode_utf16().count(), 600);
        assert_eq!(classify(&flood).classification, Classification::Spam);

        let at_limit = "😀".repeat(250);
        assert_eq!(at_limit.encode_utf16().count(), 500);
        assert!(classify(&at_limit).is_safe());
    }

    #[test]
    fn test_bitcoin_alone() {
        let result = Classifier::default().evaluate("Free bitcoin for everyone");
        assert_eq!(result.score, 3);
        assert_eq!(result.hit_count, 1);

        let verdict = classify("Free bitcoin for everyone");
        assert_eq!(verdict.classification, Classification::Flagged(Category::ScamPhishing));
        assert_eq!(verdict.classification.to_string(), "SCAM / PHISHING");
        assert_eq!(verdict.confidence, ConfidenceTier::High);
        assert_eq!(verdict.action, RecommendedAction::RemoveUser);
    }

    #[test]
    fn test_group_link_alone() {
        let result = Classifier::default().evaluate("join us at t.me/somegroup");
        assert_eq!(result.score, 1);

        let verdict = classify("join us at t.me/somegroup");
        assert_eq!(verdict.classification, Classification::Flagged(Category::PolicyViolation));
        assert_eq!(verdict.confidence, ConfidenceTier::Medium);
        assert_eq!(verdict.action, RecommendedAction::Warn);
        assert_eq!(verdict.excerpts_line(), "\"t.me/\"");
    }

    #[test]
    fn test_high_overrides_medium_category() {
        let text = "Message the group admin at chat.whatsapp.com/abc";
        let result = Classifier::default().evaluate(text);
        assert_eq!(result.score, 4);
        assert_eq!(result.dominant_category, Some(Category::Impersonation));

        let verdict = classify(text);
        assert_eq!(verdict.classification, Classification::Flagged(Category::Impersonation));
        assert_eq!(verdict.confidence, ConfidenceTier::High);
        assert_eq!(verdict.action, RecommendedAction::RemoveUser);
    }

    #[test]
    fn test_medium_only_keeps_first_category() {
        // Urgent request (scam, MEDIUM) followed by a group link (policy, MEDIUM).
        let verdict = classify("urgent! join t.me/fast");
        assert_eq!(verdict.classification, Classification::Flagged(Category::ScamPhishing));
        assert_eq!(verdict.confidence, ConfidenceTier::Medium);
        assert_eq!(verdict.action, RecommendedAction::Warn);
    }

    #[test]
    fn test_last_high_wins_by_default() {
        let text = "I'm the moderator, send your bitcoin";
        let verdict = classify(text);
        assert_eq!(verdict.classification, Classification::Flagged(Category::Impersonation));
        assert_eq!(verdict.action, RecommendedAction::RemoveUser);
    }

    #[test]
    fn test_first_high_tie_break() {
        let classifier = Classifier::new(RuleSet::default(), TieBreak::FirstHigh);
        let verdict = classifier.classify("I'm the moderator, send your bitcoin");
        assert_eq!(verdict.classification, Classification::Flagged(Category::ScamPhishing));

        // A later HIGH still overrides an earlier MEDIUM.
        let rules = RuleSet::from_rules(vec![
            Rule::new(Category::PolicyViolation, &["t.me/"], "Links.", Severity::Medium),
            Rule::new(Category::Impersonation, &["admin"], "Authority.", Severity::High),
        ])
        .unwrap();
        let classifier = Classifier::new(rules, TieBreak::FirstHigh);
        let verdict = classifier.classify("admin says t.me/x");
        assert_eq!(verdict.classification, Classification::Flagged(Category::Impersonation));
    }

    #[test]
    fn test_policy_violation_high_score_deletes() {
        let rules = RuleSet::from_rules(vec![Rule::new(
            Category::PolicyViolation,
            &["casino"],
            "No gambling promotion.",
            Severity::High,
        )])
        .unwrap();
        let verdict = Classifier::new(rules, TieBreak::default()).classify("Best CASINO in town");
        assert_eq!(verdict.confidence, ConfidenceTier::High);
        assert_eq!(verdict.action, RecommendedAction::Delete);
    }

    #[test]
    fn test_case_insensitive() {
        let upper = classify("BITCOIN giveaway");
        let lower = classify("bitcoin giveaway");
        assert_eq!(upper.classification, lower.classification);
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_idempotent() {
        let text = "URGENT: verify your account via t.me/help";
        assert_eq!(classify(text), classify(text));
    }

    #[test]
    fn test_repeated_keyword_listed_once() {
        let verdict = classify("wallet wallet WALLET");
        assert_eq!(verdict.flagged_excerpts, vec![Evidence::Keyword("wallet".to_string())]);
        assert_eq!(verdict.excerpts_line(), "\"wallet\"");
    }

    #[test]
    fn test_evidence_order_follows_rules() {
        let verdict = classify("Need a login to my wallet, crypto only");
        assert_eq!(
            verdict.excerpts_line(),
            "\"crypto\", \"wallet\", \"login\""
        );
        assert_eq!(
            verdict.rules_line(),
            "No unsolicited investment or crypto schemes. No requests for OTPs or account access."
        );
        assert_eq!(Classifier::default().evaluate("Need a login to my wallet, crypto only").score, 6);
    }

    #[test]
    fn test_long_message_with_keyword_is_not_spam() {
        let text = format!("{} hurry", "x".repeat(600));
        let verdict = classify(&text);
        assert_eq!(verdict.classification, Classification::Flagged(Category::ScamPhishing));
        assert_eq!(verdict.confidence, ConfidenceTier::Medium);
    }

    #[test]
    fn test_ordered_set() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_vec(), vec!["b", "a"]);
    }
}
