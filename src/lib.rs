pub mod classifier;
pub mod config;
pub mod detection;
pub mod phone_lookup;
pub mod verdict;

pub use classifier::{classify, Classifier, TieBreak};
pub use config::Config;
pub use detection::{Category, Rule, RuleSet, Severity};
pub use phone_lookup::{PhoneLookupClient, PhoneReport, RiskLevel};
pub use verdict::{Classification, ConfidenceTier, RecommendedAction, Verdict};
