pub mod loader;

use crate::classifier::{Classifier, TieBreak};
use crate::detection::{Rule, RuleSet};
use crate::phone_lookup::{PhoneLookupClient, DEFAULT_TIMEOUT_SECONDS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Replaces the built-in rule table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_lookup: Option<PhoneLookupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhoneLookupConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>, // default: 10
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Writes the configuration with the built-in rule table spelled out,
    /// so it can be edited in place.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut expanded = self.clone();
        if expanded.rules.is_none() {
            expanded.rules = Some(RuleSet::default().rules().to_vec());
        }
        let content = serde_yaml::to_string(&expanded)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn rule_set(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(rules) => RuleSet::from_rules(rules.clone()),
            None => Ok(RuleSet::default()),
        }
    }

    pub fn classifier(&self) -> Result<Classifier> {
        Ok(Classifier::new(self.rule_set()?, self.tie_break))
    }

    pub fn phone_client(&self) -> Result<Option<PhoneLookupClient>> {
        match &self.phone_lookup {
            Some(lookup) => {
                let timeout = lookup.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
                let client = PhoneLookupClient::new(&lookup.endpoint, timeout)
                    .with_context(|| format!("Invalid phone lookup endpoint: {}", lookup.endpoint))?;
                Ok(Some(client))
            }
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.rule_set()?;
        self.phone_client()?;
        Ok(())
    }
}
