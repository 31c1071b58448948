use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Other(String),
    Error,
}

impl RiskLevel {
    fn from_label(label: &str) -> Self {
        match label {
            "HIGH" => RiskLevel::High,
            "MEDIUM" => RiskLevel::Medium,
            other => RiskLevel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::High => f.write_str("HIGH"),
            RiskLevel::Medium => f.write_str("MEDIUM"),
            RiskLevel::Other(label) => f.write_str(label),
            RiskLevel::Error => f.write_str("ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneReport {
    pub risk_level: RiskLevel,
    pub report: String,
}

impl PhoneReport {
    fn error(message: String) -> Self {
        Self {
            risk_level: RiskLevel::Error,
            report: message,
        }
    }
}

/// Response body of the lookup service. A non-empty `error` takes precedence.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    error: Option<String>,
    #[serde(rename = "riskLevel")]
    risk_level: Option<String>,
    report: Option<String>,
}

impl TryFrom<LookupResponse> for PhoneReport {
    type Error = anyhow::Error;

    fn try_from(response: LookupResponse) -> anyhow::Result<Self> {
        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Ok(PhoneReport::error(error));
        }
        match (response.risk_level, response.report) {
            (Some(risk_level), Some(report)) => Ok(PhoneReport {
                risk_level: RiskLevel::from_label(&risk_level),
                report,
            }),
            _ => anyhow::bail!("lookup response is missing riskLevel or report"),
        }
    }
}

pub fn parse_response(body: &str) -> anyhow::Result<PhoneReport> {
    let response: LookupResponse = serde_json::from_str(body)?;
    response.try_into()
}

pub struct PhoneLookupClient {
    client: Client,
    endpoint: Url,
}

impl PhoneLookupClient {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("chat-sentinel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn request_url(&self, number: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "phone")
            .append_pair("number", number);
        url
    }

    /// Looks up `number`. Transport and decoding failures are folded into an
    /// `ERROR` report rather than returned.
    pub async fn lookup(&self, number: &str) -> PhoneReport {
        match self.fetch(number).await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Phone lookup for {number} failed: {e}");
                PhoneReport::error(format!("Connection failed.\nDetails: {e}"))
            }
        }
    }

    async fn fetch(&self, number: &str) -> anyhow::Result<PhoneReport> {
        let url = self.request_url(number);
        log::debug!("Requesting phone lookup: {url}");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        parse_response(&body)
    }
}
