//! Analytics event payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Measurement protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Hit type for every event this service sends.
pub const HIT_TYPE_PAGEVIEW: &str = "pageview";

/// One measurement-protocol hit describing a proxied resource request.
///
/// Field names on the wire are the protocol's short parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(rename = "v")]
    pub protocol_version: u8,

    #[serde(rename = "t")]
    pub hit_type: String,

    #[serde(rename = "tid")]
    pub tracking_id: String,

    /// Random per event; returning clients are not tracked.
    #[serde(rename = "cid")]
    pub client_id: Uuid,

    #[serde(rename = "aip")]
    pub anonymize_ip: bool,

    #[serde(rename = "ni")]
    pub non_interaction: bool,

    #[serde(rename = "dl")]
    pub document_location: String,

    #[serde(rename = "ua")]
    pub user_agent: String,

    /// Custom dimension 2 (API key). Always empty.
    #[serde(rename = "cd2")]
    pub api_key: String,

    /// Custom dimension 6 (short user agent). Always empty.
    #[serde(rename = "cd6")]
    pub short_user_agent: String,
}

impl AnalyticsEvent {
    /// Build a non-interaction pageview with a fresh client id.
    pub fn pageview(
        tracking_id: impl Into<String>,
        endpoint: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            hit_type: HIT_TYPE_PAGEVIEW.to_string(),
            tracking_id: tracking_id.into(),
            client_id: Uuid::new_v4(),
            anonymize_ip: true,
            non_interaction: true,
            document_location: endpoint.into(),
            user_agent: user_agent.into(),
            api_key: String::new(),
            short_user_agent: String::new(),
        }
    }

    /// Serialized request body.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
