use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A leaf value whose backend type is not stable across sources
/// (the same field may arrive as `"3600"`, `3600` or `true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Whitespace-only text carries no information and renders as missing.
    pub fn is_blank(&self) -> bool {
        matches!(self, Scalar::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Flag(flag) => write!(f, "{flag}"),
            Scalar::Number(number) => write!(f, "{number}"),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Scalar::Text(text.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(flag: bool) -> Self {
        Scalar::Flag(flag)
    }
}

/// Arguments of one diagnosis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisTarget {
    pub username: String,
    /// Disambiguates a username that exists on more than one node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_ip: Option<String>,
}

impl DiagnosisTarget {
    pub fn new(username: impl Into<String>, node_ip: Option<String>) -> Self {
        Self {
            username: username.into(),
            node_ip: node_ip.filter(|ip| !ip.trim().is_empty()),
        }
    }
}

/// Consolidated technical snapshot for one subscriber.
///
/// Every field is optional: absence is a displayable state, not an error.
/// Unknown backend fields are ignored, and a field whose JSON type does not
/// fit is dropped on its own instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisRecord {
    #[serde(rename = "cliente_nombre", deserialize_with = "lenient_text")]
    pub customer_name: Option<String>,
    #[serde(rename = "direccion", deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub plan: Option<Scalar>,
    #[serde(rename = "nodo_nombre", deserialize_with = "lenient_text")]
    pub node_name: Option<String>,
    #[serde(rename = "nodo_ip", deserialize_with = "lenient_text")]
    pub node_ip: Option<String>,
    /// Optical line terminal serving the subscriber.
    #[serde(rename = "OLT", deserialize_with = "lenient")]
    pub olt: Option<Scalar>,
    /// Username as reported by the backend. May differ from, or be missing
    /// next to, the username that was requested.
    #[serde(rename = "pppoe_username", deserialize_with = "lenient_text")]
    pub username: Option<String>,
    #[serde(rename = "mikrotik", deserialize_with = "lenient")]
    pub session: Option<SessionStatus>,
    #[serde(rename = "onu_sn", deserialize_with = "lenient_text")]
    pub onu_serial: Option<String>,
    #[serde(rename = "onu_status_smrt", deserialize_with = "lenient")]
    pub onu_status: Option<OnuStatus>,
    #[serde(rename = "onu_signal_smrt", deserialize_with = "lenient")]
    pub onu_signal: Option<OnuSignal>,
    /// Username actually sent to the diagnosis endpoint. Attached by the
    /// client, never by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_username: Option<String>,
}

/// Router session state for the subscriber's PPPoE connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStatus {
    #[serde(deserialize_with = "lenient")]
    pub active: Option<Scalar>,
    #[serde(deserialize_with = "lenient")]
    pub uptime: Option<Scalar>,
    #[serde(deserialize_with = "lenient")]
    pub secret: Option<SessionSecret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSecret {
    #[serde(rename = "last-logged-out", deserialize_with = "lenient")]
    pub last_logged_out: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnuStatus {
    #[serde(rename = "onu_status", deserialize_with = "lenient")]
    pub status: Option<Scalar>,
    #[serde(deserialize_with = "lenient")]
    pub last_status_change: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnuSignal {
    /// Signal quality class (`Critical`, `Warning`, `Very good`).
    #[serde(rename = "onu_signal", deserialize_with = "lenient")]
    pub quality: Option<Scalar>,
    /// Raw optical power reading.
    #[serde(rename = "onu_signal_value", deserialize_with = "lenient")]
    pub value: Option<Scalar>,
}

impl DiagnosisRecord {
    /// Annotate the record with the username the request was made for.
    pub fn with_requested_username(mut self, username: impl Into<String>) -> Self {
        self.requested_username = Some(username.into());
        self
    }

    /// Best identifier for display: the backend's username, falling back to
    /// the one that was requested.
    pub fn display_username(&self) -> Option<&str> {
        non_blank(self.username.as_deref()).or(non_blank(self.requested_username.as_deref()))
    }

    pub fn session_active(&self) -> Option<&Scalar> {
        self.session.as_ref()?.active.as_ref()
    }

    pub fn session_uptime(&self) -> Option<&Scalar> {
        self.session.as_ref()?.uptime.as_ref()
    }

    pub fn last_disconnect(&self) -> Option<&Scalar> {
        self.session.as_ref()?.secret.as_ref()?.last_logged_out.as_ref()
    }

    pub fn onu_status_token(&self) -> Option<&Scalar> {
        self.onu_status.as_ref()?.status.as_ref()
    }

    pub fn onu_status_changed_at(&self) -> Option<&Scalar> {
        self.onu_status.as_ref()?.last_status_change.as_ref()
    }

    pub fn onu_signal_quality(&self) -> Option<&Scalar> {
        self.onu_signal.as_ref()?.quality.as_ref()
    }

    pub fn onu_signal_value(&self) -> Option<&Scalar> {
        self.onu_signal.as_ref()?.value.as_ref()
    }
}

/// Decode `T`, treating `null` or a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Free-text field; numbers and booleans are kept in their JSON spelling.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, Scalar>(deserializer)?.map(|scalar| scalar.to_string()))
}

pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{DiagnosisRecord, DiagnosisTarget, Scalar};
    use serde_json::json;

    fn full_payload() -> serde_json::Value {
        json!({
            "cliente_nombre": "Juan Perez",
            "direccion": "Calle 1 123",
            "plan": "100 Mbps",
            "nodo_nombre": "Nodo Centro",
            "nodo_ip": "10.0.0.1",
            "OLT": 3,
            "pppoe_username": "jperez01",
            "mikrotik": {
                "active": true,
                "uptime": "3d4h12m",
                "secret": { "last-logged-out": "2024-05-01 10:00:00" }
            },
            "onu_sn": "ZTEG12345678",
            "onu_status_smrt": {
                "onu_status": "Online",
                "last_status_change": "2024-05-01 10:01:00"
            },
            "onu_signal_smrt": {
                "onu_signal": "Very good",
                "onu_signal_value": "-19.5 dBm"
            },
            "extra_field": { "ignored": true }
        })
    }

    #[test]
    fn record_decodes_nested_backend_payload() {
        let record: DiagnosisRecord =
            serde_json::from_value(full_payload()).expect("record should decode");

        assert_eq!(record.customer_name.as_deref(), Some("Juan Perez"));
        assert_eq!(record.olt, Some(Scalar::Number(3.into())));
        assert_eq!(record.session_active(), Some(&Scalar::Flag(true)));
        assert_eq!(
            record.last_disconnect(),
            Some(&Scalar::from("2024-05-01 10:00:00"))
        );
        assert_eq!(record.onu_status_token(), Some(&Scalar::from("Online")));
        assert_eq!(record.onu_signal_value(), Some(&Scalar::from("-19.5 dBm")));
        assert_eq!(record.requested_username, None);
    }

    #[test]
    fn record_accepts_empty_and_null_payloads() {
        let empty: DiagnosisRecord = serde_json::from_value(json!({})).expect("empty decodes");
        assert_eq!(empty, DiagnosisRecord::default());

        let nulls: DiagnosisRecord = serde_json::from_value(json!({
            "mikrotik": null,
            "onu_status_smrt": { "onu_status": null },
            "plan": null
        }))
        .expect("nulls decode");
        assert_eq!(nulls.session_active(), None);
        assert_eq!(nulls.onu_status_token(), None);
        assert_eq!(nulls.plan, None);
    }

    #[test]
    fn mistyped_fields_are_dropped_individually() {
        let record: DiagnosisRecord = serde_json::from_value(json!({
            "cliente_nombre": "Juan",
            "onu_sn": 12345,
            "nodo_ip": ["10.0.0.1"],
            "plan": { "name": "100 Mbps" },
            "mikrotik": { "active": true, "uptime": { "d": 1 } },
            "onu_status_smrt": "Online",
            "onu_signal_smrt": { "onu_signal": "Warning", "onu_signal_value": [-21.0] }
        }))
        .expect("mistyped fields should not fail the record");

        assert_eq!(record.customer_name.as_deref(), Some("Juan"));
        assert_eq!(record.onu_serial.as_deref(), Some("12345"));
        assert_eq!(record.node_ip, None);
        assert_eq!(record.plan, None);
        assert_eq!(record.session_active(), Some(&Scalar::Flag(true)));
        assert_eq!(record.session_uptime(), None);
        assert_eq!(record.onu_status, None);
        assert_eq!(record.onu_signal_quality(), Some(&Scalar::from("Warning")));
        assert_eq!(record.onu_signal_value(), None);
    }

    #[test]
    fn display_username_falls_back_to_requested() {
        let record = DiagnosisRecord::default().with_requested_username("jperez01");
        assert_eq!(record.display_username(), Some("jperez01"));

        let record = DiagnosisRecord {
            username: Some("jperez01-alt".to_string()),
            ..DiagnosisRecord::default()
        }
        .with_requested_username("jperez01");
        assert_eq!(record.display_username(), Some("jperez01-alt"));

        let record = DiagnosisRecord {
            username: Some("  ".to_string()),
            ..DiagnosisRecord::default()
        }
        .with_requested_username("jperez01");
        assert_eq!(record.display_username(), Some("jperez01"));
    }

    #[test]
    fn scalars_display_booleans_and_numbers() {
        assert_eq!(Scalar::Flag(false).to_string(), "false");
        assert_eq!(Scalar::Number(42.into()).to_string(), "42");
        assert!(Scalar::from("   ").is_blank());
        assert!(!Scalar::Flag(false).is_blank());
    }

    #[test]
    fn target_drops_blank_node_ip() {
        let target = DiagnosisTarget::new("jperez01", Some(" ".to_string()));
        assert_eq!(target.node_ip, None);
    }
}
