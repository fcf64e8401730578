use serde::{Deserialize, Serialize};

use crate::diagnosis::DiagnosisTarget;

/// A lightweight search hit. Many candidates may come back for one query;
/// the operator (or auto-selection) picks exactly one to diagnose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Connection (PPPoE) username. Unique within one result set, except
    /// when the same username is bound to several nodes.
    #[serde(rename = "pppoe")]
    pub username: String,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "origen", default)]
    pub origin: Origin,
    /// Node the username is bound to. Distinguishes otherwise identical
    /// usernames living on different nodes.
    #[serde(rename = "nodo_ip", default, skip_serializing_if = "Option::is_none")]
    pub node_ip: Option<String>,
}

impl Candidate {
    /// Diagnosis request for this candidate, node IP included when known.
    pub fn target(&self) -> DiagnosisTarget {
        DiagnosisTarget::new(self.username.clone(), self.node_ip.clone())
    }
}

/// Source system a candidate was found in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Origin {
    /// Billing / customer registry (ISPCube).
    Billing,
    /// Router (MikroTik) session tables.
    Router,
    /// Optical line management (SmartOLT).
    Optical,
    /// Tag not known to this client; kept verbatim.
    Other(String),
    #[default]
    Unknown,
}

impl Origin {
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Billing => "ispcube",
            Origin::Router => "mikrotik",
            Origin::Optical => "smartolt",
            Origin::Other(tag) => tag,
            Origin::Unknown => "",
        }
    }

    /// Billing hits are customers; everything else came from network gear.
    pub fn is_billing(&self) -> bool {
        matches!(self, Origin::Billing)
    }

    pub fn label(&self) -> &'static str {
        if self.is_billing() { "Cliente" } else { "Técnico" }
    }
}

impl From<String> for Origin {
    fn from(tag: String) -> Self {
        match tag.trim() {
            "ispcube" => Origin::Billing,
            "mikrotik" => Origin::Router,
            "smartolt" => Origin::Optical,
            "" => Origin::Unknown,
            _ => Origin::Other(tag),
        }
    }
}

impl From<Option<String>> for Origin {
    fn from(tag: Option<String>) -> Self {
        tag.map(Origin::from).unwrap_or_default()
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.as_str().to_string()
    }
}
