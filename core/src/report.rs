//! Field derivation shared by the structured view and the plain-text report.
//!
//! Both outputs go through [`render`], so labels, value derivation and the
//! placeholder policy have a single source of truth.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::diagnosis::{DiagnosisRecord, Scalar, non_blank};
use crate::status::{self, Health, PLACEHOLDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportField {
    Customer,
    Address,
    Plan,
    Node,
    Olt,
    Username,
    Session,
    Uptime,
    LastDisconnect,
    OnuSerial,
    OnuStatus,
    OnuStatusChange,
    OnuSignal,
    OnuSignalValue,
}

/// Standard field order of the diagnosis report.
pub const STANDARD_LAYOUT: [ReportField; 14] = [
    ReportField::Customer,
    ReportField::Address,
    ReportField::Plan,
    ReportField::Node,
    ReportField::Olt,
    ReportField::Username,
    ReportField::Session,
    ReportField::Uptime,
    ReportField::LastDisconnect,
    ReportField::OnuSerial,
    ReportField::OnuStatus,
    ReportField::OnuStatusChange,
    ReportField::OnuSignal,
    ReportField::OnuSignalValue,
];

impl ReportField {
    pub fn key(self) -> &'static str {
        match self {
            ReportField::Customer => "customer",
            ReportField::Address => "address",
            ReportField::Plan => "plan",
            ReportField::Node => "node",
            ReportField::Olt => "olt",
            ReportField::Username => "username",
            ReportField::Session => "session",
            ReportField::Uptime => "uptime",
            ReportField::LastDisconnect => "last-disconnect",
            ReportField::OnuSerial => "onu-serial",
            ReportField::OnuStatus => "onu-status",
            ReportField::OnuStatusChange => "onu-status-change",
            ReportField::OnuSignal => "onu-signal",
            ReportField::OnuSignalValue => "onu-signal-value",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportField::Customer => "Cliente",
            ReportField::Address => "Domicilio",
            ReportField::Plan => "Plan",
            ReportField::Node => "Nodo",
            ReportField::Olt => "OLT",
            ReportField::Username => "PPPoE User",
            ReportField::Session => "Estado PPPoE",
            ReportField::Uptime => "Tiempo activo",
            ReportField::LastDisconnect => "Última conexión",
            ReportField::OnuSerial => "ONU s/n",
            ReportField::OnuStatus => "ONU Estado",
            ReportField::OnuStatusChange => "ONU Último cambio de estado",
            ReportField::OnuSignal => "ONU Señal",
            ReportField::OnuSignalValue => "ONU Señal Detalle",
        }
    }

    /// Display value, never empty: missing data yields the placeholder.
    pub fn value(self, record: &DiagnosisRecord) -> String {
        match self {
            ReportField::Customer => text(record.customer_name.as_deref()),
            ReportField::Address => text(record.address.as_deref()),
            ReportField::Plan => scalar(record.plan.as_ref()),
            ReportField::Node => match non_blank(record.node_name.as_deref()) {
                Some(name) => format!("{name} - {}", text(record.node_ip.as_deref())),
                None => PLACEHOLDER.to_string(),
            },
            ReportField::Olt => scalar(record.olt.as_ref()),
            ReportField::Username => text(record.display_username()),
            ReportField::Session => status::translate(record.session_active()).to_string(),
            ReportField::Uptime => scalar(record.session_uptime()),
            ReportField::LastDisconnect => scalar(record.last_disconnect()),
            ReportField::OnuSerial => text(record.onu_serial.as_deref()),
            ReportField::OnuStatus => status::translate(record.onu_status_token()).to_string(),
            ReportField::OnuStatusChange => scalar(record.onu_status_changed_at()),
            ReportField::OnuSignal => status::translate(record.onu_signal_quality()).to_string(),
            ReportField::OnuSignalValue => scalar(record.onu_signal_value()),
        }
    }

    /// Health class for fields used in coloring; `None` for informational
    /// fields.
    pub fn health(self, record: &DiagnosisRecord) -> Option<Health> {
        match self {
            ReportField::Session => Some(status::connection_health(record.session_active())),
            ReportField::OnuStatus => Some(status::optical_health(record.onu_status_token())),
            _ => None,
        }
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown report field '{0}'")]
pub struct ReportFieldError(pub String);

impl FromStr for ReportField {
    type Err = ReportFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        STANDARD_LAYOUT
            .into_iter()
            .find(|field| field.key() == wanted)
            .ok_or_else(|| ReportFieldError(s.to_string()))
    }
}

/// One rendered field of a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub field: ReportField,
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

pub fn render(record: &DiagnosisRecord, layout: &[ReportField]) -> Vec<ReportLine> {
    layout
        .iter()
        .map(|&field| ReportLine {
            field,
            label: field.label(),
            value: field.value(record),
            health: field.health(record),
        })
        .collect()
}

/// Plain-text export of a diagnosis: one `Label: value` line per field.
pub fn format_report(record: &DiagnosisRecord, layout: &[ReportField]) -> String {
    render(record, layout)
        .into_iter()
        .map(|line| format!("{}: {}\n", line.label, line.value))
        .collect()
}

fn text(value: Option<&str>) -> String {
    non_blank(value).unwrap_or(PLACEHOLDER).to_string()
}

fn scalar(value: Option<&Scalar>) -> String {
    match value {
        Some(v) if !v.is_blank() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}
