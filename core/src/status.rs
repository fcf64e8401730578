//! Normalization of raw backend status vocabularies.
//!
//! Router and OLT integrations report state with their own tokens
//! (`true`, `Power fail`, `Very good`, ...). This module maps that closed
//! vocabulary onto fixed display labels and, for the two fields used for
//! health coloring, an ok/error classification. Everything here is pure.

use serde::Serialize;

use crate::diagnosis::Scalar;

/// Rendered for any missing, blank or unmapped value.
pub const PLACEHOLDER: &str = "—";

/// Known backend status tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusToken {
    Connected,
    Disconnected,
    Online,
    PowerFail,
    LossOfSignal,
    Offline,
    Critical,
    Warning,
    VeryGood,
}

impl StatusToken {
    pub fn parse(raw: &Scalar) -> Option<Self> {
        match raw {
            Scalar::Flag(true) => Some(StatusToken::Connected),
            Scalar::Flag(false) => Some(StatusToken::Disconnected),
            Scalar::Number(_) => None,
            Scalar::Text(text) => match text.as_str() {
                "true" => Some(StatusToken::Connected),
                "false" => Some(StatusToken::Disconnected),
                "Online" => Some(StatusToken::Online),
                "Power fail" => Some(StatusToken::PowerFail),
                "LOS" => Some(StatusToken::LossOfSignal),
                "Offline" => Some(StatusToken::Offline),
                "Critical" => Some(StatusToken::Critical),
                "Warning" => Some(StatusToken::Warning),
                "Very good" => Some(StatusToken::VeryGood),
                _ => None,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusToken::Connected => "Conectado",
            StatusToken::Disconnected => "Desconectado",
            StatusToken::Online => "En línea",
            StatusToken::PowerFail => "Problema de energía",
            StatusToken::LossOfSignal => "Sin señal/sin luz",
            StatusToken::Offline => "Fuera de línea",
            StatusToken::Critical => "Crítico - Luz muy alta",
            StatusToken::Warning => "Advertencia - Luz alta",
            StatusToken::VeryGood => "Muy buena - Luz óptima",
        }
    }
}

/// Binary health class used for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ok,
    Error,
}

/// Display label for a raw token; the placeholder when absent or unmapped.
pub fn translate(raw: Option<&Scalar>) -> &'static str {
    raw.and_then(StatusToken::parse)
        .map(StatusToken::label)
        .unwrap_or(PLACEHOLDER)
}

/// PPPoE session health: ok only for an explicit `true`.
pub fn connection_health(active: Option<&Scalar>) -> Health {
    match active.and_then(StatusToken::parse) {
        Some(StatusToken::Connected) => Health::Ok,
        _ => Health::Error,
    }
}

/// ONU health: ok only for exactly `Online`.
pub fn optical_health(status: Option<&Scalar>) -> Health {
    match status {
        Some(Scalar::Text(text)) if text == "Online" => Health::Ok,
        _ => Health::Error,
    }
}
