//! Canonical request and response shapes shared by every adaptor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inbound payload as received from a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRequest {
    /// Flat form or JSON fields
    Form(HashMap<String, String>),
    /// XML document body
    Xml(String),
}

impl RawRequest {
    /// Build a form payload from key/value pairs.
    pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        RawRequest::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Normalized request, independent of the upstream gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub session_id: String,
    pub service_code: String,
    pub phone_number: String,
    pub request_string: String,
}

impl CanonicalRequest {
    pub fn new(
        session_id: impl Into<String>,
        service_code: impl Into<String>,
        phone_number: impl Into<String>,
        request_string: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            service_code: service_code.into(),
            phone_number: phone_number.into(),
            request_string: request_string.into(),
        }
    }

    /// Remove every `+` from the phone number.
    pub fn sanitize_phone_number(&mut self) {
        self.phone_number = self.phone_number.replace('+', "");
    }

    /// Context record handed to handlers.
    pub fn context(&self) -> SessionContext {
        SessionContext {
            session_id: self.session_id.clone(),
            service_code: self.service_code.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

/// Trailing context record passed to handlers with the pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub service_code: String,
    pub phone_number: String,
}

/// Canonical output before wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    pub text: String,
    /// Whether the session stays open awaiting input
    pub continue_session: bool,
}

impl RenderResult {
    /// Response that keeps the session open.
    pub fn con(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continue_session: true,
        }
    }

    /// Response that ends the session.
    pub fn end(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continue_session: false,
        }
    }
}

/// Encoded response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub body: String,
    pub content_type: &'static str,
}
