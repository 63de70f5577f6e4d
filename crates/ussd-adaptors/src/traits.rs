//! Adaptor trait shared by every gateway profile.

use std::collections::HashMap;

use ussd_core::config::RequestVariables;
use ussd_core::{CanonicalRequest, Error, RawRequest, RenderResult, Result, WireResponse};

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_XML: &str = "text/xml";

/// A named wire-format profile for one upstream gateway.
pub trait WireAdaptor: Send + Sync {
    /// Profile name used in configuration.
    fn name(&self) -> &str;

    /// Map an inbound payload to the canonical request.
    ///
    /// `vars` names the fields of the default inbound shape; profiles with
    /// a fixed shape ignore it.
    fn normalize(&self, raw: &RawRequest, vars: &RequestVariables) -> Result<CanonicalRequest>;

    /// Encode a rendered response for the gateway.
    fn encode(&self, result: &RenderResult, session_id: &str) -> Result<WireResponse>;
}

/// Inbound field names for a flat form or JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub session_id: String,
    pub service_code: String,
    pub phone_number: String,
    pub request_string: String,
}

impl FieldMap {
    pub fn new(
        session_id: &str,
        service_code: &str,
        phone_number: &str,
        request_string: &str,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            service_code: service_code.to_string(),
            phone_number: phone_number.to_string(),
            request_string: request_string.to_string(),
        }
    }

    /// Extract the canonical request from form fields.
    ///
    /// The request string may be absent (first request of a session); every
    /// other mapped field is required.
    pub fn extract(&self, fields: &HashMap<String, String>) -> Result<CanonicalRequest> {
        let required = |name: &str| {
            fields
                .get(name)
                .cloned()
                .ok_or_else(|| Error::MalformedRequest(format!("missing field '{}'", name)))
        };

        Ok(CanonicalRequest {
            session_id: required(&self.session_id)?,
            service_code: required(&self.service_code)?,
            phone_number: required(&self.phone_number)?,
            request_string: fields.get(&self.request_string).cloned().unwrap_or_default(),
        })
    }
}

impl From<&RequestVariables> for FieldMap {
    fn from(vars: &RequestVariables) -> Self {
        Self::new(
            &vars.session_id,
            &vars.service_code,
            &vars.phone_number,
            &vars.request_string,
        )
    }
}

/// Borrow the fields of a form payload.
pub fn form_fields<'a>(adaptor: &str, raw: &'a RawRequest) -> Result<&'a HashMap<String, String>> {
    match raw {
        RawRequest::Form(fields) => Ok(fields),
        RawRequest::Xml(_) => Err(Error::MalformedRequest(format!(
            "adaptor '{}' expects form fields, got an XML body",
            adaptor
        ))),
    }
}

/// Serialize a JSON envelope.
pub fn json_response<T: serde::Serialize>(envelope: &T) -> Result<WireResponse> {
    Ok(WireResponse {
        body: serde_json::to_string(envelope)?,
        content_type: APPLICATION_JSON,
    })
}

/// `action` value of the JSON envelopes.
pub fn action(continue_session: bool) -> &'static str {
    if continue_session {
        "request"
    } else {
        "end"
    }
}
