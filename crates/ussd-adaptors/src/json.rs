//! JSON profiles.
//!
//! Three gateways speak JSON with different envelopes:
//! - `json`: fields named by configuration, `{response_string, action}` out
//! - `json_urlencoded`: upper-case fields, `{message, action}` with the
//!   message URL-encoded
//! - `json_snake`: snake_case fields, `{session_id, response_string,
//!   continue_session}` out

use serde::Serialize;
use ussd_core::config::RequestVariables;
use ussd_core::{CanonicalRequest, RawRequest, RenderResult, Result, WireResponse};

use crate::traits::{action, form_fields, json_response, FieldMap, WireAdaptor};

#[derive(Serialize)]
struct ActionEnvelope<'a> {
    response_string: &'a str,
    action: &'static str,
}

#[derive(Serialize)]
struct MessageEnvelope {
    message: String,
    action: &'static str,
}

#[derive(Serialize)]
struct SnakeEnvelope<'a> {
    session_id: &'a str,
    response_string: &'a str,
    continue_session: bool,
}

/// Generic JSON envelope.
#[derive(Debug, Default)]
pub struct JsonAdaptor;

impl WireAdaptor for JsonAdaptor {
    fn name(&self) -> &str {
        "json"
    }

    fn normalize(&self, raw: &RawRequest, vars: &RequestVariables) -> Result<CanonicalRequest> {
        FieldMap::from(vars).extract(form_fields(self.name(), raw)?)
    }

    fn encode(&self, result: &RenderResult, _session_id: &str) -> Result<WireResponse> {
        json_response(&ActionEnvelope {
            response_string: &result.text,
            action: action(result.continue_session),
        })
    }
}

/// JSON envelope carrying URL-encoded text.
#[derive(Debug)]
pub struct JsonUrlencodedAdaptor {
    fields: FieldMap,
}

impl Default for JsonUrlencodedAdaptor {
    fn default() -> Self {
        Self {
            fields: FieldMap::new("SESSION_ID", "SERVICE_CODE", "MSISDN", "USSD_STRING"),
        }
    }
}

impl WireAdaptor for JsonUrlencodedAdaptor {
    fn name(&self) -> &str {
        "json_urlencoded"
    }

    fn normalize(&self, raw: &RawRequest, _vars: &RequestVariables) -> Result<CanonicalRequest> {
        self.fields.extract(form_fields(self.name(), raw)?)
    }

    fn encode(&self, result: &RenderResult, _session_id: &str) -> Result<WireResponse> {
        json_response(&MessageEnvelope {
            message: urlencoding::encode(&result.text).into_owned(),
            action: action(result.continue_session),
        })
    }
}

/// JSON envelope with snake_case field names.
#[derive(Debug)]
pub struct JsonSnakeAdaptor {
    fields: FieldMap,
}

impl Default for JsonSnakeAdaptor {
    fn default() -> Self {
        Self {
            fields: FieldMap::new("session_id", "service_code", "msisdn", "ussd_string"),
        }
    }
}

impl WireAdaptor for JsonSnakeAdaptor {
    fn name(&self) -> &str {
        "json_snake"
    }

    fn normalize(&self, raw: &RawRequest, _vars: &RequestVariables) -> Result<CanonicalRequest> {
        self.fields.extract(form_fields(self.name(), raw)?)
    }

    fn encode(&self, result: &RenderResult, session_id: &str) -> Result<WireResponse> {
        json_response(&SnakeEnvelope {
            session_id,
            response_string: &result.text,
            continue_session: result.continue_session,
        })
    }
}
