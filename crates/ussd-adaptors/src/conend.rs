//! Plain-text profile: `CON `/`END ` prefixed body.

use ussd_core::config::RequestVariables;
use ussd_core::{CanonicalRequest, RawRequest, RenderResult, Result, WireResponse};

use crate::traits::{form_fields, FieldMap, WireAdaptor, TEXT_PLAIN};

/// Form fields named by configuration in, prefixed plain text out.
#[derive(Debug, Default)]
pub struct ConEndAdaptor;

impl WireAdaptor for ConEndAdaptor {
    fn name(&self) -> &str {
        "conend"
    }

    fn normalize(&self, raw: &RawRequest, vars: &RequestVariables) -> Result<CanonicalRequest> {
        FieldMap::from(vars).extract(form_fields(self.name(), raw)?)
    }

    fn encode(&self, result: &RenderResult, _session_id: &str) -> Result<WireResponse> {
        let prefix = if result.continue_session { "CON" } else { "END" };
        Ok(WireResponse {
            body: format!("{} {}", prefix, result.text),
            content_type: TEXT_PLAIN,
        })
    }
}
