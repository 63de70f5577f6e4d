//! # ussd-adaptors
//!
//! Wire-format adaptors for the USSD menu engine.
//!
//! This crate provides:
//! - The [`WireAdaptor`] trait: inbound normalization to a
//!   [`CanonicalRequest`](ussd_core::CanonicalRequest) and outbound encoding
//!   of a [`RenderResult`](ussd_core::RenderResult)
//! - Five gateway profiles: `conend`, `json`, `xmlrpc`, `json_urlencoded`
//!   and `json_snake`
//! - An [`AdaptorRegistry`] keyed by profile name

pub mod conend;
pub mod json;
pub mod registry;
pub mod traits;
pub mod xmlrpc;

pub use conend::ConEndAdaptor;
pub use json::{JsonAdaptor, JsonSnakeAdaptor, JsonUrlencodedAdaptor};
pub use registry::AdaptorRegistry;
pub use traits::{FieldMap, WireAdaptor};
pub use xmlrpc::XmlRpcAdaptor;

/// Remove the Back item from rendered text.
///
/// Used when a session ends: a terminal response never offers a Back
/// control. Blank lines left at the end are dropped as well.
pub fn strip_back_item(text: &str, back_label: &str) -> String {
    if !text.lines().any(|line| line.trim() == back_label) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for line in text.lines().filter(|line| line.trim() != back_label) {
        out.push_str(line);
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}
