//! XML-RPC profile.
//!
//! Inbound requests are `methodCall` documents whose struct carries the
//! members `msisdn`, `shortcode` and `session`. The shortcode is the whole
//! dialled string, e.g. `*384*12*1*2#`: the first two segments form the
//! service code (`*384*12`) and the rest is the request string (`1*2`).
//!
//! Responses are `methodCall` documents named `USSD.CONT` or `USSD.END`.

use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use ussd_core::config::RequestVariables;
use ussd_core::{CanonicalRequest, Error, RawRequest, RenderResult, Result, WireResponse};

use crate::traits::{WireAdaptor, TEXT_XML};

const METHOD_CONTINUE: &str = "USSD.CONT";
const METHOD_END: &str = "USSD.END";

fn malformed(e: impl std::fmt::Display) -> Error {
    Error::MalformedRequest(format!("invalid XML-RPC payload: {}", e))
}

/// Collect `<member><name>..</name><value>..</value></member>` pairs.
///
/// Values may be bare text or wrapped in a type element such as `<string>`.
fn struct_members(body: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut members = HashMap::new();
    let mut in_name = false;
    let mut pending: Option<String> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) if e.name().as_ref() == b"name" => in_name = true,
            Event::End(e) if e.name().as_ref() == b"name" => in_name = false,
            Event::End(e) if e.name().as_ref() == b"member" => pending = None,
            Event::Text(t) => {
                let text = t.unescape().map_err(malformed)?.into_owned();
                if in_name {
                    pending = Some(text);
                } else if let Some(name) = pending.take() {
                    members.insert(name, text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(members)
}

/// Split a dialled shortcode into service code and request string.
pub fn split_shortcode(shortcode: &str) -> (String, String) {
    let trimmed = shortcode.trim().trim_end_matches('#');
    let segments: Vec<&str> = trimmed.split('*').collect();

    let service_code: String = segments
        .iter()
        .skip(1)
        .take(2)
        .map(|s| format!("*{}", s))
        .collect();
    let request_string = if segments.len() >= 4 {
        segments[3..].join("*")
    } else {
        String::new()
    };

    (service_code, request_string)
}

struct XmlWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| Error::MalformedRequest(format!("failed to write XML: {}", e)))
    }

    fn start(&mut self, tag: &str) -> Result<()> {
        self.write(Event::Start(BytesStart::new(tag)))
    }

    fn end(&mut self, tag: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(tag)))
    }

    fn element(&mut self, tag: &str, text: &str) -> Result<()> {
        self.start(tag)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(tag)
    }

    fn member(&mut self, name: &str, value: &str) -> Result<()> {
        self.start("member")?;
        self.element("name", name)?;
        self.start("value")?;
        self.element("string", value)?;
        self.end("value")?;
        self.end("member")
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.inner.into_inner().into_inner())
            .map_err(|e| Error::MalformedRequest(format!("non UTF-8 XML output: {}", e)))
    }
}

/// XML-RPC gateway profile.
#[derive(Debug, Default)]
pub struct XmlRpcAdaptor;

impl WireAdaptor for XmlRpcAdaptor {
    fn name(&self) -> &str {
        "xmlrpc"
    }

    fn normalize(&self, raw: &RawRequest, _vars: &RequestVariables) -> Result<CanonicalRequest> {
        let body = match raw {
            RawRequest::Xml(body) => body,
            RawRequest::Form(_) => {
                return Err(Error::MalformedRequest(
                    "adaptor 'xmlrpc' expects an XML body".to_string(),
                ))
            }
        };

        let mut members = struct_members(body)?;
        let mut take = |name: &str| {
            members
                .remove(name)
                .ok_or_else(|| Error::MalformedRequest(format!("missing member '{}'", name)))
        };

        let phone_number = take("msisdn")?;
        let shortcode = take("shortcode")?;
        let session_id = take("session")?;
        let (service_code, request_string) = split_shortcode(&shortcode);

        tracing::debug!(session_id = %session_id, %shortcode, "Parsed XML-RPC request");

        Ok(CanonicalRequest {
            session_id,
            service_code,
            phone_number,
            request_string,
        })
    }

    fn encode(&self, result: &RenderResult, session_id: &str) -> Result<WireResponse> {
        let method = if result.continue_session {
            METHOD_CONTINUE
        } else {
            METHOD_END
        };

        let mut xml = XmlWriter::new();
        xml.write(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        xml.start("methodCall")?;
        xml.element("methodName", method)?;
        xml.start("params")?;
        xml.start("param")?;
        xml.start("value")?;
        xml.start("struct")?;
        xml.member("session", session_id)?;
        if result.continue_session {
            xml.member("text", &result.text)?;
        }
        xml.end("struct")?;
        xml.end("value")?;
        xml.end("param")?;
        xml.end("params")?;
        xml.end("methodCall")?;

        Ok(WireResponse {
            body: xml.finish()?,
            content_type: TEXT_XML,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"<?xml version="1.0"?>
<methodCall>
  <methodName>USSD.BEGIN</methodName>
  <params>
    <param>
      <value>
        <struct>
          <member><name>msisdn</name><value><string>+254700000000</string></value></member>
          <member><name>shortcode</name><value><string>*384*12*1*2#</string></value></member>
          <member><name>session</name><value>abc-123</value></member>
        </struct>
      </value>
    </param>
  </params>
</methodCall>"#;

    #[test]
    fn test_split_shortcode() {
        assert_eq!(
            split_shortcode("*384*12*1*2#"),
            ("*384*12".to_string(), "1*2".to_string())
        );
        assert_eq!(
            split_shortcode("*384*12#"),
            ("*384*12".to_string(), String::new())
        );
        assert_eq!(split_shortcode("*384#"), ("*384".to_string(), String::new()));
    }

    #[test]
    fn test_normalize() {
        let req = XmlRpcAdaptor
            .normalize(&RawRequest::Xml(REQUEST.into()), &RequestVariables::default())
            .unwrap();
        assert_eq!(req.session_id, "abc-123");
        assert_eq!(req.phone_number, "+254700000000");
        assert_eq!(req.service_code, "*384*12");
        assert_eq!(req.request_string, "1*2");
    }

    #[test]
    fn test_missing_member() {
        let body = "<methodCall><params><param><value><struct>\
                    <member><name>msisdn</name><value>1</value></member>\
                    </struct></value></param></params></methodCall>";
        let err = XmlRpcAdaptor
            .normalize(&RawRequest::Xml(body.into()), &RequestVariables::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(ref m) if m.contains("shortcode")));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let err = XmlRpcAdaptor
            .normalize(
                &RawRequest::Xml("<methodCall><params></methodCall>".into()),
                &RequestVariables::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn test_form_payload_is_malformed() {
        let err = XmlRpcAdaptor
            .normalize(&RawRequest::form([("session", "a")]), &RequestVariables::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn test_encode_continue_includes_text() {
        let response = XmlRpcAdaptor
            .encode(&RenderResult::con("Menu\n1. A & B\n"), "abc")
            .unwrap();
        assert_eq!(response.content_type, "text/xml");
        assert!(response.body.starts_with("<?xml"));
        assert!(response.body.contains("<methodName>USSD.CONT</methodName>"));
        assert!(response.body.contains("<name>session</name><value><string>abc</string></value>"));
        assert!(response.body.contains("<name>text</name>"));
        assert!(response.body.contains("1. A &amp; B"));
    }

    #[test]
    fn test_encode_end_omits_text() {
        let response = XmlRpcAdaptor
            .encode(&RenderResult::end("Goodbye\n"), "abc")
            .unwrap();
        assert!(response.body.contains("<methodName>USSD.END</methodName>"));
        assert!(response.body.contains("<name>session</name>"));
        assert!(!response.body.contains("<name>text</name>"));
        assert!(!response.body.contains("Goodbye"));
    }
}
