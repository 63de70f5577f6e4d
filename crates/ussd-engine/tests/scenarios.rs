//! End-to-end request scenarios against an in-memory session store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ussd_core::{CanonicalRequest, Config, Environment, Error, MenuTree, RawRequest, RenderResult};
use ussd_engine::UssdEngine;
use ussd_handlers::{HandlerRegistry, HandlerReply};
use ussd_session::{KeyValueStore, MemoryStore, SqliteStore, StoreError};

const MENU: &str = r#"{
    "default_menu": {
        "menu_title": "Welcome",
        "display": "1. Balance|2. Products|3. Feedback|4. Register|5. Exit",
        "options": {
            "1": { "display": "_EXECUTE_", "execute_func": "balance" },
            "2": {
                "menu_title": "Products",
                "display": "A|B|C|D|E",
                "items_displayed": 2,
                "options": {
                    "1": { "display": "Product A details" }
                }
            },
            "3": {
                "display": "_EXECUTE_",
                "execute_func": "feedback",
                "options": { "uses_same_method": true }
            },
            "4": {
                "menu_title": "Register",
                "display": "1. Start",
                "options": {
                    "1": { "display": "_EXECUTE_", "execute_func": "register" }
                }
            },
            "5": { "display": "Goodbye" }
        }
    }
}"#;

const ROOT_TEXT: &str = "Welcome\n1. Balance\n2. Products\n3. Feedback\n4. Register\n5. Exit\n";

struct Harness {
    engine: UssdEngine,
    kv: Arc<MemoryStore>,
    register_calls: Arc<AtomicUsize>,
}

impl Harness {
    async fn push(&self, session_id: &str, input: &str) -> RenderResult {
        self.engine
            .push(CanonicalRequest::new(session_id, "*384#", "+254700000000", input))
            .await
    }
}

fn handlers(register_calls: Arc<AtomicUsize>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register_fn("balance", |call| {
        Ok(HandlerReply::new(format!(
            "Balance for {}|KES 100",
            call.context.phone_number
        )))
    });
    registry.register_fn("feedback", |call| {
        let reply = match call.last_input() {
            _ if call.pattern.len() == 1 => HandlerReply::new("Tell us what you think"),
            Some("done") => HandlerReply::end("Thanks for your feedback"),
            Some(text) => HandlerReply::new(format!("Noted: {}", text)),
            None => HandlerReply::new(""),
        };
        Ok(reply)
    });
    registry.register_fn("register", move |_| {
        register_calls.fetch_add(1, Ordering::SeqCst);
        Ok("Registered".into())
    });
    registry
}

fn harness_with(config: Config) -> Harness {
    let kv = Arc::new(MemoryStore::new());
    let register_calls = Arc::new(AtomicUsize::new(0));
    let engine = UssdEngine::new(
        config,
        MenuTree::from_json_str(MENU).unwrap(),
        handlers(register_calls.clone()),
        kv.clone(),
    )
    .unwrap();
    Harness {
        engine,
        kv,
        register_calls,
    }
}

fn harness() -> Harness {
    harness_with(Config::default())
}

#[tokio::test]
async fn test_first_request_shows_default_menu_without_back() {
    let h = harness();
    let result = h.push("s1", "").await;
    assert_eq!(result, RenderResult::con(ROOT_TEXT));
    assert!(!result.text.contains("Back"));
}

#[tokio::test]
async fn test_back_restores_parent_menu() {
    let h = harness();
    h.push("s1", "").await;

    let products = h.push("s1", "2").await;
    assert!(products.continue_session);
    assert_eq!(products.text, "Products\nA\nB\n0. Next\n00. Back\n");

    let back = h.push("s1", "2*00").await;
    assert_eq!(back, RenderResult::con(ROOT_TEXT));

    let stored = h.engine.store().load("s1").await.unwrap().unwrap();
    assert!(stored.pattern.is_empty());
}

#[tokio::test]
async fn test_pagination_walks_pages() {
    let h = harness();
    h.push("s1", "").await;
    h.push("s1", "2").await;

    let page2 = h.push("s1", "2*0").await;
    assert_eq!(page2.text, "Products\nC\nD\n0. Next\n00. Back\n");

    let page3 = h.push("s1", "2*0*0").await;
    assert_eq!(page3.text, "Products\nE\n00. Back\n");

    // Paging never changes the pattern, so "1" still selects under Products.
    let details = h.push("s1", "2*0*0*1").await;
    assert_eq!(details, RenderResult::end("Product A details\n"));
}

#[tokio::test]
async fn test_terminal_execute_node_ends_session_without_back() {
    let h = harness();
    h.push("s1", "").await;

    let result = h.push("s1", "1").await;
    assert_eq!(
        result,
        RenderResult::end("Balance for 254700000000\nKES 100\n")
    );
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn test_phone_number_kept_when_sanitization_disabled() {
    let mut config = Config::default();
    config.general.sanitize_phone_number = false;
    let h = harness_with(config);

    let result = h.push("s1", "1").await;
    assert!(result.text.starts_with("Balance for +254700000000"));
}

#[tokio::test]
async fn test_terminal_display_node() {
    let h = harness();
    let result = h.push("s1", "5").await;
    assert_eq!(result, RenderResult::end("Goodbye\n"));
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn test_disabled_handler_is_not_invoked() {
    let mut config = Config::default();
    config.handlers.disabled_func.insert("register".to_string());
    let h = harness_with(config);

    h.push("s1", "").await;
    let register = h.push("s1", "4").await;
    assert_eq!(register.text, "Register\n1. Start\n00. Back\n");

    let result = h.push("s1", "4*1").await;
    assert_eq!(
        result,
        RenderResult::end("Service is not available at the moment.")
    );
    assert_eq!(h.register_calls.load(Ordering::SeqCst), 0);
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn test_enabled_handler_is_invoked_once() {
    let h = harness();
    let result = h.push("s1", "4").await;
    assert_eq!(result, RenderResult::con("Register\n1. Start\n00. Back\n"));

    let result = h.push("s1", "4*1").await;
    assert!(!result.continue_session);
    assert_eq!(h.register_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_option_ends_session() {
    let h = harness();
    h.push("s1", "").await;

    let result = h.push("s1", "9").await;
    assert_eq!(result, RenderResult::end("Unknown Option"));
    assert!(h.kv.is_empty());

    // A fresh session starts over at the default menu.
    assert_eq!(h.push("s1", "").await, RenderResult::con(ROOT_TEXT));
}

#[tokio::test]
async fn test_sticky_branch_routes_across_requests() {
    let h = harness();
    h.push("s1", "").await;

    let prompt = h.push("s1", "3").await;
    assert_eq!(prompt, RenderResult::con("Tell us what you think\n00. Back\n"));

    let noted = h.push("s1", "3*great").await;
    assert_eq!(noted, RenderResult::con("Noted: great\n00. Back\n"));

    let noted = h.push("s1", "3*great*fast service").await;
    assert_eq!(noted.text, "Noted: fast service\n00. Back\n");

    let done = h.push("s1", "3*great*fast service*done").await;
    assert_eq!(done, RenderResult::end("Thanks for your feedback\n"));
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn test_sessions_do_not_share_sticky_state() {
    let h = harness();
    h.push("a", "3").await;

    let result = h.push("b", "hello").await;
    assert_eq!(result, RenderResult::end("Unknown Option"));

    let result = h.push("a", "3*hello").await;
    assert_eq!(result.text, "Noted: hello\n00. Back\n");
}

#[tokio::test]
async fn test_plain_input_format() {
    let mut config = Config::default();
    config.input.input_format = "plain".to_string();
    let h = harness_with(config);

    h.push("s1", "2").await;
    let page2 = h.push("s1", "0").await;
    assert_eq!(page2.text, "Products\nC\nD\n0. Next\n00. Back\n");
    let back = h.push("s1", "00").await;
    assert_eq!(back.text, ROOT_TEXT);
}

#[tokio::test]
async fn test_navigation_disabled() {
    let mut config = Config::default();
    config.navigation.enabled = false;
    let h = harness_with(config);

    let products = h.push("s1", "2").await;
    assert_eq!(products.text, "Products\nA\nB\n");

    // "00" is an ordinary token with no matching option.
    let result = h.push("s1", "2*00").await;
    assert_eq!(result, RenderResult::end("Unknown Option"));
}

#[tokio::test]
async fn test_legacy_options_fallback_renders_empty_response() {
    let mut config = Config::default();
    config.general.legacy_options_fallback = true;
    let h = harness_with(config);

    h.push("s1", "2").await;
    let result = h.push("s1", "2*7").await;
    assert_eq!(result, RenderResult::end("Empty Response\n"));
    assert!(h.kv.is_empty());
}

struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

fn failing_engine(environment: Environment) -> UssdEngine {
    let mut config = Config::default();
    config.general.environment = environment;
    UssdEngine::new(
        config,
        MenuTree::from_json_str(MENU).unwrap(),
        handlers(Arc::new(AtomicUsize::new(0))),
        Arc::new(FailingStore),
    )
    .unwrap()
}

#[tokio::test]
async fn test_store_failure_renders_generic_error_in_production() {
    let engine = failing_engine(Environment::Production);
    let result = engine
        .push(CanonicalRequest::new("s1", "*384#", "254700000000", "1"))
        .await;
    assert_eq!(
        result,
        RenderResult::end("Error Occurred\nSomething went wrong. Please try again later\n")
    );
}

#[tokio::test]
async fn test_store_failure_surfaces_detail_in_development() {
    let engine = failing_engine(Environment::Development);
    let result = engine
        .push(CanonicalRequest::new("s1", "*384#", "254700000000", "1"))
        .await;
    assert!(!result.continue_session);
    assert!(result.text.starts_with("Error Occurred\n"));
    assert!(result.text.contains("connection refused"));
}

#[tokio::test]
async fn test_handler_failure_is_internal_error() {
    let mut registry = handlers(Arc::new(AtomicUsize::new(0)));
    registry.register_fn("balance", |_| Err(anyhow::anyhow!("ledger offline")));
    let kv = Arc::new(MemoryStore::new());
    let engine = UssdEngine::new(
        Config::default(),
        MenuTree::from_json_str(MENU).unwrap(),
        registry,
        kv.clone(),
    )
    .unwrap();

    let result = engine
        .push(CanonicalRequest::new("s1", "*384#", "254700000000", "1"))
        .await;
    assert_eq!(
        result,
        RenderResult::end("Error Occurred\nSomething went wrong. Please try again later\n")
    );
    assert!(kv.is_empty());
}

#[test]
fn test_strict_mode_rejects_unregistered_handlers() {
    let err = UssdEngine::new(
        Config::default(),
        MenuTree::from_json_str(MENU).unwrap(),
        HandlerRegistry::new(),
        Arc::new(MemoryStore::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::ConfigInvalid(ref m) if m.contains("balance")));
}

#[tokio::test]
async fn test_strict_mode_accepts_disabled_unregistered_handler() {
    let mut registry = HandlerRegistry::new();
    registry.register_fn("balance", |_| Ok("KES 100".into()));
    registry.register_fn("feedback", |_| Ok("Tell us what you think".into()));
    let mut config = Config::default();
    config.handlers.disabled_func.insert("register".to_string());
    let kv = Arc::new(MemoryStore::new());
    let engine = UssdEngine::new(
        config,
        MenuTree::from_json_str(MENU).unwrap(),
        registry,
        kv.clone(),
    )
    .unwrap();

    let push = |input: &str| {
        engine.push(CanonicalRequest::new("s1", "*384#", "254700000000", input))
    };
    push("").await;
    push("4").await;
    assert_eq!(
        push("4*1").await,
        RenderResult::end("Service is not available at the moment.")
    );
    assert!(kv.is_empty());
}

#[tokio::test]
async fn test_lenient_mode_reports_missing_handler_at_runtime() {
    let mut config = Config::default();
    config.handlers.strict = false;
    let engine = UssdEngine::new(
        config,
        MenuTree::from_json_str(MENU).unwrap(),
        HandlerRegistry::new(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let result = engine
        .push(CanonicalRequest::new("s1", "*384#", "254700000000", "1"))
        .await;
    assert_eq!(result, RenderResult::end("Service is not defined."));
}

#[test]
fn test_missing_default_menu_is_fatal() {
    let mut config = Config::default();
    config.general.default_menu = "main".to_string();
    let err = UssdEngine::new(
        config,
        MenuTree::from_json_str(MENU).unwrap(),
        handlers(Arc::new(AtomicUsize::new(0))),
        Arc::new(MemoryStore::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::MenuLoad(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_unknown_adaptor_is_rejected() {
    let mut config = Config::default();
    config.output.adaptor = Some("soap".to_string());
    let err = UssdEngine::new(
        config,
        MenuTree::from_json_str(MENU).unwrap(),
        handlers(Arc::new(AtomicUsize::new(0))),
        Arc::new(MemoryStore::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::UnsupportedAdaptor(ref name) if name == "soap"));
}

#[tokio::test]
async fn test_conend_wire_response() {
    let h = harness();
    let raw = RawRequest::form([
        ("sessionId", "s1"),
        ("serviceCode", "*384#"),
        ("phoneNumber", "+254700000000"),
        ("text", ""),
    ]);
    let response = h.engine.handle(&raw).await.unwrap();
    assert_eq!(response.content_type, "text/plain");
    assert_eq!(response.body, format!("CON {}", ROOT_TEXT));
}

#[tokio::test]
async fn test_empty_handler_reply_renders_blank_line() {
    let mut registry = handlers(Arc::new(AtomicUsize::new(0)));
    registry.register_fn("balance", |_| Ok(HandlerReply::end("")));
    let engine = UssdEngine::new(
        Config::default(),
        MenuTree::from_json_str(MENU).unwrap(),
        registry,
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let raw = RawRequest::form([
        ("sessionId", "s1"),
        ("serviceCode", "*384#"),
        ("phoneNumber", "+254700000000"),
        ("text", "1"),
    ]);
    let response = engine.handle(&raw).await.unwrap();
    assert_eq!(response.body, "END \n");
}

#[tokio::test]
async fn test_json_wire_response() {
    let mut config = Config::default();
    config.output.output_format = ussd_core::OutputFormat::Json;
    let h = harness_with(config);

    let raw = RawRequest::form([
        ("sessionId", "s1"),
        ("serviceCode", "*384#"),
        ("phoneNumber", "254700000000"),
        ("text", "5"),
    ]);
    let response = h.engine.handle(&raw).await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["response_string"], "Goodbye\n");
    assert_eq!(body["action"], "end");
}

fn xmlrpc_request(session: &str, shortcode: &str) -> RawRequest {
    RawRequest::Xml(format!(
        "<?xml version=\"1.0\"?><methodCall><methodName>USSD.BEGIN</methodName><params><param><value><struct>\
         <member><name>msisdn</name><value><string>254700000000</string></value></member>\
         <member><name>shortcode</name><value><string>{}</string></value></member>\
         <member><name>session</name><value><string>{}</string></value></member>\
         </struct></value></param></params></methodCall>",
        shortcode, session
    ))
}

#[tokio::test]
async fn test_xmlrpc_end_to_end() {
    let mut config = Config::default();
    config.output.adaptor = Some("xmlrpc".to_string());
    let h = harness_with(config);
    assert_eq!(h.engine.adaptor_name(), "xmlrpc");

    let response = h.engine.handle(&xmlrpc_request("x1", "*384*12#")).await.unwrap();
    assert_eq!(response.content_type, "text/xml");
    assert!(response.body.contains("<methodName>USSD.CONT</methodName>"));
    assert!(response.body.contains("Welcome"));
    assert!(response.body.contains("<string>x1</string>"));

    let response = h
        .engine
        .handle(&xmlrpc_request("x1", "*384*12*1#"))
        .await
        .unwrap();
    assert!(response.body.contains("<methodName>USSD.END</methodName>"));
    assert!(!response.body.contains("<name>text</name>"));
    assert!(h.kv.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_is_rejected() {
    let h = harness();
    let err = h
        .engine
        .handle(&RawRequest::Xml("<methodCall/>".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedRequest(_)));
}

#[tokio::test]
async fn test_sqlite_sessions_survive_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    let build = || {
        UssdEngine::new(
            Config::default(),
            MenuTree::from_json_str(MENU).unwrap(),
            handlers(Arc::new(AtomicUsize::new(0))),
            Arc::new(SqliteStore::open(&path).unwrap()),
        )
        .unwrap()
    };

    let first = build();
    first
        .push(CanonicalRequest::new("s1", "*384#", "254700000000", "2"))
        .await;
    drop(first);

    let second = build();
    let result = second
        .push(CanonicalRequest::new("s1", "*384#", "254700000000", "2*0"))
        .await;
    assert_eq!(result.text, "Products\nC\nD\n0. Next\n00. Back\n");
}
