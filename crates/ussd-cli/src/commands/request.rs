//! One-shot request through the configured store and adaptor.

use ussd_core::{CanonicalRequest, Config};

use super::build_engine;

pub async fn run(
    config: Config,
    session_id: &str,
    input: &str,
    phone: &str,
    service_code: &str,
) -> anyhow::Result<()> {
    let kv = ussd_session::open_backend(&config.session)?;
    let engine = build_engine(config, kv)?;

    let result = engine
        .push(CanonicalRequest::new(session_id, service_code, phone, input))
        .await;
    let response = engine.encode(&result, session_id)?;

    println!("Content-Type: {}", response.content_type);
    println!();
    println!("{}", response.body);
    Ok(())
}
