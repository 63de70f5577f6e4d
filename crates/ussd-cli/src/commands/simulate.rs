//! Interactive handset simulator.

use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use ussd_core::{CanonicalRequest, Config, RenderResult};
use ussd_engine::UssdEngine;
use ussd_session::MemoryStore;

use super::build_engine;

/// Request string a handset sends after `inputs`.
///
/// In chained mode the gateway repeats every earlier input, joined by `*`.
pub fn request_string(inputs: &[String], chained: bool) -> String {
    if chained {
        inputs.join("*")
    } else {
        inputs.last().cloned().unwrap_or_default()
    }
}

struct Handset<'a> {
    engine: &'a UssdEngine,
    service_code: &'a str,
    phone: &'a str,
    session_id: String,
    inputs: Vec<String>,
}

impl<'a> Handset<'a> {
    fn new(engine: &'a UssdEngine, service_code: &'a str, phone: &'a str) -> Self {
        Self {
            engine,
            service_code,
            phone,
            session_id: String::new(),
            inputs: Vec::new(),
        }
    }

    async fn dial(&mut self) -> RenderResult {
        self.session_id = uuid::Uuid::new_v4().to_string();
        self.inputs.clear();
        self.send().await
    }

    async fn reply(&mut self, input: &str) -> RenderResult {
        self.inputs.push(input.to_string());
        self.send().await
    }

    async fn send(&self) -> RenderResult {
        let chained = self.engine.config().chained_input();
        let request = CanonicalRequest::new(
            &self.session_id,
            self.service_code,
            self.phone,
            request_string(&self.inputs, chained),
        );
        self.engine.push(request).await
    }
}

fn show(result: &RenderResult) {
    println!();
    print!("{}", result.text);
    if !result.text.ends_with('\n') {
        println!();
    }
    if !result.continue_session {
        println!("[session ended]");
    }
}

/// Run the interactive simulator.
pub async fn run(config: Config, service_code: &str, phone: &str) -> anyhow::Result<()> {
    let engine = build_engine(config, Arc::new(MemoryStore::new()))?;
    let mut handset = Handset::new(&engine, service_code, phone);

    println!("Dialling {} as {} (Ctrl-D to quit)", service_code, phone);
    show(&handset.dial().await);

    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = editor.add_history_entry(line);

                let result = handset.reply(line).await;
                show(&result);

                if !result.continue_session {
                    println!("\nDialling {} again", service_code);
                    show(&handset.dial().await);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
