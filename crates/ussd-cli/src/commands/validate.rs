//! Configuration and menu validation.

use std::path::Path;

use ussd_adaptors::AdaptorRegistry;
use ussd_core::config::IssueSeverity;
use ussd_core::{Config, MenuTree};
use ussd_handlers::HandlerRegistry;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let mut failed = false;

    println!("Configuration:");
    let result = config.validate();
    if result.issues.is_empty() {
        println!("  ✓ No issues");
    }
    for issue in &result.issues {
        let mark = match issue.severity {
            IssueSeverity::Error => {
                failed = true;
                "✗"
            }
            IssueSeverity::Warning => "!",
        };
        println!("  {} {}: {}", mark, issue.field, issue.message);
    }

    let adaptors = AdaptorRegistry::with_defaults();
    let adaptor = config.output.adaptor_name();
    if adaptors.contains(adaptor) {
        println!("  ✓ Adaptor '{}'", adaptor);
    } else {
        failed = true;
        println!(
            "  ✗ Unsupported adaptor '{}' (available: {})",
            adaptor,
            adaptors.list().join(", ")
        );
    }

    println!("\nMenu {:?}:", config.general.menu_file);
    match MenuTree::load(&config.general.menu_file) {
        Ok(tree) => {
            if tree.get(&config.general.default_menu).is_some() {
                println!("  ✓ Default menu '{}'", config.general.default_menu);
            } else {
                failed = true;
                println!("  ✗ Default menu '{}' is not defined", config.general.default_menu);
            }

            let handlers = HandlerRegistry::with_demo_handlers();
            let funcs = tree.execute_funcs();
            println!("\nHandlers:");
            for name in &funcs {
                let status = if config.handlers.disabled_func.contains(*name) {
                    "- disabled"
                } else if handlers.contains(name) {
                    "✓ registered"
                } else {
                    if config.handlers.strict {
                        failed = true;
                    }
                    "✗ not registered"
                };
                println!("  {} {}", status, name);
            }
        }
        Err(e) => {
            failed = true;
            println!("  ✗ {}", e);
        }
    }

    if failed {
        anyhow::bail!("Validation failed");
    }
    println!("\nAll checks passed");
    Ok(())
}
