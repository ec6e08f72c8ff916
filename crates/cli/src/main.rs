mod cli;
mod repl;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use thea_core::config::{load_dotenv, Config};
use thea_core::{ApplicationContext, PatientRef};
use thea_intent::lifecycle::{Connectivity, StaticConnectivity};
use thea_intent::{IntentCatalogue, IntentRecognizer, ModelLifecycle};

use crate::cli::CliArgs;
use crate::repl::{Command, HELP};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    load_dotenv();
    let config = match args.profile.as_deref() {
        Some(profile) => {
            let known = Config::available_profiles()
                .iter()
                .any(|p| p.eq_ignore_ascii_case(profile));
            if !known {
                warn!(profile = %profile, "no environment keys found for profile, using defaults");
            }
            Config::for_profile(profile)
        }
        None => Config::from_env(),
    };
    config.log_summary();
    config.validate().context("invalid configuration")?;

    let catalogue = match args.catalogue.as_deref() {
        Some(path) => IntentCatalogue::from_path(path)
            .with_context(|| format!("failed to load intent catalogue {}", path.display()))?,
        None => IntentCatalogue::bundled().context("bundled intent catalogue is invalid")?,
    };

    let connectivity: Arc<dyn Connectivity> = Arc::new(StaticConnectivity::new(!args.offline));
    let lifecycle = Arc::new(ModelLifecycle::from_config(
        &config,
        Arc::new(catalogue),
        connectivity,
    ));
    lifecycle.on_status(|status| {
        if let Err(e) = Terminal::new().print_status(status) {
            error!(error = %e, "failed to print model status");
        }
    });

    let recognizer = IntentRecognizer::new(lifecycle.clone());

    let mut context = ApplicationContext::new(args.view).with_debug(args.debug);
    if let Some(id) = &args.patient {
        context = context.with_patient(PatientRef::new(id));
    }
    if let Some(id) = &args.record {
        context = context.with_record(id);
    }

    if args.debug {
        lifecycle.load(true).await;
    }

    if let Some(text) = &args.text {
        let result = recognizer
            .recognize(text, &context)
            .await
            .context("intent recognition failed")?;
        terminal.print_result(&result)?;
        return Ok(());
    }

    terminal.print_banner(config.profile_label(), &config.embedding.provider)?;

    loop {
        let input = match terminal.read_input(&context)? {
            Some(text) => text,
            None => {
                terminal.print_info("Goodbye.")?;
                break;
            }
        };

        if input.is_empty() {
            continue;
        }

        let command = match Command::parse(&input) {
            Ok(command) => command,
            Err(msg) => {
                terminal.print_error(&msg)?;
                continue;
            }
        };

        match command {
            Command::Recognize(text) => match recognizer.recognize(&text, &context).await {
                Ok(result) => terminal.print_result(&result)?,
                Err(e) => {
                    error!(error = %e, "recognition failed");
                    terminal.print_error(&format!("{:#}", e))?;
                }
            },
            Command::View(view) => {
                context.current_view = view;
                info!(view = %view, "view changed");
            }
            Command::Patient(id) => {
                context.current_patient = id.map(PatientRef::new);
            }
            Command::Record(id) => {
                context.current_record_id = id;
            }
            Command::Reload { debug } => {
                context.debug_mode = debug;
                if !lifecycle.reload(debug).await {
                    terminal.print_error(&lifecycle.status().message())?;
                }
            }
            Command::Unload => {
                lifecycle.unload().await;
            }
            Command::Status => {
                terminal.print_status(&lifecycle.status())?;
                terminal.print_info(&format!(
                    "loaded: {} | debug: {} | source: {}",
                    lifecycle.is_loaded(),
                    lifecycle.debug_enabled(),
                    lifecycle.source_name()
                ))?;
            }
            Command::Config => {
                terminal.print_info(&serde_json::to_string_pretty(&config.redacted_summary())?)?;
            }
            Command::Help => terminal.print_info(HELP)?,
            Command::Quit => {
                terminal.print_info("Goodbye.")?;
                break;
            }
        }
    }

    lifecycle.clear_status_callback();
    lifecycle.unload().await;
    Ok(())
}
