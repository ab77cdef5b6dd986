//! CLI entrypoint for cadmate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use cadmate_application::{AgentManager, CadGateway, PipelineProgress};
use cadmate_domain::agent::AgentMode;
use cadmate_infrastructure::{
    ConfigLoader, JsonlExecutionLogger, MemoryCad, ToolRegistry, build_capability_catalog,
    build_provider, build_selector, register_builtin_tools,
};
use cadmate_presentation::{
    AgentRepl, Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress,
};
use clap::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        show_config_paths();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };

    // Initialize logging: verbosity flags win over the configured level
    let filter = match cli.verbose {
        0 => EnvFilter::new(config.logging.level.clone()),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Bad values degrade behavior instead of aborting startup
    for issue in config.validate() {
        warn!("config: {}", issue);
    }

    info!("Starting cadmate");

    // === Dependency Injection ===
    let cad: Arc<dyn CadGateway> = Arc::new(MemoryCad::new("Unnamed"));

    let catalog = build_capability_catalog()?;
    let selector = build_selector(&catalog)?;
    let mut registry = ToolRegistry::new(Some(Arc::clone(&cad)));
    let registered = register_builtin_tools(&mut registry, Arc::clone(&cad));
    info!(tools = registered, "tool registry ready");

    let provider = config.provider.kind().and_then(|kind| {
        match config.provider.api_key_for(kind) {
            Some(key) => Some(build_provider(
                kind,
                Some(key),
                config.provider.model.clone(),
            )),
            None => {
                warn!(provider = %kind, "no API key configured; AI provider disabled");
                None
            }
        }
    });

    if cli.test_connection {
        let Some(provider) = &provider else {
            bail!("no AI provider configured; set [provider] in the config file");
        };
        println!("Testing {} ({})...", provider.name(), provider.model());
        if provider.test_connection().await {
            println!("Connection OK.");
            return Ok(());
        }
        bail!("connection failed");
    }

    // One-shot runs get plain text progress, the REPL gets a progress bar
    let progress: Option<Arc<dyn PipelineProgress>> = if cli.quiet {
        None
    } else if cli.instruction.is_some() {
        Some(Arc::new(SimpleProgress))
    } else {
        Some(Arc::new(ProgressReporter::new()))
    };

    let mut builder = AgentManager::builder()
        .with_settings(config.agent.clone())
        .with_registry(catalog)
        .with_selector(selector)
        .with_tools(Arc::new(registry))
        .with_cad(Arc::clone(&cad));
    if let Some(provider) = provider {
        builder = builder.with_provider(provider);
    }
    if let Some(progress) = progress {
        builder = builder.with_progress(progress);
    }
    let mut manager = builder.build();

    // Execution log subscriber, when configured
    if let Some(path) = &config.logging.execution_log {
        if let Some(logger) = JsonlExecutionLogger::new(path) {
            info!(path = %logger.path().display(), "execution log enabled");
            let mut events = manager.subscribe();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => logger.log(&event),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    match cli.mode.as_str() {
        "agent" => manager.set_mode(AgentMode::Agent),
        "chat" => {}
        other => warn!("unknown mode '{}', staying in chat mode", other),
    }

    // Single instruction mode
    if let Some(instruction) = &cli.instruction {
        let response = manager.process_message(instruction, HashMap::new()).await;
        let output = match cli.output {
            OutputFormat::Full => ConsoleFormatter::format(&response),
            OutputFormat::Json => ConsoleFormatter::format_json(&response),
        };
        println!("{}", output);
        return Ok(());
    }

    // Interactive mode
    let mut repl = AgentRepl::new(manager, Some(cad));
    repl.run().await?;

    Ok(())
}

fn show_config_paths() {
    match ConfigLoader::global_config_path() {
        Some(path) => println!("Global config:  {}", path.display()),
        None => println!("Global config:  (unavailable)"),
    }
    match ConfigLoader::project_config_path() {
        Some(path) => println!("Project config: {}", path.display()),
        None => println!("Project config: (none found)"),
    }
}
