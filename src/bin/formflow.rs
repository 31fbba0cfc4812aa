use clap::{Parser, Subcommand};
use formflow::backend::FormBackend;
use formflow::backend::http::HttpFormBackend;
use formflow::backend::poll::ExecutionPoller;
use formflow::config::{EngineConfig, load_config_from_yaml};
use formflow::convert::converter::{to_external, to_internal};
use formflow::dependency::graph::find_cycle;
use formflow::form::controller::FormController;
use formflow::schema::loader::{load_form_data, load_schema};
use formflow::store::{ValueStore, value_store_from_config};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use anyhow::{Result, Context as AnyhowContext};
use serde_json::Value;
use tracing::{info, warn, error};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the configuration file
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate form values against a schema file
    Validate {
        /// Schema file (`fields` + `dependencies`)
        #[arg(long, short)]
        schema: PathBuf,

        /// Values file (JSON or YAML object)
        #[arg(long, short)]
        data: Option<PathBuf>,

        /// Inline values (key=value), applied after the values file
        #[arg(long, short = 'D', value_parser = parse_key_val)]
        vars: Vec<(String, Value)>,
    },

    /// Convert a form definition between the external and internal formats
    Convert {
        /// Input file
        #[arg(long, short)]
        file: PathBuf,

        /// Treat the input as internal and emit the external format
        #[arg(long)]
        to_external: bool,

        /// Write the result here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Check a schema's dependency map for cycles
    CheckDeps {
        #[arg(long, short)]
        schema: PathBuf,
    },

    /// Fetch a node's form from the backend and print it
    Fetch {
        #[arg(long, short)]
        node: String,
    },

    /// Show (or clear) the values saved for a node
    Saved {
        #[arg(long, short)]
        node: String,

        /// Delete the saved values instead of printing them
        #[arg(long)]
        clear: bool,
    },

    /// Poll an execution until it finishes
    Watch {
        #[arg(long, short)]
        execution: String,
    },
}

fn parse_key_val(s: &str) -> Result<(String, Value), String> {
    let pos = s.find('=').ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    let key = s[..pos].to_string();
    let val_str = &s[pos + 1..];
    // Try parsing as JSON, otherwise treat as string
    let val = serde_json::from_str(val_str).unwrap_or_else(|_| Value::String(val_str.to_string()));
    Ok((key, val))
}

fn load_engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_yaml(path)?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &cli.backend {
        config.backend_url = url.clone();
    }
    Ok(config)
}

fn print_json(value: &impl serde::Serialize, output: Option<&PathBuf>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", text),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = load_engine_config(&cli)?;

    match cli.command {
        Commands::Validate { schema, data, vars } => {
            let schema = load_schema(&schema)?;
            let mut values = match data {
                Some(path) => load_form_data(&path)?,
                None => Default::default(),
            };
            values.extend(vars);

            let mut controller = FormController::new(schema.fields, values);
            if controller.validate_form() {
                info!("Form is valid");
                return Ok(ExitCode::SUCCESS);
            }
            for err in controller.errors() {
                println!("{}: {}", err.field, err.message);
            }
            return Ok(ExitCode::FAILURE);
        }

        Commands::Convert { file, to_external: emit_external, output } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let raw: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            if emit_external {
                let internal = serde_json::from_value(raw)
                    .with_context(|| format!("{} is not an internal form configuration", file.display()))?;
                print_json(&to_external(&internal), output.as_ref())?;
            } else {
                match to_internal(&raw) {
                    Ok(internal) => print_json(&internal, output.as_ref())?,
                    Err(e) => {
                        error!(error = %e, "Invalid Form Configuration");
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }

        Commands::CheckDeps { schema } => {
            let schema = load_schema(&schema)?;
            if let Some(cycle) = find_cycle(&schema.dependencies) {
                warn!("Dependency cycle: {}", cycle.join(" -> "));
                return Ok(ExitCode::FAILURE);
            }
            info!("No dependency cycles");
        }

        Commands::Fetch { node } => {
            let backend = HttpFormBackend::from_config(&config)?;
            match backend.fetch_form_schema(&node).await {
                Ok(schema) => print_json(&schema, None)?,
                Err(e) => {
                    error!(node_id = %node, error = %e, "Failed to load form");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Commands::Saved { node, clear } => {
            let store = value_store_from_config(&config)?;
            if clear {
                store.clear(&node).await?;
                info!(node_id = %node, "Saved values cleared");
            } else {
                match store.load(&node).await? {
                    Some(values) => print_json(&values, None)?,
                    None => info!(node_id = %node, "No saved values"),
                }
            }
        }

        Commands::Watch { execution } => {
            let backend: Arc<dyn FormBackend> = Arc::new(HttpFormBackend::from_config(&config)?);
            let poller = ExecutionPoller::new(backend, config.poll_interval());
            let handle = poller.start(&execution, |status| {
                info!(status = ?status.status, "Execution status");
            });

            tokio::select! {
                finished = handle.wait() => match finished {
                    Ok(Some(status)) => print_json(&status, None)?,
                    Ok(None) => {}
                    Err(e) => {
                        error!(execution_id = %execution, error = %e, "Stopped watching execution");
                        return Ok(ExitCode::FAILURE);
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted; polling cancelled");
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
