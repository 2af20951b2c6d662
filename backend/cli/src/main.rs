mod config;
mod demo;
mod hints;
mod repl;
mod sim_widget;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use paramsync_browser::classify;
use paramsync_config::{seed_config, SeedOutcome};
use paramsync_core::{DeviceKind, FormState, SessionCounters};
use tracing::info;

use config::Runtime;
use terminal_output::{note_success, note_warn};

#[derive(Parser)]
#[command(name = "paramsync")]
#[command(about = "paramsync - session parameter sequencer for an embedded chat widget")]
#[command(version)]
struct Cli {
    /// Path to config.yaml (defaults to $PARAMSYNC_CONFIG_DIR or ~/.paramsync)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file of high-entropy client hints to use instead of UA parsing
    #[arg(long, global = true)]
    client_hints: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.yaml (refuses to overwrite without --force)
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Classify a User-Agent string into browser, OS, and device fields
    Classify {
        user_agent: String,
    },
    /// Print the parameter payload that would be pushed, without a widget
    Preview {
        #[command(flatten)]
        form: FormArgs,
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Run a scripted session against a simulated widget
    Demo {
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Drive a simulated widget interactively
    Repl {
        /// Keep the session counter in memory instead of the state file
        #[arg(long)]
        fresh: bool,
        #[arg(long)]
        user_agent: Option<String>,
    },
}

/// Form overrides layered on top of the configured form.
#[derive(Args, Default)]
struct FormArgs {
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    country_code: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    user_tier: Option<String>,
    #[arg(long)]
    debug: bool,
    /// desktop, mobile, or tablet (detected when omitted)
    #[arg(long)]
    device: Option<DeviceKind>,
    #[arg(long)]
    omit_region: bool,
}

impl FormArgs {
    fn apply(self, form: &mut FormState) {
        if let Some(v) = self.language {
            form.language = v;
        }
        if let Some(v) = self.region {
            form.region = v;
        }
        if let Some(v) = self.country_code {
            form.country_code = v;
        }
        if let Some(v) = self.user_id {
            form.user_id = v;
        }
        if let Some(v) = self.email {
            form.email = v;
        }
        if let Some(v) = self.user_tier {
            form.user_tier = v;
        }
        if self.device.is_some() {
            form.device = self.device;
        }
        form.debug_mode |= self.debug;
        form.omit_region |= self.omit_region;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = Runtime::load(cli.config, cli.client_hints).await?;

    let _log_guard = paramsync_logging::init_logger(runtime.log_dir(), &runtime.config.logging.level);
    info!(config = %runtime.location.file.display(), "paramsync starting");

    match cli.command {
        Commands::Init { force } => {
            let path = &runtime.location.file;
            match seed_config(path, force).await? {
                SeedOutcome::Written => note_success(&format!("Wrote {}", path.display())),
                SeedOutcome::Kept => {
                    note_warn(&format!("{} already exists (use --force)", path.display()))
                }
            }
        }
        Commands::Classify { user_agent } => {
            let env = classify(&user_agent);
            println!("{}", serde_json::to_string_pretty(&env)?);
        }
        Commands::Preview { form: overrides, user_agent } => {
            let mut form = runtime.config.form.clone();
            overrides.apply(&mut form);
            let page = runtime.page(user_agent);
            let env = runtime.probe(&page.user_agent).detect().await;
            let counters = SessionCounters { session_count: 1, message_count: 0 };
            let params = paramsync_sequencer::build(&form, &page, &env, counters);
            println!("{}", params.render_preview());
        }
        Commands::Demo { user_agent } => demo::run(&runtime, user_agent).await?,
        Commands::Repl { fresh, user_agent } => repl::run(&runtime, user_agent, fresh).await?,
    }

    Ok(())
}
