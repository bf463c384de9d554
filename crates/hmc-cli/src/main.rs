//! HMC - management operator for Kubernetes platform components

use clap::{Parser, Subcommand};
use hmc_core::TemplateKind;
use std::net::SocketAddr;
use std::path::PathBuf;

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

use error::Result;

#[derive(Parser)]
#[command(name = "hmc")]
#[command(version)]
#[command(about = "Converge HMC Management objects and guard template deletion", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Operator configuration file
    #[arg(long, global = true, env = "HMC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Management controller
    Controller,

    /// Serve the template admission webhook
    ///
    /// Serves plain HTTP only. The API server calls admission webhooks over
    /// HTTPS, so put a TLS terminator (a sidecar proxy or a service mesh)
    /// in front of the listen address before registering the webhook.
    Webhook {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:9443")]
        listen: SocketAddr,
    },

    /// Run a single convergence pass for a Management
    Reconcile {
        /// Management name
        #[arg(default_value = "hmc")]
        name: String,

        /// Management namespace (defaults to the system namespace)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Check whether a template can be deleted
    CanDelete {
        /// Template kind: cluster, service or provider
        #[arg(short, long)]
        kind: TemplateKind,

        /// Template name
        name: String,
    },

    /// Print the effective operator configuration
    Config {
        /// Output as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = commands::config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Controller => commands::controller::run(config).await,
        Commands::Webhook { listen } => commands::webhook::run(&config, listen).await,
        Commands::Reconcile { name, namespace } => {
            commands::reconcile::run(config, namespace.as_deref(), &name).await
        }
        Commands::CanDelete { kind, name } => {
            commands::can_delete::run(&config, kind, &name).await
        }
        Commands::Config { json } => commands::config::run(&config, json),
    }
}
