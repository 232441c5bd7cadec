use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use std::process;

mod api;
mod config;
mod logging;
mod server;
mod statsd;

#[derive(Parser)]
#[command(name = "summoner-api", about = "Player profile aggregation service")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the profile API and the admin probes
    Serve(ConfigArgs),
    /// Build one profile and print it as JSON
    Lookup {
        #[command(flatten)]
        config: ConfigArgs,
        /// Riot ID, e.g. "Name#TAG"
        riot_id: String,
    },
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, short)]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        CliCommand::Serve(args) => &args.config,
        CliCommand::Lookup { config, .. } => &config.config,
    };
    let config = match Config::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {e}", config_path.display());
            process::exit(1);
        }
    };

    let _sentry = logging::init(&config.logging);

    if let Some(metrics_config) = &config.metrics
        && let Err(e) = statsd::init(metrics_config)
    {
        tracing::error!(error = %e, "Failed to set up metrics");
        process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start the async runtime");
            process::exit(1);
        }
    };

    match cli.command {
        CliCommand::Serve(_) => {
            tracing::info!("Starting summoner-api");
            if let Err(e) = runtime.block_on(server::serve(config)) {
                tracing::error!(error = %e, "Server error");
                process::exit(1);
            }
        }
        CliCommand::Lookup { riot_id, .. } => {
            let profile = match runtime.block_on(server::lookup(&config, &riot_id)) {
                Ok(profile) => profile,
                Err(e) => {
                    eprintln!("{e}");
                    process::exit(2);
                }
            };
            match serde_json::to_string_pretty(&profile) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Could not encode profile: {e}");
                    process::exit(1);
                }
            }
            if profile.is_error() {
                process::exit(3);
            }
        }
    }
}
