use clap::Parser;

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod preview;
mod url_policy;
mod web;

use config::Config;
use preview::PreviewOpts;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = Config::load();

    match args.command {
        cli::Command::Daemon { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            web::start_daemon(config);
        }

        cli::Command::Preview {
            url,
            timeout,
            extended,
        } => {
            let opts = PreviewOpts {
                timeout_ms: timeout,
                extended,
            };

            match preview::fetch_preview(&url, &opts, &config) {
                Ok(record) => {
                    println!("{}", serde_json::to_string_pretty(&record).unwrap());
                }
                Err(err) => {
                    let body = serde_json::json!({
                        "success": false,
                        "error": err.label(),
                        "message": err.to_string(),
                    });
                    eprintln!("{}", serde_json::to_string_pretty(&body).unwrap());
                    std::process::exit(1);
                }
            }
        }
    }
}
