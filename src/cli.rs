use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the preview HTTP daemon.
    Daemon {
        /// Bind address, overrides the config file
        #[clap(long)]
        bind: Option<String>,
    },

    /// Fetch one URL and print its metadata record as JSON.
    Preview {
        /// The page to unfurl
        url: String,

        /// Fetch timeout in milliseconds (clamped server-side)
        #[clap(long)]
        timeout: Option<u64>,

        /// Include excerpt, headings and framework signals
        #[clap(long, default_value = "false")]
        extended: bool,
    },
}
