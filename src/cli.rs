use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voxgate")]
#[command(about = "Voice-command gateway: biometric gate, intent resolution, tool dispatch", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the HTTP listener (enroll + voice-command endpoints).
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Listener port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Directory holding enrolled voice samples
        #[arg(long, default_value = "voiceprints")]
        voiceprints: PathBuf,
        /// Directory for the command audit log
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
        /// Biometric gate mode: strict | demo (overrides VOXGATE_GATE_MODE)
        #[arg(long)]
        gate_mode: Option<String>,
        /// Fallback mode: passive | canned-email (overrides VOXGATE_FALLBACK_MODE)
        #[arg(long)]
        fallback_mode: Option<String>,
    },

    /// Print the tool catalog as JSON.
    Tools,

    /// Build an Uber deep link for a dropoff address (no network).
    Ride { dropoff: String },
}
