// Module declarations
mod audit;
mod cli;
mod config;
mod fallback;
mod gate;
mod oracle;
mod profiles;
mod resolver;
mod services;
mod store;
mod tool_args;
mod tool_defs;
mod tool_exec;
mod types;

// Re-export module items at the crate root so cross-module references
// stay short.
#[allow(unused_imports)]
pub(crate) use audit::*;
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use config::*;
#[allow(unused_imports)]
pub(crate) use fallback::*;
#[allow(unused_imports)]
pub(crate) use gate::*;
#[allow(unused_imports)]
pub(crate) use oracle::*;
#[allow(unused_imports)]
pub(crate) use profiles::*;
#[allow(unused_imports)]
pub(crate) use resolver::*;
#[allow(unused_imports)]
pub(crate) use services::*;
#[allow(unused_imports)]
pub(crate) use store::*;
#[allow(unused_imports)]
pub(crate) use tool_args::*;
#[allow(unused_imports)]
pub(crate) use tool_defs::*;
#[allow(unused_imports)]
pub(crate) use tool_exec::*;
#[allow(unused_imports)]
pub(crate) use types::*;

use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            bind,
            port,
            voiceprints,
            log_dir,
            gate_mode,
            fallback_mode,
        } => {
            let serve =
                ServeConfig::resolve(bind, port, voiceprints, log_dir, gate_mode, fallback_mode)?;
            let oracle = OracleConfig::from_env()?;
            run_server(serve, oracle)
        }

        Command::Tools => {
            let catalog = tool_definitions_json();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(())
        }

        Command::Ride { dropoff } => {
            println!("{}", ride_deep_link(&dropoff));
            Ok(())
        }
    }
}
