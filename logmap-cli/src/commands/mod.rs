//! Command handlers -- one module per subcommand

pub mod categories;
pub mod convert;

use logmap_core::config::LogmapConfig;

use crate::cli::Commands;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Dispatch a parsed subcommand to its handler.
pub async fn execute(
    command: Commands,
    config: &LogmapConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match command {
        Commands::Convert(args) => convert::execute(args, config, writer).await,
        Commands::Categories(args) => categories::execute(args, config, writer).await,
    }
}
