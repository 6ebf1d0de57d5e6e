use anyhow::Result;
use clap::Parser;

use logmap_cli::cli::Cli;
use logmap_cli::commands;
use logmap_cli::error::CliError;
use logmap_cli::logging::init_tracing;
use logmap_cli::output::OutputWriter;
use logmap_core::config::LogmapConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 설정 파일이 없으면 기본값 + 환경변수
    let config = match &cli.config {
        Some(path) => LogmapConfig::load(path).await,
        None => LogmapConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => exit_with(CliError::from(e)),
    };

    init_tracing(&config.general, cli.log_level.as_deref())?;

    tracing::info!(
        config = %cli.config.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
        "logmap starting"
    );

    let writer = OutputWriter::new(cli.output);
    if let Err(e) = commands::execute(cli.command, &config, &writer).await {
        tracing::error!(error = %e, "command failed");
        exit_with(e);
    }

    Ok(())
}

fn exit_with(err: CliError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(err.exit_code());
}
