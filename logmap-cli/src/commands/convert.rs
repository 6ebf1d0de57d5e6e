//! `logmap convert` command handler

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value;
use tracing::{info, warn};

use logmap_core::config::LogmapConfig;
use logmap_logsource::{
    LogsourceConverter, LogsourceError, MappingLoader, RuleLoader, build_out_path,
};

use crate::cli::ConvertArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `convert` command.
pub async fn execute(
    args: ConvertArgs,
    config: &LogmapConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = run(args, config).await?;
    writer.render(&report)?;
    Ok(())
}

/// Convert the whole Sigma tree and return the run report.
///
/// Rule-level failures are recorded in the report and skipped. Mapping and
/// I/O failures abort the run.
pub async fn run(args: ConvertArgs, config: &LogmapConfig) -> Result<ConvertReport, CliError> {
    let sigma_dir = args
        .sigma_dir
        .unwrap_or_else(|| PathBuf::from(&config.convert.sigma_dir));
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| PathBuf::from(&config.convert.out_dir));

    let converter = MappingLoader::load(&config.mapping)
        .await?
        .into_converter(config.mapping.excluded_categories.iter().cloned());

    info!(
        sigma_dir = %sigma_dir.display(),
        out_dir = %out_dir.display(),
        dry_run = args.dry_run,
        "converting sigma rules"
    );

    let files = RuleLoader::collect_rule_files(&sigma_dir).await?;
    let mut report = ConvertReport {
        sigma_dir: sigma_dir.display().to_string(),
        out_dir: out_dir.display().to_string(),
        dry_run: args.dry_run,
        total: files.len(),
        converted: 0,
        written: 0,
        skipped: Vec::new(),
        outputs: Vec::new(),
    };

    // 출력 경로 -> 그 경로를 차지한 규칙 파일
    let mut claimed: BTreeMap<PathBuf, &Path> = BTreeMap::new();

    for path in &files {
        let outputs = match prepare(&converter, &sigma_dir, &out_dir, path).await {
            Ok(outputs) => outputs,
            Err(e) if e.is_rule_level() => {
                warn!(path = %path.display(), error = %e, "skipping rule");
                report.skipped.push(SkippedRule {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if let Some((out_path, owner)) = outputs
            .iter()
            .find_map(|(out, _)| claimed.get(out).map(|owner| (out, *owner)))
        {
            warn!(
                path = %path.display(),
                out_path = %out_path.display(),
                owner = %owner.display(),
                "output path already used by another rule, skipping"
            );
            report.skipped.push(SkippedRule {
                file: path.display().to_string(),
                reason: format!(
                    "output path {} collides with {}",
                    out_path.display(),
                    owner.display()
                ),
            });
            continue;
        }

        for (out_path, document) in outputs {
            claimed.insert(out_path.clone(), path.as_path());
            if !args.dry_run {
                write_document(&out_path, &document).await?;
                report.written += 1;
            }
            report.outputs.push(out_path.display().to_string());
        }
        report.converted += 1;
    }

    info!(
        total = report.total,
        converted = report.converted,
        written = report.written,
        skipped = report.skipped.len(),
        "conversion finished"
    );

    Ok(report)
}

/// Load and convert one rule file, pairing each document with its output path.
async fn prepare(
    converter: &LogsourceConverter,
    sigma_dir: &Path,
    out_dir: &Path,
    path: &Path,
) -> Result<Vec<(PathBuf, Value)>, LogsourceError> {
    let rule = RuleLoader::load_file(path).await?;

    converter
        .convert_rule(&rule)?
        .into_iter()
        .map(|converted| {
            let out_path = build_out_path(sigma_dir, out_dir, path, converted.is_sysmon)?;
            Ok((out_path, converted.document))
        })
        .collect()
}

async fn write_document(path: &Path, document: &Value) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_yaml::to_string(document)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ConvertReport {
    pub sigma_dir: String,
    pub out_dir: String,
    pub dry_run: bool,
    pub total: usize,
    pub converted: usize,
    pub written: usize,
    pub skipped: Vec<SkippedRule>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SkippedRule {
    pub file: String,
    pub reason: String,
}

impl Render for ConvertReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Sigma Conversion: {} -> {}", self.sigma_dir.bold(), self.out_dir.bold())?;
        if self.dry_run {
            writeln!(w, "  {}", "dry run: no files written".yellow())?;
        }
        writeln!(
            w,
            "  Rules: {} total, {} converted, {} skipped",
            self.total,
            self.converted.to_string().green(),
            self.skipped.len().to_string().yellow()
        )?;
        writeln!(w, "  Files written: {}", self.written)?;

        if !self.skipped.is_empty() {
            writeln!(w)?;
            writeln!(w, "Skipped:")?;
            for s in &self.skipped {
                writeln!(w, "  {} {}", "-".yellow(), s.file)?;
                writeln!(w, "    {}", s.reason)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ConvertReport {
        ConvertReport {
            sigma_dir: "sigma/rules/windows".to_owned(),
            out_dir: "hayabusa_rules".to_owned(),
            dry_run: false,
            total: 3,
            converted: 2,
            written: 3,
            skipped: vec![SkippedRule {
                file: "file_rename/rule.yml".to_owned(),
                reason: "unsupported category: file_rename".to_owned(),
            }],
            outputs: Vec::new(),
        }
    }

    #[test]
    fn test_render_text_lists_skipped_rules() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report().render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("utf-8");

        assert!(output.contains("3 total, 2 converted, 1 skipped"));
        assert!(output.contains("Files written: 3"));
        assert!(output.contains("file_rename/rule.yml"));
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(report()).expect("serialize");
        assert_eq!(json["converted"].as_u64(), Some(2));
        assert_eq!(json["skipped"][0]["file"].as_str(), Some("file_rename/rule.yml"));
    }
}
