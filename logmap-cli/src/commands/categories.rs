//! `logmap categories` command handler

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use logmap_core::config::LogmapConfig;
use logmap_logsource::{ChannelEvent, MappingLoader, Mappings};

use crate::cli::CategoriesArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `categories` command.
pub async fn execute(
    args: CategoriesArgs,
    config: &LogmapConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mappings = MappingLoader::load(&config.mapping).await?;
    let report = build_report(&mappings, &config.mapping.excluded_categories, args.name.as_deref())?;
    writer.render(&report)?;
    Ok(())
}

/// Build the report for every merged key, or for `name` only.
pub fn build_report(
    mappings: &Mappings,
    excluded: &[String],
    name: Option<&str>,
) -> Result<CategoryReport, CliError> {
    let entry = |name: &str, pairs: &std::collections::BTreeSet<ChannelEvent>| CategoryEntry {
        name: name.to_owned(),
        excluded: excluded.iter().any(|e| e == name),
        sources: pairs.iter().cloned().collect(),
        renames: mappings.fields.get(name).cloned(),
    };

    let categories = match name {
        Some(name) => {
            let pairs = mappings.categories.get(name).ok_or_else(|| {
                CliError::Command(format!("unknown category or service: {name}"))
            })?;
            vec![entry(name, pairs)]
        }
        None => mappings
            .categories
            .iter()
            .map(|(name, pairs)| entry(name, pairs))
            .collect(),
    };

    Ok(CategoryReport {
        total: categories.len(),
        categories,
    })
}

#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub total: usize,
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub name: String,
    pub excluded: bool,
    pub sources: Vec<ChannelEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renames: Option<BTreeMap<String, String>>,
}

impl Render for CategoryReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Categories ({} total)", self.total.to_string().bold())?;

        for c in &self.categories {
            writeln!(w)?;
            if c.excluded {
                writeln!(w, "{} {}", c.name.bold(), "(excluded)".yellow())?;
            } else {
                writeln!(w, "{}", c.name.bold())?;
            }
            for source in &c.sources {
                writeln!(w, "  {source}")?;
            }
            if let Some(renames) = &c.renames {
                for (from, to) in renames {
                    writeln!(w, "  {} {from} -> {to}", "field".cyan())?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logmap_logsource::{CategoryMap, ConfigDocument, FieldMap};

    fn mappings() -> Mappings {
        let mut categories = CategoryMap::default();
        categories.insert("process_creation", ChannelEvent::new("Security", Some(4688)));
        categories.insert(
            "process_creation",
            ChannelEvent::new("Microsoft-Windows-Sysmon/Operational", Some(1)),
        );
        categories.insert("ps_module", ChannelEvent::new("Windows PowerShell", None));

        let doc = ConfigDocument::from_yaml(
            "process_creation:\n  service: security\n  fields:\n    Image: NewProcessName\n",
            "audit.yaml",
        )
        .expect("valid document");

        Mappings {
            categories,
            fields: FieldMap::build(&doc),
            ..Mappings::default()
        }
    }

    #[test]
    fn test_report_all_categories() {
        let report = build_report(&mappings(), &["ps_module".to_owned()], None).expect("report");
        assert_eq!(report.total, 2);
        let ps = report
            .categories
            .iter()
            .find(|c| c.name == "ps_module")
            .expect("ps_module entry");
        assert!(ps.excluded);
    }

    #[test]
    fn test_report_single_category_with_renames() {
        let report = build_report(&mappings(), &[], Some("process_creation")).expect("report");
        assert_eq!(report.total, 1);
        assert_eq!(report.categories[0].sources.len(), 2);
        assert!(report.categories[0].renames.is_some());
    }

    #[test]
    fn test_report_unknown_name_fails() {
        let err = build_report(&mappings(), &[], Some("file_rename")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_render_text() {
        colored::control::set_override(false);
        let report = build_report(&mappings(), &[], Some("process_creation")).expect("report");
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("utf-8");

        assert!(output.contains("Security (EventID 4688)"));
        assert!(output.contains("Image -> NewProcessName"));
    }
}
