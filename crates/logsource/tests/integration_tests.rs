//! 통합 테스트 -- 저장소의 기본 매핑 문서로 전체 변환 흐름 검증

use std::path::PathBuf;

use serde_yaml::Value;

use logmap_core::config::MappingConfig;
use logmap_logsource::{
    CategoryMap, ConfigDocument, FieldMap, LogSource, LogsourceConverter, LogsourceError,
    MappingLoader, RuleLoader, RuleLogsource, SYSMON_CHANNEL, ServiceMap, build_condition,
    build_out_path,
};

const SERVICES_YAML: &str = include_str!("../../../config/windows-services.yaml");
const SYSMON_YAML: &str = include_str!("../../../config/sysmon.yaml");
const AUDIT_YAML: &str = include_str!("../../../config/windows-audit.yaml");

fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

fn services() -> ServiceMap {
    let doc = ConfigDocument::from_yaml(SERVICES_YAML, "windows-services.yaml").unwrap();
    ServiceMap::build(&doc, "windows-services.yaml").unwrap()
}

fn merged() -> CategoryMap {
    let services = services();
    let sysmon = ConfigDocument::from_yaml(SYSMON_YAML, "sysmon.yaml").unwrap();
    let audit = ConfigDocument::from_yaml(AUDIT_YAML, "windows-audit.yaml").unwrap();
    let maps = [
        CategoryMap::build(&sysmon, &services, "sysmon.yaml").unwrap(),
        CategoryMap::build(&audit, &services, "windows-audit.yaml").unwrap(),
    ];
    CategoryMap::merge(&services, &maps)
}

fn converter() -> LogsourceConverter {
    let audit = ConfigDocument::from_yaml(AUDIT_YAML, "windows-audit.yaml").unwrap();
    LogsourceConverter::new(merged(), FieldMap::build(&audit), Vec::new())
}

#[test]
fn service_document_has_every_service() {
    let services = services();
    assert_eq!(services.len(), 36);
    assert_eq!(services.channel("sysmon"), Some(SYSMON_CHANNEL));
    assert_eq!(services.channel("security"), Some("Security"));
}

#[test]
fn merged_map_covers_services_and_categories() {
    let merged = merged();
    assert_eq!(merged.len(), 66);
    assert_eq!(merged.get("process_creation").unwrap().len(), 2);
    assert!(merged.contains("sysmon"));
    assert!(!merged.contains("file_rename"));
}

#[test]
fn process_creation_resolves_to_sysmon_and_security() {
    let sources = converter()
        .resolve(&RuleLogsource::category("process_creation"))
        .unwrap();
    assert_eq!(sources.len(), 2);
    assert!(sources.contains(&LogSource::new(
        "process_creation",
        "",
        SYSMON_CHANNEL,
        Some(1)
    )));
    assert!(sources.contains(&LogSource::new(
        "process_creation",
        "",
        "Security",
        Some(4688)
    )));
}

#[test]
fn sysmon_service_resolves_to_sysmon_channel() {
    let sources = converter()
        .resolve(&RuleLogsource::service("sysmon"))
        .unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].service, "sysmon");
    assert!(sources[0].is_sysmon());

    let block = sources[0].detection_block();
    assert_eq!(block.get("Channel"), Some(&Value::from(SYSMON_CHANNEL)));
}

#[test]
fn file_rename_is_unsupported() {
    let converter = converter();
    let err = converter
        .resolve(&RuleLogsource::category("file_rename"))
        .unwrap_err();
    assert!(matches!(err, LogsourceError::UnsupportedCategory(_)));

    let err = converter
        .resolve(&RuleLogsource::service("file_rename"))
        .unwrap_err();
    assert!(matches!(err, LogsourceError::UnsupportedService(_)));
}

#[test]
fn condition_for_resolved_source() {
    let sources = converter()
        .resolve(&RuleLogsource::category("process_creation"))
        .unwrap();
    let security = sources.iter().find(|s| !s.is_sysmon()).unwrap();
    let renames = FieldMap::build(&ConfigDocument::from_yaml(AUDIT_YAML, "audit").unwrap());

    let condition = build_condition(
        "selection | count(Image) by Computer > 5",
        security,
        &["selection".to_owned(), "condition".to_owned()],
        renames.renames_for(security).unwrap(),
    );
    assert_eq!(
        condition,
        "(process_creation and selection) | count(NewProcessName) by Computer > 5"
    );
}

#[test]
fn convert_rule_end_to_end() {
    let rule = RuleLoader::parse_yaml(
        r#"
title: Whoami Execution
id: 502b42de-4306-40b4-9596-6f590c81f073
logsource:
  category: process_creation
  product: windows
detection:
  selection:
    Image|endswith: '\whoami.exe'
  condition: selection
level: medium
"#,
        "proc_creation_win_whoami.yml",
    )
    .unwrap();

    let converted = converter().convert_rule(&rule).unwrap();
    assert_eq!(converted.len(), 2);

    for output in &converted {
        assert_eq!(output.document.get("ruletype"), Some(&Value::from("Sigma")));
        assert_eq!(output.document.get("title"), rule.get("title"));

        let out = build_out_path(
            "/sigma/rules/windows",
            "/hayabusa_rules",
            "/sigma/rules/windows/process_creation/proc_creation_win_whoami.yml",
            output.is_sysmon,
        )
        .unwrap();
        let tree = if output.is_sysmon { "sysmon" } else { "builtin" };
        assert_eq!(
            out,
            PathBuf::from(format!("/hayabusa_rules/{tree}/proc_creation_win_whoami.yml"))
        );
    }

    let builtin = converted.iter().find(|c| !c.is_sysmon).unwrap();
    let selection = builtin
        .document
        .get("detection")
        .and_then(|d| d.get("selection"))
        .unwrap();
    assert!(selection.get("NewProcessName|endswith").is_some());
}

#[tokio::test]
async fn mapping_loader_reads_repository_documents() {
    let dir = config_dir();
    let path = |name: &str| dir.join(name).display().to_string();

    let config = MappingConfig {
        service_config: path("windows-services.yaml"),
        category_configs: vec![
            path("sysmon.yaml"),
            path("windows-audit.yaml"),
            path("windows-services.yaml"),
        ],
        field_configs: vec![path("windows-audit.yaml")],
        excluded_categories: Vec::new(),
    };

    let mappings = MappingLoader::load(&config).await.unwrap();
    assert_eq!(mappings.services.len(), 36);
    assert_eq!(mappings.categories, merged());
    assert!(mappings.fields.get("process_creation").is_some());
}
