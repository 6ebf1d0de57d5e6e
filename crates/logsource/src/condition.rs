//! 조건식 합성 -- 규칙 조건식에 로그소스 선택자를 결합
//!
//! 조건식 언어 자체는 파싱하지 않습니다. 이미 올바른 조건식이라고 가정하고
//! 문자열 수준에서만 재작성합니다.
//!
//! ```text
//! select1 and select2
//!   -> process_creation and (select1 and select2)
//! select | count(Image) by Workstation > 10
//!   -> (process_creation and select) | count(NewProcessName) by Workstation > 10
//! ```

use std::sync::OnceLock;

use regex::Regex;

use crate::logsource::LogSource;
use crate::mapping::FieldRenames;

/// 집계 절 구분자
const AGGREGATION_DELIMITER: char = '|';

/// 로그소스 선택자를 결합한 최종 조건식을 만듭니다.
///
/// - 집계 절(`<predicate> | <func>(<field>) ...`)이 있으면
///   `(<selector> and <predicate>) | <aggregation>` 형태로 합성하고,
///   집계 대상 필드가 `renames`에 있으면 플랫폼 필드 이름으로 바꿉니다.
/// - 없으면 `<selector> and <condition>` 형태로 합성합니다.
///
/// 술어가 공백을 포함하는 복합식이면 괄호로 감쌉니다.
/// 공유 상태를 변경하지 않는 순수 함수입니다.
pub fn build_condition(
    base_condition: &str,
    source: &LogSource,
    used_identifiers: &[String],
    renames: &FieldRenames,
) -> String {
    compose_condition(
        &source.identifier_for_detection(used_identifiers),
        base_condition,
        renames,
    )
}

/// 이미 정해진 선택자 식으로 조건식을 합성합니다.
///
/// 여러 채널 블록을 `(a or b)`처럼 묶은 선택자 식에도 쓰입니다.
pub fn compose_condition(selector: &str, base_condition: &str, renames: &FieldRenames) -> String {
    match base_condition.split_once(AGGREGATION_DELIMITER) {
        Some((predicate, aggregation)) => {
            let aggregation = rename_aggregation_field(aggregation.trim(), renames);
            format!(
                "({selector} and {}) {AGGREGATION_DELIMITER} {aggregation}",
                group(predicate.trim())
            )
        }
        None => format!("{selector} and {}", group(base_condition.trim())),
    }
}

/// 공백이 있는 복합 술어는 괄호로 감쌉니다.
fn group(predicate: &str) -> String {
    if predicate.contains(char::is_whitespace) {
        format!("({predicate})")
    } else {
        predicate.to_owned()
    }
}

/// `func(field) ...` 의 `field`를 변환 테이블에 따라 바꿉니다.
fn rename_aggregation_field(aggregation: &str, renames: &FieldRenames) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<func>\w+)\s*\(\s*(?P<field>[^()\s]*)\s*\)(?P<rest>.*)$")
            .expect("aggregation pattern is a valid regex")
    });

    let Some(caps) = pattern.captures(aggregation) else {
        return aggregation.to_owned();
    };

    let field = caps.name("field").map(|m| m.as_str()).unwrap_or_default();
    match renames.get(field) {
        Some(renamed) => {
            let func = caps.name("func").map(|m| m.as_str()).unwrap_or_default();
            let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
            format!("{func}({renamed}){rest}")
        }
        None => aggregation.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_creation() -> LogSource {
        LogSource::new("process_creation", "sysmon", "hoge", None)
    }

    fn image_renames() -> FieldRenames {
        FieldRenames::from([("Image".to_owned(), "NewProcessName".to_owned())])
    }

    #[test]
    fn compound_condition_is_parenthesised() {
        assert_eq!(
            build_condition("select1 and select2", &process_creation(), &[], &FieldRenames::new()),
            "process_creation and (select1 and select2)"
        );
    }

    #[test]
    fn single_selection_is_not_parenthesised() {
        assert_eq!(
            build_condition("select", &process_creation(), &[], &FieldRenames::new()),
            "process_creation and select"
        );
    }

    #[test]
    fn aggregation_condition_keeps_aggregation_outside() {
        assert_eq!(
            build_condition(
                "select | count(TargetUserName) by Workstation > 10",
                &process_creation(),
                &[],
                &FieldRenames::new(),
            ),
            "(process_creation and select) | count(TargetUserName) by Workstation > 10"
        );
    }

    #[test]
    fn aggregation_field_is_renamed() {
        let source = LogSource::new("process_creation", "Security", "hoge", Some(4688));
        assert_eq!(
            build_condition(
                "select | count(Image) by Workstation > 10",
                &source,
                &[],
                &image_renames(),
            ),
            "(process_creation and select) | count(NewProcessName) by Workstation > 10"
        );
    }

    #[test]
    fn grouping_field_is_not_renamed() {
        let source = LogSource::new("process_creation", "", "Security", Some(4688));
        assert_eq!(
            build_condition(
                "select | count(CommandLine) by Image > 3",
                &source,
                &[],
                &image_renames(),
            ),
            "(process_creation and select) | count(CommandLine) by Image > 3"
        );
    }

    #[test]
    fn aggregation_without_field_is_untouched() {
        assert_eq!(
            build_condition(
                "selection | count() > 5",
                &process_creation(),
                &[],
                &image_renames(),
            ),
            "(process_creation and selection) | count() > 5"
        );
    }

    #[test]
    fn compound_predicate_before_pipe_is_parenthesised() {
        assert_eq!(
            build_condition(
                "selection and not filter | count(Image) by Computer > 2",
                &process_creation(),
                &[],
                &FieldRenames::new(),
            ),
            "(process_creation and (selection and not filter)) | count(Image) by Computer > 2"
        );
    }

    #[test]
    fn colliding_selector_uses_prefixed_identifier() {
        let used = vec!["process_creation".to_owned(), "condition".to_owned()];
        assert_eq!(
            build_condition("process_creation", &process_creation(), &used, &FieldRenames::new()),
            "logsource_mapping_process_creation and process_creation"
        );
    }

    #[test]
    fn service_only_source_uses_service_selector() {
        let source = LogSource::new("", "security", "Security", None);
        assert_eq!(
            build_condition("1 of selection*", &source, &[], &FieldRenames::new()),
            "security and (1 of selection*)"
        );
    }

    #[test]
    fn grouped_selector_expression() {
        assert_eq!(
            compose_condition(
                "(svc_install_Security or svc_install_System)",
                "selection | count() by ServiceName > 2",
                &FieldRenames::new(),
            ),
            "((svc_install_Security or svc_install_System) and selection) | count() by ServiceName > 2"
        );
    }
}
