//! 로그소스 레코드 -- 규칙 하나가 평가될 구체적인 채널/이벤트 ID

use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Sysmon 이벤트가 기록되는 채널
pub const SYSMON_CHANNEL: &str = "Microsoft-Windows-Sysmon/Operational";

/// 식별자 충돌 시 붙이는 접두사
pub const IDENTIFIER_PREFIX: &str = "logsource_mapping_";

/// 규칙 하나가 평가될 구체적인 Windows 이벤트 로그 소스
///
/// `channel`은 항상 비어 있지 않습니다. `category`와 `service`는 규칙이 logsource를
/// 어떻게 선언했는지에 따라 둘 중 하나만 채워지거나 둘 다 비어 있을 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LogSource {
    /// 탐지 카테고리 (예: `process_creation`)
    pub category: String,
    /// 서비스/프로바이더 이름 (예: `sysmon`, `security`)
    pub service: String,
    /// 이벤트 로그 채널 이름
    pub channel: String,
    /// 이벤트 ID (`None`이면 채널의 모든 이벤트)
    pub event_id: Option<u32>,
}

impl LogSource {
    pub fn new(
        category: impl Into<String>,
        service: impl Into<String>,
        channel: impl Into<String>,
        event_id: Option<u32>,
    ) -> Self {
        Self {
            category: category.into(),
            service: service.into(),
            channel: channel.into(),
            event_id,
        }
    }

    /// 탐지 블록에 추가할 선택자 이름의 기본값
    ///
    /// 카테고리, 서비스, 채널 순으로 처음 비어 있지 않은 값을 쓰고
    /// `[A-Za-z0-9_]` 이외의 문자는 `_`로 바꿉니다.
    pub fn selector(&self) -> String {
        let base = [&self.category, &self.service, &self.channel]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or_default();

        sanitize_identifier(base)
    }

    /// 이미 사용 중인 탐지 식별자와 겹치지 않는 선택자 이름
    pub fn identifier_for_detection(&self, used: &[String]) -> String {
        get_identifier(&self.selector(), used)
    }

    /// 탐지 블록에 추가할 채널/이벤트 ID 선택 조건
    ///
    /// ```yaml
    /// Channel: Security
    /// EventID: 4688
    /// ```
    pub fn detection_block(&self) -> Mapping {
        let mut block = Mapping::new();
        block.insert("Channel".into(), Value::String(self.channel.clone()));
        if let Some(id) = self.event_id {
            block.insert("EventID".into(), Value::Number(id.into()));
        }
        block
    }

    /// Sysmon 채널 로그소스인지 여부
    pub fn is_sysmon(&self) -> bool {
        self.channel == SYSMON_CHANNEL
    }

    /// 카테고리 필드 이름 변환이 필요한지 여부
    ///
    /// Sigma 필드 이름은 Sysmon 기준이므로 Sysmon 이외의 채널로 해석된 카테고리만
    /// 변환 대상입니다.
    pub fn needs_field_conversion(&self) -> bool {
        !self.category.is_empty() && !self.is_sysmon()
    }

    /// 출력 트리 이름 (`sysmon` 또는 `builtin`)
    pub fn tree(&self) -> &'static str {
        if self.is_sysmon() { "sysmon" } else { "builtin" }
    }
}

/// `[A-Za-z0-9_]` 이외의 문자를 `_`로 바꿉니다.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// 충돌하지 않는 탐지 식별자를 반환합니다.
///
/// `selector`가 `used`에 없으면 그대로, 있으면 [`IDENTIFIER_PREFIX`]를 붙여 반환합니다.
/// 접두사를 붙인 뒤에도 충돌하는 경우는 다루지 않습니다.
pub fn get_identifier(selector: &str, used: &[String]) -> String {
    if used.iter().any(|u| u == selector) {
        format!("{IDENTIFIER_PREFIX}{selector}")
    } else {
        selector.to_owned()
    }
}
