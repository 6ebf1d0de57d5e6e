//! Sigma 규칙 입력 -- logsource 선언 타입과 규칙 파일 로더
//!
//! 규칙 본문은 변환 과정에서 구조를 그대로 보존해야 하므로
//! [`serde_yaml::Value`]로 다루고, `logsource` 블록만 타입으로 역직렬화합니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::LogsourceError;

/// 규칙 파일 최대 크기
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
/// 한 번에 수집할 최대 규칙 파일 수
const MAX_RULE_FILES: usize = 100_000;

/// 규칙의 `logsource` 선언
///
/// ```yaml
/// logsource:
///   product: windows
///   category: process_creation
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLogsource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<u32>,
}

impl RuleLogsource {
    /// 카테고리만 선언한 logsource
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// 서비스만 선언한 logsource
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            ..Self::default()
        }
    }

    /// 채널(과 이벤트 ID)을 직접 선언한 logsource
    pub fn channel(channel: impl Into<String>, event_id: Option<u32>) -> Self {
        Self {
            channel: Some(channel.into()),
            event_id,
            ..Self::default()
        }
    }

    /// 규칙 문서에서 `logsource` 블록을 꺼냅니다. 블록이 없으면 `None`입니다.
    pub fn from_rule(rule: &Value) -> Result<Option<Self>, LogsourceError> {
        let Some(block) = rule.get("logsource") else {
            return Ok(None);
        };

        serde_yaml::from_value(block.clone())
            .map(Some)
            .map_err(|e| LogsourceError::InvalidRule(format!("malformed logsource block: {e}")))
    }
}

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 디렉토리 아래의 모든 `.yml`/`.yaml` 파일 경로를 재귀적으로 수집합니다.
    ///
    /// 결과는 경로 순으로 정렬됩니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 파일 수가 `MAX_RULE_FILES`를 초과하는 경우
    pub async fn collect_rule_files(
        dir: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, LogsourceError> {
        let root = dir.as_ref();
        let mut pending = vec![root.to_path_buf()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries =
                tokio::fs::read_dir(&dir)
                    .await
                    .map_err(|e| LogsourceError::ConfigLoad {
                        path: dir.display().to_string(),
                        reason: format!("failed to read directory: {e}"),
                    })?;

            while let Some(entry) =
                entries
                    .next_entry()
                    .await
                    .map_err(|e| LogsourceError::ConfigLoad {
                        path: dir.display().to_string(),
                        reason: format!("failed to read directory entry: {e}"),
                    })?
            {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                // .yml / .yaml 확장자만 처리
                let is_yaml = path
                    .extension()
                    .is_some_and(|ext| ext == "yml" || ext == "yaml");
                if !is_yaml {
                    continue;
                }

                files.push(path);
                if files.len() > MAX_RULE_FILES {
                    return Err(LogsourceError::ConfigLoad {
                        path: root.display().to_string(),
                        reason: format!("too many rule files: max {MAX_RULE_FILES}"),
                    });
                }
            }
        }

        files.sort();

        tracing::debug!(
            dir = %root.display(),
            count = files.len(),
            "collected sigma rule files"
        );

        Ok(files)
    }

    /// 단일 YAML 규칙 파일을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Value, LogsourceError> {
        let path = path.as_ref();
        let content = read_limited(path).await.map_err(|reason| LogsourceError::RuleLoad {
            path: path.display().to_string(),
            reason,
        })?;

        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// YAML 문자열을 파싱하여 규칙 문서를 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Value, LogsourceError> {
        let rule: Value = serde_yaml::from_str(yaml_str).map_err(|e| LogsourceError::RuleLoad {
            path: source.to_owned(),
            reason: format!("YAML parse error: {e}"),
        })?;

        if !rule.is_mapping() {
            return Err(LogsourceError::RuleLoad {
                path: source.to_owned(),
                reason: "rule document must be a mapping".to_owned(),
            });
        }

        Ok(rule)
    }
}

/// 크기 제한을 확인한 뒤 파일을 문자열로 읽습니다.
pub(crate) async fn read_limited(path: &Path) -> Result<String, String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| format!("failed to read file metadata: {e}"))?;

    if metadata.len() > MAX_RULE_FILE_SIZE {
        return Err(format!(
            "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
            metadata.len()
        ));
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read file: {e}"))
}
