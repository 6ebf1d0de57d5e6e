//! 설정 관리 -- logmap.toml 파싱 및 런타임 설정
//!
//! [`LogmapConfig`]는 변환 도구 전체의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGMAP_CONVERT_OUT_DIR=/tmp/out` 형식)
//! 3. 설정 파일 (`logmap.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logmap_core::error::LogmapError> {
//! use logmap_core::config::LogmapConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogmapConfig::load("logmap.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogmapConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LogmapError};

/// logmap 통합 설정
///
/// `logmap.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogmapConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 매핑 설정 문서 위치
    #[serde(default)]
    pub mapping: MappingConfig,
    /// 규칙 변환 입출력 디렉토리
    #[serde(default)]
    pub convert: ConvertConfig,
}

impl LogmapConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogmapError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// 설정 파일 없이 기본값에 환경변수 오버라이드만 적용합니다.
    pub fn from_env() -> Result<Self, LogmapError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogmapError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogmapError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogmapError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogmapError> {
        toml::from_str(toml_str).map_err(|e| {
            LogmapError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGMAP_{SECTION}_{FIELD}`
    /// 예: `LOGMAP_MAPPING_EXCLUDED_CATEGORIES=ps_module,ps_script`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGMAP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGMAP_GENERAL_LOG_FORMAT");

        // Mapping
        override_string(
            &mut self.mapping.service_config,
            "LOGMAP_MAPPING_SERVICE_CONFIG",
        );
        override_csv(
            &mut self.mapping.category_configs,
            "LOGMAP_MAPPING_CATEGORY_CONFIGS",
        );
        override_csv(
            &mut self.mapping.field_configs,
            "LOGMAP_MAPPING_FIELD_CONFIGS",
        );
        override_csv(
            &mut self.mapping.excluded_categories,
            "LOGMAP_MAPPING_EXCLUDED_CATEGORIES",
        );

        // Convert
        override_string(&mut self.convert.sigma_dir, "LOGMAP_CONVERT_SIGMA_DIR");
        override_string(&mut self.convert.out_dir, "LOGMAP_CONVERT_OUT_DIR");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogmapError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.mapping.service_config.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mapping.service_config".to_owned(),
                reason: "service config path must not be empty".to_owned(),
            }
            .into());
        }

        if self.mapping.category_configs.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mapping.category_configs".to_owned(),
                reason: "at least one category config is required".to_owned(),
            }
            .into());
        }

        if self.convert.sigma_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "convert.sigma_dir".to_owned(),
                reason: "sigma directory must not be empty".to_owned(),
            }
            .into());
        }

        if self.convert.out_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "convert.out_dir".to_owned(),
                reason: "output directory must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 매핑 설정 문서 위치
///
/// 서비스 문서는 서비스 -> 채널 매핑을, 카테고리 문서는 카테고리 -> (채널, 이벤트 ID)
/// 매핑을 제공합니다. 같은 문서가 양쪽 목록에 모두 올 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// 서비스 설정 문서 경로
    pub service_config: String,
    /// 카테고리 설정 문서 경로 목록 (병합 순서는 결과에 영향 없음)
    pub category_configs: Vec<String>,
    /// 필드 이름 변환 테이블을 담은 문서 경로 목록
    pub field_configs: Vec<String>,
    /// 변환 대상에서 제외할 카테고리/서비스 이름
    pub excluded_categories: Vec<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            service_config: "config/windows-services.yaml".to_owned(),
            category_configs: vec![
                "config/sysmon.yaml".to_owned(),
                "config/windows-audit.yaml".to_owned(),
                "config/windows-services.yaml".to_owned(),
            ],
            field_configs: vec!["config/windows-audit.yaml".to_owned()],
            excluded_categories: Vec::new(),
        }
    }
}

/// 규칙 변환 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Sigma 규칙 루트 디렉토리
    pub sigma_dir: String,
    /// 변환 결과 출력 디렉토리 (`sysmon/`, `builtin/` 하위 트리가 생성됨)
    pub out_dir: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sigma_dir: "sigma/rules/windows".to_owned(),
            out_dir: "hayabusa_rules".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
