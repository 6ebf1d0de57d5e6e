//! 로그소스 매핑 에러 타입
//!
//! [`LogsourceError`]는 매핑 테이블 구성, 규칙 logsource 해석, 출력 경로 계산에서
//! 발생하는 모든 에러를 표현합니다.
//! `From<LogsourceError> for LogmapError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 규칙 단위로 건너뛸 수 있는 에러와 전체 실행을 중단해야 하는 에러는
//! [`LogsourceError::is_rule_level`]로 구분합니다.

use logmap_core::error::LogmapError;

/// 로그소스 매핑 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogsourceError {
    /// 설정 문서 항목에 필수 필드가 없음
    #[error("config format error: {document}: entry '{entry}': {reason}")]
    ConfigFormat {
        /// 설정 문서 이름 (파일 경로 등)
        document: String,
        /// 문제가 된 항목 이름
        entry: String,
        /// 실패 사유
        reason: String,
    },

    /// 카테고리 항목이 서비스 맵에 없는 서비스를 참조함
    #[error("unresolved service: category '{category}' references unknown service '{service}'")]
    UnresolvedService {
        /// 카테고리 이름
        category: String,
        /// 찾지 못한 서비스 이름
        service: String,
    },

    /// 병합된 카테고리 맵에 없는 카테고리
    #[error("unsupported category: [{0}]")]
    UnsupportedCategory(String),

    /// 병합된 카테고리 맵에 없는 서비스
    #[error("unsupported service: [{0}]")]
    UnsupportedService(String),

    /// 제외 목록에 명시된 카테고리/서비스
    #[error("excluded category: [{0}]")]
    ExcludedCategory(String),

    /// Sigma 규칙 경로가 기준 디렉토리 아래에 있지 않음
    #[error("path resolution error: '{path}' is not under '{base}'")]
    PathResolution {
        /// Sigma 규칙 경로
        path: String,
        /// 기준 디렉토리
        base: String,
    },

    /// 설정 문서 YAML 파싱 실패
    #[error("document parse error: {source_name}: {reason}")]
    DocumentParse {
        /// 문서 출처
        source_name: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 문서 파일 로딩 실패
    #[error("config load error: {path}: {reason}")]
    ConfigLoad {
        /// 설정 문서 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 규칙 파일 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 변환할 수 없는 규칙 구조 (detection/condition 누락 등)
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogsourceError {
    /// 규칙 하나만 건너뛰면 되는 에러인지 여부
    ///
    /// 매핑 설정 불량이나 호출자 오용은 `false`이며 전체 변환을 중단해야 합니다.
    pub fn is_rule_level(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCategory(_)
                | Self::UnsupportedService(_)
                | Self::ExcludedCategory(_)
                | Self::InvalidRule(_)
                | Self::RuleLoad { .. }
        )
    }
}

impl From<LogsourceError> for LogmapError {
    fn from(err: LogsourceError) -> Self {
        match err {
            LogsourceError::Io(e) => LogmapError::Io(e),
            other => LogmapError::Mapping(other.to_string()),
        }
    }
}
