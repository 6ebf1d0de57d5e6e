#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`document`]: 서비스/카테고리/필드 매핑 설정 문서 타입
//! - [`mapping`]: 서비스 맵, 카테고리 맵, 필드 이름 변환 맵 및 병합
//! - [`loader`]: 설정 문서 파일을 읽어 [`Mappings`] 구성
//! - [`logsource`]: 구체적인 채널/이벤트 ID 레코드와 탐지 식별자
//! - [`condition`]: 로그소스 선택자를 결합한 조건식 합성
//! - [`rule`]: Sigma 규칙 파일 로더와 `logsource` 선언 타입
//! - [`converter`]: 규칙 logsource 해석 및 규칙 문서 변환
//! - [`path`]: 변환된 규칙의 출력 경로 계산
//! - [`error`]: 도메인 에러 타입

pub mod condition;
pub mod converter;
pub mod document;
pub mod error;
pub mod loader;
pub mod logsource;
pub mod mapping;
pub mod path;
pub mod rule;

// --- 주요 타입 re-export ---

// 에러
pub use error::LogsourceError;

// 설정 문서 및 매핑
pub use document::{ConfigDocument, EventIds, LogsourceEntry};
pub use loader::{MappingLoader, Mappings};
pub use mapping::{CategoryMap, ChannelEvent, FieldMap, FieldRenames, ServiceMap};

// 로그소스 및 조건식
pub use condition::build_condition;
pub use logsource::{IDENTIFIER_PREFIX, LogSource, SYSMON_CHANNEL, get_identifier};

// 규칙 변환
pub use converter::{ConvertedRule, LogsourceConverter};
pub use path::build_out_path;
pub use rule::{RuleLoader, RuleLogsource};
