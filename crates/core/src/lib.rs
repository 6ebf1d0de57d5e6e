#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogmapError};

// 설정
pub use config::{ConvertConfig, GeneralConfig, LogmapConfig, MappingConfig};
