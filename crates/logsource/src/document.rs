//! 매핑 설정 문서 타입
//!
//! 서비스/카테고리/필드 매핑 문서는 모두 같은 형태를 가집니다.
//!
//! ```yaml
//! # 서비스 문서 항목
//! sysmon:
//!   channel: Microsoft-Windows-Sysmon/Operational
//!
//! # 카테고리 문서 항목
//! process_creation:
//!   service: security
//!   event_id: 4688          # 단일 값 또는 목록
//!   fields:
//!     Image: NewProcessName
//! ```
//!
//! 필수 필드 여부는 문서를 어느 빌더에 넣느냐에 따라 달라지므로, 여기서는 모든 필드를
//! 선택 값으로 역직렬화하고 각 빌더가 누락을 [`LogsourceError::ConfigFormat`]으로 보고합니다.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::LogsourceError;

/// 파싱된 매핑 설정 문서
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    entries: BTreeMap<String, LogsourceEntry>,
}

impl ConfigDocument {
    /// YAML 문자열을 파싱하여 문서를 생성합니다.
    ///
    /// 빈 문서는 항목이 없는 문서로 취급합니다.
    pub fn from_yaml(yaml_str: &str, source: &str) -> Result<Self, LogsourceError> {
        if yaml_str.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml_str).map_err(|e| LogsourceError::DocumentParse {
            source_name: source.to_owned(),
            reason: format!("YAML parse error: {e}"),
        })
    }

    /// 항목 목록에서 문서를 생성합니다.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, LogsourceEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// 항목을 이름 순으로 순회합니다.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LogsourceEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 설정 문서의 단일 항목
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsourceEntry {
    /// 서비스 이름 (서비스 맵을 거쳐 채널로 변환)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// 채널 이름 (서비스 간접 참조 없이 직접 지정)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// 이벤트 ID (없으면 채널 전체)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventIds>,
    /// 필드 이름 변환 테이블 (원본 필드 -> 플랫폼 필드)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl LogsourceEntry {
    /// 서비스 참조 항목을 생성합니다.
    pub fn with_service(service: impl Into<String>, event_ids: &[u32]) -> Self {
        Self {
            service: Some(service.into()),
            event_id: EventIds::from_slice(event_ids),
            ..Self::default()
        }
    }

    /// 채널 직접 지정 항목을 생성합니다.
    pub fn with_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            ..Self::default()
        }
    }

    /// 이벤트 ID를 집합으로 정규화합니다. 빈 집합은 와일드카드입니다.
    pub fn event_id_set(&self) -> BTreeSet<u32> {
        match &self.event_id {
            None => BTreeSet::new(),
            Some(EventIds::One(id)) => BTreeSet::from([*id]),
            Some(EventIds::Many(ids)) => ids.iter().copied().collect(),
        }
    }
}

/// 이벤트 ID 지정 -- 단일 값 또는 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventIds {
    One(u32),
    Many(Vec<u32>),
}

impl EventIds {
    fn from_slice(ids: &[u32]) -> Option<Self> {
        match ids {
            [] => None,
            [id] => Some(Self::One(*id)),
            ids => Some(Self::Many(ids.to_vec())),
        }
    }
}
