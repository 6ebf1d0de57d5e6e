//! 카테고리 맵 -- 카테고리 이름 -> (채널, 이벤트 ID) 집합
//!
//! 하나의 카테고리는 여러 채널/이벤트 ID 조합으로 해석될 수 있습니다.
//! 예: `process_creation`은 Sysmon 이벤트 1과 Security 이벤트 4688 모두에 대응합니다.
//!
//! 값은 [`BTreeSet`]이므로 동일한 쌍은 한 번만 저장되고, 병합은 키별 합집합입니다.
//! 따라서 병합 순서와 중복 입력은 결과에 영향을 주지 않습니다.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::document::ConfigDocument;
use crate::error::LogsourceError;

use super::service::ServiceMap;

/// (채널, 이벤트 ID) 쌍. `event_id`가 `None`이면 채널의 모든 이벤트를 뜻합니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ChannelEvent {
    pub channel: String,
    pub event_id: Option<u32>,
}

impl ChannelEvent {
    pub fn new(channel: impl Into<String>, event_id: Option<u32>) -> Self {
        Self {
            channel: channel.into(),
            event_id,
        }
    }
}

impl fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event_id {
            Some(id) => write!(f, "{} (EventID {id})", self.channel),
            None => write!(f, "{} (any EventID)", self.channel),
        }
    }
}

/// 카테고리 이름 -> (채널, 이벤트 ID) 집합 매핑
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    categories: BTreeMap<String, BTreeSet<ChannelEvent>>,
}

impl CategoryMap {
    /// 카테고리 설정 문서 하나에서 맵을 생성합니다.
    ///
    /// 각 항목은 `service`를 서비스 맵으로 해석하거나 `channel`을 직접 사용해 채널을
    /// 결정하고, {채널} x {이벤트 ID 또는 와일드카드} 조합을 등록합니다.
    /// `service`와 `channel`이 모두 있으면 `service`를 따릅니다.
    ///
    /// # Errors
    /// - `service`가 서비스 맵에 없으면 [`LogsourceError::UnresolvedService`]
    /// - `service`와 `channel`이 모두 없으면 [`LogsourceError::ConfigFormat`]
    pub fn build(
        document: &ConfigDocument,
        services: &ServiceMap,
        source: &str,
    ) -> Result<Self, LogsourceError> {
        let mut map = Self::default();

        for (category, entry) in document.entries() {
            let channel = match (entry.service.as_deref(), entry.channel.as_deref()) {
                (Some(service), _) => services.channel(service).ok_or_else(|| {
                    LogsourceError::UnresolvedService {
                        category: category.to_owned(),
                        service: service.to_owned(),
                    }
                })?,
                (None, Some(channel)) if !channel.is_empty() => channel,
                _ => {
                    return Err(LogsourceError::ConfigFormat {
                        document: source.to_owned(),
                        entry: category.to_owned(),
                        reason: "entry needs either 'service' or 'channel'".to_owned(),
                    });
                }
            };

            let event_ids = entry.event_id_set();
            if event_ids.is_empty() {
                map.insert(category, ChannelEvent::new(channel, None));
            } else {
                for id in event_ids {
                    map.insert(category, ChannelEvent::new(channel, Some(id)));
                }
            }
        }

        tracing::debug!(source, count = map.len(), "built category map");

        Ok(map)
    }

    /// 여러 카테고리 맵을 하나로 병합합니다.
    ///
    /// 서비스 맵의 각 서비스도 자기 이름을 키로 (채널, 와일드카드) 쌍과 함께 등록되어,
    /// `service`만 선언한 규칙도 같은 맵에서 조회할 수 있습니다.
    pub fn merge<'a>(
        services: &ServiceMap,
        maps: impl IntoIterator<Item = &'a CategoryMap>,
    ) -> Self {
        let mut merged = Self::default();

        for map in maps {
            for (category, pairs) in &map.categories {
                merged
                    .categories
                    .entry(category.clone())
                    .or_default()
                    .extend(pairs.iter().cloned());
            }
        }

        for (service, channel) in services.iter() {
            merged.insert(service, ChannelEvent::new(channel, None));
        }

        tracing::debug!(count = merged.len(), "merged category maps");

        merged
    }

    /// 쌍 하나를 등록합니다.
    pub fn insert(&mut self, category: &str, pair: ChannelEvent) {
        self.categories
            .entry(category.to_owned())
            .or_default()
            .insert(pair);
    }

    /// 카테고리에 등록된 쌍을 조회합니다.
    pub fn get(&self, category: &str) -> Option<&BTreeSet<ChannelEvent>> {
        self.categories.get(category)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// (카테고리, 쌍 집합)을 이름 순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<ChannelEvent>)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
