//! 서비스 맵 -- 서비스 이름 -> 이벤트 로그 채널

use std::collections::BTreeMap;

use crate::document::ConfigDocument;
use crate::error::LogsourceError;

/// 서비스 이름 -> 채널 이름 매핑
///
/// 대소문자를 구분하는 정확한 일치로 조회합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceMap {
    channels: BTreeMap<String, String>,
}

impl ServiceMap {
    /// 서비스 설정 문서에서 맵을 생성합니다.
    ///
    /// 문서의 모든 최상위 항목이 맵 항목이 됩니다.
    ///
    /// # Errors
    /// - 항목에 `channel`이 없거나 비어 있는 경우 [`LogsourceError::ConfigFormat`]
    pub fn build(document: &ConfigDocument, source: &str) -> Result<Self, LogsourceError> {
        let mut channels = BTreeMap::new();

        for (service, entry) in document.entries() {
            let channel = entry
                .channel
                .as_deref()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| LogsourceError::ConfigFormat {
                    document: source.to_owned(),
                    entry: service.to_owned(),
                    reason: "missing required field 'channel'".to_owned(),
                })?;
            channels.insert(service.to_owned(), channel.to_owned());
        }

        tracing::debug!(source, count = channels.len(), "built service map");

        Ok(Self { channels })
    }

    /// 서비스의 채널을 조회합니다.
    pub fn channel(&self, service: &str) -> Option<&str> {
        self.channels.get(service).map(String::as_str)
    }

    /// (서비스, 채널) 쌍을 서비스 이름 순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.channels
            .iter()
            .map(|(s, c)| (s.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl FromIterator<(String, String)> for ServiceMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            channels: iter.into_iter().collect(),
        }
    }
}
