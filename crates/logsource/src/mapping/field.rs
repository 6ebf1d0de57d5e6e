//! 필드 맵 -- 카테고리별 필드 이름 변환 테이블

use std::collections::BTreeMap;

use crate::document::ConfigDocument;
use crate::logsource::LogSource;

/// 원본 필드 이름 -> 플랫폼 필드 이름
pub type FieldRenames = BTreeMap<String, String>;

/// 카테고리 이름 -> 필드 이름 변환 테이블
///
/// `fields` 항목이 없는 카테고리는 키 자체가 없으므로,
/// "변환 없음"과 "의도적으로 비운 변환 테이블"을 구분할 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    renames: BTreeMap<String, FieldRenames>,
}

impl FieldMap {
    /// 카테고리 설정 문서에서 `fields` 항목을 모읍니다.
    pub fn build(document: &ConfigDocument) -> Self {
        let renames = document
            .entries()
            .filter_map(|(category, entry)| {
                entry
                    .fields
                    .as_ref()
                    .map(|fields| (category.to_owned(), fields.clone()))
            })
            .collect();
        Self { renames }
    }

    /// 여러 문서에서 만든 필드 맵을 합칩니다. 같은 카테고리의 같은 필드는 뒤의 값이 이깁니다.
    pub fn merge<'a>(maps: impl IntoIterator<Item = &'a FieldMap>) -> Self {
        let mut merged = Self::default();
        for map in maps {
            for (category, fields) in &map.renames {
                merged
                    .renames
                    .entry(category.clone())
                    .or_default()
                    .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        merged
    }

    /// 카테고리의 변환 테이블을 조회합니다.
    pub fn get(&self, category: &str) -> Option<&FieldRenames> {
        self.renames.get(category)
    }

    /// 로그소스에 적용할 변환 테이블을 조회합니다.
    ///
    /// Sysmon 채널은 원본 필드 이름을 그대로 쓰므로 변환 대상이 아닙니다.
    pub fn renames_for(&self, source: &LogSource) -> Option<&FieldRenames> {
        if source.needs_field_conversion() {
            self.get(&source.category)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}
