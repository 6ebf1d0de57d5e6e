//! 매핑 설정 로더 -- 설정 문서 파일을 읽어 병합된 매핑을 구성
//!
//! [`MappingConfig`]가 가리키는 서비스/카테고리/필드 문서를 읽고 다음 순서로 조립합니다.
//!
//! 1. 서비스 문서 -> [`ServiceMap`]
//! 2. 카테고리 문서마다 [`CategoryMap`] 생성 후 서비스 맵과 함께 병합
//! 3. 필드 문서마다 [`FieldMap`] 생성 후 병합
//!
//! 같은 경로의 문서는 한 번만 읽습니다.

use std::collections::BTreeMap;
use std::path::Path;

use logmap_core::config::MappingConfig;

use crate::converter::LogsourceConverter;
use crate::document::ConfigDocument;
use crate::error::LogsourceError;
use crate::mapping::{CategoryMap, FieldMap, ServiceMap};
use crate::rule::read_limited;

/// 로드가 끝난 매핑 묶음
#[derive(Debug, Clone, Default)]
pub struct Mappings {
    /// 서비스 -> 채널
    pub services: ServiceMap,
    /// 서비스 키까지 포함해 병합된 카테고리 맵
    pub categories: CategoryMap,
    /// 카테고리별 필드 이름 변환 테이블
    pub fields: FieldMap,
}

impl Mappings {
    /// 제외 목록과 함께 규칙 변환기를 만듭니다.
    pub fn into_converter(self, excluded: impl IntoIterator<Item = String>) -> LogsourceConverter {
        LogsourceConverter::new(self.categories, self.fields, excluded)
    }
}

/// 매핑 설정 문서 로더
pub struct MappingLoader;

impl MappingLoader {
    /// 설정에 지정된 모든 문서를 읽어 [`Mappings`]를 만듭니다.
    ///
    /// # Errors
    /// - 문서를 읽을 수 없으면 [`LogsourceError::ConfigLoad`]
    /// - 문서 형식이 잘못되었으면 [`LogsourceError::DocumentParse`] 또는
    ///   [`LogsourceError::ConfigFormat`]
    /// - 카테고리 항목의 서비스가 서비스 문서에 없으면 [`LogsourceError::UnresolvedService`]
    pub async fn load(config: &MappingConfig) -> Result<Mappings, LogsourceError> {
        let mut documents: BTreeMap<String, ConfigDocument> = BTreeMap::new();

        let service_doc = Self::document(&mut documents, &config.service_config).await?;
        let services = ServiceMap::build(&service_doc, &config.service_config)?;

        let mut category_maps = Vec::with_capacity(config.category_configs.len());
        for path in &config.category_configs {
            let doc = Self::document(&mut documents, path).await?;
            category_maps.push(CategoryMap::build(&doc, &services, path)?);
        }
        let categories = CategoryMap::merge(&services, &category_maps);

        let mut field_maps = Vec::with_capacity(config.field_configs.len());
        for path in &config.field_configs {
            let doc = Self::document(&mut documents, path).await?;
            field_maps.push(FieldMap::build(&doc));
        }
        let fields = FieldMap::merge(&field_maps);

        tracing::info!(
            services = services.len(),
            categories = categories.len(),
            field_tables = fields.len(),
            documents = documents.len(),
            "logsource mappings loaded"
        );

        Ok(Mappings {
            services,
            categories,
            fields,
        })
    }

    /// 단일 설정 문서 파일을 읽습니다.
    pub async fn load_document(path: impl AsRef<Path>) -> Result<ConfigDocument, LogsourceError> {
        let path = path.as_ref();
        let content = read_limited(path)
            .await
            .map_err(|reason| LogsourceError::ConfigLoad {
                path: path.display().to_string(),
                reason,
            })?;

        ConfigDocument::from_yaml(&content, &path.display().to_string())
    }

    async fn document(
        cache: &mut BTreeMap<String, ConfigDocument>,
        path: &str,
    ) -> Result<ConfigDocument, LogsourceError> {
        if let Some(doc) = cache.get(path) {
            return Ok(doc.clone());
        }

        let doc = Self::load_document(path).await?;
        tracing::debug!(path, entries = doc.len(), "loaded mapping document");
        cache.insert(path.to_owned(), doc.clone());
        Ok(doc)
    }
}
