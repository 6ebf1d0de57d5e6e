//! 로그소스 변환기 -- 규칙 logsource 해석 및 규칙 문서 변환
//!
//! [`LogsourceConverter`]는 병합된 [`CategoryMap`], [`FieldMap`], 제외 목록을 들고
//! 규칙마다 다음을 수행합니다.
//!
//! 1. `logsource` 선언을 하나 이상의 [`LogSource`]로 해석
//! 2. 해석 결과를 `sysmon`/`builtin` 트리별로 묶어 규칙 문서를 복제
//! 3. 탐지 블록 맨 앞에 채널/이벤트 ID 선택자를 추가하고 조건식을 재작성
//!
//! 변환기는 생성 후 내부 상태를 바꾸지 않으므로 여러 규칙을 동시에 변환해도 됩니다.

use std::collections::{BTreeMap, BTreeSet};

use serde_yaml::{Mapping, Value};

use crate::condition::compose_condition;
use crate::error::LogsourceError;
use crate::logsource::{LogSource, get_identifier, sanitize_identifier};
use crate::mapping::{CategoryMap, ChannelEvent, FieldMap, FieldRenames};
use crate::rule::RuleLogsource;

/// 변환 결과 규칙 문서에 붙는 규칙 유형 태그
const RULE_TYPE: &str = "Sigma";

/// 변환된 규칙 하나
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRule {
    /// Sigma 규칙을 `sysmon` 트리에 둘지 여부
    pub is_sysmon: bool,
    /// 이 문서에 반영된 로그소스
    pub sources: Vec<LogSource>,
    /// 변환된 규칙 문서
    pub document: Value,
}

/// 규칙 logsource 해석기 겸 변환기
#[derive(Debug, Clone)]
pub struct LogsourceConverter {
    categories: CategoryMap,
    fields: FieldMap,
    excluded: BTreeSet<String>,
}

impl LogsourceConverter {
    /// 병합된 카테고리 맵, 필드 맵, 제외할 카테고리/서비스 이름으로 변환기를 만듭니다.
    pub fn new(
        categories: CategoryMap,
        fields: FieldMap,
        excluded: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            categories,
            fields,
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// `logsource` 선언을 구체적인 로그소스 목록으로 해석합니다.
    ///
    /// 우선순위: `channel` 직접 지정 > `service` > `category`.
    /// 아무것도 선언하지 않았으면 빈 목록을 반환합니다.
    ///
    /// # Errors
    /// - 제외 목록에 있는 이름이면 [`LogsourceError::ExcludedCategory`]
    /// - 맵에 없는 서비스면 [`LogsourceError::UnsupportedService`]
    /// - 맵에 없는 카테고리면 [`LogsourceError::UnsupportedCategory`]
    pub fn resolve(&self, logsource: &RuleLogsource) -> Result<Vec<LogSource>, LogsourceError> {
        if let Some(channel) = logsource.channel.as_deref().filter(|c| !c.is_empty()) {
            return Ok(vec![LogSource::new("", "", channel, logsource.event_id)]);
        }

        if let Some(service) = logsource.service.as_deref() {
            let pairs = self
                .lookup(service)?
                .ok_or_else(|| LogsourceError::UnsupportedService(service.to_owned()))?;
            return Ok(pairs
                .iter()
                .map(|p| LogSource::new("", service, p.channel.as_str(), p.event_id))
                .collect());
        }

        if let Some(category) = logsource.category.as_deref() {
            let pairs = self
                .lookup(category)?
                .ok_or_else(|| LogsourceError::UnsupportedCategory(category.to_owned()))?;
            return Ok(pairs
                .iter()
                .map(|p| LogSource::new(category, "", p.channel.as_str(), p.event_id))
                .collect());
        }

        Ok(Vec::new())
    }

    /// 규칙 문서의 `logsource` 블록을 해석합니다. 블록이 없으면 빈 목록입니다.
    pub fn resolve_rule(&self, rule: &Value) -> Result<Vec<LogSource>, LogsourceError> {
        match RuleLogsource::from_rule(rule)? {
            Some(logsource) => self.resolve(&logsource),
            None => Ok(Vec::new()),
        }
    }

    /// 규칙 문서를 로그소스 매핑이 반영된 문서로 변환합니다.
    ///
    /// 해석된 로그소스가 `sysmon`/`builtin` 양쪽에 걸치면 트리마다 한 문서씩 만듭니다.
    /// `logsource`가 없는 규칙은 규칙 유형 태그만 붙여 `builtin` 트리로 보냅니다.
    pub fn convert_rule(&self, rule: &Value) -> Result<Vec<ConvertedRule>, LogsourceError> {
        if !rule.is_mapping() {
            return Err(LogsourceError::InvalidRule(
                "rule document must be a mapping".to_owned(),
            ));
        }

        let sources = self.resolve_rule(rule)?;
        if sources.is_empty() {
            let mut document = rule.clone();
            tag_rule_type(&mut document);
            return Ok(vec![ConvertedRule {
                is_sysmon: false,
                sources,
                document,
            }]);
        }

        let mut groups: BTreeMap<bool, Vec<LogSource>> = BTreeMap::new();
        for source in sources {
            groups.entry(source.is_sysmon()).or_default().push(source);
        }

        groups
            .into_iter()
            .map(|(is_sysmon, group)| self.convert_group(rule, is_sysmon, group))
            .collect()
    }

    fn lookup(&self, name: &str) -> Result<Option<&BTreeSet<ChannelEvent>>, LogsourceError> {
        if self.excluded.contains(name) {
            return Err(LogsourceError::ExcludedCategory(name.to_owned()));
        }
        Ok(self.categories.get(name))
    }

    fn convert_group(
        &self,
        rule: &Value,
        is_sysmon: bool,
        group: Vec<LogSource>,
    ) -> Result<ConvertedRule, LogsourceError> {
        let detection = rule
            .get("detection")
            .and_then(Value::as_mapping)
            .ok_or_else(|| LogsourceError::InvalidRule("missing detection block".to_owned()))?;
        let condition = condition_text(detection.get("condition"))?;

        // 그룹은 항상 하나 이상의 로그소스를 가짐
        let Some(primary) = group.first() else {
            return Err(LogsourceError::InvalidRule(
                "no log source to convert".to_owned(),
            ));
        };

        let empty = FieldRenames::new();
        let renames = self.fields.renames_for(primary).unwrap_or(&empty);
        let used: Vec<String> = detection
            .keys()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect();

        let mut new_detection = Mapping::new();
        let blocks = channel_blocks(&group);
        let selector = if let [(_, block)] = blocks.as_slice() {
            let identifier = primary.identifier_for_detection(&used);
            new_detection.insert(Value::String(identifier.clone()), Value::Mapping(block.clone()));
            identifier
        } else {
            // (채널, 이벤트 ID) 쌍이 섞이지 않도록 채널마다 블록을 따로 둠
            let identifiers: Vec<String> = blocks
                .into_iter()
                .map(|(channel, block)| {
                    let identifier = get_identifier(
                        &format!("{}_{}", primary.selector(), sanitize_identifier(channel)),
                        &used,
                    );
                    new_detection.insert(Value::String(identifier.clone()), Value::Mapping(block));
                    identifier
                })
                .collect();
            format!("({})", identifiers.join(" or "))
        };

        for (key, value) in detection {
            let value = if key.as_str() == Some("condition") {
                Value::String(compose_condition(&selector, &condition, renames))
            } else {
                rename_fields(value, renames)
            };
            new_detection.insert(key.clone(), value);
        }

        let mut document = rule.clone();
        if let Some(map) = document.as_mapping_mut() {
            map.insert("detection".into(), Value::Mapping(new_detection));
        }
        tag_rule_type(&mut document);

        tracing::debug!(
            selector = %primary.selector(),
            tree = primary.tree(),
            sources = group.len(),
            "converted rule for log source group"
        );

        Ok(ConvertedRule {
            is_sysmon,
            sources: group,
            document,
        })
    }
}

/// 채널별 선택 조건 블록 (채널 이름 순)
fn channel_blocks(group: &[LogSource]) -> Vec<(&str, Mapping)> {
    let mut by_channel: BTreeMap<&str, Vec<&LogSource>> = BTreeMap::new();
    for source in group {
        by_channel.entry(source.channel.as_str()).or_default().push(source);
    }

    by_channel
        .into_iter()
        .map(|(channel, sources)| (channel, channel_detection_block(channel, &sources)))
        .collect()
}

/// 한 채널에 속한 로그소스들의 선택 조건
///
/// 이벤트 ID가 여럿이면 목록으로, 와일드카드가 하나라도 있으면 `EventID`를 생략합니다.
fn channel_detection_block(channel: &str, sources: &[&LogSource]) -> Mapping {
    if let [single] = sources {
        return single.detection_block();
    }

    let event_ids: Option<BTreeSet<u32>> = sources.iter().map(|s| s.event_id).collect();

    let mut block = Mapping::new();
    block.insert("Channel".into(), Value::from(channel));
    if let Some(ids) = event_ids {
        block.insert("EventID".into(), scalar_or_list(ids.into_iter().map(Value::from)));
    }
    block
}

fn scalar_or_list(values: impl Iterator<Item = Value>) -> Value {
    let mut values: Vec<Value> = values.collect();
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Sequence(values)
    }
}

/// 조건식을 문자열로 꺼냅니다. 목록 형식은 `or`로 결합합니다.
///
/// 집계 절이 있는 조건식은 다른 조건식과 `or`로 결합할 수 없습니다.
fn condition_text(condition: Option<&Value>) -> Result<String, LogsourceError> {
    match condition {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Sequence(items)) if !items.is_empty() => {
            let parts = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::trim).ok_or_else(|| {
                        LogsourceError::InvalidRule("condition list must hold strings".to_owned())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if parts.len() == 1 {
                return Ok(parts[0].to_owned());
            }
            if parts.iter().any(|p| p.contains('|')) {
                return Err(LogsourceError::InvalidRule(
                    "aggregation condition cannot be combined in a condition list".to_owned(),
                ));
            }
            Ok(parts
                .iter()
                .map(|p| {
                    if p.contains(char::is_whitespace) {
                        format!("({p})")
                    } else {
                        (*p).to_owned()
                    }
                })
                .collect::<Vec<_>>()
                .join(" or "))
        }
        _ => Err(LogsourceError::InvalidRule(
            "missing detection condition".to_owned(),
        )),
    }
}

/// 선택 블록의 필드 이름을 바꿉니다. `Field|modifier` 형식의 수정자는 보존합니다.
fn rename_fields(value: &Value, renames: &FieldRenames) -> Value {
    if renames.is_empty() {
        return value.clone();
    }

    match value {
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .map(|(key, v)| (rename_key(key, renames), v.clone()))
                .collect(),
        ),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| rename_fields(item, renames)).collect())
        }
        other => other.clone(),
    }
}

fn rename_key(key: &Value, renames: &FieldRenames) -> Value {
    let Some(name) = key.as_str() else {
        return key.clone();
    };

    let (field, modifiers) = match name.split_once('|') {
        Some((field, modifiers)) => (field, Some(modifiers)),
        None => (name, None),
    };

    match (renames.get(field), modifiers) {
        (Some(renamed), Some(modifiers)) => Value::String(format!("{renamed}|{modifiers}")),
        (Some(renamed), None) => Value::String(renamed.clone()),
        (None, _) => key.clone(),
    }
}

fn tag_rule_type(document: &mut Value) {
    if let Some(map) = document.as_mapping_mut() {
        map.insert("ruletype".into(), Value::from(RULE_TYPE));
    }
}
