//! 매핑 테이블 -- 설정 문서에서 만든 읽기 전용 조회 테이블
//!
//! - [`ServiceMap`]: 서비스 이름 -> 채널
//! - [`CategoryMap`]: 카테고리 이름 -> (채널, 이벤트 ID) 집합, 문서 간 병합 지원
//! - [`FieldMap`]: 카테고리 이름 -> 필드 이름 변환 테이블
//!
//! 모든 테이블은 시작 시 한 번 만들어지고 이후에는 변경되지 않으므로
//! 여러 스레드에서 공유해 조회해도 안전합니다.

pub mod category;
pub mod field;
pub mod service;

pub use category::{CategoryMap, ChannelEvent};
pub use field::{FieldMap, FieldRenames};
pub use service::ServiceMap;
