//! # Econ Core
//!
//! 경제 지표 대시보드의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! - 관측 주기, 조회 구간, 시계열 타입
//! - 지표 메타데이터와 카탈로그
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
