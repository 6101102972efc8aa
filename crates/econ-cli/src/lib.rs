//! 경제 지표 대시보드 CLI 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 지표 카탈로그 조회
//! - 단일 지표 레벨/YoY 시계열 조회
//! - 분류별 대시보드 요약

pub mod commands;
