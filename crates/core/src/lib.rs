//! inbursts 공통 크레이트
//!
//! 캡처 엔진과 CLI가 공유하는 도메인 타입, 에러 분류, 설정, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구성
//! - [`types`]: 캡처 타임스탬프, 캡처된 프레임
//! - [`error`]: 도메인별 에러 타입
//! - [`config`]: `inbursts.toml` 파싱 + 환경변수 오버라이드
//! - [`metrics`]: 메트릭 이름 상수 및 설명 등록

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    CaptureError, ConfigError, DecodeError, InburstsError, OutputError, ReportError,
};

// 설정
pub use config::{CaptureConfig, GeneralConfig, InburstsConfig, OutputConfig};

// 도메인 타입
pub use types::{BUCKET_RESOLUTION_MICROS, CaptureTimestamp, CapturedFrame, OwnedFrame};
