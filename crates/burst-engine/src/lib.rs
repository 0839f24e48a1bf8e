//! inbursts 버스트 엔진
//!
//! 수신 인터페이스로 들어오는 IPv4 트래픽을 밀리초 단위 버킷으로 집계하여
//! 버스트 레코드로 기록합니다.
//!
//! # 모듈 구성
//! - [`decoder`]: 이더넷 프레임에서 IPv4 목적지 추출
//! - [`accumulator`]: 밀리초 버킷 상태 머신 (롤오버/종료 flush)
//! - [`emitter`]: 버킷 → 텍스트 레코드 출력
//! - [`stats`]: 실행 전체 통계 (프레임 수, 버킷 최대값)
//! - [`capture`]: 프레임 소스 추상화 (libpcap, 메모리)
//! - [`controller`]: 실행 상태와 프레임 루프, 종료 처리
//! - [`report`]: 출력 파일 분석 (경과 시간 시계열, 요약)

pub mod accumulator;
pub mod capture;
pub mod controller;
pub mod decoder;
pub mod emitter;
pub mod report;
pub mod stats;

// --- 주요 타입 re-export ---

// 집계
pub use accumulator::{Bucket, BurstAccumulator};
pub use decoder::{DecodedPacket, decode_frame};
pub use emitter::{RecordEmitter, format_record};
pub use stats::RunTotals;

// 캡처
pub use capture::{
    CaptureStats, FrameSource, MemorySource, NextFrame, PcapSource, local_ipv4, resolve_device,
};

// 실행
pub use controller::{
    FrameOutcome, RunController, RunControllerBuilder, RunState, RunSummary, StopReason,
};

// 리포트
pub use report::{BurstRecord, BurstSeries, ParseRecordError, Peak, SeriesPoint, SeriesSummary};
