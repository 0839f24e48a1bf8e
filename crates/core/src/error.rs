//! 에러 타입: 도메인별 에러 정의
//!
//! # 분류
//! - 설정/캡처 준비/출력 파일 열기 실패: 캡처 시작 전 치명적 에러 ([`InburstsError::is_setup_failure`])
//! - 프레임 디코딩 실패: 호출자가 조용히 버림 ([`DecodeError`])
//! - 출력 쓰기 실패: 실행 중 치명적 에러

use std::path::PathBuf;

/// inbursts 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum InburstsError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 캡처 장치 에러
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// 출력 싱크 에러
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// 프레임 디코딩 에러
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// 버스트 리포트 에러
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 이미 중단된 실행을 다시 구동하려 함
    #[error("capture run already aborted: {0}")]
    Aborted(String),
}

impl InburstsError {
    /// 캡처 시작 전에 발생하는 준비 단계 에러인지 여부
    pub fn is_setup_failure(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Capture(e) => !matches!(e, CaptureError::Read(_)),
            Self::Output(e) => matches!(e, OutputError::Open { .. }),
            Self::Decode(_) | Self::Report(_) | Self::Io(_) | Self::Aborted(_) => false,
        }
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 캡처 장치 에러
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 캡처 가능한 장치가 없음
    #[error("couldn't find default device: {0}")]
    NoDevices(String),

    /// 지정한 장치가 없음
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// 장치에 IPv4 주소가 없음
    #[error("couldn't obtain an IPv4 address for interface {0}")]
    NoAddress(String),

    /// 장치 또는 savefile 열기 실패
    #[error("couldn't open {target}: {reason}")]
    Open { target: String, reason: String },

    /// 이더넷 이외의 링크 타입
    #[error("{target} doesn't provide Ethernet headers (link type {link_type}) - not supported")]
    UnsupportedLinkType { target: String, link_type: String },

    /// 필터 컴파일/설치 실패
    #[error("couldn't install filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    /// 캡처 도중 읽기 실패
    #[error("capture read failed: {0}")]
    Read(String),
}

/// 출력 싱크 에러
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// 출력 파일 열기 실패
    #[error("couldn't open output file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 레코드 쓰기 실패
    #[error("failed to write burst record: {0}")]
    Write(#[source] std::io::Error),

    /// 이미 닫힌 싱크에 쓰기 시도
    #[error("output sink already closed")]
    Closed,
}

/// 프레임 디코딩 에러
///
/// 호출자는 이 에러를 보고하지 않고 프레임을 버립니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// 캡처된 바이트가 링크 헤더 + 최소 IPv4 헤더보다 짧음
    #[error("frame truncated: {len} bytes captured, {required} required")]
    Truncated { len: usize, required: usize },

    /// IPv4 헤더 길이 필드가 최소값(20바이트) 미만
    #[error("invalid IP header length: {header_len} bytes")]
    InvalidHeaderLength { header_len: usize },
}

/// 버스트 리포트 에러
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// 입력 파일 읽기 실패
    #[error("couldn't read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 잘못된 시간 창 (min > max)
    #[error("invalid window: min {min} ms is greater than max {max} ms")]
    InvalidWindow { min: u64, max: u64 },
}
