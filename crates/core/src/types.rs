//! 도메인 타입: 캡처 계층과 엔진이 주고받는 공통 타입
//!
//! 캡처 장치가 프레임마다 넘겨주는 도착 시각과 원시 바이트를 표현합니다.
//! 버킷 경계는 [`CaptureTimestamp::bucket_millis`]로 결정됩니다.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 버킷 해상도 (마이크로초). 밀리초 단위 고정이며 설정으로 바꿀 수 없습니다.
pub const BUCKET_RESOLUTION_MICROS: u32 = 1_000;

/// 마이크로초 → 초 환산 값
const MICROS_PER_SEC: u64 = 1_000_000;

/// 캡처 장치가 보고한 프레임 도착 시각 (초 + 마이크로초)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaptureTimestamp {
    /// Unix epoch 기준 초
    pub secs: u64,
    /// 초 내 마이크로초
    pub micros: u32,
}

impl CaptureTimestamp {
    /// 타임스탬프를 생성합니다.
    pub const fn new(secs: u64, micros: u32) -> Self {
        Self { secs, micros }
    }

    /// `timeval` 형태의 부호 있는 값에서 타임스탬프를 생성합니다.
    ///
    /// 음수 값은 0으로 고정됩니다. 마이크로초가 1초를 넘으면 초로 올림 정규화합니다.
    pub fn from_timeval(secs: i64, micros: i64) -> Self {
        let secs = u64::try_from(secs).unwrap_or(0);
        let micros = u64::try_from(micros).unwrap_or(0);
        let carry = micros / MICROS_PER_SEC;
        // micros % 1_000_000 < 2^32
        #[allow(clippy::cast_possible_truncation)]
        let micros = (micros % MICROS_PER_SEC) as u32;
        Self {
            secs: secs.saturating_add(carry),
            micros,
        }
    }

    /// 밀리초 단위로 절삭한 epoch 밀리초 값 (`secs * 1000 + floor(micros / 1000)`)
    ///
    /// 같은 값을 갖는 프레임은 같은 버킷에 속합니다.
    pub fn bucket_millis(&self) -> u64 {
        self.secs
            .saturating_mul(1_000)
            .saturating_add(u64::from(self.micros / BUCKET_RESOLUTION_MICROS))
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// 캡처된 링크 계층 프레임 (한 번의 콜백 동안만 빌림)
#[derive(Debug, Clone, Copy)]
pub struct CapturedFrame<'a> {
    /// 도착 시각
    pub timestamp: CaptureTimestamp,
    /// 와이어 상의 전체 프레임 길이 (snaplen으로 잘리기 전 길이)
    pub wire_len: u32,
    /// 캡처된 바이트 (snaplen 이하)
    pub data: &'a [u8],
}

/// 소유권을 가진 프레임
///
/// 메모리 재생 소스, 벤치마크, 퍼징에서 사용합니다.
#[derive(Debug, Clone)]
pub struct OwnedFrame {
    /// 도착 시각
    pub timestamp: CaptureTimestamp,
    /// 와이어 상의 전체 프레임 길이
    pub wire_len: u32,
    /// 캡처된 바이트
    pub data: Bytes,
}

impl OwnedFrame {
    /// 새 프레임을 생성합니다.
    pub fn new(timestamp: CaptureTimestamp, wire_len: u32, data: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            wire_len,
            data: data.into(),
        }
    }

    /// 빌린 형태의 프레임을 반환합니다.
    pub fn as_captured(&self) -> CapturedFrame<'_> {
        CapturedFrame {
            timestamp: self.timestamp,
            wire_len: self.wire_len,
            data: &self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_millis_truncates_micros() {
        let ts = CaptureTimestamp::new(1_700_000_000, 123_999);
        assert_eq!(ts.bucket_millis(), 1_700_000_000_123);
    }

    #[test]
    fn bucket_millis_same_millisecond_is_equal() {
        let a = CaptureTimestamp::new(10, 5_000);
        let b = CaptureTimestamp::new(10, 5_999);
        let c = CaptureTimestamp::new(10, 6_000);
        assert_eq!(a.bucket_millis(), b.bucket_millis());
        assert_ne!(b.bucket_millis(), c.bucket_millis());
    }

    #[test]
    fn bucket_millis_pads_small_millis() {
        // 7ms는 "...007"로 표현되어야 함
        let ts = CaptureTimestamp::new(42, 7_500);
        assert_eq!(ts.bucket_millis(), 42_007);
    }

    #[test]
    fn from_timeval_clamps_negative_values() {
        let ts = CaptureTimestamp::from_timeval(-5, -1);
        assert_eq!(ts, CaptureTimestamp::new(0, 0));
    }

    #[test]
    fn from_timeval_normalizes_micro_overflow() {
        let ts = CaptureTimestamp::from_timeval(10, 2_500_000);
        assert_eq!(ts, CaptureTimestamp::new(12, 500_000));
    }

    #[test]
    fn display_formats_seconds_and_micros() {
        let ts = CaptureTimestamp::new(3, 42);
        assert_eq!(ts.to_string(), "3.000042");
    }

    #[test]
    fn owned_frame_as_captured_borrows_payload() {
        let frame = OwnedFrame::new(CaptureTimestamp::new(1, 0), 60, vec![0xAAu8; 34]);
        let captured = frame.as_captured();
        assert_eq!(captured.wire_len, 60);
        assert_eq!(captured.data.len(), 34);
        assert_eq!(captured.timestamp, frame.timestamp);
    }
}
