//! 실행 누적 통계: 프로세스 수명 동안의 카운터
//!
//! [`RunTotals`]는 프레임마다 증가하고 버킷이 출력될 때 최대값을 갱신합니다.
//! 종료 시 한 번 읽어 요약 보고에 사용합니다.

use std::fmt;

use inbursts_core::metrics as m;
use serde::Serialize;

use crate::accumulator::Bucket;

/// 실행 전체 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    /// 디코딩에 성공한 전체 프레임 수
    pub frames: u64,
    /// 인바운드 프레임 수
    pub inbound_frames: u64,
    /// 출력된 버킷 중 최대 바이트 수
    pub max_bytes_in: u64,
    /// 출력된 버킷 중 최대 패킷 수
    pub max_packets_in: u64,
}

impl RunTotals {
    /// 제로 초기화된 통계를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 디코딩된 프레임 하나를 집계합니다.
    pub fn record_frame(&mut self, length: u32, is_inbound: bool) {
        self.frames += 1;
        metrics::counter!(m::FRAMES_TOTAL).increment(1);

        if is_inbound {
            self.inbound_frames += 1;
            metrics::counter!(m::INBOUND_FRAMES_TOTAL).increment(1);
            metrics::counter!(m::INBOUND_BYTES_TOTAL).increment(u64::from(length));
        }
    }

    /// 출력된 버킷으로 최대값을 갱신합니다.
    pub fn record_bucket(&mut self, bucket: &Bucket) {
        self.max_bytes_in = self.max_bytes_in.max(bucket.bytes_in);
        self.max_packets_in = self.max_packets_in.max(bucket.packets_in);

        metrics::counter!(m::BUCKETS_FLUSHED_TOTAL).increment(1);
        // u64 → f64: 버킷당 값은 2^53 미만
        #[allow(clippy::cast_precision_loss)]
        {
            metrics::gauge!(m::BUCKET_PEAK_BYTES).set(self.max_bytes_in as f64);
            metrics::gauge!(m::BUCKET_PEAK_PACKETS).set(self.max_packets_in as f64);
        }
    }
}

/// 종료 시 진단 스트림으로 보고하는 사람이 읽을 수 있는 요약
impl fmt::Display for RunTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Captured {} packets and {} incoming packets",
            self.frames, self.inbound_frames
        )?;
        write!(
            f,
            "Maxed at {} bytes/ms in and {} packets/ms in",
            self.max_bytes_in, self.max_packets_in
        )
    }
}
