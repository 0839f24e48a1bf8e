//! 버스트 누적기: 밀리초 버킷 상태 머신
//!
//! [`BurstAccumulator`]는 열린 버킷을 최대 하나만 유지합니다.
//!
//! # 상태 전이
//! ```text
//!            inbound (첫 프레임)
//!   Empty ─────────────────────────▶ Open
//!                                    │  same ms   : bytes += len, packets += 1
//!                                    │  other ms  : flush ─▶ 새 버킷 (rollover)
//!                                    │  drain()   : flush ─▶ Empty
//! ```
//!
//! 버킷 소속은 열린 버킷의 시작 밀리초와의 일치 여부로만 결정합니다.
//! 타임스탬프가 역행해도 보정하지 않습니다.

use serde::Serialize;

use inbursts_core::types::CaptureTimestamp;

/// 밀리초 버킷
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// 절삭된 epoch 밀리초
    pub start_millis: u64,
    /// 인바운드 바이트 수
    pub bytes_in: u64,
    /// 인바운드 패킷 수
    pub packets_in: u64,
}

impl Bucket {
    fn open(start_millis: u64, length: u32) -> Self {
        Self {
            start_millis,
            bytes_in: u64::from(length),
            packets_in: 1,
        }
    }

    fn add(&mut self, length: u32) {
        self.bytes_in = self.bytes_in.saturating_add(u64::from(length));
        self.packets_in = self.packets_in.saturating_add(1);
    }
}

/// 밀리초 버킷 누적기
#[derive(Debug, Default)]
pub struct BurstAccumulator {
    open: Option<Bucket>,
}

impl BurstAccumulator {
    /// Empty 상태의 누적기를 생성합니다.
    pub fn new() -> Self {
        Self { open: None }
    }

    /// 디코딩된 프레임 하나를 반영합니다.
    ///
    /// 롤오버가 일어나면 닫힌 버킷을 반환하며, 호출자가 출력해야 합니다.
    /// 인바운드가 아닌 프레임은 버킷에 영향을 주지 않습니다.
    pub fn observe(
        &mut self,
        timestamp: CaptureTimestamp,
        length: u32,
        is_inbound: bool,
    ) -> Option<Bucket> {
        if !is_inbound {
            return None;
        }

        let millis = timestamp.bucket_millis();
        if let Some(bucket) = self.open.as_mut() {
            if bucket.start_millis == millis {
                bucket.add(length);
                return None;
            }
        }

        // Empty → Open 이면 None, 롤오버면 이전 버킷
        self.open.replace(Bucket::open(millis, length))
    }

    /// 열린 버킷을 꺼내 Empty 상태로 돌아갑니다.
    ///
    /// 종료 시 한 번 호출합니다. 이미 비어 있으면 `None`을 반환하므로
    /// 같은 버킷이 두 번 출력되지 않습니다.
    pub fn drain(&mut self) -> Option<Bucket> {
        self.open.take()
    }

    /// 현재 열린 버킷
    pub fn open_bucket(&self) -> Option<&Bucket> {
        self.open.as_ref()
    }

    /// 버킷이 열려 있는지 여부
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64, micros: u32) -> CaptureTimestamp {
        CaptureTimestamp::new(secs, micros)
    }

    // =============================================================================
    // 초기 상태
    // =============================================================================

    #[test]
    fn new_accumulator_is_empty() {
        let acc = BurstAccumulator::new();
        assert!(!acc.is_open());
        assert!(acc.open_bucket().is_none());
    }

    #[test]
    fn first_inbound_frame_opens_bucket_without_flush() {
        let mut acc = BurstAccumulator::new();
        assert_eq!(acc.observe(ts(100, 250_400), 60, true), None);

        let bucket = acc.open_bucket().unwrap();
        assert_eq!(bucket.start_millis, 100_250);
        assert_eq!(bucket.bytes_in, 60);
        assert_eq!(bucket.packets_in, 1);
    }

    // =============================================================================
    // 비-인바운드 프레임
    // =============================================================================

    #[test]
    fn non_inbound_frame_is_ignored_when_empty() {
        let mut acc = BurstAccumulator::new();
        assert_eq!(acc.observe(ts(1, 0), 1500, false), None);
        assert!(!acc.is_open());
    }

    #[test]
    fn non_inbound_frame_does_not_touch_open_bucket() {
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(1, 0), 100, true);
        // 다른 밀리초지만 인바운드가 아니므로 롤오버 없음
        assert_eq!(acc.observe(ts(2, 0), 1500, false), None);

        let bucket = acc.open_bucket().unwrap();
        assert_eq!(bucket.start_millis, 1_000);
        assert_eq!(bucket.bytes_in, 100);
        assert_eq!(bucket.packets_in, 1);
    }

    // =============================================================================
    // 같은 밀리초 누적 / 롤오버
    // =============================================================================

    #[test]
    fn same_millisecond_accumulates() {
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(5, 1_000), 100, true);
        assert_eq!(acc.observe(ts(5, 1_999), 50, true), None);

        let bucket = acc.open_bucket().unwrap();
        assert_eq!(bucket.bytes_in, 150);
        assert_eq!(bucket.packets_in, 2);
    }

    #[test]
    fn different_millisecond_rolls_over() {
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(5, 1_000), 100, true);
        acc.observe(ts(5, 1_500), 50, true);

        let flushed = acc.observe(ts(5, 2_000), 200, true).unwrap();
        assert_eq!(
            flushed,
            Bucket {
                start_millis: 5_001,
                bytes_in: 150,
                packets_in: 2
            }
        );

        // 롤오버 후에도 Open 상태 유지
        let bucket = acc.open_bucket().unwrap();
        assert_eq!(bucket.start_millis, 5_002);
        assert_eq!(bucket.bytes_in, 200);
        assert_eq!(bucket.packets_in, 1);
    }

    #[test]
    fn same_millis_in_different_seconds_rolls_over() {
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(7, 3_000), 10, true);
        let flushed = acc.observe(ts(8, 3_000), 10, true);
        assert_eq!(flushed.map(|b| b.start_millis), Some(7_003));
    }

    #[test]
    fn gap_of_several_milliseconds_emits_single_bucket() {
        // 빈 밀리초는 출력하지 않음
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(1, 0), 10, true);
        let flushed = acc.observe(ts(1, 900_000), 20, true).unwrap();
        assert_eq!(flushed.start_millis, 1_000);
        assert_eq!(acc.open_bucket().unwrap().start_millis, 1_900);
    }

    #[test]
    fn earlier_timestamp_triggers_rollover_without_correction() {
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(10, 5_000), 10, true);
        let flushed = acc.observe(ts(10, 4_000), 20, true).unwrap();
        assert_eq!(flushed.start_millis, 10_005);
        assert_eq!(acc.open_bucket().unwrap().start_millis, 10_004);
    }

    // =============================================================================
    // 종료 시 drain
    // =============================================================================

    #[test]
    fn drain_returns_open_bucket_once() {
        let mut acc = BurstAccumulator::new();
        acc.observe(ts(3, 0), 64, true);

        let drained = acc.drain().unwrap();
        assert_eq!(drained.bytes_in, 64);
        assert!(!acc.is_open());
        assert_eq!(acc.drain(), None);
    }

    #[test]
    fn drain_on_empty_returns_none() {
        let mut acc = BurstAccumulator::new();
        assert_eq!(acc.drain(), None);
    }

    #[test]
    fn three_frame_sequence_produces_two_buckets() {
        let mut acc = BurstAccumulator::new();
        let mut flushed = Vec::new();

        for (micros, len) in [(0, 100), (400, 50), (1_000, 200)] {
            flushed.extend(acc.observe(ts(1_600_000_000, micros), len, true));
        }
        flushed.extend(acc.drain());

        assert_eq!(
            flushed,
            vec![
                Bucket {
                    start_millis: 1_600_000_000_000,
                    bytes_in: 150,
                    packets_in: 2
                },
                Bucket {
                    start_millis: 1_600_000_000_001,
                    bytes_in: 200,
                    packets_in: 1
                },
            ]
        );
    }

    #[test]
    fn totals_are_conserved_across_buckets() {
        let mut acc = BurstAccumulator::new();
        let mut flushed = Vec::new();
        let mut expected_bytes = 0u64;
        let mut expected_packets = 0u64;

        for i in 0u32..500 {
            let len = 60 + (i % 7) * 100;
            expected_bytes += u64::from(len);
            expected_packets += 1;
            // 3프레임마다 1ms 전진
            flushed.extend(acc.observe(ts(9, (i / 3) * 1_000 + i % 3), len, true));
        }
        flushed.extend(acc.drain());

        assert_eq!(flushed.iter().map(|b| b.bytes_in).sum::<u64>(), expected_bytes);
        assert_eq!(
            flushed.iter().map(|b| b.packets_in).sum::<u64>(),
            expected_packets
        );
        // 시작 밀리초는 단조 증가
        assert!(flushed.windows(2).all(|w| w[0].start_millis < w[1].start_millis));
    }
}
