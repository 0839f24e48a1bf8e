//! 메트릭 상수 및 설명 등록
//!
//! 캡처 엔진이 `metrics` 파사드로 기록하는 메트릭의 이름과 설명을 정의합니다.
//! 익스포터는 설치하지 않으므로 레코더가 없으면 기록은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `inbursts_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 캡처 메트릭 ────────────────────────────────────────────────────

/// 디코딩에 성공한 전체 프레임 수 (counter)
pub const FRAMES_TOTAL: &str = "inbursts_frames_total";

/// 로컬 주소로 향한 인바운드 프레임 수 (counter)
pub const INBOUND_FRAMES_TOTAL: &str = "inbursts_inbound_frames_total";

/// 인바운드 바이트 수 (counter)
pub const INBOUND_BYTES_TOTAL: &str = "inbursts_inbound_bytes_total";

/// IP 헤더가 잘못되어 버려진 프레임 수 (counter)
pub const FRAMES_MALFORMED_TOTAL: &str = "inbursts_frames_malformed_total";

// ─── 버킷 메트릭 ────────────────────────────────────────────────────

/// 출력된 버킷 수 (counter)
pub const BUCKETS_FLUSHED_TOTAL: &str = "inbursts_buckets_flushed_total";

/// 단일 버킷의 최대 바이트 수 (gauge)
pub const BUCKET_PEAK_BYTES: &str = "inbursts_bucket_peak_bytes";

/// 단일 버킷의 최대 패킷 수 (gauge)
pub const BUCKET_PEAK_PACKETS: &str = "inbursts_bucket_peak_packets";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더가 설치되지 않은 상태에서 호출해도 안전합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        FRAMES_TOTAL,
        "Total number of captured frames with a valid IP header"
    );
    describe_counter!(
        INBOUND_FRAMES_TOTAL,
        "Total number of frames destined to the monitored interface address"
    );
    describe_counter!(INBOUND_BYTES_TOTAL, "Total inbound wire bytes");
    describe_counter!(
        FRAMES_MALFORMED_TOTAL,
        "Total number of frames dropped for a truncated or invalid IP header"
    );
    describe_counter!(
        BUCKETS_FLUSHED_TOTAL,
        "Total number of millisecond buckets written to the output sink"
    );
    describe_gauge!(
        BUCKET_PEAK_BYTES,
        "Largest inbound byte count observed in a single millisecond bucket"
    );
    describe_gauge!(
        BUCKET_PEAK_PACKETS,
        "Largest inbound packet count observed in a single millisecond bucket"
    );
}
