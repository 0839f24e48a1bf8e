#![no_main]

use inbursts_core::types::{CaptureTimestamp, CapturedFrame};
use inbursts_engine::decoder::{ETHERNET_HEADER_LEN, MIN_IPV4_HEADER_LEN, decode_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let frame = CapturedFrame {
        timestamp: CaptureTimestamp::new(1, 0),
        wire_len: u32::try_from(data.len()).unwrap_or(u32::MAX),
        data,
    };

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(packet) = decode_frame(&frame) {
        assert!(data.len() >= ETHERNET_HEADER_LEN + MIN_IPV4_HEADER_LEN);
        assert!(packet.header_len >= MIN_IPV4_HEADER_LEN);
    }
});
