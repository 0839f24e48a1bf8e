#![no_main]

use std::cell::RefCell;
use std::io::Write;
use std::net::Ipv4Addr;
use std::rc::Rc;

use arbitrary::Arbitrary;
use inbursts_core::types::{CaptureTimestamp, OwnedFrame};
use inbursts_engine::decoder::build_ipv4_frame;
use inbursts_engine::{BurstSeries, FrameOutcome, RecordEmitter, RunState};
use libfuzzer_sys::fuzz_target;

const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
const REMOTE: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 99);

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzFrame {
    secs: u32,
    micros: u32,
    len: u16,
    inbound: bool,
    ihl: u8,
}

/// 기록 내용을 테스트 쪽에서 다시 읽을 수 있는 싱크
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|frames: Vec<FuzzFrame>| {
    let sink = SharedSink::default();
    let mut state = RunState::new(LOCAL, RecordEmitter::new(sink.clone()));
    let mut inbound_bytes = 0u64;
    let mut inbound_packets = 0u64;

    for f in frames.iter().take(4096) {
        let dst = if f.inbound { LOCAL } else { REMOTE };
        let frame = OwnedFrame::new(
            CaptureTimestamp::new(u64::from(f.secs), f.micros % 1_000_000),
            u32::from(f.len),
            build_ipv4_frame(REMOTE, dst, f.ihl),
        );
        if let Ok(FrameOutcome::Inbound) = state.process_frame(&frame.as_captured()) {
            inbound_bytes += u64::from(f.len);
            inbound_packets += 1;
        }
    }

    let totals = state.finish().expect("in-memory sink never fails");
    assert_eq!(totals.inbound_frames, inbound_packets);
    // 두 번째 종료는 아무것도 쓰지 않음
    let written = sink.0.borrow().len();
    state.finish().expect("second finish is a no-op");
    assert_eq!(sink.0.borrow().len(), written);

    // 기록된 레코드의 합은 인바운드 합과 같아야 한다
    let output = sink.0.borrow().clone();
    let summary = BurstSeries::from_reader(output.as_slice())
        .expect("in-memory read")
        .summary();
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.total_bytes, inbound_bytes);
    assert_eq!(summary.total_packets, inbound_packets);
    assert_eq!(
        summary.peak_bytes.map_or(0, |p| p.value),
        totals.max_bytes_in
    );
});
