//! 버스트 집계 벤치마크
//!
//! 프레임 디코딩, 버킷 누적, 프레임 단위 처리(RunState)의 처리량을 측정합니다.

use std::io::sink;
use std::net::Ipv4Addr;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use inbursts_core::types::{CaptureTimestamp, OwnedFrame};
use inbursts_engine::decoder::build_ipv4_frame;
use inbursts_engine::{BurstAccumulator, RecordEmitter, RunState, decode_frame};

const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 10);
const REMOTE: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 45);

/// 1000개 프레임, 4프레임마다 1ms 전진, 4번째마다 비-인바운드
fn frames() -> Vec<OwnedFrame> {
    let inbound = build_ipv4_frame(REMOTE, LOCAL, 5);
    let other = build_ipv4_frame(LOCAL, REMOTE, 5);
    (0u32..1000)
        .map(|i| {
            let data = if i % 4 == 3 { other.clone() } else { inbound.clone() };
            OwnedFrame::new(CaptureTimestamp::new(1_600_000_000, (i / 4) * 1_000), 1514, data)
        })
        .collect()
}

fn bench_decoder(c: &mut Criterion) {
    let frame = OwnedFrame::new(
        CaptureTimestamp::new(1, 0),
        1514,
        build_ipv4_frame(REMOTE, LOCAL, 5),
    );

    let mut group = c.benchmark_group("decoder");
    group.throughput(Throughput::Elements(1));
    group.bench_function("ipv4_frame", |b| {
        b.iter(|| decode_frame(black_box(&frame.as_captured())).unwrap())
    });
    group.finish();
}

fn bench_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");

    // 같은 밀리초 누적
    group.throughput(Throughput::Elements(1000));
    group.bench_function("same_millisecond_1000", |b| {
        b.iter(|| {
            let mut acc = BurstAccumulator::new();
            for _ in 0..1000 {
                black_box(acc.observe(CaptureTimestamp::new(1, 500), 1514, true));
            }
            acc.drain()
        })
    });

    // 매 프레임 롤오버
    group.bench_function("rollover_1000", |b| {
        b.iter(|| {
            let mut acc = BurstAccumulator::new();
            for i in 0u32..1000 {
                black_box(acc.observe(CaptureTimestamp::new(1, i * 1_000), 1514, true));
            }
            acc.drain()
        })
    });

    group.finish();
}

fn bench_run_state(c: &mut Criterion) {
    let frames = frames();

    let mut group = c.benchmark_group("run_state");
    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("process_1000_frames", |b| {
        b.iter_batched(
            || RunState::new(LOCAL, RecordEmitter::new(sink())),
            |mut state| {
                for frame in &frames {
                    state.process_frame(&frame.as_captured()).unwrap();
                }
                state.finish().unwrap()
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_decoder, bench_accumulator, bench_run_state);
criterion_main!(benches);
