//! 통합 테스트 -- 블로킹 캡처 루프 구동, 종료 코드, 리포트 명령

use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use inbursts_cli::capture::drive;
use inbursts_cli::cli::{OutputFormat, ReportCli};
use inbursts_cli::report;
use inbursts_core::types::{CaptureTimestamp, OwnedFrame};
use inbursts_engine::decoder::build_ipv4_frame;
use inbursts_engine::{MemorySource, RecordEmitter, RunState, StopReason};

const LOCAL: Ipv4Addr = Ipv4Addr::new(10, 20, 30, 40);
const REMOTE: Ipv4Addr = Ipv4Addr::new(10, 20, 30, 1);

fn inbound(secs: u64, micros: u32, len: u32) -> OwnedFrame {
    OwnedFrame::new(
        CaptureTimestamp::new(secs, micros),
        len,
        build_ipv4_frame(REMOTE, LOCAL, 5),
    )
}

/// 첫 쓰기 이후 실패하는 싱크 (디스크 가득 참)
#[derive(Clone, Default)]
struct FullDisk {
    written: Arc<Mutex<Vec<u8>>>,
}

impl FullDisk {
    fn contents(&self) -> String {
        String::from_utf8(self.written.lock().unwrap().clone()).unwrap()
    }
}

impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut written = self.written.lock().unwrap();
        if !written.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "no space left on device",
            ));
        }
        written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_drive_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbursts.out");

    let source: MemorySource = [
        inbound(1_600_000_000, 0, 100),
        inbound(1_600_000_000, 400, 50),
        inbound(1_600_000_000, 1_000, 200),
    ]
    .into_iter()
    .collect();
    let state = RunState::new(LOCAL, RecordEmitter::create(&path).unwrap());

    let summary = drive(source, state, None, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::SourceExhausted);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "1600000000000,150,2\n1600000000001,200,1\n"
    );
    let text = summary.to_string();
    assert!(text.contains("Captured 3 packets and 3 incoming packets"));
    assert!(text.contains("Maxed at 200 bytes/ms in and 2 packets/ms in"));
}

#[tokio::test]
async fn test_drive_honours_frame_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbursts.out");

    let source: MemorySource = (0..10).map(|i| inbound(2, i * 1_000, 60)).collect();
    let state = RunState::new(LOCAL, RecordEmitter::create(&path).unwrap());

    let summary = drive(source, state, Some(4), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::FrameLimit);
    assert_eq!(summary.records_written, 4);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap().lines().count(),
        4
    );
}

#[tokio::test]
async fn test_drive_pre_cancelled_token() {
    let source: MemorySource = [inbound(3, 0, 60)].into_iter().collect();
    let state = RunState::new(LOCAL, RecordEmitter::new(Vec::new()));
    let token = CancellationToken::new();
    token.cancel();

    let summary = drive(source, state, None, token).await.unwrap();
    assert_eq!(summary.stop_reason, StopReason::Cancelled);
    assert_eq!(summary.totals.frames, 0);
}

#[tokio::test]
async fn test_write_failure_mid_run_exits_with_1() {
    let disk = FullDisk::default();
    let source: MemorySource = (0..5).map(|i| inbound(4, i * 1_000, 60)).collect();
    let state = RunState::new(LOCAL, RecordEmitter::new(disk.clone()));

    let err = drive(source, state, None, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("no space left on device"));
    // 실패 이전 레코드만 남고, 실패 이후 버킷은 쓰지 않음
    assert_eq!(disk.contents(), "4000,60,1\n");
}

#[test]
fn test_report_over_captured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbursts.out");
    std::fs::write(&path, "5000,2048,2\n5003,1024,1\n").unwrap();

    let cli = ReportCli {
        input: path,
        min: None,
        max: Some(3),
        format: OutputFormat::Json,
        series: true,
        log_level: "warn".to_owned(),
    };

    let mut out = Vec::new();
    report::execute(&cli, &mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(json["summary"]["records"], 2);
    assert_eq!(json["summary"]["span_ms"], 3);
    assert_eq!(json["summary"]["total_bytes"], 3072);
    assert_eq!(json["series"][1]["elapsed_ms"], 3);
    assert_eq!(json["window"]["max_ms"], 3);
}
