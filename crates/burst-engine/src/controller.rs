//! 실행 컨트롤러: 프레임 루프 구동과 종료 처리
//!
//! [`RunController`]는 빌더 패턴([`RunControllerBuilder`])으로 생성하며,
//! 프레임 소스에서 프레임을 하나씩 가져와 [`RunState`]에 전달합니다.
//!
//! # 아키텍처
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐     ┌────────────────┐
//! │ FrameSource  │────▶│ decode_frame │────▶│ BurstAccumulator │────▶│ RecordEmitter  │
//! │ (pcap/memory)│     │              │     │ (rollover)       │     │ (output sink)  │
//! └──────────────┘     └──────────────┘     └──────────────────┘     └────────────────┘
//!        ▲                                          │
//!        │ CancellationToken (signal task)          ▼
//!   RunController ────────────────────────────▶ RunTotals
//! ```
//!
//! 종료 요청은 토큰 취소로만 전달되며, 실제 flush/close는 항상 루프를 돌던
//! 스레드에서 프레임 처리 사이에 수행됩니다.
//!
//! # 사용 예시
//! ```ignore
//! let state = RunState::new(local_addr, RecordEmitter::create("inbursts.out")?);
//! let mut controller = RunController::builder()
//!     .source(source)
//!     .state(state)
//!     .frame_limit(Some(1000))
//!     .cancel_token(token.clone())
//!     .build()?;
//!
//! let summary = controller.run()?;
//! ```

use std::fmt;
use std::io::Write;
use std::net::Ipv4Addr;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use inbursts_core::error::{ConfigError, InburstsError, OutputError};
use inbursts_core::metrics as m;
use inbursts_core::types::CapturedFrame;

use crate::accumulator::BurstAccumulator;
use crate::capture::{CaptureStats, FrameSource, NextFrame};
use crate::decoder::decode_frame;
use crate::emitter::RecordEmitter;
use crate::stats::RunTotals;

/// 프레임 하나의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// 로컬 주소로 향한 프레임
    Inbound,
    /// 다른 주소로 향한 프레임
    Other,
    /// IP 헤더가 잘못되어 버려진 프레임
    Malformed,
}

/// 루프가 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 프레임 수 제한 도달
    FrameLimit,
    /// 외부 종료 요청
    Cancelled,
    /// 소스 소진
    SourceExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FrameLimit => "frame limit reached",
            Self::Cancelled => "termination requested",
            Self::SourceExhausted => "capture source exhausted",
        };
        f.write_str(s)
    }
}

/// 실행 요약
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// 실행 전체 통계
    pub totals: RunTotals,
    /// 캡처 장치가 전달한 프레임 수 (잘못된 프레임 포함)
    pub frames_delivered: u64,
    /// 출력된 레코드 수
    pub records_written: u64,
    /// 종료 이유
    pub stop_reason: StopReason,
    /// 캡처 장치 통계
    pub capture_stats: Option<CaptureStats>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Capture completed ({})", self.stop_reason)?;
        write!(f, "{}", self.totals)?;
        if let Some(stats) = &self.capture_stats {
            write!(
                f,
                "\nKernel received {} packets, dropped {} (interface dropped {})",
                stats.received, stats.dropped, stats.if_dropped
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// RunState
// =============================================================================

/// 실행 상태: 누적기, 출력기, 통계를 하나로 소유
///
/// 전역 상태 대신 컨트롤러가 소유하며, 종료 경로도 같은 인스턴스를 사용합니다.
#[derive(Debug)]
pub struct RunState<W: Write> {
    local_addr: Ipv4Addr,
    accumulator: BurstAccumulator,
    emitter: RecordEmitter<W>,
    totals: RunTotals,
    finished: bool,
    failed: bool,
}

impl<W: Write> RunState<W> {
    /// 새 실행 상태를 생성합니다.
    pub fn new(local_addr: Ipv4Addr, emitter: RecordEmitter<W>) -> Self {
        Self {
            local_addr,
            accumulator: BurstAccumulator::new(),
            emitter,
            totals: RunTotals::new(),
            finished: false,
            failed: false,
        }
    }

    /// 인바운드 판정 기준 주소
    pub fn local_addr(&self) -> Ipv4Addr {
        self.local_addr
    }

    /// 현재까지의 통계
    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    /// 누적기 (열린 버킷 조회용)
    pub fn accumulator(&self) -> &BurstAccumulator {
        &self.accumulator
    }

    /// 출력기
    pub fn emitter(&self) -> &RecordEmitter<W> {
        &self.emitter
    }

    /// 종료 처리가 끝났는지 여부
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 레코드 쓰기가 실패했는지 여부
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// 캡처된 프레임 하나를 처리합니다.
    ///
    /// 잘못된 헤더의 프레임은 카운터에 영향 없이 버립니다.
    /// 롤오버로 닫힌 버킷의 쓰기 실패는 치명적 에러로 전파하며, 이후 이 상태는
    /// 더 이상 프레임을 받지 않습니다. 실패를 일으킨 프레임은 집계되지 않습니다.
    pub fn process_frame(
        &mut self,
        frame: &CapturedFrame<'_>,
    ) -> Result<FrameOutcome, InburstsError> {
        if self.finished {
            return Err(OutputError::Closed.into());
        }
        if self.failed {
            return Err(InburstsError::Aborted(
                "an earlier burst record write failed".to_owned(),
            ));
        }

        let packet = match decode_frame(frame) {
            Ok(packet) => packet,
            Err(_) => {
                metrics::counter!(m::FRAMES_MALFORMED_TOTAL).increment(1);
                return Ok(FrameOutcome::Malformed);
            }
        };

        let is_inbound = packet.destination == self.local_addr;
        if let Some(bucket) =
            self.accumulator
                .observe(frame.timestamp, packet.frame_len, is_inbound)
        {
            if let Err(e) = self.emitter.emit(&bucket) {
                self.failed = true;
                return Err(e.into());
            }
            self.totals.record_bucket(&bucket);
        }
        self.totals.record_frame(packet.frame_len, is_inbound);

        Ok(if is_inbound {
            FrameOutcome::Inbound
        } else {
            FrameOutcome::Other
        })
    }

    /// 열린 버킷을 출력하고 싱크를 닫습니다.
    ///
    /// 여러 번 호출해도 버킷은 한 번만 출력되고 싱크도 한 번만 닫힙니다.
    /// 쓰기 실패 이후에는 열린 버킷을 버리고 싱크만 닫으므로, 출력 파일은
    /// 실패한 레코드 직전까지의 연속된 레코드만 담습니다.
    pub fn finish(&mut self) -> Result<RunTotals, InburstsError> {
        if self.finished {
            return Ok(self.totals);
        }

        if self.failed {
            if let Some(bucket) = self.accumulator.drain() {
                debug!(
                    start_millis = bucket.start_millis,
                    "dropping open bucket after write failure"
                );
            }
        } else if let Some(bucket) = self.accumulator.drain() {
            if let Err(e) = self.emitter.emit(&bucket) {
                self.failed = true;
                return Err(e.into());
            }
            self.totals.record_bucket(&bucket);
        }
        self.emitter.close()?;
        self.finished = true;

        Ok(self.totals)
    }
}

// =============================================================================
// RunController
// =============================================================================

/// 실행 컨트롤러
pub struct RunController<S: FrameSource, W: Write> {
    source: S,
    state: RunState<W>,
    frame_limit: Option<u64>,
    cancel: CancellationToken,
    frames_delivered: u64,
    summary: Option<RunSummary>,
    aborted: Option<String>,
}

/// 실행 컨트롤러 빌더
pub struct RunControllerBuilder<S: FrameSource, W: Write> {
    source: Option<S>,
    state: Option<RunState<W>>,
    frame_limit: Option<u64>,
    cancel: Option<CancellationToken>,
}

impl<S: FrameSource, W: Write> RunControllerBuilder<S, W> {
    fn new() -> Self {
        Self {
            source: None,
            state: None,
            frame_limit: None,
            cancel: None,
        }
    }

    /// 프레임 소스를 지정합니다.
    pub fn source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    /// 실행 상태를 지정합니다.
    pub fn state(mut self, state: RunState<W>) -> Self {
        self.state = Some(state);
        self
    }

    /// 프레임 수 제한을 지정합니다 (`None`이면 무제한).
    pub fn frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// 외부 종료 요청 토큰을 지정합니다.
    ///
    /// 지정하지 않으면 내부적으로 생성하며 [`RunController::cancel_token`]으로 얻을 수 있습니다.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// 컨트롤러를 생성합니다.
    ///
    /// # 에러
    /// - `ConfigError::InvalidValue`: 소스나 상태가 누락된 경우
    pub fn build(self) -> Result<RunController<S, W>, InburstsError> {
        let source = self.source.ok_or_else(|| ConfigError::InvalidValue {
            field: "source".to_owned(),
            reason: "frame source is required".to_owned(),
        })?;
        let state = self.state.ok_or_else(|| ConfigError::InvalidValue {
            field: "state".to_owned(),
            reason: "run state is required".to_owned(),
        })?;

        Ok(RunController {
            source,
            state,
            frame_limit: self.frame_limit,
            cancel: self.cancel.unwrap_or_default(),
            frames_delivered: 0,
            summary: None,
            aborted: None,
        })
    }
}

impl<S: FrameSource, W: Write> RunController<S, W> {
    /// 빌더를 반환합니다.
    pub fn builder() -> RunControllerBuilder<S, W> {
        RunControllerBuilder::new()
    }

    /// 종료 요청 토큰 (복제하여 시그널 태스크에 전달)
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 실행 상태
    pub fn state(&self) -> &RunState<W> {
        &self.state
    }

    /// 캡처 장치가 지금까지 전달한 프레임 수
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    /// 프레임 루프를 실행하고 종료 처리 후 요약을 반환합니다.
    ///
    /// 이미 종료된 컨트롤러에서 다시 호출하면 루프 없이 같은 요약을 반환합니다.
    /// 에러로 중단된 뒤에는 소스를 건드리지 않고 [`InburstsError::Aborted`]를 반환합니다.
    pub fn run(&mut self) -> Result<RunSummary, InburstsError> {
        self.check_terminal()?;
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        info!(
            source = self.source.describe(),
            local_addr = %self.state.local_addr(),
            frame_limit = ?self.frame_limit,
            "starting capture loop"
        );

        let stop_reason = match self.drive() {
            Ok(reason) => reason,
            Err(e) => {
                warn!(error = %e, "capture loop aborted");
                self.aborted = Some(e.to_string());
                // 싱크가 살아 있으면 열린 버킷은 남김
                if let Err(finish_err) = self.state.finish() {
                    debug!(error = %finish_err, "terminal flush after abort failed");
                }
                return Err(e);
            }
        };

        self.shutdown(stop_reason)
    }

    /// 종료 처리: 열린 버킷 출력, 싱크 닫기, 요약 생성
    ///
    /// 두 번째 호출부터는 추가 출력 없이 첫 번째 요약을 반환합니다.
    pub fn shutdown(&mut self, stop_reason: StopReason) -> Result<RunSummary, InburstsError> {
        self.check_terminal()?;
        if let Some(summary) = &self.summary {
            return Ok(summary.clone());
        }

        let totals = match self.state.finish() {
            Ok(totals) => totals,
            Err(e) => {
                self.aborted = Some(e.to_string());
                return Err(e);
            }
        };
        let summary = RunSummary {
            totals,
            frames_delivered: self.frames_delivered,
            records_written: self.state.emitter().records_written(),
            stop_reason,
            capture_stats: self.source.capture_stats(),
        };

        info!(
            reason = %stop_reason,
            frames = totals.frames,
            inbound_frames = totals.inbound_frames,
            max_bytes_in = totals.max_bytes_in,
            max_packets_in = totals.max_packets_in,
            records = summary.records_written,
            "capture completed"
        );

        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// 중단된 실행인지 여부
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    fn check_terminal(&self) -> Result<(), InburstsError> {
        match &self.aborted {
            Some(reason) => Err(InburstsError::Aborted(reason.clone())),
            None => Ok(()),
        }
    }

    fn drive(&mut self) -> Result<StopReason, InburstsError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }
            if self
                .frame_limit
                .is_some_and(|limit| self.frames_delivered >= limit)
            {
                return Ok(StopReason::FrameLimit);
            }

            match self.source.next_frame()? {
                NextFrame::Frame(frame) => {
                    self.frames_delivered += 1;
                    self.state.process_frame(&frame)?;
                }
                NextFrame::Idle => continue,
                NextFrame::Exhausted => return Ok(StopReason::SourceExhausted),
            }
        }
    }
}
