//! `inbursts` capture run: source setup, signal wiring and the blocking frame loop.
//!
//! Setup order: device, local address, capture handle (link type and
//! filter), signal handlers, output file. Any failure before the loop starts
//! is a setup failure.

use std::io::Write;
use std::net::Ipv4Addr;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use inbursts_core::InburstsError;
use inbursts_core::config::{CaptureConfig, InburstsConfig};
use inbursts_core::error::ConfigError;
use inbursts_engine::{
    FrameSource, PcapSource, RecordEmitter, RunController, RunState, RunSummary, local_ipv4,
    resolve_device,
};

use crate::error::CliError;
use crate::signal::ShutdownSignals;

/// Open the configured frame source and determine the local IPv4 address.
///
/// A savefile replay has no interface address, so `capture.local_addr`
/// must be set.
pub fn open_source(capture: &CaptureConfig) -> Result<(PcapSource, Ipv4Addr), CliError> {
    let local_override = capture.local_addr()?;

    if let Some(path) = capture.savefile() {
        let local_addr = local_override.ok_or_else(|| {
            InburstsError::from(ConfigError::InvalidValue {
                field: "capture.local_addr".to_owned(),
                reason: "required when replaying a savefile".to_owned(),
            })
        })?;
        let source = PcapSource::open_savefile(path, capture)?;
        return Ok((source, local_addr));
    }

    let device = resolve_device(capture.interface())?;
    let local_addr = match local_override {
        Some(addr) => addr,
        None => local_ipv4(&device)?,
    };
    let source = PcapSource::open_live(device, capture)?;
    Ok((source, local_addr))
}

/// Run a capture with the given configuration until the frame limit,
/// a termination signal or the end of a savefile.
pub async fn run(config: &InburstsConfig) -> Result<RunSummary, CliError> {
    let (source, local_addr) = open_source(&config.capture)?;
    let signals = ShutdownSignals::install()?;
    let emitter = RecordEmitter::create(&config.output.path).map_err(InburstsError::from)?;

    eprintln!("Starting to collect on {}", source.describe());
    eprintln!("Outputting data to {}", config.output.path);
    info!(
        source = source.describe(),
        local_addr = %local_addr,
        output = config.output.path.as_str(),
        "inbursts starting"
    );

    let token = CancellationToken::new();
    let done = CancellationToken::new();
    let signal_task = signals.spawn(token.clone(), done.clone());

    let result = drive(
        source,
        RunState::new(local_addr, emitter),
        config.capture.frame_limit(),
        token.clone(),
    )
    .await;

    done.cancel();
    if let Err(e) = signal_task.await {
        debug!(error = %e, "signal task join failed");
    }

    result
}

/// Drive a frame loop on the blocking thread pool.
///
/// On a runtime failure the totals gathered so far are still reported on
/// stderr before the error is returned.
pub async fn drive<S, W>(
    source: S,
    state: RunState<W>,
    frame_limit: Option<u64>,
    token: CancellationToken,
) -> Result<RunSummary, CliError>
where
    S: FrameSource + Send + 'static,
    W: Write + Send + 'static,
{
    let mut controller = RunController::builder()
        .source(source)
        .state(state)
        .frame_limit(frame_limit)
        .cancel_token(token)
        .build()?;

    let (result, totals) = tokio::task::spawn_blocking(move || {
        let result = controller.run();
        (result, *controller.state().totals())
    })
    .await
    .map_err(|e| CliError::Runtime(e.to_string()))?;

    result.map_err(|e| {
        error!(
            error = %e,
            frames = totals.frames,
            inbound_frames = totals.inbound_frames,
            "capture aborted"
        );
        eprintln!("\nCapture aborted\n{totals}");
        CliError::from(e)
    })
}
