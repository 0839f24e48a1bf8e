//! `inbursts-report` command handler.
//!
//! Reads a burst record file, applies the optional elapsed-time window and
//! renders the summary (and optionally the plotted series) as text or JSON.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use inbursts_core::InburstsError;
use inbursts_engine::{BurstSeries, Peak, SeriesPoint, SeriesSummary};

use crate::cli::ReportCli;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// One row of the plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    pub elapsed_ms: u64,
    pub kbytes_in: f64,
    pub packets_in: u64,
}

impl From<&SeriesPoint> for SeriesRow {
    fn from(point: &SeriesPoint) -> Self {
        Self {
            elapsed_ms: point.elapsed_ms,
            kbytes_in: point.kbytes_in(),
            packets_in: point.record.packets_in,
        }
    }
}

/// Elapsed-time window applied to the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub min_ms: Option<u64>,
    pub max_ms: Option<u64>,
}

/// Report output payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    pub input: String,
    pub window: Window,
    pub summary: SeriesSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<SeriesRow>>,
}

impl ReportPayload {
    /// Build the payload from the parsed arguments.
    pub fn build(args: &ReportCli) -> Result<Self, CliError> {
        let series = BurstSeries::from_path(&args.input).map_err(InburstsError::from)?;
        let windowed = series
            .window(args.min, args.max)
            .map_err(InburstsError::from)?;

        info!(
            input = %args.input.display(),
            records = series.points().len(),
            skipped = series.skipped(),
            windowed = windowed.points().len(),
            "burst records loaded"
        );

        Ok(Self {
            input: args.input.display().to_string(),
            window: Window {
                min_ms: args.min,
                max_ms: args.max,
            },
            summary: windowed.summary(),
            series: args
                .series
                .then(|| windowed.points().iter().map(SeriesRow::from).collect()),
        })
    }
}

fn render_peak(peak: Option<Peak>) -> String {
    match peak {
        Some(p) => format!("{} at +{} ms", p.value, p.elapsed_ms),
        None => "-".to_owned(),
    }
}

fn render_bound(bound: Option<u64>, open: &str) -> String {
    bound.map_or_else(|| open.to_owned(), |ms| format!("{ms} ms"))
}

impl Render for ReportPayload {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let s = &self.summary;
        writeln!(w, "Input:            {}", self.input)?;
        writeln!(
            w,
            "Window:           {} .. {}",
            render_bound(self.window.min_ms, "start"),
            render_bound(self.window.max_ms, "end")
        )?;
        writeln!(w, "Records:          {} ({} skipped)", s.records, s.skipped)?;
        writeln!(w, "Span:             {} ms", s.span_ms)?;
        writeln!(
            w,
            "Total in:         {} bytes, {} packets",
            s.total_bytes, s.total_packets
        )?;
        writeln!(w, "Peak bytes/ms:    {}", render_peak(s.peak_bytes))?;
        writeln!(w, "Peak packets/ms:  {}", render_peak(s.peak_packets))?;
        writeln!(
            w,
            "Mean per bucket:  {:.1} bytes, {:.2} packets",
            s.mean_bytes, s.mean_packets
        )?;

        if let Some(rows) = &self.series {
            writeln!(w)?;
            writeln!(w, "elapsed_ms,kbytes_in,packets_in")?;
            for row in rows {
                writeln!(w, "{},{:.3},{}", row.elapsed_ms, row.kbytes_in, row.packets_in)?;
            }
        }
        Ok(())
    }
}

/// Execute the report and write it to `w`.
pub fn execute(args: &ReportCli, w: &mut dyn Write) -> Result<(), CliError> {
    let payload = ReportPayload::build(args)?;
    OutputWriter::new(args.format).render_to(&payload, w)
}
