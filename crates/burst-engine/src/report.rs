//! 버스트 리포트: 출력 파일을 읽어 경과 시간 기준 시계열과 요약을 계산
//!
//! 입력은 [`crate::emitter`]가 쓰는 `<epoch_millisecond>,<bytes_in>,<packets_in>` 레코드입니다.
//! 필드가 정확히 세 개가 아니거나 숫자가 아닌 줄은 건너뛰고 개수만 셉니다.
//!
//! 경과 시간은 첫 번째 유효 레코드를 0으로 합니다. 첫 레코드보다 이른
//! 타임스탬프(역행)는 0으로 고정됩니다.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use inbursts_core::error::ReportError;

/// 레코드 한 줄 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseRecordError {
    /// 필드 수가 3이 아님
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    /// 숫자가 아닌 필드
    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

/// 출력 파일의 레코드 한 줄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BurstRecord {
    /// 버킷 시작 epoch 밀리초
    pub timestamp_millis: u64,
    /// 인바운드 바이트 수
    pub bytes_in: u64,
    /// 인바운드 패킷 수
    pub packets_in: u64,
}

impl FromStr for BurstRecord {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        let [ts, bytes, packets] = fields.as_slice() else {
            return Err(ParseRecordError::FieldCount(fields.len()));
        };

        Ok(Self {
            timestamp_millis: parse_field("timestamp", ts)?,
            bytes_in: parse_field("bytes_in", bytes)?,
            packets_in: parse_field("packets_in", packets)?,
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<u64, ParseRecordError> {
    let value = value.trim();
    value.parse().map_err(|_| ParseRecordError::InvalidNumber {
        field,
        value: value.to_owned(),
    })
}

/// 시계열의 한 점
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// 첫 레코드로부터의 경과 밀리초
    pub elapsed_ms: u64,
    /// 원본 레코드
    pub record: BurstRecord,
}

impl SeriesPoint {
    /// 킬로바이트 단위 인바운드 양 (bytes / 1024)
    #[allow(clippy::cast_precision_loss)]
    pub fn kbytes_in(&self) -> f64 {
        self.record.bytes_in as f64 / 1024.0
    }
}

/// 경과 시간 기준 버스트 시계열
#[derive(Debug, Clone, Default)]
pub struct BurstSeries {
    points: Vec<SeriesPoint>,
    skipped: u64,
}

impl BurstSeries {
    /// 리더에서 레코드를 읽어 시계열을 만듭니다.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut series = Self::default();
        let mut origin = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<BurstRecord>() {
                Ok(record) => {
                    let origin = *origin.get_or_insert(record.timestamp_millis);
                    series.points.push(SeriesPoint {
                        elapsed_ms: record.timestamp_millis.saturating_sub(origin),
                        record,
                    });
                }
                Err(e) => {
                    debug!(line = index + 1, error = %e, "skipping burst record");
                    series.skipped += 1;
                }
            }
        }

        Ok(series)
    }

    /// 파일에서 시계열을 읽습니다.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let read_err = |source: io::Error| ReportError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_err)?;
        Self::from_reader(BufReader::new(file)).map_err(read_err)
    }

    /// `min <= elapsed <= max`인 점만 남긴 시계열을 반환합니다.
    ///
    /// 경과 시간은 원래 시계열의 기준점을 유지합니다.
    pub fn window(&self, min: Option<u64>, max: Option<u64>) -> Result<Self, ReportError> {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ReportError::InvalidWindow { min, max });
            }
        }

        let points = self
            .points
            .iter()
            .filter(|p| min.is_none_or(|m| p.elapsed_ms >= m))
            .filter(|p| max.is_none_or(|m| p.elapsed_ms <= m))
            .copied()
            .collect();

        Ok(Self {
            points,
            skipped: self.skipped,
        })
    }

    /// 시계열의 점들
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// 건너뛴 줄 수
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// 점이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 요약 통계를 계산합니다.
    pub fn summary(&self) -> SeriesSummary {
        let records = self.points.len() as u64;
        let total = |value: fn(&BurstRecord) -> u64| {
            self.points
                .iter()
                .fold(0u64, |acc, p| acc.saturating_add(value(&p.record)))
        };
        let total_bytes = total(|r: &BurstRecord| r.bytes_in);
        let total_packets = total(|r: &BurstRecord| r.packets_in);

        let span_ms = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.elapsed_ms.saturating_sub(first.elapsed_ms),
            _ => 0,
        };

        // 동률이면 먼저 나온 점
        let peak = |value: fn(&BurstRecord) -> u64| {
            self.points
                .iter()
                .fold(None::<Peak>, |best, p| {
                    let v = value(&p.record);
                    match best {
                        Some(b) if b.value >= v => Some(b),
                        _ => Some(Peak {
                            elapsed_ms: p.elapsed_ms,
                            value: v,
                        }),
                    }
                })
        };

        #[allow(clippy::cast_precision_loss)]
        let mean = |total: u64| {
            if records == 0 {
                0.0
            } else {
                total as f64 / records as f64
            }
        };

        SeriesSummary {
            records,
            skipped: self.skipped,
            span_ms,
            total_bytes,
            total_packets,
            peak_bytes: peak(|r: &BurstRecord| r.bytes_in),
            peak_packets: peak(|r: &BurstRecord| r.packets_in),
            mean_bytes: mean(total_bytes),
            mean_packets: mean(total_packets),
        }
    }
}

/// 최대값과 그 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Peak {
    /// 최대값이 나온 경과 밀리초
    pub elapsed_ms: u64,
    /// 최대값
    pub value: u64,
}

/// 시계열 요약
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// 유효 레코드 수
    pub records: u64,
    /// 건너뛴 줄 수
    pub skipped: u64,
    /// 첫 레코드부터 마지막 레코드까지의 경과 밀리초
    pub span_ms: u64,
    /// 인바운드 바이트 합계
    pub total_bytes: u64,
    /// 인바운드 패킷 합계
    pub total_packets: u64,
    /// 바이트 최대 버킷
    pub peak_bytes: Option<Peak>,
    /// 패킷 최대 버킷
    pub peak_packets: Option<Peak>,
    /// 레코드당 평균 바이트
    pub mean_bytes: f64,
    /// 레코드당 평균 패킷
    pub mean_packets: f64,
}
