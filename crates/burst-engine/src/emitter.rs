//! 레코드 출력기: 닫힌 버킷을 한 줄의 텍스트 레코드로 기록
//!
//! 출력 형식 (헤더 없음, ASCII):
//! ```text
//! <epoch_millisecond>,<bytes_in>,<packets_in>\n
//! ```
//!
//! 버킷마다 한 번 쓰고 즉시 flush합니다. 비정상 종료 시에도 아직 닫히지 않은
//! 버킷 하나만 잃습니다.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use inbursts_core::error::OutputError;

use crate::accumulator::Bucket;

/// 버킷 하나를 출력 레코드 한 줄로 포맷합니다.
pub fn format_record(bucket: &Bucket) -> String {
    format!(
        "{},{},{}\n",
        bucket.start_millis, bucket.bytes_in, bucket.packets_in
    )
}

/// 버스트 레코드 출력기
///
/// `close()` 이후의 쓰기는 [`OutputError::Closed`]를 반환합니다.
#[derive(Debug)]
pub struct RecordEmitter<W: Write> {
    sink: Option<W>,
    records_written: u64,
}

impl RecordEmitter<File> {
    /// 출력 파일을 생성(또는 비움)하고 출력기를 만듭니다.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> RecordEmitter<W> {
    /// 임의의 싱크로 출력기를 생성합니다.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Some(sink),
            records_written: 0,
        }
    }

    /// 버킷 하나를 기록합니다.
    pub fn emit(&mut self, bucket: &Bucket) -> Result<(), OutputError> {
        let sink = self.sink.as_mut().ok_or(OutputError::Closed)?;
        let line = format_record(bucket);
        sink.write_all(line.as_bytes()).map_err(OutputError::Write)?;
        sink.flush().map_err(OutputError::Write)?;
        self.records_written += 1;
        Ok(())
    }

    /// 지금까지 기록한 레코드 수
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// 싱크가 닫혔는지 여부
    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// 싱크를 flush하고 닫습니다. 두 번째 호출부터는 아무 일도 하지 않습니다.
    pub fn close(&mut self) -> Result<(), OutputError> {
        match self.sink.take() {
            Some(mut sink) => sink.flush().map_err(OutputError::Write),
            None => Ok(()),
        }
    }

    /// 싱크를 돌려받습니다 (닫혔으면 `None`).
    pub fn into_inner(self) -> Option<W> {
        self.sink
    }
}
