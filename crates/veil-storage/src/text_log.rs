//! 추출 텍스트 로그 (JSON Lines).
//!
//! 레코드 한 건 = JSON 한 줄. 파일은 append 모드로 한 번 열어 프로세스 수명 동안 유지한다.
//! 각 줄은 뮤텍스 안에서 단일 `write_all`로 기록되므로 동시 기록 시에도 줄이 섞이지 않는다.

use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use veil_core::error::CoreError;
use veil_core::models::text_record::TextRecord;
use veil_core::ports::text_sink::TextRecordSink;

/// 추가 전용 텍스트 로그: `TextRecordSink` 포트 구현
pub struct JsonlTextLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl JsonlTextLog {
    /// 로그 파일 열기 (없으면 생성, 상위 디렉토리 포함)
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::LogAppend(format!(
                        "로그 디렉토리 생성 실패: {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                CoreError::LogAppend(format!("로그 파일 열기 실패: {}: {e}", path.display()))
            })?;

        info!("텍스트 로그 열기: {}", path.display());

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    /// 로그 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 로그 파일의 모든 레코드 읽기 (기록 순서)
    pub fn read_all(path: &Path) -> Result<Vec<TextRecord>, CoreError> {
        let file = File::open(path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl TextRecordSink for JsonlTextLog {
    fn append(&self, record: &TextRecord) -> Result<(), CoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.file
            .lock()
            .write_all(&line)
            .map_err(|e| CoreError::LogAppend(format!("{}: {e}", self.path.display())))?;

        debug!(file = %record.source_file_name, bytes = line.len(), "텍스트 레코드 기록");
        Ok(())
    }
}
