//! 시작 시 검증.
//!
//! 설정 로드와 CLI 덮어쓰기, 감시/출력 디렉토리 확인, 텍스트 로그 열기.
//! 여기서 발생한 에러는 모두 치명적이며 프로세스는 0이 아닌 코드로 종료한다.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use veil_core::config::AppConfig;
use veil_core::config_manager::ConfigManager;
use veil_core::error::CoreError;
use veil_storage::text_log::JsonlTextLog;

/// 쓰기 확인용 임시 파일 이름
const WRITE_PROBE_NAME: &str = ".veil-write-probe";

/// 시작 단계 에러
#[derive(Debug, Error)]
pub enum StartupError {
    /// 설정 로드/검증 실패
    #[error("설정 에러: {0}")]
    Config(#[source] CoreError),

    /// 감시 디렉토리 없음
    #[error("감시 디렉토리가 없습니다: {0}")]
    WatchDirMissing(PathBuf),

    /// 감시 경로가 디렉토리가 아님
    #[error("감시 경로가 디렉토리가 아닙니다: {0}")]
    WatchDirNotDirectory(PathBuf),

    /// 출력 디렉토리 생성/쓰기 불가
    #[error("출력 디렉토리에 쓸 수 없습니다: {path}: {source}")]
    OutputDirNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 출력 디렉토리가 감시 디렉토리와 같음
    #[error("출력 디렉토리가 감시 디렉토리와 같습니다: {0}")]
    OutputIsWatchDir(PathBuf),

    /// 텍스트 로그 열기 실패
    #[error("텍스트 로그를 열 수 없습니다: {0}")]
    TextLog(#[source] CoreError),

    /// 얼굴 검출 모델 로드 실패
    #[error("얼굴 검출기 초기화 실패: {0}")]
    Detector(#[source] CoreError),

    /// 파일 시스템 감시 시작 실패
    #[error("디렉토리 감시 시작 실패: {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// 종료 시그널 핸들러 등록 실패
    #[error("시그널 핸들러 등록 실패: {0}")]
    Signal(#[source] std::io::Error),
}

/// CLI에서 받은 설정 덮어쓰기 값
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub watch_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub text_log: Option<PathBuf>,
    pub workers: Option<usize>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.watch_dir {
            config.paths.watch_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir = dir.clone();
        }
        if let Some(path) = &self.text_log {
            config.paths.text_log = path.clone();
        }
        if let Some(workers) = self.workers {
            config.ingest.worker_count = workers;
        }
    }
}

/// 설정 파일 로드 → 덮어쓰기 적용 → 검증
///
/// `config_path`가 `None`이면 (플랫폼 설정 경로 없음) 기본 설정에서 시작한다.
/// 파일이 있는데 읽거나 파싱할 수 없으면 에러.
pub fn resolve_config(
    config_path: Option<PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<AppConfig, StartupError> {
    let mut config = match config_path {
        Some(path) => {
            let manager = ConfigManager::with_path(path).map_err(StartupError::Config)?;
            info!("설정 파일: {}", manager.config_path().display());
            manager.get()
        }
        None => AppConfig::default_config(),
    };

    overrides.apply(&mut config);
    config.validate().map_err(StartupError::Config)?;
    Ok(config)
}

/// 감시 디렉토리가 존재하는 디렉토리인지 확인
pub fn validate_watch_dir(path: &Path) -> Result<(), StartupError> {
    if !path.exists() {
        return Err(StartupError::WatchDirMissing(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(StartupError::WatchDirNotDirectory(path.to_path_buf()));
    }
    debug!("감시 디렉토리 확인: {}", path.display());
    Ok(())
}

/// 출력 디렉토리 생성 후 쓰기 확인 파일을 기록/삭제
pub fn prepare_output_dir(path: &Path) -> Result<(), StartupError> {
    let not_writable = |source| StartupError::OutputDirNotWritable {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(path).map_err(not_writable)?;
    let probe = path.join(WRITE_PROBE_NAME);
    fs::write(&probe, b"probe").map_err(not_writable)?;
    fs::remove_file(&probe).map_err(not_writable)?;

    info!("출력 디렉토리 확인: {}", path.display());
    Ok(())
}

/// 출력 디렉토리가 감시 디렉토리와 다른지 확인 (두 디렉토리 모두 존재해야 함)
pub fn ensure_distinct_dirs(watch_dir: &Path, output_dir: &Path) -> Result<(), StartupError> {
    let watch = fs::canonicalize(watch_dir)
        .map_err(|_| StartupError::WatchDirMissing(watch_dir.to_path_buf()))?;
    let output =
        fs::canonicalize(output_dir).map_err(|source| StartupError::OutputDirNotWritable {
            path: output_dir.to_path_buf(),
            source,
        })?;

    if watch == output {
        return Err(StartupError::OutputIsWatchDir(output));
    }
    Ok(())
}

/// 텍스트 로그 열기 (상위 디렉토리 생성 포함)
pub fn open_text_log(path: &Path) -> Result<JsonlTextLog, StartupError> {
    JsonlTextLog::open(path).map_err(StartupError::TextLog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_watch_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = validate_watch_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, StartupError::WatchDirMissing(_)));
    }

    #[test]
    fn watch_path_must_be_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let err = validate_watch_dir(&file).unwrap_err();
        assert!(matches!(err, StartupError::WatchDirNotDirectory(_)));
        assert!(validate_watch_dir(dir.path()).is_ok());
    }

    #[test]
    fn output_dir_created_and_probe_removed() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("processed").join("images");

        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn output_dir_under_file_is_not_writable() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("blocker");
        fs::write(&file, "x").unwrap();

        let err = prepare_output_dir(&file.join("out")).unwrap_err();
        assert!(matches!(err, StartupError::OutputDirNotWritable { .. }));
    }

    #[test]
    fn text_log_parent_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image_text").join("image_text.jsonl");
        open_text_log(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn output_dir_must_differ_from_watch_dir() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        fs::create_dir_all(&raw).unwrap();
        fs::create_dir_all(&processed).unwrap();

        assert!(ensure_distinct_dirs(&raw, &processed).is_ok());

        let err = ensure_distinct_dirs(&raw, &raw).unwrap_err();
        assert!(matches!(err, StartupError::OutputIsWatchDir(_)));

        // 표기만 다른 같은 디렉토리
        let aliased = dir.path().join("processed").join("..").join("raw");
        let err = ensure_distinct_dirs(&raw, &aliased).unwrap_err();
        assert!(matches!(err, StartupError::OutputIsWatchDir(_)));
    }

    #[test]
    fn overrides_apply_before_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "ingest": { "worker_count": 0 } }"#).unwrap();

        let err = resolve_config(Some(path.clone()), &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, StartupError::Config(CoreError::Validation { .. })));

        let overrides = ConfigOverrides {
            workers: Some(2),
            watch_dir: Some(dir.path().join("in")),
            ..Default::default()
        };
        let config = resolve_config(Some(path), &overrides).unwrap();
        assert_eq!(config.ingest.worker_count, 2);
        assert_eq!(config.paths.watch_dir, dir.path().join("in"));
    }

    #[test]
    fn unreadable_config_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ broken").unwrap();

        let err = resolve_config(Some(path), &ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, StartupError::Config(CoreError::Config(_))));
    }

    #[test]
    fn missing_platform_path_uses_defaults() {
        let config = resolve_config(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.ingest.worker_count, 3);
    }
}
