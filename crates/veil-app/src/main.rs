//! # veil-app
//!
//! VEIL 바이너리 진입점.
//! 설정 로드, 협력자(검출기/OCR/로그) 조립, 시작 검증, 감시 루프와 워커 풀 오케스트레이션.

mod in_flight;
mod lifecycle;
mod startup;
mod watcher;
mod worker_pool;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use veil_core::config::AppConfig;
use veil_core::config_manager::ConfigManager;
use veil_core::ports::face_detector::FaceDetector;
use veil_core::ports::text_recognizer::TextRecognizer;
use veil_vision::pipeline::{FileOutcome, ImagePipeline};

use crate::in_flight::InFlightSet;
use crate::lifecycle::LifecycleManager;
use crate::startup::{ConfigOverrides, StartupError};
use crate::watcher::IngestWatcher;
use crate::worker_pool::WorkerPool;

/// VEIL 이미지 수집 파이프라인
///
/// 디렉토리에 들어온 이미지의 얼굴을 블러 처리하고, 인쇄된 텍스트를 추출해 로그에 남긴다.
#[derive(Parser, Debug)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 감시 디렉토리
    #[arg(long, global = true)]
    watch_dir: Option<PathBuf>,

    /// 출력 디렉토리
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// 텍스트 로그 파일 (JSON Lines)
    #[arg(long, global = true)]
    text_log: Option<PathBuf>,

    /// 워커 수
    #[arg(long, short = 'w', global = true)]
    workers: Option<usize>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 감시 디렉토리를 계속 감시 (기본)
    Watch,
    /// 지정한 파일만 한 번 처리하고 종료
    Process {
        /// 처리할 이미지 파일
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "veil={0},veil_app={0},veil_core={0},veil_vision={0},veil_storage={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => run_watch(config).await,
        Command::Process { files } => run_process(config, files).await,
    }
}

/// 설정 파일 로드 후 CLI 인자로 덮어쓰기
///
/// `--config`가 없으면 플랫폼 설정 경로를 쓰고, 그 경로조차 없을 때만 기본 설정으로 시작한다.
fn load_config(args: &Args) -> Result<AppConfig, StartupError> {
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => match ConfigManager::default_config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("설정 경로를 결정할 수 없음, 기본 설정 사용: {e}");
                None
            }
        },
    };

    let overrides = ConfigOverrides {
        watch_dir: args.watch_dir.clone(),
        output_dir: args.output_dir.clone(),
        text_log: args.text_log.clone(),
        workers: args.workers,
    };
    startup::resolve_config(config_path, &overrides)
}

/// 설정에 맞는 얼굴 검출기 조립
fn build_face_detector(config: &AppConfig) -> Result<Arc<dyn FaceDetector>, StartupError> {
    #[cfg(feature = "haar")]
    if let Some(model) = &config.face.cascade_path {
        let detector = veil_vision::face::HaarFaceDetector::load(model, &config.face)
            .map_err(StartupError::Detector)?;
        return Ok(Arc::new(detector));
    }

    #[cfg(not(feature = "haar"))]
    if config.face.cascade_path.is_some() {
        warn!("haar feature 없이 빌드됨: face.cascade_path 무시");
    }

    warn!("얼굴 검출 모델 미설정: 얼굴 블러 비활성");
    Ok(Arc::new(veil_vision::face::NoOpFaceDetector))
}

/// 설정에 맞는 텍스트 인식기 조립
fn build_text_recognizer(config: &AppConfig) -> Arc<dyn TextRecognizer> {
    #[cfg(feature = "ocr")]
    {
        let recognizer = veil_vision::ocr::TesseractRecognizer::from_config(&config.text);
        info!(language = %config.text.language, "Tesseract OCR 사용");
        Arc::new(recognizer)
    }

    #[cfg(not(feature = "ocr"))]
    {
        let _ = config;
        warn!("ocr feature 없이 빌드됨: 텍스트 추출 비활성");
        Arc::new(veil_vision::recognizer::NoOpTextRecognizer)
    }
}

/// 텍스트 로그를 열고 파이프라인 조립 (출력 디렉토리는 준비된 상태)
fn build_pipeline(config: &AppConfig) -> Result<Arc<ImagePipeline>, StartupError> {
    let text_log = startup::open_text_log(&config.paths.text_log)?;
    let detector = build_face_detector(config)?;
    let recognizer = build_text_recognizer(config);

    info!(
        detector = detector.name(),
        recognizer = recognizer.name(),
        "파이프라인 구성 완료"
    );

    Ok(Arc::new(ImagePipeline::new(
        config,
        detector,
        recognizer,
        Arc::new(text_log),
    )))
}

/// 데몬 모드: 종료 시그널까지 감시
async fn run_watch(config: AppConfig) -> Result<()> {
    startup::validate_watch_dir(&config.paths.watch_dir)?;
    startup::prepare_output_dir(&config.paths.output_dir)?;
    startup::ensure_distinct_dirs(&config.paths.watch_dir, &config.paths.output_dir)?;
    let pipeline = build_pipeline(&config)?;

    let watcher = IngestWatcher::new(
        config.paths.watch_dir.clone(),
        config.ingest.clone(),
        pipeline,
        InFlightSet::new(),
    );
    let subscription = watcher.subscribe()?;
    let pool = WorkerPool::new(config.ingest.worker_count);

    let lifecycle = Arc::new(LifecycleManager::new());
    let shutdown_rx = lifecycle.subscribe();
    let _signals = lifecycle
        .listen_for_signals()
        .map_err(StartupError::Signal)?;

    info!(
        watch_dir = %config.paths.watch_dir.display(),
        output_dir = %config.paths.output_dir.display(),
        workers = pool.size(),
        "VEIL 시작"
    );

    watcher.run(subscription, &pool, shutdown_rx).await;
    if !lifecycle.is_shutting_down() {
        warn!("감시 이벤트 스트림 종료");
    }

    info!(pending = pool.active(), "대기 중인 작업 처리 후 종료");
    let stats = pool.shutdown().await;
    info!(
        processed = stats.completed,
        peak_workers = stats.peak_active,
        "VEIL 종료"
    );
    Ok(())
}

/// 단발 모드: 주어진 파일을 순서대로 처리
async fn run_process(config: AppConfig, files: Vec<PathBuf>) -> Result<()> {
    startup::prepare_output_dir(&config.paths.output_dir)?;
    let pipeline = build_pipeline(&config)?;
    let total = files.len();
    let mut failed = 0usize;

    for file in files {
        let pipeline = Arc::clone(&pipeline);
        let outcome = tokio::task::spawn_blocking(move || pipeline.run(&file)).await;
        match outcome {
            Ok(FileOutcome::Processed(_)) => {}
            Ok(_) => failed += 1,
            Err(e) => {
                error!("처리 작업 비정상 종료: {e}");
                failed += 1;
            }
        }
    }

    info!(total, failed, "단발 처리 완료");
    if failed > 0 {
        bail!("{failed}/{total}개 파일 처리 실패");
    }
    Ok(())
}
