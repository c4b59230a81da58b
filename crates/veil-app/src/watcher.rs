//! 수집 디렉토리 감시.
//!
//! `notify` 콜백은 이벤트를 무제한 채널로 넘기기만 하고, 필터링/중복 제거/디스패치는
//! 제어 태스크에서 수행한다. 파일 단위 처리 실패는 감시 루프로 전파되지 않는다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use veil_core::config::IngestConfig;
use veil_vision::pipeline::ImagePipeline;

use crate::in_flight::InFlightSet;
use crate::startup::StartupError;
use crate::worker_pool::WorkerPool;

/// 활성화된 감시 구독. drop 시 감시가 해제된다.
pub struct Subscription {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

/// 수집 감시자
pub struct IngestWatcher {
    watch_dir: PathBuf,
    ingest: IngestConfig,
    pipeline: Arc<ImagePipeline>,
    in_flight: Arc<InFlightSet>,
}

impl IngestWatcher {
    pub fn new(
        watch_dir: PathBuf,
        ingest: IngestConfig,
        pipeline: Arc<ImagePipeline>,
        in_flight: Arc<InFlightSet>,
    ) -> Self {
        Self {
            watch_dir,
            ingest,
            pipeline,
            in_flight,
        }
    }

    /// 감시 디렉토리 구독 시작 (비재귀)
    pub fn subscribe(&self) -> Result<Subscription, StartupError> {
        let watch_err = |source| StartupError::Watch {
            path: self.watch_dir.clone(),
            source,
        };

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })
        .map_err(watch_err)?;
        watcher
            .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            .map_err(watch_err)?;

        info!("디렉토리 감시 시작: {}", self.watch_dir.display());
        Ok(Subscription {
            _watcher: watcher,
            events,
        })
    }

    /// 종료 신호까지 이벤트를 받아 디스패치
    pub async fn run(
        &self,
        mut subscription: Subscription,
        pool: &WorkerPool,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("감시 루프 종료");
                    break;
                }
                event = subscription.events.recv() => match event {
                    Some(Ok(event)) => {
                        if is_arrival(&event.kind) {
                            for path in &event.paths {
                                self.dispatch(path, pool);
                            }
                        }
                    }
                    Some(Err(e)) => warn!("감시 이벤트 에러: {e}"),
                    None => {
                        warn!("감시 이벤트 채널 닫힘");
                        break;
                    }
                },
            }
        }
        // subscription drop → notify 감시 해제
    }

    /// 경로 하나를 필터링/중복 확인 후 워커 풀에 제출. 제출했으면 `true`.
    pub fn dispatch(&self, path: &Path, pool: &WorkerPool) -> bool {
        if !path.is_file() || !self.ingest.accepts(path) {
            debug!("대상 아님: {}", path.display());
            return false;
        }

        let Some(guard) = self.in_flight.try_acquire(path) else {
            debug!("이미 처리 중: {}", path.display());
            return false;
        };

        let pipeline = Arc::clone(&self.pipeline);
        let job_path = path.to_path_buf();
        let submitted = pool.submit(Box::new(move || {
            let _guard = guard;
            pipeline.run(&job_path);
        }));

        match submitted {
            Ok(()) => {
                debug!("처리 대기열 추가: {}", path.display());
                true
            }
            Err(e) => {
                warn!("{}: {e}", path.display());
                false
            }
        }
    }
}

/// 새 파일 도착 이벤트: 쓰기 종료, 디렉토리 안으로의 이름 변경, (inotify 외) 생성
///
/// inotify의 생성 이벤트는 내용이 기록되기 전에 오므로 쓰기 모드 close를 기다린다.
/// close 이벤트를 보고하지 않는 백엔드에서는 생성 이벤트를 쓴다.
fn is_arrival(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => true,
        EventKind::Create(_) => !REPORTS_CLOSE_WRITE,
        _ => false,
    }
}

/// 감시 백엔드가 쓰기 종료(close) 이벤트를 보고하는지 여부
const REPORTS_CLOSE_WRITE: bool = cfg!(any(target_os = "linux", target_os = "android"));
