//! 고정 크기 워커 풀.
//!
//! N개의 tokio 워커 태스크가 하나의 무제한 큐를 공유한다. 각 워커는 한 번에 한 작업만
//! 꺼내 blocking 스레드 풀에서 실행하므로 동시에 실행되는 작업은 최대 N개다.
//! 제출은 블로킹하지 않는다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 워커에서 실행되는 동기 작업
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// 워커 풀 에러
#[derive(Debug, Error)]
pub enum PoolError {
    /// 종료 중이라 작업을 받을 수 없음
    #[error("워커 풀이 닫혔습니다")]
    Closed,
}

/// 종료 시점 집계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// 완료된 작업 수 (패닉 포함)
    pub completed: usize,
    /// 최대 동시 실행 수
    pub peak_active: usize,
}

/// 고정 크기 워커 풀
pub struct WorkerPool {
    tx: Option<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// 워커 `size`개로 풀 시작 (최소 1). tokio 런타임 안에서 호출해야 한다.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let workers = (0..size)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                let completed = Arc::clone(&completed);
                tokio::spawn(async move {
                    loop {
                        // 잠금은 다음 작업을 꺼내는 동안만 유지
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else { break };

                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);

                        if let Err(e) = tokio::task::spawn_blocking(job).await {
                            error!(worker = id, "작업 비정상 종료: {e}");
                        }

                        active.fetch_sub(1, Ordering::SeqCst);
                        completed.fetch_add(1, Ordering::SeqCst);
                    }
                    debug!(worker = id, "워커 종료");
                })
            })
            .collect();

        info!(workers = size, "워커 풀 시작");

        Self {
            tx: Some(tx),
            workers,
            active,
            peak,
            completed,
        }
    }

    /// 작업 제출 (블로킹 없음)
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        self.tx
            .as_ref()
            .ok_or(PoolError::Closed)?
            .send(job)
            .map_err(|_| PoolError::Closed)
    }

    /// 워커 수
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// 현재 실행 중인 작업 수
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// 지금까지의 최대 동시 실행 수
    pub fn peak_active(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// 완료된 작업 수 (패닉 포함)
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// 큐를 닫고 이미 제출된 작업이 모두 끝날 때까지 대기
    pub async fn shutdown(mut self) -> PoolStats {
        self.tx.take();
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                error!("워커 태스크 조인 실패: {e}");
            }
        }

        let stats = PoolStats {
            completed: self.completed(),
            peak_active: self.peak_active(),
        };
        info!(
            completed = stats.completed,
            peak = stats.peak_active,
            "워커 풀 종료"
        );
        stats
    }
}
