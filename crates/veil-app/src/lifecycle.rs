//! 프로세스 수명 관리.
//!
//! 종료 여부는 `watch` 채널 하나로 전파된다. 시그널 핸들러는 감시 루프보다 먼저 등록하고,
//! 등록 실패는 시작 에러가 된다.

use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// 종료 신호 전파자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// 종료 신호 수신기
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 종료 요청. 수신기가 없어도 상태는 기록된다.
    pub fn shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("종료 요청");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// SIGINT/SIGTERM 핸들러를 등록하고, 수신 시 [`shutdown`](Self::shutdown)을 호출하는 태스크 시작
    #[cfg(unix)]
    pub fn listen_for_signals(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let lifecycle = Arc::clone(self);

        Ok(tokio::spawn(async move {
            let name = tokio::select! {
                _ = sigint.recv() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            };
            info!(signal = name, "종료 시그널 수신");
            lifecycle.shutdown();
        }))
    }

    /// Ctrl+C 대기 태스크 시작. 핸들러 등록 에러는 태스크 안에서만 드러난다.
    #[cfg(not(unix))]
    pub fn listen_for_signals(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        let lifecycle = Arc::clone(self);
        Ok(tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!(signal = "Ctrl+C", "종료 시그널 수신");
                    lifecycle.shutdown();
                }
                Err(e) => tracing::error!("Ctrl+C 핸들러 등록 실패: {e}"),
            }
        }))
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_wakes_subscribers() {
        let lm = LifecycleManager::new();
        let mut rx = lm.subscribe();
        assert!(!*rx.borrow());

        lm.shutdown();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }

    #[test]
    fn shutdown_without_subscribers_is_recorded() {
        let lm = LifecycleManager::new();
        lm.shutdown();
        assert!(lm.is_shutting_down());
        assert!(*lm.subscribe().borrow());
    }

    #[tokio::test]
    async fn installing_signal_handlers_does_not_shut_down() {
        let lm = Arc::new(LifecycleManager::new());
        let handle = lm.listen_for_signals().unwrap();
        assert!(!lm.is_shutting_down());
        handle.abort();
    }
}
