//! 처리 중 경로 집합.
//!
//! 경로는 디스패치 시점에 들어가고 워커 작업이 끝나면 (성공, 실패, 패닉 모두) 빠진다.
//! 제거는 [`InFlightGuard`]의 `Drop`에 묶여 있다. 크기 기반 제거는 없다.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 현재 워커가 소유한 경로 집합
#[derive(Debug, Default)]
pub struct InFlightSet {
    paths: Mutex<HashSet<PathBuf>>,
}

impl InFlightSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 경로 점유 시도. 이미 처리 중이면 `None`.
    pub fn try_acquire(self: &Arc<Self>, path: &Path) -> Option<InFlightGuard> {
        if !self.paths.lock().insert(path.to_path_buf()) {
            return None;
        }
        Some(InFlightGuard {
            set: Arc::clone(self),
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }
}

/// 점유 해제 가드. drop 시 집합에서 경로를 제거한다.
#[derive(Debug)]
pub struct InFlightGuard {
    set: Arc<InFlightSet>,
    path: PathBuf,
}

impl InFlightGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.paths.lock().remove(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let set = InFlightSet::new();
        let path = Path::new("/watch/a.jpg");

        let guard = set.try_acquire(path).unwrap();
        assert!(set.contains(path));
        assert!(set.try_acquire(path).is_none());
        assert_eq!(guard.path(), path);

        drop(guard);
        assert!(set.is_empty());
        assert!(set.try_acquire(path).is_some());
    }

    #[test]
    fn distinct_paths_are_independent() {
        let set = InFlightSet::new();
        let _a = set.try_acquire(Path::new("/watch/a.jpg")).unwrap();
        let _b = set.try_acquire(Path::new("/watch/b.jpg")).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn guard_released_on_panic() {
        let set = InFlightSet::new();
        let path = PathBuf::from("/watch/panic.jpg");

        let guard = set.try_acquire(&path).unwrap();
        let result = std::thread::spawn(move || {
            let _guard = guard;
            panic!("파이프라인 패닉");
        })
        .join();

        assert!(result.is_err());
        assert!(!set.contains(&path));
    }
}
