use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// 规则未能执行完毕的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    Cancelled,
    /// 工作线程异常退出
    Failed(String),
}

/// 在有界工作池中逐项执行阻塞任务，结果顺序与输入一致
///
/// 取消后尚未开始的项不再执行，交给 `on_abort` 生成结果。
pub async fn run_bounded<T, R, W, A>(
    items: Vec<T>,
    workers: usize,
    cancel: &CancellationToken,
    work: W,
    on_abort: A,
) -> Vec<R>
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    W: Fn(&T, &CancellationToken) -> R + Send + Sync + 'static,
    A: Fn(&T, Abort) -> R,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let work = Arc::new(work);
    let mut handles = Vec::with_capacity(items.len());

    for item in &items {
        let semaphore = semaphore.clone();
        let work = work.clone();
        let item = item.clone();
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Err(Abort::Cancelled);
            };
            if cancel.is_cancelled() {
                return Err(Abort::Cancelled);
            }
            tokio::task::spawn_blocking(move || work(&item, &cancel))
                .await
                .map_err(|e| Abort::Failed(e.to_string()))
        }));
    }

    let mut results = Vec::with_capacity(items.len());
    for (item, handle) in items.iter().zip(handles) {
        let result = match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(abort)) => on_abort(item, abort),
            Err(e) => on_abort(item, Abort::Failed(e.to_string())),
        };
        results.push(result);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn results_keep_input_order() {
        let items: Vec<u64> = (0..20).collect();
        let results = run_bounded(
            items,
            4,
            &CancellationToken::new(),
            |n, _| {
                std::thread::sleep(std::time::Duration::from_millis(20 - *n));
                *n * 10
            },
            |_, _| u64::MAX,
        )
        .await;
        assert_eq!(results, (0..20).map(|n| n * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (active.clone(), peak.clone());

        run_bounded(
            (0..16).collect::<Vec<u32>>(),
            3,
            &CancellationToken::new(),
            move |_, _| {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(10));
                a.fetch_sub(1, Ordering::SeqCst);
            },
            |_, _| (),
        )
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn cancelled_items_are_reported_not_dropped() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = run_bounded(
            vec!["a", "b"],
            2,
            &cancel,
            |item, _| format!("done {}", item),
            |item, abort| format!("{} {:?}", item, abort),
        )
        .await;
        assert_eq!(results, vec!["a Cancelled", "b Cancelled"]);
    }

    #[tokio::test]
    async fn panicking_worker_becomes_failure() {
        let results = run_bounded(
            vec![1u8, 2],
            2,
            &CancellationToken::new(),
            |item, _| {
                if *item == 2 {
                    panic!("boom");
                }
                "ok".to_string()
            },
            |_, abort| match abort {
                Abort::Failed(_) => "failed".to_string(),
                Abort::Cancelled => "cancelled".to_string(),
            },
        )
        .await;
        assert_eq!(results, vec!["ok", "failed"]);
    }
}
