//! Bounded worker pool over a shared work queue.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::shutdown::Shutdown;

/// Process `items` with at most `workers` in flight.
///
/// Workers stop taking new items once shutdown is triggered; items already
/// started run to completion. Results come back in completion order.
pub async fn run_pool<T, R, F, Fut>(
    items: Vec<T>,
    workers: usize,
    shutdown: &Shutdown,
    work: F,
) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let workers = workers.max(1).min(items.len().max(1));
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let results = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let queue = queue.clone();
        let results = results.clone();
        let shutdown = shutdown.clone();
        let work = work.clone();

        handles.push(tokio::spawn(async move {
            while !shutdown.is_triggered() {
                let item = {
                    let mut queue = queue.lock().await;
                    queue.pop_front()
                };
                let Some(item) = item else {
                    break;
                };
                let result = work(item).await;
                results.lock().await.push(result);
            }
        }));
    }

    for joined in futures::future::join_all(handles).await {
        if let Err(e) = joined {
            warn!("Worker task failed: {}", e);
        }
    }

    let mut results = results.lock().await;
    std::mem::take(&mut *results)
}
