use crate::core::diff_engine::compare_tables;
use crate::domain::model::{CompareRequest, DiffReport};
use crate::utils::error::{DiffError, Result};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 呼叫端持有的取消旗標
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs comparisons on the blocking thread pool, one request per call.
#[derive(Debug, Clone)]
pub struct CompareWorker {
    timeout: Duration,
    cancel: CancelFlag,
}

impl CompareWorker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(&self, request: CompareRequest) -> Result<DiffReport> {
        self.execute(move || compare_tables(&request.old, &request.new, &request.options))
            .await
    }

    /// 在 blocking 執行緒池跑比對工作，套用逾時與取消旗標
    async fn execute<F>(&self, job: F) -> Result<DiffReport>
    where
        F: FnOnce() -> DiffReport + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(DiffError::Cancelled);
        }

        let cancel = self.cancel.clone();
        let abandoned = Arc::new(AtomicBool::new(false));
        let task_abandoned = Arc::clone(&abandoned);
        let task = tokio::task::spawn_blocking(move || {
            // 還在佇列中就已逾時或取消的工作不再執行
            if cancel.is_cancelled() || task_abandoned.load(Ordering::Relaxed) {
                return None;
            }
            Some(job())
        });

        // 逾時後放棄等待；已開始的計算無法中斷，結果直接丟棄
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Some(report))) => Ok(report),
            Ok(Ok(None)) => Err(DiffError::Cancelled),
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    join_error.to_string()
                };
                tracing::error!("❌ Comparison worker failed: {}", message);
                Err(DiffError::WorkerFailed { message })
            }
            Err(_) => {
                abandoned.store(true, Ordering::Relaxed);
                tracing::warn!("⏱️ Comparison timed out after {:?}", self.timeout);
                Err(DiffError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

impl Default for CompareWorker {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown worker failure".to_string()
    }
}
