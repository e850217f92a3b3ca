use crate::error::{AppError, AppResult};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from dispatching background work
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("A background task is already running: {running}")]
    Busy { running: String },
}

/// Cooperative cancellation flag handed to every dispatched task.
///
/// Cancellation is advisory: a task may poll the flag between steps, but a
/// blocked child process or network call is not interrupted — the command
/// runner's own timeout bounds those.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receiving side of a dispatched task: exactly one value or one typed
/// error arrives, never both.
pub struct TaskHandle<T> {
    label: String,
    cancel: CancelToken,
    rx: oneshot::Receiver<AppResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Request cancellation (advisory; see [`CancelToken`]).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task's result.
    pub async fn join(self) -> AppResult<T> {
        match self.rx.await {
            Ok(result) => result,
            // Sender dropped without a result: the task panicked
            Err(_) => Err(AppError::TaskAborted(self.label)),
        }
    }
}

struct ActiveTask {
    label: String,
    done: Arc<AtomicBool>,
    cancel: CancelToken,
}

/// One-task-at-a-time background dispatch.
///
/// The control thread stays free while a task runs; a new dispatch while busy
/// is rejected outright rather than queued, so git mutations can never race
/// each other.
pub struct Dispatcher {
    active: Option<ActiveTask>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Whether a dispatched task is still running.
    pub fn is_busy(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|task| !task.done.load(Ordering::SeqCst))
    }

    /// Label of the running task, if any.
    pub fn active_label(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|task| !task.done.load(Ordering::SeqCst))
            .map(|task| task.label.as_str())
    }

    /// Request cancellation of the running task, if any.
    pub fn cancel_active(&self) {
        if let Some(task) = &self.active {
            task.cancel.cancel();
        }
    }

    /// Spawn `task` on the background unit, handing it a [`CancelToken`].
    ///
    /// Fails with [`DispatchError::Busy`] while another task is in flight.
    pub fn dispatch<T, F, Fut>(
        &mut self,
        label: impl Into<String>,
        task: F,
    ) -> Result<TaskHandle<T>, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        if let Some(active) = &self.active
            && !active.done.load(Ordering::SeqCst)
        {
            return Err(DispatchError::Busy {
                running: active.label.clone(),
            });
        }

        let label = label.into();
        let cancel = CancelToken::default();
        let done = Arc::new(AtomicBool::new(false));
        let (tx, rx) = oneshot::channel();

        // Dropped on any exit, including a panic, so the slot is freed
        struct DoneGuard(Arc<AtomicBool>);
        impl Drop for DoneGuard {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let future = task(cancel.clone());
        let done_flag = DoneGuard(Arc::clone(&done));
        tokio::spawn(async move {
            let _done = done_flag;
            let result = future.await;
            let _ = tx.send(result);
        });

        self.active = Some(ActiveTask {
            label: label.clone(),
            done,
            cancel: cancel.clone(),
        });

        Ok(TaskHandle { label, cancel, rx })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitError;
    use std::time::Duration;

    #[tokio::test]
    async fn dispatch_delivers_value() {
        let mut dispatcher = Dispatcher::new();

        let handle = dispatcher
            .dispatch("quick", |_cancel| async { Ok(41 + 1) })
            .unwrap();

        assert_eq!(handle.join().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn dispatch_delivers_typed_error() {
        let mut dispatcher = Dispatcher::new();

        let handle = dispatcher
            .dispatch("failing", |_cancel| async {
                Err::<(), _>(AppError::Git(GitError::NotARepository))
            })
            .unwrap();

        match handle.join().await {
            Err(AppError::Git(GitError::NotARepository)) => {}
            other => panic!("expected NotARepository, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_dispatch_rejected_while_busy() {
        let mut dispatcher = Dispatcher::new();

        let handle = dispatcher
            .dispatch("slow", |_cancel| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .unwrap();

        assert!(dispatcher.is_busy());
        assert_eq!(dispatcher.active_label(), Some("slow"));

        let rejected = dispatcher.dispatch("eager", |_cancel| async { Ok(()) });
        match rejected {
            Err(DispatchError::Busy { running }) => assert_eq!(running, "slow"),
            Ok(_) => panic!("dispatch must be rejected while busy"),
        }

        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn dispatch_allowed_after_completion() {
        let mut dispatcher = Dispatcher::new();

        let first = dispatcher
            .dispatch("first", |_cancel| async { Ok(1) })
            .unwrap();
        assert_eq!(first.join().await.unwrap(), 1);

        // The previous task has finished; the slot is free again
        let second = dispatcher
            .dispatch("second", |_cancel| async { Ok(2) })
            .unwrap();
        assert_eq!(second.join().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn cancellation_flag_is_observable_by_task() {
        let mut dispatcher = Dispatcher::new();

        let handle = dispatcher
            .dispatch("cancellable", |cancel| async move {
                for _ in 0..100 {
                    if cancel.is_cancelled() {
                        return Ok(true);
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Ok(false)
            })
            .unwrap();

        dispatcher.cancel_active();
        assert!(handle.join().await.unwrap());
    }

    #[tokio::test]
    async fn panicked_task_reports_abort() {
        let mut dispatcher = Dispatcher::new();

        let handle = dispatcher
            .dispatch("doomed", |_cancel| async {
                if cfg!(test) {
                    panic!("boom");
                }
                Ok(())
            })
            .unwrap();

        match handle.join().await {
            Err(AppError::TaskAborted(label)) => assert_eq!(label, "doomed"),
            other => panic!("expected TaskAborted, got {other:?}"),
        }

        // The slot must not stay occupied by the dead task
        assert!(!dispatcher.is_busy());
    }
}
