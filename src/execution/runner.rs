use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::{CodeExecutionRequest, CodeExecutor};
use crate::error::{ExecutionError, SessionError, SessionResult};

/// Result of one execution cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Output(String),
    Failed(ExecutionError),
    TimedOut(Duration),
    /// The session ended before the result arrived
    Discarded,
}

impl RunOutcome {
    /// Text shown in the output pane
    pub fn display_text(&self) -> String {
        match self {
            RunOutcome::Output(output) => output.clone(),
            RunOutcome::Failed(e) => format!("Error executing code: {}", e),
            RunOutcome::TimedOut(limit) => {
                format!("Execution timed out after {:.1}s", limit.as_secs_f64())
            }
            RunOutcome::Discarded => String::new(),
        }
    }

    fn from_result(result: Result<String, ExecutionError>) -> Self {
        match result {
            Ok(output) => RunOutcome::Output(output),
            Err(ExecutionError::TimedOut(limit)) => RunOutcome::TimedOut(limit),
            Err(e) => RunOutcome::Failed(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Output(_))
    }
}

/// Releases the in-flight slot when the run finishes or is dropped
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Submits code to the execution service, one run at a time
#[derive(Clone)]
pub struct CodeRunner {
    executor: Arc<dyn CodeExecutor>,
    timeout: Option<Duration>,
    in_flight: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl CodeRunner {
    pub fn new(
        executor: Arc<dyn CodeExecutor>,
        timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            executor,
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Claim the run slot and return the pending run
    ///
    /// The slot is taken before this returns, so a second call made before
    /// the first future completes fails with `AlreadyRunning` and sends
    /// nothing.
    pub fn submit(
        &self,
        request: CodeExecutionRequest,
    ) -> SessionResult<BoxFuture<'static, RunOutcome>> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Ended);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Code run refused: another run is in flight");
            return Err(SessionError::AlreadyRunning);
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let executor = Arc::clone(&self.executor);
        let timeout = self.timeout;
        let cancel = self.cancel.clone();

        Ok(async move {
            let _guard = guard;
            info!(
                "Running {:?} code ({} bytes)",
                request.language,
                request.code.len()
            );

            let run = async {
                match timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, executor.execute(&request)).await {
                            Ok(result) => RunOutcome::from_result(result),
                            Err(_) => RunOutcome::TimedOut(limit),
                        }
                    }
                    None => RunOutcome::from_result(executor.execute(&request).await),
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => RunOutcome::Discarded,
                outcome = run => outcome,
            };

            match &outcome {
                RunOutcome::Output(_) => info!("Code run finished"),
                RunOutcome::Failed(e) => warn!("Code run failed: {}", e),
                RunOutcome::TimedOut(limit) => warn!("Code run timed out after {:?}", limit),
                RunOutcome::Discarded => info!("Code run discarded after session teardown"),
            }

            outcome
        }
        .boxed())
    }
}
