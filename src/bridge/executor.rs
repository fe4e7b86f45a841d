//! Script executor seam
//!
//! An [`Executor`] is anything that can run script text against a host and
//! report back exactly once. The bridge never talks to a host any other way,
//! so a different embedded engine can be substituted by implementing this
//! trait alone.

use futures::future::BoxFuture;
use serde_json::Value as Json;
use tokio::sync::oneshot;

use super::value::RawResult;

/// Exception details reported by the host
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostExceptionInfo {
    /// Host error code
    pub code: i64,
    /// Exception message, when the host supplied one
    pub message: Option<String>,
    /// Structured details attached to the exception
    pub details: Option<Json>,
}

impl HostExceptionInfo {
    /// Exception with a code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            details: None,
        }
    }

    /// Exception with only a code
    pub fn bare(code: i64) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }
}

/// Failure shapes an executor can report
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionFailure {
    /// The script raised an exception in the host
    HostException(HostExceptionInfo),
    /// The script completed but its result cannot cross the transport
    UnsupportedType,
    /// The host could not run the script at all
    Transport(String),
}

/// Outcome of one script evaluation
pub type RawExecutionResult = Result<RawResult, ExecutionFailure>;

/// Something that can evaluate script text and report the outcome
pub trait Executor: Send + Sync {
    /// Evaluate `script`, resolving once the host reports completion
    fn execute(&self, script: String) -> BoxFuture<'_, RawExecutionResult>;
}

/// One-shot completion handed to a callback-style host
pub struct Completion {
    tx: oneshot::Sender<RawExecutionResult>,
}

impl Completion {
    /// Report the evaluation outcome
    pub fn complete(self, result: RawExecutionResult) {
        // The waiting side may have been dropped; nothing to report to then.
        let _ = self.tx.send(result);
    }

    /// Report a successful evaluation
    pub fn succeed(self, raw: RawResult) {
        self.complete(Ok(raw));
    }

    /// Report a failed evaluation
    pub fn fail(self, failure: ExecutionFailure) {
        self.complete(Err(failure));
    }

    /// Report the JSON text some hosts return from evaluation
    pub fn complete_json(self, text: &str) {
        let result = RawResult::from_json_str(text)
            .map_err(|err| ExecutionFailure::Transport(format!("unreadable host result: {err}")));
        self.complete(result);
    }
}

/// Adapts a callback-based host evaluation function into an [`Executor`]
///
/// The host function receives the script and a [`Completion`] it must call
/// once, from any thread. If the completion is dropped unused the execution
/// fails with a transport error instead of hanging.
pub struct CallbackExecutor<F> {
    evaluate: F,
}

impl<F> CallbackExecutor<F>
where
    F: Fn(String, Completion) + Send + Sync,
{
    /// Wrap a host evaluation function
    pub fn new(evaluate: F) -> Self {
        Self { evaluate }
    }
}

impl<F> Executor for CallbackExecutor<F>
where
    F: Fn(String, Completion) + Send + Sync,
{
    fn execute(&self, script: String) -> BoxFuture<'_, RawExecutionResult> {
        let (tx, rx) = oneshot::channel();
        (self.evaluate)(script, Completion { tx });

        Box::pin(async move {
            rx.await.unwrap_or_else(|_| {
                Err(ExecutionFailure::Transport(
                    "host dropped the completion without reporting".to_string(),
                ))
            })
        })
    }
}

impl<F> std::fmt::Debug for CallbackExecutor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackExecutor").finish_non_exhaustive()
    }
}
