//! Command bridge between typed callers and a script executor
//!
//! A [`Bridge`] renders each command to script text, submits it to the
//! attached [`Executor`], and returns either a decoded value or a classified
//! error. Submissions from every caller go through one ordered channel
//! drained by a single worker task, and the worker waits for each execution
//! to complete before starting the next, so results come back in submission
//! order and the host never sees overlapping evaluations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

pub mod classify;
pub mod executor;
pub mod value;

pub use classify::{classify, interpret};
pub use executor::{
    CallbackExecutor, Completion, ExecutionFailure, Executor, HostExceptionInfo,
    RawExecutionResult,
};
pub use value::{BoxedNumber, DecodedValue, FromDecoded, NumberTag, RawResult, decode};

use crate::command::{Command, ValueCommand};
use crate::error::{BridgeError, BridgeResult};

/// Attachment state of the executor
enum ExecutorSlot {
    Detached,
    Attached(Weak<dyn Executor>),
}

impl ExecutorSlot {
    fn resolve(&self) -> BridgeResult<Arc<dyn Executor>> {
        match self {
            ExecutorSlot::Detached => Err(BridgeError::HostNotReady),
            ExecutorSlot::Attached(weak) => weak.upgrade().ok_or(BridgeError::MissingParent),
        }
    }

    fn is_attached(&self) -> bool {
        matches!(self, ExecutorSlot::Attached(_))
    }
}

/// One queued execution
struct Submission {
    seq: u64,
    script: String,
    expects_value: bool,
    reply: oneshot::Sender<BridgeResult<DecodedValue>>,
}

/// Serializing facade over a script executor
///
/// The worker task runs on the Tokio runtime the bridge was created in and
/// ends when the bridge is dropped.
pub struct Bridge {
    slot: Arc<RwLock<ExecutorSlot>>,
    queue: mpsc::UnboundedSender<Submission>,
    next_seq: AtomicU64,
}

// No `Default`: construction needs a runtime and can fail.
#[allow(clippy::new_without_default)]
impl Bridge {
    /// Create a bridge with no executor attached
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; use [`Bridge::try_new`]
    /// where that cannot be guaranteed.
    pub fn new() -> Self {
        Self::spawn_on(&Handle::current())
    }

    /// Create a bridge, failing with [`BridgeError::HostNotReady`] when no
    /// Tokio runtime is available to run its worker
    pub fn try_new() -> BridgeResult<Self> {
        let handle = Handle::try_current().map_err(|err| {
            tracing::warn!("Cannot start bridge worker: {}", err);
            BridgeError::HostNotReady
        })?;
        Ok(Self::spawn_on(&handle))
    }

    fn spawn_on(handle: &Handle) -> Self {
        let slot = Arc::new(RwLock::new(ExecutorSlot::Detached));
        let (queue, submissions) = mpsc::unbounded_channel();
        handle.spawn(run_worker(slot.clone(), submissions));

        Self {
            slot,
            queue,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Attach the executor once the host has finished loading
    ///
    /// Only a weak reference is kept. If the executor is dropped without
    /// being detached, executions fail with [`BridgeError::MissingParent`].
    pub fn attach<E: Executor + 'static>(&self, executor: &Arc<E>) {
        let weak = Arc::downgrade(executor);
        let weak: Weak<dyn Executor> = weak;
        *self.slot.write() = ExecutorSlot::Attached(weak);
        tracing::info!("Executor attached");
    }

    /// Detach the executor at teardown
    pub fn detach(&self) {
        *self.slot.write() = ExecutorSlot::Detached;
        tracing::info!("Executor detached");
    }

    /// Whether an executor is attached
    pub fn is_attached(&self) -> bool {
        self.slot.read().is_attached()
    }

    /// Execute a command and return its decoded result
    ///
    /// Fails immediately with [`BridgeError::HostNotReady`] when no executor is
    /// attached. Otherwise suspends until the host reports completion; there is
    /// no timeout and no cancellation once submitted.
    pub async fn execute<C: Command + ?Sized>(&self, command: &C) -> BridgeResult<DecodedValue> {
        if !self.is_attached() {
            return Err(BridgeError::HostNotReady);
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (reply, response) = oneshot::channel();
        let submission = Submission {
            seq,
            script: command.script(),
            expects_value: command.expects_value(),
            reply,
        };

        tracing::debug!(seq, "Submitting {:?}", command);
        self.queue
            .send(submission)
            .map_err(|_| BridgeError::HostNotReady)?;

        response.await.map_err(|_| BridgeError::HostNotReady)?
    }

    /// Execute a value command and convert the result to its output type
    pub async fn query<C: ValueCommand>(&self, command: &C) -> BridgeResult<C::Output> {
        let value = self.execute(command).await?;
        C::Output::from_decoded(value)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("attached", &self.is_attached())
            .field("submitted", &self.next_seq.load(Ordering::Relaxed))
            .finish()
    }
}

async fn run_worker(
    slot: Arc<RwLock<ExecutorSlot>>,
    mut submissions: mpsc::UnboundedReceiver<Submission>,
) {
    while let Some(submission) = submissions.recv().await {
        let Submission {
            seq,
            script,
            expects_value,
            reply,
        } = submission;

        // Read guard is released before awaiting the host.
        let executor = slot.read().resolve();
        let result = match executor {
            Ok(executor) => interpret(executor.execute(script).await),
            Err(err) => Err(err),
        };

        log_outcome(seq, expects_value, &result);

        // The caller may have stopped waiting; the execution still ran.
        let _ = reply.send(result);
    }
    tracing::debug!("Bridge worker stopped");
}

fn log_outcome(seq: u64, expects_value: bool, result: &BridgeResult<DecodedValue>) {
    match result {
        Ok(value) if expects_value && value.is_empty() => {
            tracing::warn!(seq, "Value command returned {}", value.kind());
        }
        Ok(value) => tracing::debug!(seq, "Completed with {}", value.kind()),
        Err(BridgeError::HostException { code, reason }) => {
            tracing::warn!(seq, "Host exception {}: {}", code, reason);
        }
        Err(err) => tracing::debug!(seq, "Failed: {}", err),
    }
}
