//! Event classification, delivery, and double-tap synthesis
//!
//! Every recognized host event is forwarded to the delegate as-is. On top of
//! that stream the processor runs a small gesture state machine:
//!
//! - `touchend` pushes a touch-end tag into the ring buffer and, when it
//!   arrives within the sensitivity window of the previous touch-end, a
//!   double-tap tag as well. The state becomes [`GestureState::TouchPending`].
//! - `idle` returns the state to [`GestureState::IdleWatch`]; if a double-tap
//!   tag is buffered, one synthesized double-tap is delivered and the buffer
//!   is cleared.
//!
//! Delivery of the double-tap waits for the host's idle signal so the gesture
//! never lands in the middle of an animation.

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::buffer::CircularEventBuffer;
use super::{ClassifiedEvent, EventKind, EventPayload, PointerPayload, RawEvent};
use crate::config::{BridgeConfig, DEFAULT_DOUBLE_TAP_SENSITIVITY, DEFAULT_EVENT_BUFFER_CAPACITY};

/// Receiver of classified and synthesized events
pub trait EventDelegate: Send + Sync {
    /// Called once per delivered event
    fn on_event(&self, event: &ClassifiedEvent);
}

impl<F> EventDelegate for F
where
    F: Fn(&ClassifiedEvent) + Send + Sync,
{
    fn on_event(&self, event: &ClassifiedEvent) {
        self(event)
    }
}

/// Source of event timestamps, in seconds
pub trait Clock: Send + Sync {
    /// Current time in seconds from an arbitrary fixed origin
    fn now(&self) -> f64;
}

/// Monotonic clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// State of the gesture state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// Waiting for a touch-end
    IdleWatch,
    /// A touch-end arrived since the last idle signal
    TouchPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureTag {
    TouchEnd,
    DoubleTap,
}

#[derive(Debug)]
struct GestureTracker {
    buffer: CircularEventBuffer<GestureTag>,
    state: GestureState,
    /// Seconds
    sensitivity: f64,
    last_touch: Option<f64>,
    /// Pointer of the touch-end that completed the latest pair
    tap_pointer: Option<PointerPayload>,
}

impl GestureTracker {
    fn new(capacity: usize, sensitivity: f64) -> Self {
        Self {
            buffer: CircularEventBuffer::new(capacity),
            state: GestureState::IdleWatch,
            sensitivity,
            last_touch: None,
            tap_pointer: None,
        }
    }

    fn touch_end(&mut self, now: f64, pointer: Option<PointerPayload>) {
        self.buffer.enqueue(GestureTag::TouchEnd);

        if let Some(last) = self.last_touch {
            let delta = now - last;
            if (0.0..self.sensitivity).contains(&delta) {
                tracing::debug!("Touch-end pair {:.3}s apart, double-tap pending", delta);
                self.buffer.enqueue(GestureTag::DoubleTap);
                self.tap_pointer = pointer;
            }
        }

        self.last_touch = Some(now);
        self.state = GestureState::TouchPending;
    }

    fn idle(&mut self) -> Option<ClassifiedEvent> {
        self.state = GestureState::IdleWatch;

        if !self.buffer.contains(GestureTag::DoubleTap) {
            return None;
        }

        self.buffer.clear();
        Some(ClassifiedEvent {
            kind: EventKind::DoubleTap,
            payload: self.tap_pointer.take().map(EventPayload::Pointer),
        })
    }
}

/// Long-lived processor for one map session's host events
pub struct EventProcessor {
    tracker: Mutex<GestureTracker>,
    delegate: RwLock<Option<Weak<dyn EventDelegate>>>,
    clock: Arc<dyn Clock>,
}

impl EventProcessor {
    /// Create a processor with default sizing and a monotonic clock
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_EVENT_BUFFER_CAPACITY, DEFAULT_DOUBLE_TAP_SENSITIVITY)
    }

    /// Create a processor from configuration
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::with_settings(config.event_buffer_capacity, config.double_tap_sensitivity)
    }

    fn with_settings(capacity: usize, sensitivity: f64) -> Self {
        Self {
            tracker: Mutex::new(GestureTracker::new(capacity, sensitivity)),
            delegate: RwLock::new(None),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Replace the clock used by [`EventProcessor::handle`]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register the delegate
    ///
    /// Only a weak reference is kept; the application owns the delegate.
    pub fn set_delegate<D: EventDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak = Arc::downgrade(delegate);
        let weak: Weak<dyn EventDelegate> = weak;
        *self.delegate.write() = Some(weak);
    }

    /// Stop delivering events
    pub fn clear_delegate(&self) {
        *self.delegate.write() = None;
    }

    /// Set the double-tap window in seconds
    ///
    /// Takes effect on the next processed touch-end. Negative and non-finite
    /// values are ignored.
    pub fn set_double_tap_sensitivity(&self, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            tracing::warn!("Ignoring invalid double-tap sensitivity {}", seconds);
            return;
        }
        self.tracker.lock().sensitivity = seconds;
        tracing::debug!("Double-tap sensitivity set to {}s", seconds);
    }

    /// Current double-tap window in seconds
    pub fn double_tap_sensitivity(&self) -> f64 {
        self.tracker.lock().sensitivity
    }

    /// Current gesture state
    pub fn state(&self) -> GestureState {
        self.tracker.lock().state
    }

    /// Process a raw event stamped with the processor's clock
    pub fn handle(&self, raw: &RawEvent) {
        let now = self.clock.now();
        self.handle_at(raw, now);
    }

    /// Process a raw event with an explicit timestamp in seconds
    pub fn handle_at(&self, raw: &RawEvent, now: f64) {
        let Some(event) = ClassifiedEvent::classify(raw) else {
            tracing::warn!("Dropping unrecognized host event '{}'", raw.name);
            return;
        };

        let synthesized = {
            let mut tracker = self.tracker.lock();
            match event.kind {
                EventKind::TouchEnd => {
                    tracker.touch_end(now, event.pointer().copied());
                    None
                }
                EventKind::Idle => tracker.idle(),
                _ => None,
            }
        };

        self.deliver(&event);
        if let Some(tap) = synthesized {
            tracing::debug!("Delivering synthesized double-tap");
            self.deliver(&tap);
        }
    }

    /// Process a host message body, dropping it if malformed
    pub fn handle_message(&self, body: &str) {
        match RawEvent::from_json_str(body) {
            Ok(raw) => self.handle(&raw),
            Err(err) => tracing::warn!("Dropping host message: {}", err),
        }
    }

    /// Drain a host message channel until every sender is gone
    ///
    /// Running the processor from one task keeps every delegate call on a
    /// single context.
    pub async fn run(&self, mut messages: mpsc::UnboundedReceiver<RawEvent>) {
        while let Some(raw) = messages.recv().await {
            self.handle(&raw);
        }
        tracing::debug!("Host message channel closed");
    }

    fn deliver(&self, event: &ClassifiedEvent) {
        let delegate = self.delegate.read().as_ref().and_then(Weak::upgrade);
        match delegate {
            Some(delegate) => delegate.on_event(event),
            None => tracing::trace!("No delegate for '{}' event", event.kind.name()),
        }
    }
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProcessor")
            .field("tracker", &*self.tracker.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> (EventProcessor, Arc<Mutex<Vec<EventKind>>>, Arc<impl EventDelegate>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let delegate = Arc::new(move |event: &ClassifiedEvent| sink.lock().push(event.kind));
        let processor = EventProcessor::new();
        processor.set_delegate(&delegate);
        (processor, seen, delegate)
    }

    #[test]
    fn test_state_transitions() {
        let (processor, _seen, _delegate) = recording();
        assert_eq!(processor.state(), GestureState::IdleWatch);

        processor.handle_at(&RawEvent::new("touchend"), 1.0);
        assert_eq!(processor.state(), GestureState::TouchPending);

        processor.handle_at(&RawEvent::new("idle"), 1.1);
        assert_eq!(processor.state(), GestureState::IdleWatch);
    }

    #[test]
    fn test_double_tap_after_idle() {
        let (processor, seen, _delegate) = recording();
        processor.handle_at(&RawEvent::new("touchend"), 1.0);
        processor.handle_at(&RawEvent::new("touchend"), 1.2);
        assert!(!seen.lock().contains(&EventKind::DoubleTap));

        processor.handle_at(&RawEvent::new("idle"), 1.5);
        assert_eq!(
            *seen.lock(),
            vec![
                EventKind::TouchEnd,
                EventKind::TouchEnd,
                EventKind::Idle,
                EventKind::DoubleTap
            ]
        );
    }

    #[test]
    fn test_invalid_sensitivity_ignored() {
        let processor = EventProcessor::new();
        processor.set_double_tap_sensitivity(f64::NAN);
        processor.set_double_tap_sensitivity(-1.0);
        assert_eq!(processor.double_tap_sensitivity(), DEFAULT_DOUBLE_TAP_SENSITIVITY);

        processor.set_double_tap_sensitivity(0.25);
        assert_eq!(processor.double_tap_sensitivity(), 0.25);
    }

    #[test]
    fn test_dropped_delegate_is_tolerated() {
        let (processor, seen, delegate) = recording();
        drop(delegate);
        processor.handle_at(&RawEvent::new("load"), 0.0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_malformed_message_is_dropped() {
        let (processor, seen, _delegate) = recording();
        processor.handle_message("{not json");
        processor.handle_message(r#"{"name":"futureEvent"}"#);
        processor.handle_message(r#"{"name":"load"}"#);
        assert_eq!(*seen.lock(), vec![EventKind::Load]);
    }
}
