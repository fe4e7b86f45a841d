//! Double-tap synthesis and event delivery tests
//!
//! Feeds timed raw events through the event processor and checks what the
//! delegate receives.

use std::sync::Arc;

use mapbridge::config::BridgeConfig;
use mapbridge::events::{
    ClassifiedEvent, EventKind, EventPayload, EventProcessor, GestureState, RawEvent,
};
use mapbridge::types::ScreenPoint;
use parking_lot::Mutex;
use serde_json::json;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ClassifiedEvent>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|event| event.kind).collect()
    }

    fn double_taps(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind == EventKind::DoubleTap)
            .count()
    }
}

impl mapbridge::events::EventDelegate for Recorder {
    fn on_event(&self, event: &ClassifiedEvent) {
        self.events.lock().push(event.clone());
    }
}

fn processor_with_recorder() -> (EventProcessor, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let processor = EventProcessor::new();
    processor.set_delegate(&recorder);
    (processor, recorder)
}

fn touch_end() -> RawEvent {
    RawEvent::new("touchend")
}

fn idle() -> RawEvent {
    RawEvent::new("idle")
}

#[test]
fn quick_touch_pair_yields_one_double_tap_after_idle() {
    let (processor, recorder) = processor_with_recorder();

    processor.handle_at(&touch_end(), 10.0);
    processor.handle_at(&touch_end(), 10.25);
    assert_eq!(recorder.double_taps(), 0, "double-tap waits for idle");

    processor.handle_at(&idle(), 10.5);
    assert_eq!(recorder.double_taps(), 1);
    assert_eq!(recorder.kinds().last(), Some(&EventKind::DoubleTap));

    // Buffer was cleared: another idle delivers nothing new.
    processor.handle_at(&idle(), 11.0);
    assert_eq!(recorder.double_taps(), 1);
    assert_eq!(processor.state(), GestureState::IdleWatch);
}

#[test]
fn slow_touch_pair_yields_no_double_tap() {
    let (processor, recorder) = processor_with_recorder();

    processor.handle_at(&touch_end(), 1.0);
    processor.handle_at(&touch_end(), 1.5);
    processor.handle_at(&idle(), 2.0);

    assert_eq!(recorder.double_taps(), 0);
    assert_eq!(
        recorder.kinds(),
        vec![EventKind::TouchEnd, EventKind::TouchEnd, EventKind::Idle]
    );
}

#[test]
fn delta_equal_to_window_is_not_a_double_tap() {
    let (processor, recorder) = processor_with_recorder();
    processor.set_double_tap_sensitivity(0.5);

    processor.handle_at(&touch_end(), 2.0);
    processor.handle_at(&touch_end(), 2.5);
    processor.handle_at(&idle(), 3.0);

    assert_eq!(recorder.double_taps(), 0);
}

#[test]
fn sensitivity_change_applies_to_later_touches_only() {
    let (processor, recorder) = processor_with_recorder();

    // 0.3s apart under the default 0.4s window: double-tap tag buffered.
    processor.handle_at(&touch_end(), 0.0);
    processor.handle_at(&touch_end(), 0.3);

    // Narrowing the window does not undo the earlier comparison.
    processor.set_double_tap_sensitivity(0.1);
    processor.handle_at(&idle(), 0.5);
    assert_eq!(recorder.double_taps(), 1);

    // The same spacing now falls outside the window.
    processor.handle_at(&touch_end(), 1.0);
    processor.handle_at(&touch_end(), 1.3);
    processor.handle_at(&idle(), 1.5);
    assert_eq!(recorder.double_taps(), 1);

    // Widening it again lets the next pair through.
    processor.set_double_tap_sensitivity(1.0);
    processor.handle_at(&touch_end(), 2.0);
    processor.handle_at(&idle(), 2.2);
    assert_eq!(recorder.double_taps(), 2);
}

#[test]
fn double_tap_carries_pointer_of_second_touch() {
    let (processor, recorder) = processor_with_recorder();
    let payload = |x: f64| {
        json!({"point": {"x": x, "y": 5.0}})
            .as_object()
            .cloned()
            .expect("object")
    };

    processor.handle_at(&touch_end().with_payload(payload(1.0)), 0.0);
    processor.handle_at(&touch_end().with_payload(payload(2.0)), 0.1);
    processor.handle_at(&idle(), 0.2);

    let events = recorder.events.lock();
    let tap = events.last().expect("double-tap");
    assert_eq!(tap.kind, EventKind::DoubleTap);
    match &tap.payload {
        Some(EventPayload::Pointer(pointer)) => {
            assert_eq!(pointer.point, Some(ScreenPoint::new(2.0, 5.0)));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn unknown_event_is_dropped_without_delivery() {
    let (processor, recorder) = processor_with_recorder();

    processor.handle_at(&RawEvent::new("futureEvent"), 0.0);
    processor.handle_at(&RawEvent::new("doubletap"), 0.1);

    assert!(recorder.kinds().is_empty());
    assert_eq!(processor.state(), GestureState::IdleWatch);
}

#[test]
fn every_recognized_event_is_forwarded() {
    let (processor, recorder) = processor_with_recorder();

    for (offset, kind) in EventKind::HOST_EVENTS.iter().enumerate() {
        processor.handle_at(&RawEvent::new(kind.name()), offset as f64 * 10.0);
    }

    assert_eq!(recorder.kinds(), EventKind::HOST_EVENTS.to_vec());
}

#[test]
fn processor_follows_config() {
    let config = BridgeConfig {
        double_tap_sensitivity: 0.05,
        event_buffer_capacity: 4,
        ..Default::default()
    };
    let recorder = Arc::new(Recorder::default());
    let processor = EventProcessor::from_config(&config);
    processor.set_delegate(&recorder);

    assert_eq!(processor.double_tap_sensitivity(), 0.05);
    processor.handle_at(&touch_end(), 0.0);
    processor.handle_at(&touch_end(), 0.1);
    processor.handle_at(&idle(), 0.2);
    assert_eq!(recorder.double_taps(), 0);
}

#[test]
fn double_tap_evicted_by_later_touches_is_not_delivered() {
    let config = BridgeConfig {
        event_buffer_capacity: 3,
        ..Default::default()
    };
    let recorder = Arc::new(Recorder::default());
    let processor = EventProcessor::from_config(&config);
    processor.set_delegate(&recorder);

    // Pair at 0.0/0.1 buffers [touch, touch, double-tap].
    processor.handle_at(&touch_end(), 0.0);
    processor.handle_at(&touch_end(), 0.1);
    // Three slow touches push the double-tap tag out of the ring.
    processor.handle_at(&touch_end(), 1.0);
    processor.handle_at(&touch_end(), 2.0);
    processor.handle_at(&touch_end(), 3.0);
    processor.handle_at(&idle(), 4.0);

    assert_eq!(recorder.double_taps(), 0);
}

#[tokio::test]
async fn run_drains_host_channel() {
    let recorder = Arc::new(Recorder::default());
    let processor = Arc::new(EventProcessor::new());
    processor.set_delegate(&recorder);

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let worker = {
        let processor = processor.clone();
        tokio::spawn(async move { processor.run(rx).await })
    };

    tx.send(RawEvent::new("load")).expect("send");
    tx.send(RawEvent::new("futureEvent")).expect("send");
    tx.send(RawEvent::new("styledata")).expect("send");
    drop(tx);
    worker.await.expect("join");

    assert_eq!(recorder.kinds(), vec![EventKind::Load, EventKind::StyleData]);
}
