use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use pointerflow_common::config::{PanConfig, PinchConfig, TapConfig};
use pointerflow_model::event::{parse_events, PointerEvent};
use pointerflow_model::geometry::{Direction, Point};
use pointerflow_model::gesture::GesturePhase;
use pointerflow_model::signal::SignalKind;
use pointerflow_recognizers::{pan, pinch, tap, PanSignal, TapSignal};
use pointerflow_stream::{Stream, Subject};

fn load_fixture(name: &str) -> Vec<PointerEvent> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("gestures")
        .join(name);

    let content = std::fs::read_to_string(path).expect("fixture events should be readable");
    parse_events(&content).expect("fixture events should parse")
}

fn collect<T: 'static>(stream: &Stream<T>) -> Rc<RefCell<Vec<T>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    stream.subscribe_next(move |value| sink.borrow_mut().push(value));
    seen
}

fn tap_counts(signals: &[TapSignal]) -> Vec<u32> {
    signals.iter().map(|s| s.value().count).collect()
}

#[test]
fn pan_fixture_replays_to_rightward_pan() {
    let events = Stream::of(load_fixture("pan_right.jsonl"));
    let signals = collect(&pan(&events, &PanConfig::default()).unwrap());
    let signals = signals.borrow();

    let phases: Vec<_> = signals.iter().map(|s| s.value().phase).collect();
    assert_eq!(
        phases,
        vec![
            GesturePhase::Start,
            GesturePhase::Move,
            GesturePhase::Move,
            GesturePhase::Move,
            GesturePhase::End,
        ]
    );
    assert!(signals.iter().all(|s| s.kind() == SignalKind::Pan));
    assert!(signals
        .iter()
        .all(|s| s.value().direction == Direction::Right));

    let first_move = signals[1].value();
    assert_eq!((first_move.delta_x, first_move.delta_y), (12.0, 0.0));
    assert_eq!(first_move.velocity_x, 9.0 / 16.0);

    let end = signals[4].value();
    assert_eq!((end.delta_x, end.delta_y), (80.0, 4.0));
    assert_eq!(signals[4].created_at(), 80.0);
}

#[test]
fn pinch_fixture_replays_to_doubling_scale() {
    let events = Stream::of(load_fixture("pinch_spread.jsonl"));
    let signals = collect(&pinch(&events, &PinchConfig::default()).unwrap());
    let signals = signals.borrow();

    let phases: Vec<_> = signals.iter().map(|s| s.value().phase).collect();
    assert_eq!(
        phases,
        vec![
            GesturePhase::Start,
            GesturePhase::Move,
            GesturePhase::Move,
            GesturePhase::Move,
            GesturePhase::End,
        ]
    );
    let scales: Vec<_> = signals.iter().map(|s| s.value().scale).collect();
    assert_eq!(scales, vec![1.25, 1.5, 1.75, 2.0, 2.0]);
    assert_eq!(signals[0].value().center, Point::new(262.5, 300.0));
    assert!(signals.iter().all(|s| s.value().rotation == 0.0));
    assert!(signals.iter().all(|s| s.device_id().as_str() == "panel-0"));
}

#[test]
fn tap_fixture_replays_chain_and_long_press() {
    let events = Stream::of(load_fixture("taps.jsonl"));
    let signals = collect(&tap(&events, &TapConfig::default()).unwrap());
    let signals = signals.borrow();

    let summary: Vec<_> = signals
        .iter()
        .map(|s| (s.value().phase, s.value().count))
        .collect();
    assert_eq!(
        summary,
        vec![
            (GesturePhase::Start, 1),
            (GesturePhase::End, 1),
            (GesturePhase::Start, 2),
            (GesturePhase::End, 2),
            (GesturePhase::Start, 1),
            (GesturePhase::Cancel, 1),
            (GesturePhase::Start, 1),
            (GesturePhase::End, 1),
        ]
    );
    assert!(signals.iter().all(|s| s.device_id().as_str() == "mouse"));
}

#[test]
fn resubscribing_runs_independent_recognizers() {
    let events = Stream::of(load_fixture("taps.jsonl"));
    let stream = tap(&events, &TapConfig::default()).unwrap();

    let first = collect(&stream);
    let second = collect(&stream);
    // A shared machine would have chained the second replay onto the first.
    assert_eq!(tap_counts(&first.borrow()), tap_counts(&second.borrow()));
}

#[test]
fn unsubscribe_mid_gesture_stops_signals() {
    let subject = Subject::new();
    let stream = pan(&subject.stream(), &PanConfig::default()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = stream.subscribe_next(move |s: PanSignal| {
        sink.borrow_mut().push(s.value().phase)
    });

    subject.next(PointerEvent::start(1, 0.0, 0.0, 0.0));
    subject.next(PointerEvent::moved(1, 20.0, 0.0, 10.0));
    subscription.unsubscribe();
    subscription.unsubscribe();
    subject.next(PointerEvent::moved(1, 30.0, 0.0, 20.0));
    subject.next(PointerEvent::end(1, 30.0, 0.0, 30.0));

    assert_eq!(*seen.borrow(), vec![GesturePhase::Start, GesturePhase::Move]);
    assert_eq!(subject.observer_count(), 0);
}

#[test]
fn gestures_compose_with_operators() {
    let events = Stream::of(load_fixture("pan_right.jsonl"));
    let distances = pan(&events, &PanConfig::default())
        .unwrap()
        .filter(|s| s.value().phase == GesturePhase::Move)
        .map(|s| s.value().distance.round() as i64)
        .take(2);

    let seen = collect(&distances);
    assert_eq!(*seen.borrow(), vec![12, 40]);
}
