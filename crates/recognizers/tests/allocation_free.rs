//! Steady-state gesture updates must not touch the heap.
//!
//! One test per binary: the counting allocator is process-wide.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use pointerflow_common::config::{PanConfig, PinchConfig, TapConfig};
use pointerflow_model::event::PointerEvent;
use pointerflow_recognizers::{pan, PanRecognizer, PanState, PinchRecognizer, TapRecognizer};
use pointerflow_stream::Subject;

struct CountingAlloc;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn allocations_during(f: impl FnOnce()) -> usize {
    let before = ALLOCATIONS.with(Cell::get);
    f();
    ALLOCATIONS.with(Cell::get) - before
}

fn pan_moves(recognizer: &mut PanRecognizer, from: i32) {
    for step in from..from + 100 {
        let x = 20.0 + f64::from(step);
        let event = PointerEvent::moved(1, x, 0.0, 100.0 + f64::from(step) * 8.0);
        recognizer.process(&event, drop);
    }
}

#[test]
fn test_steady_state_updates_do_not_allocate() {
    // Pan, driven directly.
    let mut recognizer = PanRecognizer::new(&PanConfig::default()).unwrap();
    recognizer.process(&PointerEvent::start(1, 0.0, 0.0, 0.0), drop);
    recognizer.process(&PointerEvent::moved(1, 20.0, 0.0, 16.0), drop);
    assert_eq!(recognizer.state(), PanState::Panning);
    pan_moves(&mut recognizer, 0);
    assert_eq!(allocations_during(|| pan_moves(&mut recognizer, 100)), 0);

    // Pinch, two pointers spreading apart.
    let mut pinch = PinchRecognizer::new(&PinchConfig::default()).unwrap();
    pinch.process(&PointerEvent::start(1, 0.0, 0.0, 0.0), drop);
    pinch.process(&PointerEvent::start(2, 10.0, 0.0, 0.0), drop);
    let spread = |pinch: &mut PinchRecognizer, from: i32| {
        for step in from..from + 100 {
            let offset = f64::from(step);
            let at = 16.0 + offset * 8.0;
            pinch.process(&PointerEvent::moved(1, -offset, 0.0, at), drop);
            pinch.process(&PointerEvent::moved(2, 10.0 + offset, 0.0, at), drop);
        }
    };
    spread(&mut pinch, 0);
    assert_eq!(allocations_during(|| spread(&mut pinch, 100)), 0);

    // Tap, repeated press and release far enough apart to never chain.
    let mut tap = TapRecognizer::new(&TapConfig::default()).unwrap();
    let taps = |tap: &mut TapRecognizer, from: i32| {
        for step in from..from + 50 {
            let at = f64::from(step) * 1_000.0;
            tap.process(&PointerEvent::start(1, 0.0, 0.0, at), drop);
            tap.process(&PointerEvent::moved(1, 1.0, 0.0, at + 10.0), drop);
            tap.process(&PointerEvent::end(1, 1.0, 0.0, at + 20.0), drop);
        }
    };
    taps(&mut tap, 0);
    assert_eq!(allocations_during(|| taps(&mut tap, 50)), 0);

    // Pan again, through a subject and a subscribed stream.
    let input = Subject::new();
    let pans = pan(&input.stream(), &PanConfig::default()).unwrap();
    let subscription = pans.subscribe_next(drop);
    input.next(PointerEvent::start(1, 0.0, 0.0, 0.0));
    input.next(PointerEvent::moved(1, 20.0, 0.0, 16.0));
    let push = |from: i32| {
        for step in from..from + 100 {
            let x = 20.0 + f64::from(step);
            input.next(PointerEvent::moved(1, x, 0.0, 100.0 + f64::from(step) * 8.0));
        }
    };
    push(0);
    assert_eq!(allocations_during(|| push(100)), 0);
    subscription.unsubscribe();
}
