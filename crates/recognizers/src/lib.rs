//! Pointerflow Recognizers
//!
//! Gesture state machines fed by raw pointer events:
//! - **Pan:** single-pointer drag past a distance threshold, optionally
//!   restricted to one axis
//! - **Pinch:** spread and rotation of a group of pointers
//! - **Tap:** short, still presses, chained into multi-taps
//!
//! Each recognizer owns a [`PointerTracker`](pointerflow_tracker::PointerTracker)
//! and a payload pool. The stream factories ([`pan()`], [`pinch()`],
//! [`tap()`]) validate their configuration, then build a fresh recognizer
//! per subscription; unsubscribing hands every held record back.
//!
//! Recognizers are plain values too: `process` drives one directly
//! without a stream, which is how the tests exercise them.

pub mod pan;
pub mod pinch;
pub mod tap;

pub use pan::{pan, PanRecognizer, PanSignal, PanState};
pub use pinch::{pinch, PinchRecognizer, PinchSignal, PinchState};
pub use tap::{tap, TapRecognizer, TapSignal, TapState};

use pointerflow_common::error::{PointerflowError, PointerflowResult, StreamError};
use pointerflow_pool::{PoolConfig, SharedPool};

/// Per-recognizer pool for emitted payloads.
fn payload_pool<T: Default + 'static>(max_size: usize) -> PointerflowResult<SharedPool<T>> {
    SharedPool::with_default(PoolConfig::bounded(max_size))
}

fn construction_error(err: PointerflowError) -> StreamError {
    StreamError::recognizer(err.to_string())
}
