//! Tracker-backed signal streams.
//!
//! Both factories validate their configuration up front and then build a
//! fresh [`PointerTracker`] for every subscription. `track_single` stays
//! silent for events the tracker ignores; `track_multi` still reports the
//! unchanged snapshot for them. Non-finite events produce no signal on
//! either stream.

use serde::Serialize;

use pointerflow_common::config::TrackerConfig;
use pointerflow_common::error::{PointerflowResult, StreamError};
use pointerflow_model::event::{PointerEvent, PointerId, PointerPhase};
use pointerflow_model::pointer::PointerInfo;
use pointerflow_model::signal::{Signal, SignalKind};
use pointerflow_pool::{ObjectPool, PoolConfig, Pooled, SharedPool};
use pointerflow_stream::{drive, Machine, Stream, Subscriber};

use crate::{PointerTracker, PointerUpdate};

/// Every tracked pointer after one raw event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerSnapshot {
    /// Phase of the event that produced this snapshot.
    pub phase: PointerPhase,
    /// Pointer the event concerned.
    pub changed: PointerId,
    /// Tracked pointers in arrival order. A pointer that just ended is no
    /// longer listed.
    pub pointers: Pooled<Vec<PointerInfo>>,
}

impl PointerSnapshot {
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn get(&self, id: PointerId) -> Option<&PointerInfo> {
        self.pointers.iter().find(|info| info.id == id)
    }
}

fn build_tracker(config: &TrackerConfig) -> Result<PointerTracker, StreamError> {
    PointerTracker::new(config).map_err(|err| StreamError::source(err.to_string()))
}

/// Emit one `pointer` signal per raw event concerning a tracked pointer.
pub fn track_single(
    source: &Stream<PointerEvent>,
    config: &TrackerConfig,
) -> PointerflowResult<Stream<Signal<PointerUpdate>>> {
    config.validate()?;
    let config = config.clone();
    Ok(drive(source, move || {
        Ok(SingleTracking {
            tracker: build_tracker(&config)?,
        })
    }))
}

struct SingleTracking {
    tracker: PointerTracker,
}

impl Machine<PointerEvent, Signal<PointerUpdate>> for SingleTracking {
    fn on_next(&mut self, event: PointerEvent, downstream: &Subscriber<Signal<PointerUpdate>>) {
        if let Some(update) = self.tracker.process(&event) {
            downstream.next(Signal::new(
                SignalKind::Pointer,
                update,
                event.device(),
                event.timestamp,
            ));
        }
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}

/// Emit one `pointers` snapshot signal per raw event.
///
/// Overflow pointers and unknown ids leave the snapshot unchanged, so the
/// signal for them lists only the tracked pointers. Events with non-finite
/// values are dropped.
pub fn track_multi(
    source: &Stream<PointerEvent>,
    config: &TrackerConfig,
) -> PointerflowResult<Stream<Signal<PointerSnapshot>>> {
    config.validate()?;
    let config = config.clone();
    Ok(drive(source, move || {
        let capacity = config.max_pointers;
        let snapshots = ObjectPool::new(
            PoolConfig::bounded(config.pool_max_size),
            move || Vec::with_capacity(capacity),
            |pointers: &mut Vec<PointerInfo>| pointers.clear(),
        )
        .map_err(|err| StreamError::source(err.to_string()))?;

        Ok(MultiTracking {
            tracker: build_tracker(&config)?,
            snapshots: SharedPool::new(snapshots),
        })
    }))
}

struct MultiTracking {
    tracker: PointerTracker,
    snapshots: SharedPool<Vec<PointerInfo>>,
}

impl Machine<PointerEvent, Signal<PointerSnapshot>> for MultiTracking {
    fn on_next(&mut self, event: PointerEvent, downstream: &Subscriber<Signal<PointerSnapshot>>) {
        if !event.is_finite() {
            tracing::warn!(id = event.id, "Dropping pointer event with non-finite values");
            return;
        }
        self.tracker.process(&event);

        let mut pointers = self.snapshots.acquire();
        pointers.extend(self.tracker.pointers().iter().cloned());
        let snapshot = PointerSnapshot {
            phase: event.phase,
            changed: event.id,
            pointers,
        };
        downstream.next(Signal::new(
            SignalKind::Pointers,
            snapshot,
            event.device(),
            event.timestamp,
        ));
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}
