//! Pointerflow Pointer Tracker
//!
//! Maintains the set of pointers currently down, derived from raw
//! start/move/end/cancel events. Each tracked pointer owns a pooled
//! [`PointerInfo`] from the moment it starts until it ends or is
//! cancelled, at which point the record goes back to the tracker's pool.
//!
//! Pointers arriving while `max_pointers` are already tracked are noted as
//! overflow: they are never reported and never promoted, even when a slot
//! frees up, until they lift and start again.
//!
//! [`stream::track_single`] and [`stream::track_multi`] expose the tracker
//! as signal streams.

pub mod stream;

use serde::Serialize;

use pointerflow_common::config::TrackerConfig;
use pointerflow_common::error::PointerflowResult;
use pointerflow_model::event::{PointerEvent, PointerId, PointerPhase};
use pointerflow_model::pointer::PointerInfo;
use pointerflow_pool::{ObjectPool, PoolConfig, PoolStats};

pub use stream::{track_multi, track_single, PointerSnapshot};

/// What a raw event did to a tracked pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerUpdate {
    pub phase: PointerPhase,
    /// The pointer's record after applying the event. For end/cancel this
    /// is the final state; the pooled record itself is already released.
    pub pointer: PointerInfo,
}

/// Tracks live pointers with pooled per-pointer records.
pub struct PointerTracker {
    pool: ObjectPool<PointerInfo>,
    active: Vec<PointerInfo>,
    overflow: Vec<PointerId>,
    max_pointers: usize,
}

impl PointerTracker {
    /// Create a tracker. The pool is pre-filled with one record per slot.
    pub fn new(config: &TrackerConfig) -> PointerflowResult<Self> {
        config.validate()?;
        let pool = ObjectPool::new(
            PoolConfig::new(
                config.max_pointers.min(config.pool_max_size),
                config.pool_max_size,
            ),
            PointerInfo::default,
            PointerInfo::reset,
        )?;

        Ok(Self {
            pool,
            active: Vec::with_capacity(config.max_pointers),
            overflow: Vec::new(),
            max_pointers: config.max_pointers,
        })
    }

    /// Apply a raw event. Returns `None` when the event does not concern a
    /// tracked pointer (overflow, unknown id, or non-finite values).
    pub fn process(&mut self, event: &PointerEvent) -> Option<PointerUpdate> {
        if !event.is_finite() {
            tracing::warn!(id = event.id, "Ignoring pointer event with non-finite values");
            return None;
        }

        match event.phase {
            PointerPhase::Start => self.start(event),
            PointerPhase::Move => self.update(event),
            PointerPhase::End | PointerPhase::Cancel => self.finish(event),
        }
    }

    fn start(&mut self, event: &PointerEvent) -> Option<PointerUpdate> {
        if let Some(info) = self.active.iter_mut().find(|info| info.id == event.id) {
            tracing::debug!(id = event.id, "Repeated start restarts tracked pointer");
            info.begin(event);
            return Some(PointerUpdate {
                phase: PointerPhase::Start,
                pointer: info.clone(),
            });
        }

        if self.overflow.contains(&event.id) {
            return None;
        }

        if self.active.len() >= self.max_pointers {
            tracing::debug!(
                id = event.id,
                max_pointers = self.max_pointers,
                "Pointer cap reached, ignoring pointer until it lifts"
            );
            self.overflow.push(event.id);
            return None;
        }

        let mut info = self.pool.acquire();
        info.begin(event);
        let change = PointerUpdate {
            phase: PointerPhase::Start,
            pointer: info.clone(),
        };
        self.active.push(info);
        Some(change)
    }

    fn update(&mut self, event: &PointerEvent) -> Option<PointerUpdate> {
        match self.active.iter_mut().find(|info| info.id == event.id) {
            Some(info) => {
                info.update(event);
                Some(PointerUpdate {
                    phase: PointerPhase::Move,
                    pointer: info.clone(),
                })
            }
            None => {
                if !self.overflow.contains(&event.id) {
                    tracing::trace!(id = event.id, "Move for untracked pointer");
                }
                None
            }
        }
    }

    fn finish(&mut self, event: &PointerEvent) -> Option<PointerUpdate> {
        let Some(index) = self.active.iter().position(|info| info.id == event.id) else {
            self.overflow.retain(|id| *id != event.id);
            return None;
        };

        let mut info = self.active.remove(index);
        info.update(event);
        let change = PointerUpdate {
            phase: event.phase,
            pointer: info.clone(),
        };
        self.pool.release(info);
        Some(change)
    }

    /// Tracked pointers in arrival order.
    pub fn pointers(&self) -> &[PointerInfo] {
        &self.active
    }

    pub fn get(&self, id: PointerId) -> Option<&PointerInfo> {
        self.active.iter().find(|info| info.id == id)
    }

    pub fn is_tracked(&self, id: PointerId) -> bool {
        self.get(id).is_some()
    }

    /// Number of tracked (reported) pointers.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of pointers held back by the cap.
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    pub fn max_pointers(&self) -> usize {
        self.max_pointers
    }

    /// Idle records waiting in the pool.
    pub fn pool_free(&self) -> usize {
        self.pool.free_len()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Forget every pointer, returning all records to the pool.
    pub fn reset(&mut self) {
        for info in self.active.drain(..) {
            self.pool.release(info);
        }
        self.overflow.clear();
    }
}

impl std::fmt::Debug for PointerTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerTracker")
            .field("active", &self.active)
            .field("overflow", &self.overflow)
            .field("max_pointers", &self.max_pointers)
            .field("pool", &self.pool)
            .finish()
    }
}
