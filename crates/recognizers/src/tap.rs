//! Tap and multi-tap recognition.
//!
//! One press is followed at a time. A press that stays within
//! `movement_threshold` of its origin and lifts within
//! `duration_threshold` is a tap. Consecutive taps close enough in time
//! and space chain, and each carries its position in the chain as
//! `count`.

use pointerflow_common::clock::{elapsed_ms, Timestamp};
use pointerflow_common::config::TapConfig;
use pointerflow_common::error::PointerflowResult;
use pointerflow_model::event::{PointerEvent, PointerId, PointerPhase};
use pointerflow_model::geometry::Point;
use pointerflow_model::gesture::{GesturePhase, TapValue};
use pointerflow_model::pointer::PointerInfo;
use pointerflow_model::signal::{Signal, SignalKind};
use pointerflow_pool::{Pooled, SharedPool};
use pointerflow_stream::{drive, Machine, Stream, Subscriber};
use pointerflow_tracker::PointerTracker;

use crate::{construction_error, payload_pool};

/// Signal emitted by the tap recognizer.
pub type TapSignal = Signal<Pooled<TapValue>>;

/// Where the tap machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapState {
    /// No press followed.
    Idle,
    /// A press is down and may still become a tap.
    Pressed,
    /// The press failed; waiting for its pointer to lift.
    Rejected,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    pointer: PointerId,
    origin: Point,
    started_at: Timestamp,
    count: u32,
}

/// The last successful tap, for chaining.
#[derive(Debug, Clone, Copy)]
struct LastTap {
    origin: Point,
    ended_at: Timestamp,
    count: u32,
}

/// Tap state machine.
pub struct TapRecognizer {
    config: TapConfig,
    tracker: PointerTracker,
    payloads: SharedPool<TapValue>,
    state: TapState,
    press: Option<Press>,
    rejected: Option<PointerId>,
    last: Option<LastTap>,
}

impl TapRecognizer {
    pub fn new(config: &TapConfig) -> PointerflowResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            tracker: PointerTracker::new(&config.tracker())?,
            payloads: payload_pool(config.pool_max_size)?,
            state: TapState::Idle,
            press: None,
            rejected: None,
            last: None,
        })
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Count of the last completed tap still eligible for chaining.
    pub fn chain_count(&self) -> u32 {
        self.last.map_or(0, |last| last.count)
    }

    /// Feed one raw event, handing every resulting signal to `emit`.
    pub fn process(&mut self, event: &PointerEvent, mut emit: impl FnMut(TapSignal)) {
        let Some(update) = self.tracker.process(event) else {
            return;
        };
        let info = &update.pointer;

        match (self.state, update.phase) {
            (TapState::Idle, PointerPhase::Start) => {
                if self.tracker.len() > 1 {
                    return;
                }
                let origin = info.start_position();
                let count = self.chained_count(origin, info.start_time);
                self.press = Some(Press {
                    pointer: info.id,
                    origin,
                    started_at: info.start_time,
                    count,
                });
                self.state = TapState::Pressed;
                tracing::debug!(pointer = info.id, count, "Tap pressed");
                emit(self.signal(GesturePhase::Start, event, info, count));
            }
            (TapState::Pressed, PointerPhase::Start) => {
                if self.press.is_some_and(|press| press.pointer != info.id) {
                    tracing::debug!(pointer = info.id, "Second pointer cancels tap");
                }
                self.fail(event, &mut emit);
            }
            (TapState::Pressed, PointerPhase::Move) => {
                let Some(press) = self.pressed(info.id) else {
                    return;
                };
                if !self.within_limits(&press, info) {
                    self.fail(event, &mut emit);
                }
            }
            (TapState::Pressed, PointerPhase::End) => {
                let Some(press) = self.pressed(info.id) else {
                    return;
                };
                if !self.within_limits(&press, info) {
                    self.fail(event, &mut emit);
                    self.settle(info.id);
                    return;
                }
                tracing::debug!(pointer = info.id, count = press.count, "Tap recognized");
                emit(self.signal(GesturePhase::End, event, info, press.count));
                self.last = Some(LastTap {
                    origin: press.origin,
                    ended_at: info.last_time,
                    count: press.count,
                });
                self.press = None;
                self.state = TapState::Idle;
            }
            (TapState::Pressed, PointerPhase::Cancel) => {
                if self.pressed(info.id).is_none() {
                    return;
                }
                self.fail(event, &mut emit);
                self.settle(info.id);
            }
            (TapState::Rejected, PointerPhase::End | PointerPhase::Cancel) => {
                self.settle(info.id);
            }
            _ => {}
        }
    }

    fn pressed(&self, pointer: PointerId) -> Option<Press> {
        self.press.filter(|press| press.pointer == pointer)
    }

    fn within_limits(&self, press: &Press, info: &PointerInfo) -> bool {
        let travelled = press.origin.distance_to(&info.position());
        let held = elapsed_ms(press.started_at, info.last_time);
        travelled <= self.config.movement_threshold && held <= self.config.duration_threshold
    }

    fn chained_count(&self, origin: Point, started_at: Timestamp) -> u32 {
        match self.last {
            Some(last)
                if elapsed_ms(last.ended_at, started_at) <= self.config.chain_interval()
                    && origin.distance_to(&last.origin) <= self.config.chain_movement() =>
            {
                last.count.saturating_add(1)
            }
            _ => 1,
        }
    }

    /// Abandon the current press: optionally report it, break the chain,
    /// and ignore its pointer until it lifts.
    fn fail(&mut self, event: &PointerEvent, emit: &mut impl FnMut(TapSignal)) {
        let Some(press) = self.press.take() else {
            return;
        };
        tracing::debug!(pointer = press.pointer, "Tap cancelled");
        if self.config.emit_cancel {
            let mut value = self.payloads.acquire();
            value.phase = GesturePhase::Cancel;
            value.count = press.count;
            value.x = event.x;
            value.y = event.y;
            emit(Signal::new(SignalKind::Tap, value, event.device(), event.timestamp));
        }
        self.last = None;
        self.rejected = Some(press.pointer);
        self.state = TapState::Rejected;
    }

    /// Return to idle once the rejected pointer lifts.
    fn settle(&mut self, pointer: PointerId) {
        if self.rejected == Some(pointer) {
            self.rejected = None;
            self.state = TapState::Idle;
        }
    }

    fn signal(
        &self,
        phase: GesturePhase,
        event: &PointerEvent,
        info: &PointerInfo,
        count: u32,
    ) -> TapSignal {
        let mut value = self.payloads.acquire();
        value.phase = phase;
        value.count = count;
        value.x = info.x;
        value.y = info.y;
        Signal::new(SignalKind::Tap, value, event.device(), event.timestamp)
    }

    /// Drop the press, the chain and every tracked pointer.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.press = None;
        self.rejected = None;
        self.last = None;
        self.state = TapState::Idle;
    }
}

impl Machine<PointerEvent, TapSignal> for TapRecognizer {
    fn on_next(&mut self, event: PointerEvent, downstream: &Subscriber<TapSignal>) {
        self.process(&event, |signal| downstream.next(signal));
    }

    fn reset(&mut self) {
        TapRecognizer::reset(self);
    }
}

/// Tap signals recognized from `source`. Each subscription runs its own
/// recognizer.
pub fn tap(
    source: &Stream<PointerEvent>,
    config: &TapConfig,
) -> PointerflowResult<Stream<TapSignal>> {
    config.validate()?;
    let config = config.clone();
    Ok(drive(source, move || {
        TapRecognizer::new(&config).map_err(construction_error)
    }))
}
