//! Multi-pointer pinch recognition.
//!
//! Once `pointers` pointers are tracked, the first `pointers` of them (in
//! arrival order) form the pinch group and their spread and angle become
//! the baseline. Spread is twice the mean distance of the group to its
//! centroid, which for two pointers is simply the distance between them.
//! The pinch activates when the spread has moved more than
//! `distance_epsilon` away from the baseline.

use pointerflow_common::config::PinchConfig;
use pointerflow_common::error::PointerflowResult;
use pointerflow_model::event::{PointerEvent, PointerId, PointerPhase};
use pointerflow_model::geometry::{self, Point};
use pointerflow_model::gesture::{GesturePhase, PinchValue};
use pointerflow_model::pointer::PointerInfo;
use pointerflow_model::signal::{Signal, SignalKind};
use pointerflow_pool::{Pooled, SharedPool};
use pointerflow_stream::{drive, Machine, Stream, Subscriber};
use pointerflow_tracker::PointerTracker;

use crate::{construction_error, payload_pool};

/// Signal emitted by the pinch recognizer.
pub type PinchSignal = Signal<Pooled<PinchValue>>;

/// Where the pinch machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchState {
    /// Fewer than `pointers` pointers tracked.
    Idle,
    /// Baseline taken, spread change still within `distance_epsilon`.
    Tracking,
    /// Pinch in progress; `move` signals flow.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    spread: f64,
    angle: f64,
    center: Point,
}

/// Pinch state machine.
pub struct PinchRecognizer {
    config: PinchConfig,
    tracker: PointerTracker,
    payloads: SharedPool<PinchValue>,
    state: PinchState,
    members: Vec<PointerId>,
    points: Vec<Point>,
    initial_distance: f64,
    initial_angle: f64,
}

impl PinchRecognizer {
    pub fn new(config: &PinchConfig) -> PointerflowResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            tracker: PointerTracker::new(&config.tracker())?,
            payloads: payload_pool(config.pool_max_size)?,
            state: PinchState::Idle,
            members: Vec::with_capacity(config.pointers),
            points: Vec::with_capacity(config.pointers),
            initial_distance: 0.0,
            initial_angle: 0.0,
        })
    }

    pub fn state(&self) -> PinchState {
        self.state
    }

    pub fn config(&self) -> &PinchConfig {
        &self.config
    }

    /// Baseline spread, once the pinch group is formed.
    pub fn initial_distance(&self) -> Option<f64> {
        match self.state {
            PinchState::Idle => None,
            _ => Some(self.initial_distance),
        }
    }

    /// Feed one raw event, handing every resulting signal to `emit`.
    pub fn process(&mut self, event: &PointerEvent, mut emit: impl FnMut(PinchSignal)) {
        let Some(update) = self.tracker.process(event) else {
            return;
        };

        match update.phase {
            PointerPhase::Start => {
                if self.state == PinchState::Idle {
                    self.try_baseline();
                }
            }
            PointerPhase::Move => {
                if self.state == PinchState::Idle || !self.members.contains(&update.pointer.id) {
                    return;
                }
                let current = self.measure(None);
                match self.state {
                    PinchState::Tracking => {
                        let change = (current.spread - self.initial_distance).abs();
                        if change > self.config.distance_epsilon {
                            self.state = PinchState::Active;
                            tracing::debug!(
                                initial_distance = self.initial_distance,
                                spread = current.spread,
                                "Pinch started"
                            );
                            emit(self.signal(GesturePhase::Start, event, &current));
                        }
                    }
                    PinchState::Active => {
                        emit(self.signal(GesturePhase::Move, event, &current));
                    }
                    PinchState::Idle => {}
                }
            }
            PointerPhase::End | PointerPhase::Cancel => {
                if self.state == PinchState::Idle || !self.members.contains(&update.pointer.id) {
                    return;
                }
                if self.state == PinchState::Active {
                    let current = self.measure(Some(&update.pointer));
                    let phase = if update.phase == PointerPhase::End {
                        GesturePhase::End
                    } else {
                        GesturePhase::Cancel
                    };
                    tracing::debug!(pointer = update.pointer.id, ?phase, "Pinch finished");
                    emit(self.signal(phase, event, &current));
                }
                self.finish();
                self.try_baseline();
            }
        }
    }

    /// Form the pinch group from the earliest tracked pointers, if enough
    /// are down.
    fn try_baseline(&mut self) {
        if self.tracker.len() < self.config.pointers {
            return;
        }
        self.members.clear();
        self.members.extend(
            self.tracker
                .pointers()
                .iter()
                .take(self.config.pointers)
                .map(|info| info.id),
        );
        let baseline = self.measure(None);
        self.initial_distance = baseline.spread;
        self.initial_angle = baseline.angle;
        self.state = PinchState::Tracking;
        tracing::debug!(
            pointers = self.members.len(),
            initial_distance = self.initial_distance,
            initial_angle = self.initial_angle,
            "Pinch baseline taken"
        );
    }

    /// Current group geometry. `ended` stands in for a member that has
    /// already left the tracker.
    fn measure(&mut self, ended: Option<&PointerInfo>) -> Geometry {
        self.points.clear();
        for id in &self.members {
            let info = match ended {
                Some(info) if info.id == *id => Some(info),
                _ => self.tracker.get(*id),
            };
            if let Some(info) = info {
                self.points.push(info.position());
            }
        }

        let center = geometry::centroid(&self.points).unwrap_or_default();
        let spread = match self.points.len() {
            0 => 0.0,
            n => {
                let total: f64 = self.points.iter().map(|p| p.distance_to(&center)).sum();
                2.0 * total / n as f64
            }
        };
        let angle = match self.points.as_slice() {
            [first, second, ..] => first.angle_to(second),
            _ => 0.0,
        };
        Geometry {
            spread,
            angle,
            center,
        }
    }

    fn signal(&self, phase: GesturePhase, event: &PointerEvent, current: &Geometry) -> PinchSignal {
        let mut value = self.payloads.acquire();
        value.phase = phase;
        value.scale = if self.initial_distance > f64::EPSILON {
            current.spread / self.initial_distance
        } else {
            1.0
        };
        value.rotation = geometry::normalize_angle(current.angle - self.initial_angle);
        value.center = current.center;
        Signal::new(SignalKind::Pinch, value, event.device(), event.timestamp)
    }

    fn finish(&mut self) {
        self.members.clear();
        self.initial_distance = 0.0;
        self.initial_angle = 0.0;
        self.state = PinchState::Idle;
    }

    /// Drop the pinch group and every tracked pointer.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.finish();
    }
}

impl Machine<PointerEvent, PinchSignal> for PinchRecognizer {
    fn on_next(&mut self, event: PointerEvent, downstream: &Subscriber<PinchSignal>) {
        self.process(&event, |signal| downstream.next(signal));
    }

    fn reset(&mut self) {
        PinchRecognizer::reset(self);
    }
}

/// Pinch signals recognized from `source`. Each subscription runs its own
/// recognizer.
pub fn pinch(
    source: &Stream<PointerEvent>,
    config: &PinchConfig,
) -> PointerflowResult<Stream<PinchSignal>> {
    config.validate()?;
    let config = config.clone();
    Ok(drive(source, move || {
        PinchRecognizer::new(&config).map_err(construction_error)
    }))
}
