//! Single-pointer pan recognition.
//!
//! A pan session begins when a pointer goes down while no session is
//! running. It stays pending until the pointer has travelled more than
//! `threshold` from its origin, at which point the dominant direction is
//! fixed. A direction the configured mode does not allow rejects the
//! session silently until the pointer lifts.

use pointerflow_common::clock::{elapsed_ms, Timestamp};
use pointerflow_common::config::PanConfig;
use pointerflow_common::error::PointerflowResult;
use pointerflow_model::event::{PointerEvent, PointerId, PointerPhase};
use pointerflow_model::geometry::{self, Direction};
use pointerflow_model::gesture::{GesturePhase, PanValue};
use pointerflow_model::pointer::PointerInfo;
use pointerflow_model::signal::{Signal, SignalKind};
use pointerflow_pool::{Pooled, SharedPool};
use pointerflow_stream::{drive, Machine, Stream, Subscriber};
use pointerflow_tracker::PointerTracker;

use crate::{construction_error, payload_pool};

/// Signal emitted by the pan recognizer.
pub type PanSignal = Signal<Pooled<PanValue>>;

/// Where the pan machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanState {
    /// No pointer followed.
    Idle,
    /// Pointer down, threshold not yet crossed.
    Pending,
    /// Pan in progress; `move` signals flow.
    Panning,
    /// Threshold crossed in a disallowed direction; waiting for the
    /// pointer to lift.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    pointer: PointerId,
    direction: Direction,
    last_x: f64,
    last_y: f64,
    last_time: Timestamp,
    velocity_x: f64,
    velocity_y: f64,
}

impl Session {
    fn new(info: &PointerInfo) -> Self {
        Self {
            pointer: info.id,
            direction: Direction::None,
            last_x: info.x,
            last_y: info.y,
            last_time: info.last_time,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    /// Fold in a new sample. Velocity keeps its previous value when no
    /// time has elapsed.
    fn sample(&mut self, info: &PointerInfo) {
        let elapsed = elapsed_ms(self.last_time, info.last_time);
        if elapsed > 0.0 {
            self.velocity_x = (info.x - self.last_x) / elapsed;
            self.velocity_y = (info.y - self.last_y) / elapsed;
        }
        self.last_x = info.x;
        self.last_y = info.y;
        self.last_time = info.last_time;
    }
}

/// Pan state machine.
pub struct PanRecognizer {
    config: PanConfig,
    tracker: PointerTracker,
    payloads: SharedPool<PanValue>,
    state: PanState,
    session: Option<Session>,
}

impl PanRecognizer {
    pub fn new(config: &PanConfig) -> PointerflowResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            tracker: PointerTracker::new(&config.tracker())?,
            payloads: payload_pool(config.pool_max_size)?,
            state: PanState::Idle,
            session: None,
        })
    }

    pub fn state(&self) -> PanState {
        self.state
    }

    pub fn config(&self) -> &PanConfig {
        &self.config
    }

    /// Direction fixed when the threshold was crossed, if panning.
    pub fn direction(&self) -> Option<Direction> {
        match self.state {
            PanState::Panning => self.session.map(|session| session.direction),
            _ => None,
        }
    }

    /// Feed one raw event, handing every resulting signal to `emit`.
    pub fn process(&mut self, event: &PointerEvent, mut emit: impl FnMut(PanSignal)) {
        let Some(update) = self.tracker.process(event) else {
            return;
        };
        let info = &update.pointer;

        if update.phase == PointerPhase::Start {
            if self.state == PanState::Idle {
                self.session = Some(Session::new(info));
                self.state = PanState::Pending;
                tracing::debug!(pointer = info.id, "Pan pending");
            }
            return;
        }

        let Some(mut session) = self.session else {
            return;
        };
        if session.pointer != info.id {
            return;
        }
        session.sample(info);
        self.session = Some(session);

        match (self.state, update.phase) {
            (PanState::Pending, PointerPhase::Move) => {
                let (dx, dy) = (info.delta_x(), info.delta_y());
                if geometry::distance(0.0, 0.0, dx, dy) <= self.config.threshold {
                    return;
                }

                let direction = geometry::direction(dx, dy);
                if !direction.allowed_by(self.config.direction_mode) {
                    tracing::debug!(
                        pointer = info.id,
                        ?direction,
                        mode = ?self.config.direction_mode,
                        "Pan rejected by direction mode"
                    );
                    self.state = PanState::Cancelled;
                    return;
                }

                session.direction = direction;
                self.session = Some(session);
                self.state = PanState::Panning;
                tracing::debug!(pointer = info.id, ?direction, "Pan started");

                emit(self.signal(GesturePhase::Start, event, info, &session));
                emit(self.signal(GesturePhase::Move, event, info, &session));
            }
            (PanState::Panning, PointerPhase::Move) => {
                emit(self.signal(GesturePhase::Move, event, info, &session));
            }
            (PanState::Panning, PointerPhase::End | PointerPhase::Cancel) => {
                let phase = if update.phase == PointerPhase::End {
                    GesturePhase::End
                } else {
                    GesturePhase::Cancel
                };
                tracing::debug!(pointer = info.id, ?phase, "Pan finished");
                emit(self.signal(phase, event, info, &session));
                self.finish();
            }
            (_, PointerPhase::End | PointerPhase::Cancel) => self.finish(),
            _ => {}
        }
    }

    fn signal(
        &self,
        phase: GesturePhase,
        event: &PointerEvent,
        info: &PointerInfo,
        session: &Session,
    ) -> PanSignal {
        let mut value = self.payloads.acquire();
        value.phase = phase;
        value.delta_x = info.delta_x();
        value.delta_y = info.delta_y();
        value.velocity_x = session.velocity_x;
        value.velocity_y = session.velocity_y;
        value.direction = session.direction;
        value.distance = geometry::distance(0.0, 0.0, value.delta_x, value.delta_y);
        Signal::new(SignalKind::Pan, value, event.device(), event.timestamp)
    }

    fn finish(&mut self) {
        self.session = None;
        self.state = PanState::Idle;
    }

    /// Drop the session and every tracked pointer.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.finish();
    }
}

impl Machine<PointerEvent, PanSignal> for PanRecognizer {
    fn on_next(&mut self, event: PointerEvent, downstream: &Subscriber<PanSignal>) {
        self.process(&event, |signal| downstream.next(signal));
    }

    fn reset(&mut self) {
        PanRecognizer::reset(self);
    }
}

/// Pan signals recognized from `source`. Each subscription runs its own
/// recognizer.
pub fn pan(
    source: &Stream<PointerEvent>,
    config: &PanConfig,
) -> PointerflowResult<Stream<PanSignal>> {
    config.validate()?;
    let config = config.clone();
    Ok(drive(source, move || {
        PanRecognizer::new(&config).map_err(construction_error)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointerflow_common::config::DirectionMode;

    fn run(config: &PanConfig, events: &[PointerEvent]) -> (PanRecognizer, Vec<PanSignal>) {
        let mut recognizer = PanRecognizer::new(config).unwrap();
        let mut signals = Vec::new();
        for event in events {
            recognizer.process(event, |signal| signals.push(signal));
        }
        (recognizer, signals)
    }

    fn phases(signals: &[PanSignal]) -> Vec<GesturePhase> {
        signals.iter().map(|s| s.value().phase).collect()
    }

    #[test]
    fn test_threshold_crossing_emits_start_then_move() {
        let (recognizer, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 3.0, 3.0, 10.0),
            ],
        );
        assert!(signals.is_empty());
        assert_eq!(recognizer.state(), PanState::Pending);

        let (recognizer, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 3.0, 3.0, 10.0),
                PointerEvent::moved(1, 12.0, 0.0, 20.0),
            ],
        );
        assert_eq!(phases(&signals), vec![GesturePhase::Start, GesturePhase::Move]);
        let value = signals[1].value();
        assert_eq!((value.delta_x, value.delta_y), (12.0, 0.0));
        assert_eq!(value.direction, Direction::Right);
        assert_eq!(value.distance, 12.0);
        assert_eq!(recognizer.state(), PanState::Panning);
        assert_eq!(recognizer.direction(), Some(Direction::Right));
    }

    #[test]
    fn test_end_reports_final_deltas() {
        let (recognizer, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 3.0, 3.0, 10.0),
                PointerEvent::moved(1, 12.0, 0.0, 20.0),
                PointerEvent::end(1, 12.0, 0.0, 30.0),
            ],
        );
        assert_eq!(
            phases(&signals),
            vec![GesturePhase::Start, GesturePhase::Move, GesturePhase::End]
        );
        let end = signals[2].value();
        assert_eq!((end.delta_x, end.delta_y), (12.0, 0.0));
        assert_eq!(recognizer.state(), PanState::Idle);
    }

    #[test]
    fn test_velocity_from_last_two_samples() {
        let (_, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 20.0, 0.0, 10.0),
                PointerEvent::moved(1, 30.0, -5.0, 15.0),
                PointerEvent::moved(1, 40.0, -5.0, 15.0),
            ],
        );
        let second = signals[2].value();
        assert_eq!(second.velocity_x, 2.0);
        assert_eq!(second.velocity_y, -1.0);
        // Zero elapsed time keeps the previous velocity.
        let third = signals[3].value();
        assert_eq!(third.velocity_x, 2.0);
        assert_eq!(third.delta_x, 40.0);
    }

    #[test]
    fn test_cancel_while_panning() {
        let (_, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 0.0, 15.0, 10.0),
                PointerEvent::cancel(1, 0.0, 16.0, 20.0),
            ],
        );
        assert_eq!(
            phases(&signals),
            vec![GesturePhase::Start, GesturePhase::Move, GesturePhase::Cancel]
        );
        assert_eq!(signals[0].value().direction, Direction::Down);
    }

    #[test]
    fn test_disallowed_direction_rejects_until_lift() {
        let config = PanConfig {
            direction_mode: DirectionMode::Horizontal,
            ..Default::default()
        };
        let (recognizer, signals) = run(
            &config,
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 0.0, -20.0, 10.0),
                PointerEvent::moved(1, 40.0, -20.0, 20.0),
            ],
        );
        assert!(signals.is_empty());
        assert_eq!(recognizer.state(), PanState::Cancelled);

        let (recognizer, signals) = run(
            &config,
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 0.0, -20.0, 10.0),
                PointerEvent::end(1, 0.0, -20.0, 20.0),
                PointerEvent::start(2, 0.0, 0.0, 30.0),
                PointerEvent::moved(2, -20.0, 0.0, 40.0),
            ],
        );
        assert_eq!(phases(&signals), vec![GesturePhase::Start, GesturePhase::Move]);
        assert_eq!(signals[0].value().direction, Direction::Left);
        assert_eq!(recognizer.state(), PanState::Panning);
    }

    #[test]
    fn test_second_pointer_ignored() {
        let (_, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::start(2, 100.0, 100.0, 1.0),
                PointerEvent::moved(2, 200.0, 100.0, 2.0),
                PointerEvent::end(2, 200.0, 100.0, 3.0),
            ],
        );
        assert!(signals.is_empty());
    }

    #[test]
    fn test_end_while_pending_emits_nothing() {
        let (recognizer, signals) = run(
            &PanConfig::default(),
            &[
                PointerEvent::start(1, 0.0, 0.0, 0.0),
                PointerEvent::moved(1, 5.0, 0.0, 10.0),
                PointerEvent::end(1, 5.0, 0.0, 20.0),
            ],
        );
        assert!(signals.is_empty());
        assert_eq!(recognizer.state(), PanState::Idle);
    }

    #[test]
    fn test_payloads_are_recycled() {
        let mut recognizer = PanRecognizer::new(&PanConfig::default()).unwrap();
        let events = [
            PointerEvent::start(1, 0.0, 0.0, 0.0),
            PointerEvent::moved(1, 20.0, 0.0, 10.0),
            PointerEvent::moved(1, 30.0, 0.0, 20.0),
            PointerEvent::moved(1, 40.0, 0.0, 30.0),
            PointerEvent::end(1, 40.0, 0.0, 40.0),
        ];
        for event in &events {
            recognizer.process(event, drop);
        }
        assert_eq!(recognizer.payloads.stats().created, 1);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config = PanConfig {
            threshold: 0.0,
            ..Default::default()
        };
        assert!(PanRecognizer::new(&config).is_err());
        assert!(pan(&Stream::empty(), &config).is_err());
    }
}
