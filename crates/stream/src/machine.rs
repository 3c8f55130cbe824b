//! Per-subscription state machines driven by an upstream stream.
//!
//! Trackers and recognizers are stateful: each subscription needs its own
//! instance, and whatever pooled records the instance holds must be handed
//! back when the subscription ends. [`drive`] wires a [`Machine`] between a
//! source and a downstream subscriber with exactly that lifecycle.

use std::cell::RefCell;
use std::rc::Rc;

use pointerflow_common::error::StreamError;

use crate::observer::Observer;
use crate::stream::Stream;
use crate::subscription::{Subscriber, Teardown};

/// A stateful step from upstream values to downstream emissions.
pub trait Machine<T, R> {
    /// Consume one upstream value, emitting zero or more values.
    fn on_next(&mut self, value: T, downstream: &Subscriber<R>);

    /// Release everything held for in-flight sessions. Called once the
    /// subscription ends for any reason; must leave the machine idle.
    fn reset(&mut self);
}

/// Build a stream running a fresh machine from `make` per subscription.
///
/// If `make` fails the subscription errors immediately. Upstream errors
/// reset the machine before being forwarded.
pub fn drive<T, R, M>(
    source: &Stream<T>,
    make: impl Fn() -> Result<M, StreamError> + 'static,
) -> Stream<R>
where
    T: 'static,
    R: 'static,
    M: Machine<T, R> + 'static,
{
    let source = source.clone();
    Stream::create(move |downstream: Subscriber<R>| {
        let machine = match make() {
            Ok(machine) => Rc::new(RefCell::new(machine)),
            Err(err) => {
                downstream.error(err);
                return Teardown::empty();
            }
        };

        let upstream = source.subscribe(MachineObserver {
            machine: Rc::clone(&machine),
            downstream,
        });
        Teardown::new(move || {
            upstream.unsubscribe();
            if let Ok(mut machine) = machine.try_borrow_mut() {
                machine.reset();
            }
        })
    })
}

struct MachineObserver<M, R> {
    machine: Rc<RefCell<M>>,
    downstream: Subscriber<R>,
}

impl<T, R, M> Observer<T> for MachineObserver<M, R>
where
    R: 'static,
    M: Machine<T, R>,
{
    fn next(&mut self, value: T) {
        if self.downstream.is_closed() {
            return;
        }
        let mut machine = self.machine.borrow_mut();
        machine.on_next(value, &self.downstream);
        // The consumer may have unsubscribed from inside the emission, while
        // the teardown could not reach the machine.
        if self.downstream.is_closed() {
            machine.reset();
        }
    }

    fn error(&mut self, err: StreamError) {
        if let Ok(mut machine) = self.machine.try_borrow_mut() {
            machine.reset();
        }
        self.downstream.error(err);
    }

    fn complete(&mut self) {
        if let Ok(mut machine) = self.machine.try_borrow_mut() {
            machine.reset();
        }
        self.downstream.complete();
    }
}
