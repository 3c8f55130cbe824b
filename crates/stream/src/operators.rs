//! Reusable stream transforms.
//!
//! Each operator is a value wrapping `Stream<T> -> Stream<R>`. Applying one
//! never subscribes to anything; per-subscription state (counters,
//! accumulators, rate gates) is created inside the produced stream so every
//! execution stays independent.
//!
//! The `try_*` variants take fallible closures. An `Err` is delivered to
//! that subscription's `error` channel, which ends it and tears down its
//! upstream; other subscriptions to the same source are unaffected.

use std::cell::Cell;
use std::rc::Rc;

use pointerflow_common::clock::{RateController, Timestamp};
use pointerflow_common::error::StreamError;

use crate::observer::Observer;
use crate::stream::Stream;
use crate::subscription::{Subscriber, Teardown};

/// A reusable transform from `Stream<T>` to `Stream<R>`.
pub struct Operator<T, R> {
    apply: Rc<dyn Fn(&Stream<T>) -> Stream<R>>,
}

impl<T, R> Clone for Operator<T, R> {
    fn clone(&self) -> Self {
        Self {
            apply: Rc::clone(&self.apply),
        }
    }
}

impl<T: 'static, R: 'static> Operator<T, R> {
    pub fn new(apply: impl Fn(&Stream<T>) -> Stream<R> + 'static) -> Self {
        Self {
            apply: Rc::new(apply),
        }
    }

    pub fn apply(&self, source: &Stream<T>) -> Stream<R> {
        (self.apply)(source)
    }

    /// Operator applying `self` and then `next`.
    pub fn then<U: 'static>(&self, next: &Operator<R, U>) -> Operator<T, U> {
        compose(self, next)
    }
}

/// Ordered composition: `first` runs before `second`.
pub fn compose<T: 'static, R: 'static, U: 'static>(
    first: &Operator<T, R>,
    second: &Operator<R, U>,
) -> Operator<T, U> {
    let first = first.clone();
    let second = second.clone();
    Operator::new(move |source| second.apply(&first.apply(source)))
}

/// Compose any number of operators left to right.
#[macro_export]
macro_rules! compose {
    ($first:expr $(, $rest:expr)* $(,)?) => {{
        let op = ::std::clone::Clone::clone(&$first);
        $( let op = op.then(&$rest); )*
        op
    }};
}

/// Observer forwarding upstream values to a downstream subscriber through
/// a per-value step. Terminal notifications pass straight through.
struct Forward<T, R, F> {
    downstream: Subscriber<R>,
    step: F,
    _marker: std::marker::PhantomData<fn(T)>,
}

impl<T, R, F> Forward<T, R, F>
where
    R: 'static,
    F: FnMut(T, &Subscriber<R>),
{
    fn new(downstream: Subscriber<R>, step: F) -> Self {
        Self {
            downstream,
            step,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, R, F> Observer<T> for Forward<T, R, F>
where
    R: 'static,
    F: FnMut(T, &Subscriber<R>),
{
    fn next(&mut self, value: T) {
        if self.downstream.is_closed() {
            return;
        }
        (self.step)(value, &self.downstream)
    }

    fn error(&mut self, err: StreamError) {
        self.downstream.error(err)
    }

    fn complete(&mut self) {
        self.downstream.complete()
    }
}

/// Build an operator from a factory producing a fresh per-subscription
/// step.
fn stepper<T, R, S, F>(make_step: F) -> Operator<T, R>
where
    T: 'static,
    R: 'static,
    S: FnMut(T, &Subscriber<R>) + 'static,
    F: Fn() -> S + 'static,
{
    let make_step = Rc::new(make_step);
    Operator::new(move |source: &Stream<T>| {
        let source = source.clone();
        let make_step = Rc::clone(&make_step);
        Stream::create(move |downstream: Subscriber<R>| {
            source
                .subscribe(Forward::new(downstream, make_step()))
                .into()
        })
    })
}

pub fn map<T: 'static, R: 'static>(f: impl Fn(T) -> R + 'static) -> Operator<T, R> {
    let f = Rc::new(f);
    stepper(move || {
        let f = Rc::clone(&f);
        move |value, downstream: &Subscriber<R>| downstream.next(f(value))
    })
}

pub fn try_map<T, R, E>(f: impl Fn(T) -> Result<R, E> + 'static) -> Operator<T, R>
where
    T: 'static,
    R: 'static,
    E: Into<StreamError> + 'static,
{
    let f = Rc::new(f);
    stepper(move || {
        let f = Rc::clone(&f);
        move |value, downstream: &Subscriber<R>| match f(value) {
            Ok(mapped) => downstream.next(mapped),
            Err(err) => downstream.error(err.into()),
        }
    })
}

pub fn filter<T: 'static>(predicate: impl Fn(&T) -> bool + 'static) -> Operator<T, T> {
    let predicate = Rc::new(predicate);
    stepper(move || {
        let predicate = Rc::clone(&predicate);
        move |value, downstream: &Subscriber<T>| {
            if predicate(&value) {
                downstream.next(value)
            }
        }
    })
}

pub fn try_filter<T, E>(predicate: impl Fn(&T) -> Result<bool, E> + 'static) -> Operator<T, T>
where
    T: 'static,
    E: Into<StreamError> + 'static,
{
    let predicate = Rc::new(predicate);
    stepper(move || {
        let predicate = Rc::clone(&predicate);
        move |value, downstream: &Subscriber<T>| match predicate(&value) {
            Ok(true) => downstream.next(value),
            Ok(false) => {}
            Err(err) => downstream.error(err.into()),
        }
    })
}

/// Run a side effect for each value and pass it through unchanged.
pub fn tap<T: 'static>(f: impl Fn(&T) + 'static) -> Operator<T, T> {
    let f = Rc::new(f);
    stepper(move || {
        let f = Rc::clone(&f);
        move |value, downstream: &Subscriber<T>| {
            f(&value);
            downstream.next(value)
        }
    })
}

pub fn try_tap<T, E>(f: impl Fn(&T) -> Result<(), E> + 'static) -> Operator<T, T>
where
    T: 'static,
    E: Into<StreamError> + 'static,
{
    let f = Rc::new(f);
    stepper(move || {
        let f = Rc::clone(&f);
        move |value, downstream: &Subscriber<T>| match f(&value) {
            Ok(()) => downstream.next(value),
            Err(err) => downstream.error(err.into()),
        }
    })
}

/// Emit the running accumulation of `f` over the values, starting from
/// `seed` for each subscription.
pub fn scan<T, R>(seed: R, f: impl Fn(R, T) -> R + 'static) -> Operator<T, R>
where
    T: 'static,
    R: Clone + 'static,
{
    let f = Rc::new(f);
    stepper(move || {
        let f = Rc::clone(&f);
        let mut acc = Some(seed.clone());
        move |value, downstream: &Subscriber<R>| {
            if let Some(current) = acc.take() {
                let next = f(current, value);
                acc = Some(next.clone());
                downstream.next(next);
            }
        }
    })
}

/// Pass the first `count` values, then complete and unsubscribe upstream.
pub fn take<T: 'static>(count: usize) -> Operator<T, T> {
    if count == 0 {
        return Operator::new(|_| Stream::empty());
    }
    stepper(move || {
        let mut remaining = count;
        move |value, downstream: &Subscriber<T>| {
            remaining = remaining.saturating_sub(1);
            downstream.next(value);
            if remaining == 0 {
                downstream.complete();
            }
        }
    })
}

/// Drop values arriving less than `interval_ms` after the last value let
/// through, judged by each value's own timestamp.
pub fn throttle<T: 'static>(
    interval_ms: f64,
    timestamp: impl Fn(&T) -> Timestamp + 'static,
) -> Operator<T, T> {
    let timestamp = Rc::new(timestamp);
    stepper(move || {
        let timestamp = Rc::clone(&timestamp);
        let mut gate = RateController::new(interval_ms);
        move |value, downstream: &Subscriber<T>| {
            if gate.should_tick(timestamp(&value)) {
                downstream.next(value)
            }
        }
    })
}

/// Interleave two streams in emission order. Completes once both have
/// completed; an error from either ends the merged subscription.
pub fn merge<T: 'static>(left: &Stream<T>, right: &Stream<T>) -> Stream<T> {
    let left = left.clone();
    let right = right.clone();
    Stream::create(move |downstream: Subscriber<T>| {
        let live = Rc::new(Cell::new(2u8));
        let subscribe_side = |source: &Stream<T>| {
            let live = Rc::clone(&live);
            source.subscribe(MergeSide {
                downstream: downstream.clone(),
                live,
            })
        };
        let left_sub = subscribe_side(&left);
        let right_sub = subscribe_side(&right);
        Teardown::new(move || {
            left_sub.unsubscribe();
            right_sub.unsubscribe();
        })
    })
}

struct MergeSide<T> {
    downstream: Subscriber<T>,
    live: Rc<Cell<u8>>,
}

impl<T: 'static> Observer<T> for MergeSide<T> {
    fn next(&mut self, value: T) {
        self.downstream.next(value)
    }

    fn error(&mut self, err: StreamError) {
        self.downstream.error(err)
    }

    fn complete(&mut self) {
        let remaining = self.live.get().saturating_sub(1);
        self.live.set(remaining);
        if remaining == 0 {
            self.downstream.complete();
        }
    }
}
