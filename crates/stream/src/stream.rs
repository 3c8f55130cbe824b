//! The `Stream` type and its basic sources.

use std::fmt;
use std::rc::Rc;

use pointerflow_common::clock::Timestamp;
use pointerflow_common::error::StreamError;

use crate::observer::{CallbackObserver, Observer};
use crate::operators::{self, Operator};
use crate::subscription::{Subscriber, Subscription, Teardown};

type Produce<T> = dyn Fn(Subscriber<T>) -> Teardown;

/// A cold description of a producer of `T` values.
///
/// Cloning a stream clones the description, not any running execution.
pub struct Stream<T> {
    produce: Rc<Produce<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            produce: Rc::clone(&self.produce),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Stream")
    }
}

impl<T: 'static> Stream<T> {
    /// Build a stream from a producer. `produce` runs once per
    /// subscription and returns the cleanup for that execution.
    pub fn create(produce: impl Fn(Subscriber<T>) -> Teardown + 'static) -> Self {
        Self {
            produce: Rc::new(produce),
        }
    }

    /// Run the producer for a new, independent execution.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        let subscriber = Subscriber::new(Box::new(observer));
        let teardown = (self.produce)(subscriber.clone());
        subscriber.set_teardown(teardown);
        subscriber.subscription()
    }

    /// Subscribe with only a `next` callback.
    pub fn subscribe_next(&self, next: impl FnMut(T) + 'static) -> Subscription {
        self.subscribe(CallbackObserver::new(next))
    }

    /// Subscribe with `next`, `error` and `complete` callbacks.
    pub fn subscribe_with(
        &self,
        next: impl FnMut(T) + 'static,
        error: impl FnMut(StreamError) + 'static,
        complete: impl FnMut() + 'static,
    ) -> Subscription {
        self.subscribe(
            CallbackObserver::new(next)
                .on_error(error)
                .on_complete(complete),
        )
    }

    /// Apply an operator.
    pub fn pipe<R: 'static>(&self, operator: &Operator<T, R>) -> Stream<R> {
        operator.apply(self)
    }

    /// Completes immediately.
    pub fn empty() -> Self {
        Self::create(|subscriber| {
            subscriber.complete();
            Teardown::empty()
        })
    }

    /// Never emits and never terminates.
    pub fn never() -> Self {
        Self::create(|_| Teardown::empty())
    }

    /// Errors immediately.
    pub fn throw(err: StreamError) -> Self {
        Self::create(move |subscriber| {
            subscriber.error(err.clone());
            Teardown::empty()
        })
    }

    pub fn map<R: 'static>(&self, f: impl Fn(T) -> R + 'static) -> Stream<R> {
        self.pipe(&operators::map(f))
    }

    pub fn try_map<R: 'static, E: Into<StreamError> + 'static>(
        &self,
        f: impl Fn(T) -> Result<R, E> + 'static,
    ) -> Stream<R> {
        self.pipe(&operators::try_map(f))
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        self.pipe(&operators::filter(predicate))
    }

    pub fn try_filter<E: Into<StreamError> + 'static>(
        &self,
        predicate: impl Fn(&T) -> Result<bool, E> + 'static,
    ) -> Stream<T> {
        self.pipe(&operators::try_filter(predicate))
    }

    pub fn tap(&self, f: impl Fn(&T) + 'static) -> Stream<T> {
        self.pipe(&operators::tap(f))
    }

    pub fn try_tap<E: Into<StreamError> + 'static>(
        &self,
        f: impl Fn(&T) -> Result<(), E> + 'static,
    ) -> Stream<T> {
        self.pipe(&operators::try_tap(f))
    }

    pub fn scan<R: Clone + 'static>(&self, seed: R, f: impl Fn(R, T) -> R + 'static) -> Stream<R> {
        self.pipe(&operators::scan(seed, f))
    }

    pub fn take(&self, count: usize) -> Stream<T> {
        self.pipe(&operators::take(count))
    }

    pub fn throttle_by(
        &self,
        interval_ms: f64,
        timestamp: impl Fn(&T) -> Timestamp + 'static,
    ) -> Stream<T> {
        self.pipe(&operators::throttle(interval_ms, timestamp))
    }

    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        operators::merge(self, other)
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emit each value in order, then complete.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        let values: Rc<[T]> = values.into_iter().collect();
        Self::create(move |subscriber| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    break;
                }
                subscriber.next(value.clone());
            }
            subscriber.complete();
            Teardown::empty()
        })
    }
}

impl<T: Clone + 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::of(iter)
    }
}
