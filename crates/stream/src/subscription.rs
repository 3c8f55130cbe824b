//! Subscriber handles, subscriptions and teardown.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use pointerflow_common::error::StreamError;

use crate::observer::{NoopObserver, Observer};

/// Cleanup returned by a producer, run exactly once when its subscription
/// ends (unsubscribe, error or complete).
#[must_use = "a teardown must be returned to the stream engine"]
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// Nothing to clean up.
    pub fn empty() -> Self {
        Self(None)
    }

    pub(crate) fn run(mut self) {
        if let Some(f) = self.0.take() {
            f()
        }
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Teardown::new(move || subscription.unsubscribe())
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Teardown").field(&self.0.is_some()).finish()
    }
}

enum Terminal {
    Error(StreamError),
    Complete,
}

struct SubscriberInner<T> {
    closed: Cell<bool>,
    observer: RefCell<Box<dyn Observer<T>>>,
    teardown: RefCell<Option<Teardown>>,
    // Terminal raised while the observer was mid-`next`; delivered once
    // that call returns.
    pending: RefCell<Option<Terminal>>,
}

impl<T: 'static> SubscriberInner<T> {
    /// Deliver a terminal notification, then tear down. Deferred while the
    /// observer is busy.
    fn finish(&self, terminal: Terminal) {
        {
            let Ok(mut observer) = self.observer.try_borrow_mut() else {
                *self.pending.borrow_mut() = Some(terminal);
                return;
            };
            match terminal {
                Terminal::Error(err) => observer.error(err),
                Terminal::Complete => observer.complete(),
            }
        }
        self.run_teardown();
        self.release_observer();
    }

    /// Called after an observer `next` returns.
    fn settle(&self) {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(terminal) => self.finish(terminal),
            None if self.closed.get() => self.release_observer(),
            None => {}
        }
    }

    fn run_teardown(&self) {
        let teardown = self.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown.run();
        }
    }

    /// Drop the observer and everything it captured. Skipped while the
    /// observer is mid-call; the closed flag already gates it.
    fn release_observer(&self) {
        if let Ok(mut observer) = self.observer.try_borrow_mut() {
            let released = std::mem::replace(&mut *observer, Box::new(NoopObserver));
            drop(observer);
            drop(released);
        }
    }
}

/// Handle a producer uses to push values to one subscription.
///
/// Cheap to clone. Once the subscription has ended every call is a no-op.
pub struct Subscriber<T> {
    inner: Rc<SubscriberInner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Subscriber<T> {
    pub(crate) fn new(observer: Box<dyn Observer<T>>) -> Self {
        Self {
            inner: Rc::new(SubscriberInner {
                closed: Cell::new(false),
                observer: RefCell::new(observer),
                teardown: RefCell::new(None),
                pending: RefCell::new(None),
            }),
        }
    }

    /// Deliver a value.
    pub fn next(&self, value: T) {
        if self.inner.closed.get() {
            return;
        }
        match self.inner.observer.try_borrow_mut() {
            Ok(mut observer) => observer.next(value),
            Err(_) => {
                tracing::warn!("Dropping value emitted re-entrantly into its own observer");
                return;
            }
        }
        self.inner.settle();
    }

    /// Deliver a terminal error and end the subscription.
    ///
    /// Raised from inside this subscriber's own `next`, the error is held
    /// until that call returns rather than lost.
    pub fn error(&self, err: StreamError) {
        if self.inner.closed.replace(true) {
            return;
        }
        self.inner.finish(Terminal::Error(err));
    }

    /// Signal normal completion and end the subscription.
    pub fn complete(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        self.inner.finish(Terminal::Complete);
    }

    /// Whether the subscription has ended. Producers looping over a
    /// source should stop once this is true.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Attach the producer's teardown. Runs it at once if the subscription
    /// already ended while the producer was still running.
    pub(crate) fn set_teardown(&self, teardown: Teardown) {
        if self.inner.closed.get() {
            teardown.run();
            return;
        }
        *self.inner.teardown.borrow_mut() = Some(teardown);
    }

    pub(crate) fn subscription(&self) -> Subscription {
        Subscription {
            handle: Rc::clone(&self.inner) as Rc<dyn Closable>,
        }
    }
}

trait Closable {
    fn close(&self);
    fn is_closed(&self) -> bool;
}

impl<T: 'static> Closable for SubscriberInner<T> {
    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.run_teardown();
        self.release_observer();
    }

    fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Handle returned by `Stream::subscribe`.
#[derive(Clone)]
pub struct Subscription {
    handle: Rc<dyn Closable>,
}

impl Subscription {
    /// Stop delivery and run the producer's teardown. Idempotent, and a
    /// no-op after the stream already errored or completed.
    pub fn unsubscribe(&self) {
        self.handle.close();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::CallbackObserver;

    fn recording() -> (Rc<RefCell<Vec<i32>>>, Subscriber<i32>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscriber = Subscriber::new(Box::new(CallbackObserver::new(move |v| {
            sink.borrow_mut().push(v)
        })));
        (seen, subscriber)
    }

    #[test]
    fn test_nothing_delivered_after_complete() {
        let (seen, subscriber) = recording();
        subscriber.next(1);
        subscriber.complete();
        subscriber.next(2);
        subscriber.error(StreamError::source("late"));
        assert_eq!(*seen.borrow(), vec![1]);
        assert!(subscriber.is_closed());
    }

    #[test]
    fn test_teardown_runs_once() {
        let (_, subscriber) = recording();
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        subscriber.set_teardown(Teardown::new(move || counter.set(counter.get() + 1)));

        let subscription = subscriber.subscription();
        subscription.unsubscribe();
        subscription.unsubscribe();
        subscriber.complete();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_teardown_set_after_completion_runs_immediately() {
        let (_, subscriber) = recording();
        subscriber.complete();

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        subscriber.set_teardown(Teardown::new(move || flag.set(true)));
        assert!(ran.get());
    }

    #[test]
    fn test_error_raised_inside_next_is_delivered_after_it_returns() {
        let slot: Rc<RefCell<Option<Subscriber<i32>>>> = Rc::new(RefCell::new(None));
        let own = Rc::clone(&slot);
        let events = Rc::new(RefCell::new(Vec::new()));
        let (on_next, on_error) = (Rc::clone(&events), Rc::clone(&events));
        let observer = CallbackObserver::new(move |v: i32| {
            on_next.borrow_mut().push(format!("next {v}"));
            if let Some(subscriber) = own.borrow().as_ref() {
                subscriber.error(StreamError::source("lost"));
            }
            on_next.borrow_mut().push("returned".to_string());
        })
        .on_error(move |err| on_error.borrow_mut().push(err.to_string()));
        let subscriber = Subscriber::new(Box::new(observer));
        *slot.borrow_mut() = Some(subscriber.clone());

        let torn_down = Rc::new(Cell::new(false));
        let flag = Rc::clone(&torn_down);
        subscriber.set_teardown(Teardown::new(move || flag.set(true)));

        subscriber.next(1);
        assert_eq!(
            *events.borrow(),
            vec!["next 1", "returned", "source failed: lost"]
        );
        assert!(subscriber.is_closed());
        assert!(torn_down.get());

        subscriber.next(2);
        assert_eq!(events.borrow().len(), 3);
        slot.borrow_mut().take();
    }

    #[test]
    fn test_complete_raised_inside_next_is_delivered() {
        let slot: Rc<RefCell<Option<Subscriber<i32>>>> = Rc::new(RefCell::new(None));
        let own = Rc::clone(&slot);
        let completed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&completed);
        let observer = CallbackObserver::new(move |_: i32| {
            if let Some(subscriber) = own.borrow().as_ref() {
                subscriber.complete();
            }
        })
        .on_complete(move || flag.set(true));
        let subscriber = Subscriber::new(Box::new(observer));
        *slot.borrow_mut() = Some(subscriber.clone());

        subscriber.next(1);
        assert!(completed.get());
        assert!(subscriber.is_closed());
        slot.borrow_mut().take();
    }

    #[test]
    fn test_unsubscribe_releases_observer() {
        let token = Rc::new(());
        let held = Rc::clone(&token);
        let subscriber = Subscriber::new(Box::new(CallbackObserver::new(move |_: i32| {
            let _ = &held;
        })));
        assert_eq!(Rc::strong_count(&token), 2);
        subscriber.subscription().unsubscribe();
        assert_eq!(Rc::strong_count(&token), 1);
    }
}
