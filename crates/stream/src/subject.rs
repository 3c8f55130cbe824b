//! Hot multicast source for host adapters.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use pointerflow_common::error::StreamError;

use crate::stream::Stream;
use crate::subscription::{Subscriber, Teardown};

enum Terminal {
    Completed,
    Errored(StreamError),
}

struct SubjectState<T> {
    subscribers: Vec<(u64, Subscriber<T>)>,
    next_id: u64,
    terminal: Option<Terminal>,
}

/// Multicast entry point a host adapter pushes events into.
///
/// Each subscriber sees the values pushed after it subscribed. Once the
/// subject errors or completes, later subscribers receive that terminal
/// notification immediately.
pub struct Subject<T> {
    state: Rc<RefCell<SubjectState<T>>>,
    // Reused delivery buffer; keeps `next` allocation-free in steady state.
    scratch: RefCell<Vec<Subscriber<T>>>,
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                subscribers: Vec::new(),
                next_id: 0,
                terminal: None,
            })),
            scratch: RefCell::new(Vec::new()),
        }
    }

    /// Stream view of this subject.
    pub fn stream(&self) -> Stream<T> {
        let state = Rc::downgrade(&self.state);
        Stream::create(move |subscriber| Self::attach(&state, subscriber))
    }

    fn attach(state: &Weak<RefCell<SubjectState<T>>>, subscriber: Subscriber<T>) -> Teardown {
        let Some(shared) = state.upgrade() else {
            subscriber.complete();
            return Teardown::empty();
        };

        let terminal = shared.borrow().terminal.as_ref().map(|terminal| match terminal {
            Terminal::Completed => None,
            Terminal::Errored(err) => Some(err.clone()),
        });
        match terminal {
            Some(None) => {
                subscriber.complete();
                return Teardown::empty();
            }
            Some(Some(err)) => {
                subscriber.error(err);
                return Teardown::empty();
            }
            None => {}
        }

        let id = {
            let mut guard = shared.borrow_mut();
            let id = guard.next_id;
            guard.next_id += 1;
            guard.subscribers.push((id, subscriber));
            id
        };

        let state = state.clone();
        Teardown::new(move || {
            if let Some(shared) = state.upgrade() {
                if let Ok(mut guard) = shared.try_borrow_mut() {
                    guard.subscribers.retain(|(sid, _)| *sid != id);
                }
            }
        })
    }

    fn deliver(&self, mut emit: impl FnMut(&Subscriber<T>)) {
        let mut batch = std::mem::take(&mut *self.scratch.borrow_mut());
        batch.extend(
            self.state
                .borrow()
                .subscribers
                .iter()
                .map(|(_, subscriber)| subscriber.clone()),
        );
        for subscriber in &batch {
            emit(subscriber);
        }
        batch.clear();
        *self.scratch.borrow_mut() = batch;
    }

    /// Push a value to every current subscriber.
    pub fn next(&self, value: T) {
        if self.state.borrow().terminal.is_some() {
            return;
        }
        self.deliver(|subscriber| subscriber.next(value.clone()));
    }

    /// Fail every current and future subscriber.
    pub fn error(&self, err: StreamError) {
        if !self.terminate(Terminal::Errored(err.clone())) {
            return;
        }
        self.deliver(|subscriber| subscriber.error(err.clone()));
        self.state.borrow_mut().subscribers.clear();
    }

    /// Complete every current and future subscriber.
    pub fn complete(&self) {
        if !self.terminate(Terminal::Completed) {
            return;
        }
        self.deliver(|subscriber| subscriber.complete());
        self.state.borrow_mut().subscribers.clear();
    }

    fn terminate(&self, terminal: Terminal) -> bool {
        let mut state = self.state.borrow_mut();
        if state.terminal.is_some() {
            return false;
        }
        state.terminal = Some(terminal);
        true
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_multicasts_to_current_subscribers() {
        let subject = Subject::new();
        let stream = subject.stream();

        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let sink_a = Rc::clone(&a);
        let sink_b = Rc::clone(&b);

        subject.next(0);
        let sub_a = stream.subscribe_next(move |v| sink_a.borrow_mut().push(v));
        subject.next(1);
        let _sub_b = stream.subscribe_next(move |v| sink_b.borrow_mut().push(v));
        subject.next(2);
        sub_a.unsubscribe();
        subject.next(3);

        assert_eq!(*a.borrow(), vec![1, 2]);
        assert_eq!(*b.borrow(), vec![2, 3]);
        assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn test_unsubscribe_during_delivery() {
        let subject = Subject::new();
        let stream = subject.stream();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let slot: Rc<RefCell<Option<crate::Subscription>>> = Rc::new(RefCell::new(None));
        let own = Rc::clone(&slot);

        let subscription = stream.subscribe_next(move |v: i32| {
            sink.borrow_mut().push(v);
            if let Some(sub) = own.borrow().as_ref() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(subscription);

        subject.next(1);
        subject.next(2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_late_subscriber_sees_terminal() {
        let subject: Subject<i32> = Subject::new();
        subject.error(StreamError::source("adapter failed"));
        subject.next(5);

        let errored = Rc::new(Cell::new(false));
        let flag = Rc::clone(&errored);
        subject
            .stream()
            .subscribe_with(|_| panic!("no values"), move |_| flag.set(true), || {});
        assert!(errored.get());
    }

    #[test]
    fn test_complete_ends_subscribers() {
        let subject: Subject<i32> = Subject::new();
        let completed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&completed);
        let subscription = subject.stream().subscribe_with(
            |_| {},
            |_| {},
            move || counter.set(counter.get() + 1),
        );
        subject.complete();
        subject.complete();
        assert_eq!(completed.get(), 1);
        assert!(subscription.is_closed());
        assert_eq!(subject.observer_count(), 0);
    }
}
