//! Observer trait and a closure-backed implementation.

use pointerflow_common::error::StreamError;

/// Receiver of a stream's values.
///
/// `error` and `complete` are terminal: the engine never calls any method
/// after either of them.
pub trait Observer<T> {
    fn next(&mut self, value: T);

    fn error(&mut self, err: StreamError) {
        tracing::warn!(error = %err, "Unhandled stream error");
    }

    fn complete(&mut self) {}
}

type NextFn<T> = Box<dyn FnMut(T)>;
type ErrorFn = Box<dyn FnMut(StreamError)>;
type CompleteFn = Box<dyn FnMut()>;

/// Observer assembled from closures.
pub struct CallbackObserver<T> {
    next: NextFn<T>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> CallbackObserver<T> {
    pub fn new(next: impl FnMut(T) + 'static) -> Self {
        Self {
            next: Box::new(next),
            error: None,
            complete: None,
        }
    }

    pub fn on_error(mut self, error: impl FnMut(StreamError) + 'static) -> Self {
        self.error = Some(Box::new(error));
        self
    }

    pub fn on_complete(mut self, complete: impl FnMut() + 'static) -> Self {
        self.complete = Some(Box::new(complete));
        self
    }
}

impl<T> Observer<T> for CallbackObserver<T> {
    fn next(&mut self, value: T) {
        (self.next)(value)
    }

    fn error(&mut self, err: StreamError) {
        match self.error.as_mut() {
            Some(error) => error(err),
            None => tracing::warn!(error = %err, "Unhandled stream error"),
        }
    }

    fn complete(&mut self) {
        if let Some(complete) = self.complete.as_mut() {
            complete()
        }
    }
}

/// Observer that ignores everything. Stands in for a released observer.
pub(crate) struct NoopObserver;

impl<T> Observer<T> for NoopObserver {
    fn next(&mut self, _value: T) {}

    fn error(&mut self, _err: StreamError) {}
}
