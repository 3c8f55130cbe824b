//! Pointerflow Stream Engine
//!
//! A cold, push-based event pipeline:
//! - **[`Stream`]:** a description of a producer. Every `subscribe` runs
//!   the producer afresh and returns a [`Subscription`].
//! - **[`Observer`]:** receives `next` values until a terminal `error` or
//!   `complete`.
//! - **[`Operator`]:** a reusable `Stream<T> -> Stream<R>` transform;
//!   operators compose in order with [`Operator::then`] or [`compose`].
//! - **[`Subject`]:** the hot entry point a host adapter pushes events into.
//! - **[`Machine`]:** per-subscription state machines (trackers,
//!   recognizers) wired in with [`drive`].
//!
//! Everything runs synchronously on the caller's thread. Values reach an
//! observer in the order the producer emitted them.

pub mod machine;
pub mod observer;
pub mod operators;
pub mod stream;
pub mod subject;
pub mod subscription;

pub use machine::{drive, Machine};
pub use observer::{CallbackObserver, Observer};
pub use operators::{compose, Operator};
pub use stream::Stream;
pub use subject::Subject;
pub use subscription::{Subscriber, Subscription, Teardown};

pub use pointerflow_common::error::StreamError;
