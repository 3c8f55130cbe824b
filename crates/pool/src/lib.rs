//! Pointerflow Object Pools
//!
//! Bounded free-list reuse containers for values created at input
//! frequency (per-pointer records, gesture payloads).
//!
//! - [`ObjectPool`] is the plain container: `acquire` pops a reset value or
//!   builds a fresh one, `release` resets a value and keeps it only while the
//!   free list is below `max_size`.
//! - [`SharedPool`] is a single-threaded shared handle whose
//!   [`Pooled`] guards hand their value back when dropped.
//!
//! Pools are explicitly constructed and owned; there are no global pools.
//! Nothing here is synchronized: pools live on the event-processing thread.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

use pointerflow_common::error::{PointerflowError, PointerflowResult};

/// Sizing of an object pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Values built up front.
    pub initial_size: usize,
    /// Upper bound on idle values kept in the free list.
    pub max_size: usize,
}

impl PoolConfig {
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        Self {
            initial_size,
            max_size,
        }
    }

    /// An empty pool that keeps up to `max_size` idle values.
    pub fn bounded(max_size: usize) -> Self {
        Self::new(0, max_size)
    }

    pub fn validate(&self) -> PointerflowResult<()> {
        if self.max_size == 0 {
            return Err(PointerflowError::config("pool max_size must be at least 1"));
        }
        if self.initial_size > self.max_size {
            return Err(PointerflowError::config(format!(
                "pool initial_size ({}) exceeds max_size ({})",
                self.initial_size, self.max_size
            )));
        }
        Ok(())
    }
}

/// Counters describing pool traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values built by the factory.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Values accepted back into the free list.
    pub recycled: u64,
    /// Released values discarded because the free list was full.
    pub dropped: u64,
}

type Factory<T> = Box<dyn Fn() -> T>;
type Reset<T> = Box<dyn Fn(&mut T)>;

/// Bounded free-list of reusable values.
pub struct ObjectPool<T> {
    free: Vec<T>,
    factory: Factory<T>,
    reset: Reset<T>,
    max_size: usize,
    stats: PoolStats,
}

impl<T> ObjectPool<T> {
    /// Build a pool, pre-populating `config.initial_size` reset values.
    pub fn new(
        config: PoolConfig,
        factory: impl Fn() -> T + 'static,
        reset: impl Fn(&mut T) + 'static,
    ) -> PointerflowResult<Self> {
        config.validate()?;

        let mut pool = Self {
            free: Vec::with_capacity(config.max_size),
            factory: Box::new(factory),
            reset: Box::new(reset),
            max_size: config.max_size,
            stats: PoolStats::default(),
        };
        for _ in 0..config.initial_size {
            let value = pool.build();
            pool.free.push(value);
        }
        Ok(pool)
    }

    fn build(&mut self) -> T {
        let mut value = (self.factory)();
        (self.reset)(&mut value);
        self.stats.created += 1;
        value
    }

    /// Take a value in its reset state.
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(value) => {
                self.stats.reused += 1;
                value
            }
            None => self.build(),
        }
    }

    /// Reset `value` and keep it for reuse, or drop it if the free list is
    /// full.
    pub fn release(&mut self, mut value: T) {
        (self.reset)(&mut value);
        if self.free.len() < self.max_size {
            self.free.push(value);
            self.stats.recycled += 1;
        } else {
            self.stats.dropped += 1;
            tracing::trace!(max_size = self.max_size, "Pool full, dropping released value");
        }
    }

    /// Number of idle values.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drop every idle value.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Default + 'static> ObjectPool<T> {
    /// Pool whose values are built and reset with `T::default()`.
    pub fn with_default(config: PoolConfig) -> PointerflowResult<Self> {
        Self::new(config, T::default, |value: &mut T| *value = T::default())
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("free", &self.free.len())
            .field("max_size", &self.max_size)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Shared handle to an [`ObjectPool`] handing out RAII [`Pooled`] guards.
pub struct SharedPool<T> {
    inner: Rc<RefCell<ObjectPool<T>>>,
}

impl<T> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> SharedPool<T> {
    pub fn new(pool: ObjectPool<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(pool)),
        }
    }

    /// Take a reset value that returns to this pool when dropped.
    pub fn acquire(&self) -> Pooled<T> {
        let value = self.inner.borrow_mut().acquire();
        Pooled {
            value: Some(value),
            pool: Rc::downgrade(&self.inner),
        }
    }

    pub fn free_len(&self) -> usize {
        self.inner.borrow().free_len()
    }

    pub fn stats(&self) -> PoolStats {
        self.inner.borrow().stats()
    }
}

impl<T: Default + 'static> SharedPool<T> {
    pub fn with_default(config: PoolConfig) -> PointerflowResult<Self> {
        Ok(Self::new(ObjectPool::with_default(config)?))
    }
}

impl<T> fmt::Debug for SharedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(pool) => pool.fmt(f),
            Err(_) => f.write_str("SharedPool(<in use>)"),
        }
    }
}

/// A pooled value owned exclusively by its holder.
///
/// Dropping the guard releases the value to its pool; if the pool no
/// longer exists the value is simply dropped.
pub struct Pooled<T> {
    value: Option<T>,
    pool: Weak<RefCell<ObjectPool<T>>>,
}

impl<T> Pooled<T> {
    /// Wrap a value that belongs to no pool.
    pub fn detached(value: T) -> Self {
        Self {
            value: Some(value),
            pool: Weak::new(),
        }
    }

    /// Keep the value and skip returning it to the pool.
    pub fn into_inner(mut self) -> T {
        match self.value.take() {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        if let Some(pool) = self.pool.upgrade() {
            if let Ok(mut pool) = pool.try_borrow_mut() {
                pool.release(value);
            }
        }
    }
}

impl<T: Clone> Clone for Pooled<T> {
    /// Copies into a value acquired from the same pool.
    fn clone(&self) -> Self {
        let Some(pool) = self.pool.upgrade() else {
            return Self::detached(T::clone(self));
        };
        let acquired = pool.try_borrow_mut().map(|mut pool| pool.acquire());
        let mut value = match acquired {
            Ok(value) => value,
            Err(_) => return Self::detached(T::clone(self)),
        };
        value.clone_from(self);
        Self {
            value: Some(value),
            pool: Rc::downgrade(&pool),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        T::fmt(self, f)
    }
}

impl<T: PartialEq> PartialEq for Pooled<T> {
    fn eq(&self, other: &Self) -> bool {
        T::eq(self, other)
    }
}

impl<T: serde::Serialize> serde::Serialize for Pooled<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        T::serialize(self, serializer)
    }
}
