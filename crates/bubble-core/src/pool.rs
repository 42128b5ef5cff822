//! Free-list object pool.
//!
//! `acquire` hands out an owned value (recycled when possible, freshly built
//! otherwise) and `release` takes it back. Ownership moves in both directions,
//! so a value is never held by the pool and a caller at the same time.

/// Lifetime counters for a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: u64,
    pub reused: u64,
    pub released: u64,
    pub discarded: u64,
    pub idle: usize,
    pub max_idle: usize,
}

pub struct ObjectPool<T> {
    free: Vec<T>,
    max_idle: usize,
    create: Box<dyn Fn() -> T>,
    reset: Box<dyn Fn(&mut T)>,
    created: u64,
    reused: u64,
    released: u64,
    discarded: u64,
}

impl<T> ObjectPool<T> {
    /// `max_idle` bounds the free list only; callers may hold any number of
    /// acquired values at once.
    pub fn new(
        max_idle: usize,
        create: impl Fn() -> T + 'static,
        reset: impl Fn(&mut T) + 'static,
    ) -> Self {
        Self {
            free: Vec::with_capacity(max_idle.min(256)),
            max_idle,
            create: Box::new(create),
            reset: Box::new(reset),
            created: 0,
            reused: 0,
            released: 0,
            discarded: 0,
        }
    }

    /// Fill the free list with up to `count` fresh values (capped at `max_idle`).
    pub fn with_prewarm(mut self, count: usize) -> Self {
        let target = count.min(self.max_idle);
        while self.free.len() < target {
            let v = (self.create)();
            self.created += 1;
            self.free.push(v);
        }
        self
    }

    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(v) => {
                self.reused += 1;
                v
            }
            None => {
                self.created += 1;
                (self.create)()
            }
        }
    }

    /// Reset `value` and keep it for reuse, or drop it if the free list is full.
    pub fn release(&mut self, mut value: T) {
        self.released += 1;
        if self.free.len() >= self.max_idle {
            self.discarded += 1;
            return;
        }
        (self.reset)(&mut value);
        self.free.push(value);
    }

    pub fn clear(&mut self) {
        if !self.free.is_empty() {
            log::debug!("[pool] dropping {} idle instances", self.free.len());
        }
        self.free.clear();
    }

    #[inline]
    pub fn idle_len(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created,
            reused: self.reused,
            released: self.released,
            discarded: self.discarded,
            idle: self.free.len(),
            max_idle: self.max_idle,
        }
    }
}

impl<T: Default + 'static> ObjectPool<T> {
    /// Pool whose values are built with `Default` and reset by `reset`.
    pub fn with_default(max_idle: usize, reset: impl Fn(&mut T) + 'static) -> Self {
        Self::new(max_idle, T::default, reset)
    }
}
