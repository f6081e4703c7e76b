use std::collections::VecDeque;

use crate::{BasicSiqGenerator, Error, Result, Siq, SiqType, TimeSource};

/// Caching single-type bulk generator.
///
/// Pre-fetches `batch_size` identifiers of one [`SiqType`] and serves them
/// from a queue. The queue is dropped when the generator's reference
/// timestamp is more than `max_age` ticks old, so a long idle period never
/// hands out stale-looking identifiers.
///
/// Useful as a database default-value factory.
///
/// ```
/// use siq::{BasicSiqGenerator, DomainHash, SiqCache, SiqType, WallClock};
///
/// let generator = BasicSiqGenerator::new(DomainHash::NONE, 1, WallClock);
/// let mut cache = SiqCache::new(generator, SiqType::Content);
/// let a = cache.next_id();
/// let b = cache.next_id();
/// assert!(a < b);
/// ```
pub struct SiqCache<T>
where
    T: TimeSource,
{
    generator: BasicSiqGenerator<T>,
    kind: SiqType,
    batch_size: usize,
    max_age: u64,
    queue: VecDeque<Siq>,
}

impl<T> SiqCache<T>
where
    T: TimeSource,
{
    pub const DEFAULT_BATCH_SIZE: usize = 64;
    pub const DEFAULT_MAX_AGE: u64 = 1024;

    /// Wraps `generator` with the default batch size (64) and maximum age
    /// (1024 ticks).
    pub fn new(generator: BasicSiqGenerator<T>, kind: SiqType) -> Self {
        Self {
            generator,
            kind,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            max_age: Self::DEFAULT_MAX_AGE,
            queue: VecDeque::with_capacity(Self::DEFAULT_BATCH_SIZE),
        }
    }

    /// Wraps `generator` with explicit tuning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchSize`] if `batch_size` is zero.
    pub fn with_options(
        generator: BasicSiqGenerator<T>,
        kind: SiqType,
        batch_size: usize,
        max_age: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        Ok(Self {
            generator,
            kind,
            batch_size,
            max_age,
            queue: VecDeque::with_capacity(batch_size),
        })
    }

    pub const fn kind(&self) -> SiqType {
        self.kind
    }

    /// Number of identifiers currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub const fn generator(&self) -> &BasicSiqGenerator<T> {
        &self.generator
    }

    /// Serves the next identifier, refilling the queue when it is empty or
    /// stale. May block while the batch is generated.
    pub fn next_id(&mut self) -> Siq {
        let now = self.generator.current_ticks();
        let stale = self.generator.last_timestamp().saturating_add(self.max_age) < now;
        if stale && !self.queue.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                dropped = self.queue.len(),
                kind = %self.kind,
                "discarding stale batch"
            );
            self.queue.clear();
        }
        loop {
            if let Some(id) = self.queue.pop_front() {
                break id;
            }
            self.queue.extend(self.generator.generate(self.kind, self.batch_size));
        }
    }

    /// Consumes the cache, returning the wrapped generator.
    pub fn into_inner(self) -> BasicSiqGenerator<T> {
        self.generator
    }
}

impl<T> Iterator for SiqCache<T>
where
    T: TimeSource,
{
    type Item = Siq;

    fn next(&mut self) -> Option<Siq> {
        Some(self.next_id())
    }
}
