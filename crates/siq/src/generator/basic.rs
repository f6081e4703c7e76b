use core::{cell::Cell, cmp::Ordering, convert::Infallible, iter::FusedIterator};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DomainHash, GeneratorConfig, Poll, Result, Siq, SiqType, TimeSource, duration_from_ticks,
};

#[derive(Copy, Clone, Debug)]
struct State {
    last_ticks: u64,
    counters: [u32; SiqType::ALL.len()],
}

/// A single-owner SIQ generator.
///
/// Every call reads the clock, compares it against the last emitted
/// timestamp and hands out the next counter slot for the requested
/// [`SiqType`]. Counters restart on every new tick; when a type runs out of
/// counter space inside one tick, or the clock reads earlier than the last
/// emitted timestamp, the generator reports [`Poll::Pending`] (or blocks, for
/// the blocking entry points) until time catches up.
///
/// ## Features
/// - ❌ Not thread-safe: state lives in a [`Cell`], so the type is `!Sync`
/// - ✅ Monotonic: timestamps never decrease across calls
///
/// ## Recommended When
/// - One generator per process or task, each with its own shard id
/// - Shared access goes through a single owner (see `SiqService` with the
///   `async-tokio` feature)
pub struct BasicSiqGenerator<T>
where
    T: TimeSource,
{
    state: Cell<State>,
    shard_id: u8,
    domain: DomainHash,
    time: T,
}

impl<T> BasicSiqGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for `domain` on shard `shard_id`.
    ///
    /// # Example
    /// ```
    /// use siq::{BasicSiqGenerator, DomainHash, SiqType, WallClock};
    ///
    /// let domain = DomainHash::from_domain("example.com").unwrap();
    /// let generator = BasicSiqGenerator::new(domain, 3, WallClock);
    /// let ids: Vec<_> = generator.generate(SiqType::Message, 4).collect();
    /// assert!(ids.windows(2).all(|w| w[0] < w[1]));
    /// ```
    pub fn new(domain: DomainHash, shard_id: u8, time: T) -> Self {
        Self::from_components(0, domain, shard_id, time)
    }

    /// Resumes after a previously emitted identifier.
    ///
    /// The generator will not emit anything at or before `last`'s timestamp,
    /// which keeps identifiers monotonic across restarts when the last value
    /// is persisted.
    pub fn from_last_id(domain: DomainHash, shard_id: u8, last: Siq, time: T) -> Self {
        Self::from_components(last.timestamp_ticks() + 1, domain, shard_id, time)
    }

    /// Creates a generator from explicit state.
    ///
    /// `last_ticks` is the reference timestamp: the clock must reach it
    /// before anything is emitted, and counters are fresh on the first tick
    /// after it.
    pub fn from_components(last_ticks: u64, domain: DomainHash, shard_id: u8, time: T) -> Self {
        Self {
            state: Cell::new(State {
                last_ticks,
                counters: [0; SiqType::ALL.len()],
            }),
            shard_id,
            domain,
            time,
        }
    }

    /// Builds a generator from a [`GeneratorConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured domain cannot be hashed.
    pub fn from_config(config: &GeneratorConfig, time: T) -> Result<Self> {
        let (domain, shard_id) = config.resolve()?;
        Ok(match config.last_id {
            Some(last) => Self::from_last_id(domain, shard_id, last, time),
            None => Self::new(domain, shard_id, time),
        })
    }

    pub const fn shard_id(&self) -> u8 {
        self.shard_id
    }

    pub const fn domain_hash(&self) -> DomainHash {
        self.domain
    }

    /// Reference timestamp: the tick of the most recent emission.
    pub fn last_timestamp(&self) -> u64 {
        self.state.get().last_ticks
    }

    /// Reads the underlying time source.
    pub fn current_ticks(&self) -> u64 {
        self.time.current_ticks()
    }

    /// Attempts to generate the next identifier of type `kind` without
    /// blocking.
    ///
    /// # Example
    /// ```
    /// use siq::{BasicSiqGenerator, DomainHash, Poll, SiqType, WallClock};
    ///
    /// let generator = BasicSiqGenerator::new(DomainHash::NONE, 0, WallClock);
    ///
    /// let id = loop {
    ///     match generator.poll_id(SiqType::Content) {
    ///         Poll::Ready { id } => break id,
    ///         Poll::Pending { .. } => std::thread::yield_now(),
    ///     }
    /// };
    /// assert_eq!(id.sequence() & 0b111, 0b111);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self, kind: SiqType) -> Poll {
        match self.try_poll_id(kind) {
            Ok(poll) => poll,
            Err(e) => match e {},
        }
    }

    /// Fallible form of [`Self::poll_id`].
    ///
    /// # Errors
    ///
    /// This method is infallible for this generator. Use [`Self::poll_id`]
    /// instead.
    pub fn try_poll_id(&self, kind: SiqType) -> Result<Poll, Infallible> {
        let now = self.time.current_ticks();
        let mut state = self.state.get();

        match now.cmp(&state.last_ticks) {
            Ordering::Less => return Ok(Self::cold_clock_behind(now, state.last_ticks)),
            Ordering::Greater => {
                state.last_ticks = now;
                state.counters = [0; SiqType::ALL.len()];
            }
            Ordering::Equal => {}
        }

        let slot = kind.index();
        let counter = state.counters[slot];
        if counter > kind.max_counter() {
            return Ok(Self::cold_counter_exhausted(kind, state.last_ticks));
        }

        let sequence = kind.prepend(counter) as u16;
        let id = Siq::from_components(state.last_ticks, self.shard_id, self.domain, sequence);
        state.counters[slot] = counter + 1;
        self.state.set(state);
        Ok(Poll::Ready { id })
    }

    /// Generates the next identifier of type `kind`, calling `f` with the
    /// number of ticks to wait every time the generator is pending.
    ///
    /// `f` decides how to wait: spin, yield or sleep.
    pub fn next_id(&self, kind: SiqType, mut f: impl FnMut(u64)) -> Siq {
        loop {
            match self.poll_id(kind) {
                Poll::Ready { id } => break id,
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Returns a lazy iterator over `count` new identifiers of type `kind`.
    ///
    /// Each identifier is generated when the iterator is advanced. The
    /// iterator sleeps the current thread while the generator is pending, so
    /// it **may block**, indefinitely if the clock is frozen or keeps moving
    /// backwards.
    pub fn generate(&self, kind: SiqType, count: usize) -> Generate<'_, T> {
        Generate {
            generator: self,
            kind,
            remaining: count,
        }
    }

    /// Generates a single identifier, blocking if needed.
    pub fn generate_one(&self, kind: SiqType) -> Siq {
        self.next_id(kind, sleep_ticks)
    }

    /// Generates `count` identifiers into a `Vec`, blocking if needed.
    pub fn generate_list(&self, kind: SiqType, count: usize) -> Vec<Siq> {
        self.generate(kind, count).collect()
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last_ticks: u64) -> Poll {
        let yield_for = last_ticks - now;
        #[cfg(feature = "tracing")]
        tracing::debug!(yield_for, "clock is behind the last emitted timestamp");
        Poll::Pending { yield_for }
    }

    #[cold]
    #[inline(never)]
    fn cold_counter_exhausted(_kind: SiqType, _last_ticks: u64) -> Poll {
        #[cfg(feature = "tracing")]
        tracing::trace!(kind = %_kind, tick = _last_ticks, "counter exhausted for this tick");
        Poll::Pending { yield_for: 1 }
    }
}

fn sleep_ticks(ticks: u64) {
    std::thread::sleep(duration_from_ticks(ticks));
}

/// Lazy, finite sequence of identifiers returned by
/// [`BasicSiqGenerator::generate`].
#[must_use = "iterators are lazy and generate nothing unless consumed"]
pub struct Generate<'a, T>
where
    T: TimeSource,
{
    generator: &'a BasicSiqGenerator<T>,
    kind: SiqType,
    remaining: usize,
}

impl<T> Iterator for Generate<'_, T>
where
    T: TimeSource,
{
    type Item = Siq;

    fn next(&mut self) -> Option<Siq> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.generator.next_id(self.kind, sleep_ticks))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: TimeSource> ExactSizeIterator for Generate<'_, T> {}

impl<T: TimeSource> FusedIterator for Generate<'_, T> {}
