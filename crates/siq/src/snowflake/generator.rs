use core::{cell::Cell, cmp::Ordering, convert::Infallible, iter::FusedIterator, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Poll, Result, Snowflake, TICKS_PER_SECOND, TimeSource};

#[derive(Copy, Clone, Debug)]
struct State {
    last_millis: u64,
    sequence: u16,
}

/// A single-owner snowflake generator in the Discord layout.
///
/// Timestamps are milliseconds since `epoch`; up to 4096 snowflakes are
/// emitted per millisecond. Prefer SIQs for new data: this generator exists
/// for systems that still hand out snowflakes next to them.
///
/// ```
/// use siq::{BasicSnowflakeGenerator, DISCORD_EPOCH, WallClock};
///
/// let generator = BasicSnowflakeGenerator::new(DISCORD_EPOCH, 1, 2, WallClock);
/// let a = generator.generate_one();
/// let b = generator.generate_one();
/// assert!(a < b);
/// assert_eq!((b.local_id(), b.shard_id()), (1, 2));
/// ```
pub struct BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    state: Cell<State>,
    epoch: Duration,
    local_id: u8,
    shard_id: u8,
    time: T,
}

impl<T> BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator. `local_id` and `shard_id` are reduced modulo 32.
    pub fn new(epoch: Duration, local_id: u8, shard_id: u8, time: T) -> Self {
        Self::from_components(0, epoch, local_id, shard_id, time)
    }

    /// Resumes after a previously emitted snowflake.
    pub fn from_last_id(
        epoch: Duration,
        local_id: u8,
        shard_id: u8,
        last: Snowflake,
        time: T,
    ) -> Self {
        Self::from_components(last.timestamp_millis() + 1, epoch, local_id, shard_id, time)
    }

    pub fn from_components(
        last_millis: u64,
        epoch: Duration,
        local_id: u8,
        shard_id: u8,
        time: T,
    ) -> Self {
        Self {
            state: Cell::new(State {
                last_millis,
                sequence: 0,
            }),
            epoch,
            local_id: local_id % 32,
            shard_id: shard_id % 32,
            time,
        }
    }

    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    pub const fn local_id(&self) -> u8 {
        self.local_id
    }

    pub const fn shard_id(&self) -> u8 {
        self.shard_id
    }

    /// Milliseconds since the epoch, by the underlying time source.
    pub fn current_millis(&self) -> u64 {
        let ticks = u128::from(self.time.current_ticks());
        let unix_millis = ticks * 1000 / u128::from(TICKS_PER_SECOND);
        (unix_millis as u64).saturating_sub(self.epoch.as_millis() as u64)
    }

    /// Attempts to generate the next snowflake without blocking.
    /// `yield_for` is in milliseconds.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Poll<Snowflake> {
        match self.try_poll_id() {
            Ok(poll) => poll,
            Err(e) => match e {},
        }
    }

    /// Fallible form of [`Self::poll_id`].
    ///
    /// # Errors
    ///
    /// This method is infallible for this generator.
    pub fn try_poll_id(&self) -> Result<Poll<Snowflake>, Infallible> {
        let now = self.current_millis();
        let mut state = self.state.get();

        match now.cmp(&state.last_millis) {
            Ordering::Less => {
                return Ok(Poll::Pending {
                    yield_for: state.last_millis - now,
                });
            }
            Ordering::Greater => {
                state.last_millis = now;
                state.sequence = 0;
            }
            Ordering::Equal => {}
        }

        if u64::from(state.sequence) > Snowflake::SEQUENCE_MASK {
            return Ok(Poll::Pending { yield_for: 1 });
        }

        let id = Snowflake::from_components(now, self.local_id, self.shard_id, state.sequence);
        state.sequence += 1;
        self.state.set(state);
        Ok(Poll::Ready { id })
    }

    /// Generates the next snowflake, calling `f` with the milliseconds to
    /// wait every time the generator is pending.
    pub fn next_id(&self, mut f: impl FnMut(u64)) -> Snowflake {
        loop {
            match self.poll_id() {
                Poll::Ready { id } => break id,
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Lazy iterator over `count` new snowflakes. **May block.**
    pub fn generate(&self, count: usize) -> GenerateSnowflakes<'_, T> {
        GenerateSnowflakes {
            generator: self,
            remaining: count,
        }
    }

    pub fn generate_one(&self) -> Snowflake {
        self.next_id(sleep_millis)
    }

    pub fn generate_list(&self, count: usize) -> Vec<Snowflake> {
        self.generate(count).collect()
    }
}

fn sleep_millis(millis: u64) {
    std::thread::sleep(Duration::from_millis(millis));
}

/// Iterator returned by [`BasicSnowflakeGenerator::generate`].
#[must_use = "iterators are lazy and generate nothing unless consumed"]
pub struct GenerateSnowflakes<'a, T>
where
    T: TimeSource,
{
    generator: &'a BasicSnowflakeGenerator<T>,
    remaining: usize,
}

impl<T> Iterator for GenerateSnowflakes<'_, T>
where
    T: TimeSource,
{
    type Item = Snowflake;

    fn next(&mut self) -> Option<Snowflake> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.generator.next_id(sleep_millis))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: TimeSource> ExactSizeIterator for GenerateSnowflakes<'_, T> {}

impl<T: TimeSource> FusedIterator for GenerateSnowflakes<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DISCORD_EPOCH;
    use std::rc::Rc;

    /// Rounds up so that converting back to milliseconds is exact.
    fn to_ticks(millis: u64) -> u64 {
        (millis * TICKS_PER_SECOND).div_ceil(1000)
    }

    #[derive(Clone)]
    struct MockTime {
        ticks: Rc<Cell<u64>>,
    }

    impl MockTime {
        fn at_unix_millis(millis: u64) -> Self {
            Self {
                ticks: Rc::new(Cell::new(to_ticks(millis))),
            }
        }

        fn set_unix_millis(&self, millis: u64) {
            self.ticks.set(to_ticks(millis));
        }
    }

    impl TimeSource for MockTime {
        fn current_ticks(&self) -> u64 {
            self.ticks.get()
        }
    }

    const NOW: u64 = 1_420_070_400_000 + 41_944_705_796;

    fn unwrap_ready(poll: Poll<Snowflake>) -> Snowflake {
        match poll {
            Poll::Ready { id } => id,
            Poll::Pending { yield_for } => panic!("unexpected pending ({yield_for})"),
        }
    }

    #[test]
    fn millis_are_relative_to_the_epoch() {
        let generator =
            BasicSnowflakeGenerator::new(DISCORD_EPOCH, 33, 2, MockTime::at_unix_millis(NOW));
        assert_eq!(generator.current_millis(), 41_944_705_796);
        let id = generator.generate_one();
        assert_eq!(id.timestamp_millis(), 41_944_705_796);
        assert_eq!(id.local_id(), 1);
        assert_eq!(id.shard_id(), 2);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn sequence_increments_then_resets() {
        let time = MockTime::at_unix_millis(NOW);
        let generator = BasicSnowflakeGenerator::new(DISCORD_EPOCH, 0, 0, time.clone());
        let ids = generator.generate_list(3);
        assert_eq!(ids.iter().map(|id| id.sequence()).collect::<Vec<_>>(), [0, 1, 2]);

        time.set_unix_millis(NOW + 1);
        let next = unwrap_ready(generator.poll_id());
        assert_eq!(next.sequence(), 0);
        assert!(next > ids[2]);
    }

    #[test]
    fn pending_after_4096_per_millisecond() {
        let time = MockTime::at_unix_millis(NOW);
        let generator = BasicSnowflakeGenerator::new(DISCORD_EPOCH, 0, 0, time.clone());
        for _ in 0..4096 {
            unwrap_ready(generator.poll_id());
        }
        assert_eq!(generator.poll_id(), Poll::Pending { yield_for: 1 });

        let id = generator.next_id(|millis| time.set_unix_millis(NOW + millis));
        assert_eq!(id.timestamp_millis(), 41_944_705_797);
    }

    #[test]
    fn pending_while_clock_is_behind() {
        let time = MockTime::at_unix_millis(NOW);
        let last = Snowflake::from_components(41_944_705_796 + 10, 0, 0, 0);
        let generator = BasicSnowflakeGenerator::from_last_id(DISCORD_EPOCH, 0, 0, last, time);
        assert_eq!(generator.poll_id(), Poll::Pending { yield_for: 11 });
    }

    #[test]
    fn generate_is_exact_size() {
        let generator =
            BasicSnowflakeGenerator::new(DISCORD_EPOCH, 0, 0, MockTime::at_unix_millis(NOW));
        let iter = generator.generate(5);
        assert_eq!(iter.len(), 5);
        let ids: Vec<_> = iter.collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
