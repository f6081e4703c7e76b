use crate::Siq;

/// Outcome of a single non-blocking generation attempt.
///
/// - [`Poll::Ready`] carries a freshly generated identifier.
/// - [`Poll::Pending`] means the generator cannot emit right now: either the
///   clock is behind the last emitted timestamp, or the counter for the
///   requested type is exhausted within the current tick. Retry once
///   `yield_for` ticks have passed.
///
/// # Example
///
/// ```
/// use siq::{BasicSiqGenerator, DomainHash, Poll, SiqType, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_ticks(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = BasicSiqGenerator::new(DomainHash::NONE, 0, FixedTime);
/// match generator.poll_id(SiqType::Content) {
///     Poll::Ready { id } => println!("SIQ: {id}"),
///     Poll::Pending { yield_for } => println!("Back off for {yield_for} ticks"),
/// }
/// ```
///
/// The same type serves the snowflake generator, whose `yield_for` is in
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<ID = Siq> {
    /// A unique identifier was generated.
    Ready {
        /// The generated identifier.
        id: ID,
    },
    /// No identifier could be generated yet.
    Pending {
        /// Time units to wait before trying again: ticks (1/65536 s) for
        /// SIQ generators.
        yield_for: u64,
    },
}
