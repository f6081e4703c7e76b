use tokio::sync::{mpsc, oneshot};

use crate::{BasicSiqGenerator, Error, Poll, Result, Siq, SiqType, TimeSource, duration_from_ticks};

/// Messages understood by the service task.
enum Request {
    Generate {
        kind: SiqType,
        count: usize,
        reply: oneshot::Sender<Vec<Siq>>,
    },
    Shutdown {
        response: oneshot::Sender<()>,
    },
}

/// Runs a [`BasicSiqGenerator`] inside a tokio task.
///
/// The task is the generator's only owner, so its counters are never touched
/// concurrently; callers share it through cheap, clonable [`SiqHandle`]s.
/// While the generator is pending the task sleeps with
/// [`tokio::time::sleep`] instead of blocking a runtime thread.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> siq::Result<()> {
/// use siq::{BasicSiqGenerator, DomainHash, SiqService, SiqType, WallClock};
///
/// let generator = BasicSiqGenerator::new(DomainHash::NONE, 1, WallClock);
/// let handle = SiqService::spawn(generator, 64);
///
/// let ids = handle.generate(SiqType::Message, 3).await?;
/// assert_eq!(ids.len(), 3);
/// handle.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct SiqService;

impl SiqService {
    /// Moves `generator` into a new task and returns a handle to it.
    ///
    /// `buffer` bounds the number of queued requests (at least one).
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<T>(generator: BasicSiqGenerator<T>, buffer: usize) -> SiqHandle
    where
        T: TimeSource + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(service_loop(rx, generator));
        SiqHandle { tx }
    }
}

/// Clonable front end of a [`SiqService`].
#[derive(Clone, Debug)]
pub struct SiqHandle {
    tx: mpsc::Sender<Request>,
}

impl SiqHandle {
    /// Requests `count` identifiers of type `kind`, in emission order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if the service has stopped.
    pub async fn generate(&self, kind: SiqType, count: usize) -> Result<Vec<Siq>> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request::Generate { kind, count, reply })
            .await
            .map_err(|_| Error::ServiceShutdown)?;
        response.await.map_err(|_| Error::ServiceShutdown)
    }

    /// Requests a single identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if the service has stopped.
    pub async fn generate_one(&self, kind: SiqType) -> Result<Siq> {
        self.generate(kind, 1)
            .await?
            .pop()
            .ok_or(Error::ServiceShutdown)
    }

    /// Stops the service once the requests queued before this one are
    /// served. Later requests fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if the service had already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        let (response, done) = oneshot::channel();
        self.tx
            .send(Request::Shutdown { response })
            .await
            .map_err(|_| Error::ServiceShutdown)?;
        done.await.map_err(|_| Error::ServiceShutdown)
    }

    /// Whether the service task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl core::fmt::Debug for Request {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Generate { kind, count, .. } => f
                .debug_struct("Generate")
                .field("kind", kind)
                .field("count", count)
                .finish_non_exhaustive(),
            Self::Shutdown { .. } => f.debug_struct("Shutdown").finish_non_exhaustive(),
        }
    }
}

async fn service_loop<T>(mut rx: mpsc::Receiver<Request>, generator: BasicSiqGenerator<T>)
where
    T: TimeSource,
{
    #[cfg(feature = "tracing")]
    tracing::trace!(shard_id = generator.shard_id(), "SIQ service started");

    while let Some(request) = rx.recv().await {
        match request {
            Request::Generate { kind, count, reply } => {
                let mut ids = Vec::with_capacity(count);
                while ids.len() < count {
                    let poll = generator.poll_id(kind);
                    match poll {
                        Poll::Ready { id } => ids.push(id),
                        Poll::Pending { yield_for } => {
                            tokio::time::sleep(duration_from_ticks(yield_for)).await;
                        }
                    }
                }
                if reply.send(ids).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%kind, count, "requester went away before the reply");
                }
            }
            Request::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("SIQ service received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("SIQ service failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("SIQ service stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomainHash, ticks_from_duration};
    use std::collections::HashSet;
    use tokio::time::Instant;

    /// Follows tokio's (pausable) clock.
    struct TokioClock {
        start: Instant,
        base: u64,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                base: 1_577_833_200 << 16,
            }
        }
    }

    impl TimeSource for TokioClock {
        fn current_ticks(&self) -> u64 {
            self.base + ticks_from_duration(self.start.elapsed())
        }
    }

    fn spawn() -> SiqHandle {
        let domain = DomainHash::from_domain("example.com").unwrap();
        SiqService::spawn(BasicSiqGenerator::new(domain, 4, TokioClock::new()), 16)
    }

    #[tokio::test(start_paused = true)]
    async fn serves_ordered_batches() {
        let handle = spawn();
        let ids = handle.generate(SiqType::Content, 10).await.unwrap();
        assert_eq!(ids.len(), 10);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(ids.iter().all(|id| id.shard_id() == 4));

        let next = handle.generate_one(SiqType::Content).await.unwrap();
        assert!(next > ids[9]);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_through_counter_exhaustion() {
        let handle = spawn();
        let count = SiqType::User.max_counter() as usize + 10;
        let ids = handle.generate(SiqType::User, count).await.unwrap();

        assert_eq!(ids.len(), count);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(ids[count - 1].timestamp_ticks() > ids[0].timestamp_ticks());
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_one_generator() {
        let handle = spawn();
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.generate(SiqType::Event, 500).await })
            })
            .collect();

        let mut seen = HashSet::new();
        for task in tasks {
            for id in task.await.unwrap().unwrap() {
                assert!(seen.insert(id), "duplicate {id}");
            }
        }
        assert_eq!(seen.len(), 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_after_shutdown_fail() {
        let handle = spawn();
        handle.shutdown().await.unwrap();
        assert_eq!(
            handle.generate(SiqType::Tag, 1).await,
            Err(Error::ServiceShutdown)
        );
        assert_eq!(handle.shutdown().await, Err(Error::ServiceShutdown));
        assert!(handle.is_closed());
    }
}
