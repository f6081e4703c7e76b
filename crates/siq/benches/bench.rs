use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use siq::{
    BasicSiqGenerator, DISCORD_EPOCH, DomainHash, MonotonicClock, Poll, Siq, SiqCache, SiqMigrator,
    SiqType, Snowflake, SnowflakeMigrator, TimeSource, UlidMigrator,
};
use std::time::Instant;

struct FixedMockTime {
    ticks: u64,
}

impl TimeSource for FixedMockTime {
    fn current_ticks(&self) -> u64 {
        self.ticks
    }
}

// Number of IDs generated per benchmark iteration. Stays below the CONTENT
// counter capacity so the fixed clock never yields.
const TOTAL_IDS: usize = 4096;

const SAMPLE: Siq = Siq::from_raw(7_451_123_622_119_491_032_717_002_740_276);

fn domain() -> DomainHash {
    DomainHash::from_raw(2_261_653_831)
}

/// Hot path: a fixed clock, every poll is `Ready`.
fn benchmark_mock_sequential_basic(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock/sequential/basic");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator =
                    BasicSiqGenerator::new(domain(), 0, FixedMockTime { ticks: 1 << 16 });
                for _ in 0..TOTAL_IDS {
                    match generator.poll_id(SiqType::Content) {
                        Poll::Ready { id } => {
                            black_box(id);
                        }
                        Poll::Pending { .. } => unreachable!(),
                    }
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Realistic clock, spinning through counter exhaustion.
fn benchmark_mono_sequential_basic(c: &mut Criterion) {
    let mut group = c.benchmark_group("mono/sequential/basic");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    for kind in [SiqType::Content, SiqType::User] {
        group.bench_function(format!("{kind}/elems/{TOTAL_IDS}"), |b| {
            let generator = BasicSiqGenerator::new(domain(), 0, MonotonicClock::default());
            b.iter(|| {
                for _ in 0..TOTAL_IDS {
                    black_box(generator.next_id(kind, |_| core::hint::spin_loop()));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_mono_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("mono/cache");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        let generator = BasicSiqGenerator::new(domain(), 0, MonotonicClock::default());
        let mut cache = SiqCache::new(generator, SiqType::Message);
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(cache.next_id());
            }
        });
    });

    group.finish();
}

fn benchmark_encodings(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.bench_function("crockford", |b| b.iter(|| black_box(SAMPLE).to_crockford()));
    group.bench_function("b32l", |b| b.iter(|| black_box(SAMPLE).to_b32l()));
    group.bench_function("base64", |b| b.iter(|| black_box(SAMPLE).to_base64()));
    group.bench_function("did", |b| b.iter(|| black_box(SAMPLE).to_did()));
    group.bench_function("decimal", |b| b.iter(|| black_box(SAMPLE).to_string()));
    group.finish();

    let crockford = SAMPLE.to_crockford();
    let did = SAMPLE.to_did();
    let decimal = SAMPLE.to_string();

    let mut group = c.benchmark_group("decode");
    group.bench_function("crockford", |b| {
        b.iter(|| Siq::from_crockford(black_box(&crockford)))
    });
    group.bench_function("did", |b| b.iter(|| Siq::from_did(black_box(&did))));
    group.bench_function("decimal", |b| {
        b.iter(|| black_box(&decimal).parse::<Siq>())
    });
    group.finish();
}

fn benchmark_migrators(c: &mut Criterion) {
    let snowflake = SnowflakeMigrator::new(domain(), DISCORD_EPOCH);
    let ulid = UlidMigrator::new(domain());
    let legacy = Snowflake::from_raw(175_928_847_299_117_063);

    let mut group = c.benchmark_group("migrate");
    group.bench_function("snowflake", |b| {
        b.iter(|| black_box(legacy).to_siq(&snowflake, SiqType::Message))
    });
    group.bench_function("ulid", |b| {
        b.iter(|| ulid.to_siq(black_box(0x0156_3DF3_6AB5_FC6B_2B3E_1B4F_0E47_D8A3), SiqType::User))
    });
    group.finish();
}

#[cfg(feature = "async-tokio")]
fn benchmark_mono_service_tokio(c: &mut Criterion) {
    use siq::SiqService;
    use tokio::runtime::Builder;

    let mut group = c.benchmark_group("mono/service/tokio");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        let rt = Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .build()
            .unwrap();
        let handle = rt.block_on(async {
            let generator = BasicSiqGenerator::new(domain(), 0, MonotonicClock::default());
            SiqService::spawn(generator, 64)
        });

        b.to_async(&rt).iter(|| {
            let handle = handle.clone();
            async move {
                black_box(handle.generate(SiqType::Content, TOTAL_IDS).await.unwrap());
            }
        });
    });

    group.finish();
}

#[cfg(not(feature = "async-tokio"))]
fn benchmark_mono_service_tokio(_: &mut Criterion) {}

criterion_group!(
    benches,
    // Mock clock
    benchmark_mock_sequential_basic,
    // Monotonic clock (yielding)
    benchmark_mono_sequential_basic,
    benchmark_mono_cache,
    // Single-owner actor
    benchmark_mono_service_tokio,
    // Conversions
    benchmark_encodings,
    benchmark_migrators,
);
criterion_main!(benches);
