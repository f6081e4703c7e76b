mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, CliConfig, Command, MigrateCommand, parse_id, parse_ulid};
use siq::{
    BasicSiqGenerator, GeneratorConfig, MonotonicClock, Siq, SiqFormat, SiqMigrator, SiqType,
    Snowflake, SnowflakeMigrator, UlidMigrator, duration_from_ticks,
};
use std::io::{self, BufWriter, Write};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;

    #[cfg(debug_assertions)]
    tracing::debug!("Running with config: {:#?}", config);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run(&config, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run(config: &CliConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match &config.command {
        Command::Generate {
            kind,
            count,
            format,
        } => generate(&config.generator, *kind, *count, *format, out),
        Command::Inspect { id, from } => inspect(parse_id(id, *from)?, out),
        Command::Decode { id, from, to } => {
            writeln!(out, "{}", to.encode(parse_id(id, *from)?))?;
            Ok(())
        }
        Command::Migrate(command) => migrate(&config.generator, command, out),
    }
}

fn generate(
    config: &GeneratorConfig,
    kind: SiqType,
    count: usize,
    format: SiqFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let generator = BasicSiqGenerator::from_config(config, MonotonicClock::default())?;
    tracing::info!(
        %kind,
        count,
        domain = %generator.domain_hash(),
        shard_id = generator.shard_id(),
        "generating identifiers"
    );
    for _ in 0..count {
        let id = generator.next_id(kind, |ticks| {
            std::thread::sleep(duration_from_ticks(ticks));
        });
        writeln!(out, "{}", format.encode(id))?;
    }
    Ok(())
}

fn inspect(id: Siq, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "timestamp:  {:.6} ({} ticks)", id.timestamp(), id.timestamp_ticks())?;
    writeln!(out, "shard:      {}", id.shard_id())?;
    writeln!(out, "domain:     {}", id.domain_hash())?;
    writeln!(out, "sequence:   {:#06x}", id.sequence())?;

    let kinds: Vec<_> = matching_kinds(id).map(SiqType::name).collect();
    writeln!(out, "kinds:      {}", kinds.join(" "))?;

    for format in SiqFormat::ALL {
        writeln!(out, "{:<11} {}", format!("{format}:"), format.encode(id))?;
    }
    writeln!(out, "did:        {}", id.to_did())?;
    Ok(())
}

/// Type tags whose pattern matches the low bits of the sequence.
///
/// Patterns of different widths can overlap, so more than one tag may match.
fn matching_kinds(id: Siq) -> impl Iterator<Item = SiqType> {
    let sequence = id.sequence();
    SiqType::ALL
        .into_iter()
        .filter(move |kind| sequence & ((1 << kind.n_bits()) - 1) == kind.pattern())
}

fn migrate(
    config: &GeneratorConfig,
    command: &MigrateCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let domain = config.domain_hash()?;
    let id = match command {
        MigrateCommand::Snowflake { id, epoch, kind } => {
            let migrator = SnowflakeMigrator::new(domain, epoch.duration());
            Snowflake::from_raw(*id).to_siq(&migrator, *kind)
        }
        MigrateCommand::Ulid { id, kind } => {
            UlidMigrator::new(domain).to_siq(parse_ulid(id)?, *kind)
        }
    };
    writeln!(out, "{id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(args: &[&str]) -> String {
        let config = CliConfig::try_from(CliArgs::try_parse_from(args.iter().copied()).unwrap())
            .unwrap();
        let mut out = Vec::new();
        run(&config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn generate_prints_requested_count() {
        let out = run_to_string(&[
            "siq", "--domain", "example.com", "--shard-id", "3", "generate", "-k", "user",
            "-n", "5",
        ]);
        let ids: Vec<Siq> = out.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(ids.len(), 5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(ids.iter().all(|id| id.shard_id() == 3));
        assert!(ids.iter().all(|id| id.domain_hash() == 2_261_653_831));
    }

    #[test]
    fn decode_converts_between_formats() {
        let out = run_to_string(&["siq", "decode", "-f", "c", "-t", "u", "5W2YJY000000000000007"]);
        assert_eq!(out, "iuxvojaaf4c6s6aaaaaaaaaaaaaah\n");
        let out = run_to_string(&["siq", "decode", "did:siq:iuxvojaaf4c6s6aaaaaaaaaaaaaah"]);
        assert_eq!(out, "7451106619238957490390643507207\n");
    }

    #[test]
    fn inspect_lists_fields_and_forms() {
        let out = run_to_string(&["siq", "inspect", "7451106619238957490390643507207"]);
        assert!(out.contains("timestamp:  1577833200.000000 (103404876595200 ticks)"));
        assert!(out.contains("shard:      0"));
        assert!(out.contains("domain:     0"));
        assert!(out.contains("sequence:   0x0007"));
        assert!(out.contains("CONTENT"));
        assert!(out.contains("c:          5W2YJY000000000000007"));
        assert!(out.contains("did:        did:siq:iuxvojaaf4c6s6aaaaaaaaaaaaaah"));
    }

    #[test]
    fn migrate_uses_the_configured_domain() {
        let out = run_to_string(&[
            "siq", "--domain", "example.com", "migrate", "snowflake", "175928847299117063",
        ]);
        assert_eq!(out, "6904171133060110654416053796927\n");

        let out = run_to_string(&[
            "siq", "--domain", "example.com", "migrate", "ulid", "-k", "user",
            "01563DF36AB5FC6B2B3E1B4F0E47D8A3",
        ]);
        assert_eq!(out, "6941492336225022257568841976512\n");
    }

    #[test]
    fn migrate_applies_the_local_id() {
        let plain = run_to_string(&[
            "siq", "--domain", "example.com", "migrate", "snowflake", "175928847299117063",
        ]);
        let local = run_to_string(&[
            "siq", "--domain", "example.com", "--local-id", "7", "migrate", "snowflake",
            "175928847299117063",
        ]);
        let plain: Siq = plain.trim().parse().unwrap();
        let local: Siq = local.trim().parse().unwrap();
        assert_eq!(local.domain_hash(), 130_947_399);
        assert_eq!(local.timestamp_ticks(), plain.timestamp_ticks());
        assert_eq!(local.shard_id(), plain.shard_id());
        assert_eq!(local.sequence(), plain.sequence());
    }
}
