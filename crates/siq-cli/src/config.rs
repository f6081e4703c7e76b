use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use core::time::Duration;
use siq::{
    DISCORD_EPOCH, DomainHash, GeneratorConfig, INSTAGRAM_EPOCH, MASTODON_EPOCH, Siq, SiqFormat,
    SiqType, TWITTER_EPOCH,
};

/// Runtime configuration for the `siq` binary.
///
/// Generator settings are global flags with environment fallbacks so a
/// deployment can pin its domain and shard once (in the environment or a
/// `.env` file) and every subcommand picks them up.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "siq",
    version,
    about = "Generate, inspect, convert and migrate SIQ identifiers"
)]
pub struct CliArgs {
    /// Domain hashed into generated identifiers. Empty or `0` means none.
    ///
    /// Environment variable: `SIQ_DOMAIN`
    #[arg(long, env = "SIQ_DOMAIN", default_value_t = String::new(), global = true)]
    pub domain: String,

    /// Overrides the top byte of the domain hash.
    ///
    /// Environment variable: `SIQ_LOCAL_ID`
    #[arg(long, env = "SIQ_LOCAL_ID", global = true)]
    pub local_id: Option<u16>,

    /// Shard id, reduced modulo 256. Defaults to the process id.
    ///
    /// Environment variable: `SIQ_SHARD_ID`
    #[arg(long, env = "SIQ_SHARD_ID", global = true)]
    pub shard_id: Option<u16>,

    /// Last identifier emitted by a previous run (decimal or `did:siq:`).
    /// Generation resumes strictly after its timestamp.
    ///
    /// Environment variable: `SIQ_LAST_ID`
    #[arg(long, env = "SIQ_LAST_ID", global = true)]
    pub last_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate new identifiers, one per line.
    Generate {
        /// Type tag, by name (`user`) or code (`32`).
        #[arg(short, long, default_value_t = SiqType::Content)]
        kind: SiqType,

        /// Number of identifiers to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Output format: b, c, 0c, d, l, o, u or x.
        #[arg(short, long, default_value_t = SiqFormat::Decimal)]
        format: SiqFormat,
    },

    /// Print the fields and every text form of an identifier.
    Inspect {
        /// The identifier.
        id: String,

        /// Input format. Without it, `did:` prefixed and decimal input is
        /// detected.
        #[arg(short, long)]
        from: Option<SiqFormat>,
    },

    /// Re-encode an identifier from one format into another.
    Decode {
        /// The identifier.
        id: String,

        /// Input format. Without it, `did:` prefixed and decimal input is
        /// detected.
        #[arg(short, long)]
        from: Option<SiqFormat>,

        /// Output format.
        #[arg(short, long, default_value_t = SiqFormat::Decimal)]
        to: SiqFormat,
    },

    /// Convert legacy identifiers into SIQs under the configured domain.
    #[command(subcommand)]
    Migrate(MigrateCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MigrateCommand {
    /// Convert a 64-bit snowflake.
    Snowflake {
        /// The snowflake, in decimal.
        id: u64,

        /// Epoch the snowflake counts milliseconds from.
        #[arg(short, long, value_enum, default_value_t = Epoch::Discord)]
        epoch: Epoch,

        /// Type tag of the resulting identifier.
        #[arg(short, long, default_value_t = SiqType::Content)]
        kind: SiqType,
    },

    /// Convert a 128-bit ULID given in hexadecimal.
    Ulid {
        /// The ULID as 32 hex digits, optionally `0x` prefixed.
        id: String,

        /// Type tag of the resulting identifier.
        #[arg(short, long, default_value_t = SiqType::Content)]
        kind: SiqType,
    },
}

/// Well-known snowflake epochs.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epoch {
    Discord,
    Twitter,
    Instagram,
    Mastodon,
}

impl Epoch {
    pub const fn duration(self) -> Duration {
        match self {
            Self::Discord => DISCORD_EPOCH,
            Self::Twitter => TWITTER_EPOCH,
            Self::Instagram => INSTAGRAM_EPOCH,
            Self::Mastodon => MASTODON_EPOCH,
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub generator: GeneratorConfig,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        DomainHash::from_domain(&args.domain)
            .with_context(|| format!("SIQ_DOMAIN ({:?}) cannot be hashed", args.domain))?;

        if matches!(args.command, Command::Generate { count: 0, .. }) {
            bail!("--count must be greater than 0");
        }

        let last_id = args
            .last_id
            .as_deref()
            .map(|s| parse_id(s, None))
            .transpose()
            .context("SIQ_LAST_ID is not a valid identifier")?;

        let mut generator = GeneratorConfig::new(args.domain);
        generator.local_id = args.local_id;
        generator.shard_id = args.shard_id;
        generator.last_id = last_id;

        Ok(Self {
            generator,
            command: args.command,
        })
    }
}

/// Parses `s` in `format`, or detects the DID and decimal forms.
pub fn parse_id(s: &str, format: Option<SiqFormat>) -> anyhow::Result<Siq> {
    let s = s.trim();
    let id = match format {
        Some(format) => format.parse(s)?,
        None if s.starts_with("did:") => Siq::from_did(s)?,
        None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse()?,
        None => bail!("cannot detect the format of {s:?}, pass --from"),
    };
    Ok(id)
}

/// Parses a ULID from hex digits.
pub fn parse_ulid(s: &str) -> anyhow::Result<u128> {
    let digits = s.trim().trim_start_matches("0x");
    if digits.len() != 32 {
        bail!("a ULID is 32 hex digits, got {}", digits.len());
    }
    u128::from_str_radix(digits, 16).with_context(|| format!("{s:?} is not hexadecimal"))
}
