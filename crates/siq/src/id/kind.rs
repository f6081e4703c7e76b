use core::{fmt, str::FromStr};

use crate::{Error, Result};

/// Qualifier embedded in the low bits of every SIQ.
///
/// The code's most significant set bit is a marker; the bits below it are the
/// pattern that [`SiqType::prepend`] places under the counter. Leaves carry a
/// 3-bit pattern, threads and messages 4 bits, everything else 5 bits.
///
/// ```text
///  CONTENT  = 15  xxx111      TAG     = 34  x00010
///  MULTI    = 11  xxx011      CHANNEL = 42  x01010
///  THREAD   = 22  xx0110      USER    = 32  x00000
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SiqType {
    // leaves: dead, non-structured content referenced from elsewhere
    /// Binary data, strings.
    Content = 15,
    /// Group member, array element, one-to-many.
    Multi = 11,
    /// Many-to-many relationship, hash array element.
    ManyToMany = 13,
    /// Relationship with more than three foreign keys.
    Ternary = 9,

    // non-leaves that may have children
    /// Tag for categorization or trending.
    Tag = 34,
    /// Anything allowing messages in it.
    Channel = 42,
    /// Thread, forum post, page.
    Thread = 22,
    /// Single message or post.
    Message = 30,

    // non-leaves without children
    /// User account.
    User = 32,
    /// Group of users (member group, role).
    Group = 36,
    /// Calendar event or task.
    Event = 40,
    /// Invite or join request.
    Invite = 44,
    /// Server side application or client.
    Application = 48,
    /// User-created collection or curated feed.
    Collection = 52,
    /// Anything sold for a fee.
    Premium = 56,
}

impl SiqType {
    /// Every registered tag, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Content,
        Self::Multi,
        Self::ManyToMany,
        Self::Ternary,
        Self::Tag,
        Self::Channel,
        Self::Thread,
        Self::Message,
        Self::User,
        Self::Group,
        Self::Event,
        Self::Invite,
        Self::Application,
        Self::Collection,
        Self::Premium,
    ];

    /// Width of the sequence region shared by the tag and its counter.
    pub const REGION_BITS: u32 = 16;

    /// Numeric code of the tag.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Dense slot in `0..ALL.len()`.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Content => 0,
            Self::Multi => 1,
            Self::ManyToMany => 2,
            Self::Ternary => 3,
            Self::Tag => 4,
            Self::Channel => 5,
            Self::Thread => 6,
            Self::Message => 7,
            Self::User => 8,
            Self::Group => 9,
            Self::Event => 10,
            Self::Invite => 11,
            Self::Application => 12,
            Self::Collection => 13,
            Self::Premium => 14,
        }
    }

    /// Number of low bits the tag pattern occupies.
    pub const fn n_bits(self) -> u32 {
        self.code().ilog2()
    }

    /// Low bits written under the counter.
    pub const fn pattern(self) -> u16 {
        (self.code() as u16) & ((1 << self.n_bits()) - 1)
    }

    /// Bits left for the rolling counter.
    pub const fn counter_bits(self) -> u32 {
        Self::REGION_BITS - self.n_bits()
    }

    /// Largest counter value that still fits the sequence region.
    pub const fn max_counter(self) -> u32 {
        (1 << self.counter_bits()) - 1
    }

    /// Combines `counter` with the tag pattern.
    ///
    /// The result is unbounded: callers check it against
    /// [`SiqType::REGION_BITS`] to detect counter exhaustion.
    ///
    /// ```
    /// use siq::SiqType;
    ///
    /// assert_eq!(SiqType::Content.prepend(0), 7);
    /// assert_eq!(SiqType::Content.prepend(1), 15);
    /// assert_eq!(SiqType::User.prepend(3), 96);
    /// ```
    pub const fn prepend(self, counter: u32) -> u32 {
        (counter << self.n_bits()) | self.pattern() as u32
    }

    /// Looks a tag up by numeric code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTag`] for unregistered codes.
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| Error::InvalidTag(code.to_string()))
    }

    /// Upper-case registry name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Content => "CONTENT",
            Self::Multi => "MULTI",
            Self::ManyToMany => "MANYTOMANY",
            Self::Ternary => "TERNARY",
            Self::Tag => "TAG",
            Self::Channel => "CHANNEL",
            Self::Thread => "THREAD",
            Self::Message => "MESSAGE",
            Self::User => "USER",
            Self::Group => "GROUP",
            Self::Event => "EVENT",
            Self::Invite => "INVITE",
            Self::Application => "APPLICATION",
            Self::Collection => "COLLECTION",
            Self::Premium => "PREMIUM",
        }
    }
}

impl TryFrom<u8> for SiqType {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_code(code)
    }
}

impl From<SiqType> for u8 {
    fn from(kind: SiqType) -> Self {
        kind.code()
    }
}

impl FromStr for SiqType {
    type Err = Error;

    /// Accepts a decimal code (`"15"`) or a case-insensitive name
    /// (`"content"`).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidTag(s.to_owned()))
    }
}

impl fmt::Display for SiqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
