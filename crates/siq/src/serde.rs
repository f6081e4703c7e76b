use core::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serializer,
    de::{self, Visitor},
};

use crate::{Error, Siq, Snowflake};

/// Visits a string and converts it with `parse`.
struct ParseVisitor<T> {
    expecting: &'static str,
    parse: fn(&str) -> Result<T, Error>,
    marker: PhantomData<T>,
}

impl<T> Visitor<'_> for ParseVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    fn visit_str<E>(self, v: &str) -> Result<T, E>
    where
        E: de::Error,
    {
        (self.parse)(v).map_err(de::Error::custom)
    }
}

fn deserialize_parsed<'de, T, D>(
    d: D,
    expecting: &'static str,
    parse: fn(&str) -> Result<T, Error>,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_str(ParseVisitor {
        expecting,
        parse,
        marker: PhantomData,
    })
}

/// Accepts the decimal or the DID form.
fn parse_any(s: &str) -> Result<Siq, Error> {
    if s.starts_with("did:") {
        Siq::from_did(s)
    } else {
        s.parse()
    }
}

/// Deserializes `GeneratorConfig::last_id` from a decimal or DID string.
pub(crate) fn deserialize_last_id<'de, D>(d: D) -> Result<Option<Siq>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d)?
        .map(|s| parse_any(&s).map_err(de::Error::custom))
        .transpose()
}

/// Serializes a [`Siq`] as its native `u128` integer.
///
/// Formats without 128-bit integers (JSON consumed by JavaScript, for
/// example) are better served by [`as_decimal`].
pub mod as_native {
    use super::{Deserialize, Deserializer, Serializer, de};
    use crate::Siq;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Siq, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u128(id.to_raw())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the value
    /// does not fit 112 bits.
    pub fn deserialize<'de, D>(d: D) -> Result<Siq, D::Error>
    where
        D: Deserializer<'de>,
    {
        Siq::try_from_raw(u128::deserialize(d)?).map_err(de::Error::custom)
    }
}

/// Serializes a [`Siq`] as a decimal string.
pub mod as_decimal {
    use super::{Deserializer, Serializer, deserialize_parsed};
    use crate::Siq;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Siq, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string
    /// is not a decimal SIQ.
    pub fn deserialize<'de, D>(d: D) -> Result<Siq, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_parsed(d, "a decimal SIQ string", str::parse::<Siq>)
    }
}

/// Serializes a [`Siq`] as Crockford base32.
pub mod as_crockford {
    use super::{Deserializer, Serializer, deserialize_parsed};
    use crate::Siq;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Siq, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_crockford())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string
    /// is not valid Crockford base32.
    pub fn deserialize<'de, D>(d: D) -> Result<Siq, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_parsed(d, "a Crockford base32 SIQ", Siq::from_crockford)
    }
}

/// Serializes a [`Siq`] in its checksummed `did:siq:` form.
pub mod as_did {
    use super::{Deserializer, Serializer, deserialize_parsed};
    use crate::Siq;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Siq, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_did())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails, the string is
    /// malformed or its checksum does not match.
    pub fn deserialize<'de, D>(d: D) -> Result<Siq, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_parsed(d, "a did:siq: identifier", Siq::from_did)
    }
}

/// Serializes a [`Snowflake`] as its native `u64` integer.
pub mod as_native_snowflake {
    use super::{Deserialize, Deserializer, Serializer};
    use crate::Snowflake;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Snowflake, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(id.to_raw())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails.
    pub fn deserialize<'de, D>(d: D) -> Result<Snowflake, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(d).map(Snowflake::from_raw)
    }
}

/// Serializes a [`Snowflake`] as stripped lowercase base32.
pub mod as_b32l_snowflake {
    use super::{Deserializer, Serializer, deserialize_parsed};
    use crate::Snowflake;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &Snowflake, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_b32l())
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string
    /// is not valid base32.
    pub fn deserialize<'de, D>(d: D) -> Result<Snowflake, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_parsed(d, "a base32 snowflake", Snowflake::from_b32l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomainHash, GeneratorConfig};
    use serde::Serialize;

    const FIRST: Siq = Siq::from_raw(7_451_106_619_238_957_490_390_643_507_207);

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Row {
        #[serde(with = "as_native")]
        native: Siq,
        #[serde(with = "as_decimal")]
        decimal: Siq,
        #[serde(with = "as_crockford")]
        crockford: Siq,
        #[serde(with = "as_did")]
        did: Siq,
    }

    #[test]
    fn every_adapter_roundtrips() {
        let row = Row {
            native: FIRST,
            decimal: FIRST,
            crockford: FIRST,
            did: FIRST,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"native":7451106619238957490390643507207,"#,
                r#""decimal":"7451106619238957490390643507207","#,
                r#""crockford":"5W2YJY000000000000007","#,
                r#""did":"did:siq:iuxvojaaf4c6s6aaaaaaaaaaaaaah"}"#
            )
        );
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn native_rejects_wide_values() {
        #[derive(Debug, Deserialize)]
        struct Native {
            #[serde(with = "as_native")]
            #[allow(dead_code)]
            id: Siq,
        }
        let json = format!(r#"{{"id":{}}}"#, Siq::MAX + 1);
        let err = serde_json::from_str::<Native>(&json).unwrap_err();
        assert!(err.to_string().contains(&Error::Overflow { bits: 112 }.to_string()));
    }

    #[test]
    fn did_adapter_reports_checksum_errors() {
        #[derive(Debug, Deserialize)]
        struct Did {
            #[serde(with = "as_did")]
            #[allow(dead_code)]
            id: Siq,
        }
        let json = r#"{"id":"did:siq:iuxvojaaf4c6s6aaaaaaaaaaaaaai"}"#;
        let err = serde_json::from_str::<Did>(json).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn snowflake_adapters() {
        #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
        struct Legacy {
            #[serde(with = "as_native_snowflake")]
            native: Snowflake,
            #[serde(with = "as_b32l_snowflake")]
            b32l: Snowflake,
        }
        let id = Snowflake::from_raw(175_928_847_299_117_063);
        let row = Legacy {
            native: id,
            b32l: id,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"native":175928847299117063,"b32l":"e4igllaqeaah"}"#);
        assert_eq!(serde_json::from_str::<Legacy>(&json).unwrap(), row);
    }

    #[test]
    fn generator_config_from_json() {
        let json = concat!(
            r#"{"domain":"example.com","shard_id":5,"#,
            r#""last_id":"did:siq:iuxvojaaf4c6s6aaaaaaaaaaaaaah"}"#
        );
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.resolve().unwrap(), (DomainHash::from_raw(2_261_653_831), 5));
        assert_eq!(config.last_id, Some(FIRST));

        let config: GeneratorConfig =
            serde_json::from_str(r#"{"last_id":"7451106619238957490390643507207"}"#).unwrap();
        assert_eq!(config.domain, "");
        assert_eq!(config.last_id, Some(FIRST));

        assert!(serde_json::from_str::<GeneratorConfig>(r#"{"shard":1}"#).is_err());
    }
}
