use chrono::{DateTime, SecondsFormat, Utc};

/// Format as ISO-8601 UTC with millisecond precision, e.g. `2026-01-02T03:04:05.678Z`.
pub fn to_iso8601(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for ISO-8601 timestamps.
///
/// Reading also accepts integer epoch milliseconds.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Text(String),
        Millis(i64),
    }

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso8601(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match RawTime::deserialize(deserializer)? {
            RawTime::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
            RawTime::Millis(millis) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {millis}"))),
        }
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            time: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(with = "super")] DateTime<Utc>);

            Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(time)| time))
        }
    }
}
