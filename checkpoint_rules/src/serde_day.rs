//! Serde encoding for open-ended day bounds.
//!
//! Configuration marks "no bound" with `-1` (or by omitting the key); in Rust
//! that is `None`. Use with `#[serde(default, with = "crate::serde_day")]`.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(day) => serializer.serialize_i64(i64::from(*day)),
        None => serializer.serialize_i64(-1),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DayInput {
        Number(i64),
        Missing(Option<()>),
    }

    match DayInput::deserialize(deserializer)? {
        DayInput::Number(-1) | DayInput::Missing(None) => Ok(None),
        DayInput::Number(value) if value >= 0 => u32::try_from(value)
            .map(Some)
            .map_err(D::Error::custom),
        DayInput::Number(value) => Err(D::Error::custom(format!(
            "day bound must be -1 or non-negative, got {value}"
        ))),
        DayInput::Missing(Some(())) => Err(D::Error::custom("unexpected unit day bound")),
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Wrapper {
        #[serde(default, with = "super")]
        until: Option<u32>,
    }

    #[test]
    fn test_minus_one_is_open_ended() {
        let parsed: Wrapper = serde_json::from_str(r#"{"until":-1}"#).unwrap();
        assert_eq!(parsed.until, None);
    }

    #[test]
    fn test_missing_is_open_ended() {
        let parsed: Wrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.until, None);
    }

    #[test]
    fn test_bounded_day() {
        let parsed: Wrapper = serde_json::from_str(r#"{"until":12}"#).unwrap();
        assert_eq!(parsed.until, Some(12));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"until":-4}"#).is_err());
    }

    #[test]
    fn test_serializes_none_as_minus_one() {
        let json = serde_json::to_string(&Wrapper { until: None }).unwrap();
        assert_eq!(json, r#"{"until":-1}"#);
    }
}
