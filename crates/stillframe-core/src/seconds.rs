//! Serde helpers that read and write [`Duration`]s as floating-point seconds.
//!
//! Story manifests express every delay the way authors think about them
//! (`fade: 2.5`), so `#[serde(with = "stillframe_core::seconds")]` is used on
//! every duration field.

use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Longest duration a manifest may express, a little over 31 years.
pub const MAX_SECS: f64 = 1.0e9;

fn from_secs(secs: f64) -> Result<Duration, String> {
    if secs > MAX_SECS {
        return Err(format!("{secs} seconds exceeds the maximum of {MAX_SECS}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

/// Serializes a duration as seconds.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Deserializes a non-negative, finite number of seconds.
///
/// # Errors
///
/// Fails on negative, NaN, infinite or out-of-range values.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    from_secs(secs).map_err(D::Error::custom)
}

/// The same conversion for `Option<Duration>` fields.
pub mod option {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional duration as seconds or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes optional seconds.
    ///
    /// # Errors
    ///
    /// Fails on negative, NaN, infinite or out-of-range values.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| super::from_secs(secs).map_err(D::Error::custom))
            .transpose()
    }
}
