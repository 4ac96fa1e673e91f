//! Shared helpers for unit tests across the crate.

pub mod serde {
    use serde::{de::DeserializeOwned, Serialize};
    use std::fmt::Debug;

    /// Serializes `value` to JSON and back, asserting the round trip is lossless.
    pub fn assert_round_trip_json<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + Debug,
    {
        let json = serde_json::to_string(value).expect("serialize");
        let back: T = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(value, &back, "value did not round-trip through JSON: {json}");
    }
}
