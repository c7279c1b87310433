//! Serde helpers for permission bits, written as zero-padded octal strings
//!  (`"0444"`) so manifests stay readable.

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{:04o}", mode))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let digits = s.strip_prefix("0o").unwrap_or(&s);
    let mode = u32::from_str_radix(digits, 8).map_err(serde::de::Error::custom)?;
    if mode > 0o7777 {
        return Err(serde::de::Error::custom(format!(
            "permission bits out of range: {}",
            s
        )));
    }
    Ok(mode)
}
