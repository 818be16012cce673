use serde::{Deserialize, Serialize};

use crate::ConfigurationProblem;

pub const KEY_LENGTH: usize = 16;

/// Symmetric secrets shared with the image packaging process. Each one is
/// written as 32 hexadecimal digits.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SecurityConfiguration {
    pub authentication_key: String,
    pub encryption_key: String,
    pub encryption_iv: String,
}

impl SecurityConfiguration {
    pub fn problems(&self) -> impl Iterator<Item = ConfigurationProblem> {
        [
            ("authentication_key", &self.authentication_key),
            ("encryption_key", &self.encryption_key),
            ("encryption_iv", &self.encryption_iv),
        ]
        .into_iter()
        .filter(|(_, raw)| parse_key(raw).is_none())
        .map(|(name, _)| ConfigurationProblem::MalformedKey(name))
        .collect::<Vec<_>>()
        .into_iter()
    }
}

/// Parses a 32 hex digit string into raw key bytes.
pub fn parse_key(raw: &str) -> Option<[u8; KEY_LENGTH]> {
    let raw = raw.trim();
    if raw.len() != KEY_LENGTH * 2 || !raw.is_ascii() {
        return None;
    }
    let mut key = [0u8; KEY_LENGTH];
    for (byte, pair) in key.iter_mut().zip(raw.as_bytes().chunks(2)) {
        let pair = std::str::from_utf8(pair).ok()?;
        *byte = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(key)
}
