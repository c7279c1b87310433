use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::ResolveError;

/// A syntactically valid capability token.
///
/// Only the canonical spelling is accepted: 36 characters, lowercase hex,
///  hyphenated. Uppercase, braced, `urn:uuid:` and simple forms are all
///  rejected even though they name the same UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(Uuid);

impl Token {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::Malformed(truncate(raw));
        if raw.len() != uuid::fmt::Hyphenated::LENGTH {
            return Err(malformed());
        }
        let uuid = Uuid::try_parse(raw).map_err(|_| malformed())?;
        if uuid.as_hyphenated().to_string() != raw {
            return Err(malformed());
        }
        Ok(Self(uuid))
    }

    pub fn uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for Token {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// Client-supplied text echoed into diagnostics is capped.
fn truncate(raw: &str) -> String {
    raw.chars().take(64).collect()
}
