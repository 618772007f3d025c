use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chat user identity.
///
/// Chat logins are case-insensitive, so the name is normalised to lowercase
/// on construction and a leading `@` (mention syntax) is stripped. Two
/// `UserName`s compare equal whenever they refer to the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(CompactString);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUserName {
    #[error("user name is empty")]
    Empty,
    #[error("user name contains whitespace")]
    Whitespace,
}

impl UserName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidUserName> {
        let trimmed = raw.as_ref().trim();
        let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(InvalidUserName::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(InvalidUserName::Whitespace);
        }
        Ok(Self(CompactString::from(trimmed.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserName {
    type Err = InvalidUserName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserName {
    type Error = InvalidUserName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0.into()
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
