use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The acting user on whose behalf entries are appended.
///
/// A log created by `use(channel, user)` is scoped to this identity, and
/// every entry it appends is attributed to the identity's name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    name: String,
}

impl Identity {
    /// Create an identity from a user name.
    ///
    /// Names must be non-empty and free of whitespace and control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidIdentity("empty name".into()));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidIdentity(format!(
                "name contains whitespace or control characters: {name:?}"
            )));
        }
        Ok(Self { name })
    }

    /// The identity used when no user has been configured.
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".into(),
        }
    }

    /// The user name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.name)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_name() {
        let id = Identity::new("alice").unwrap();
        assert_eq!(id.name(), "alice");
        assert_eq!(id.to_string(), "alice");
    }

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(Identity::new(""), Err(TypeError::InvalidIdentity(_))));
    }

    #[test]
    fn whitespace_rejected() {
        assert!(Identity::new("bad name").is_err());
        assert!(Identity::new("tab\tname").is_err());
    }

    #[test]
    fn anonymous_identity() {
        assert_eq!(Identity::anonymous().name(), "anonymous");
    }

    #[test]
    fn ordering_follows_name() {
        let a = Identity::new("a").unwrap();
        let b = Identity::new("b").unwrap();
        assert!(a < b);
    }
}
