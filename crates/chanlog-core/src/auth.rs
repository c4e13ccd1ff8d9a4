use std::collections::HashMap;

use async_trait::async_trait;

/// What a caller is trying to do to a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Decides whether a password grants an action on a channel.
///
/// Consulted by `query`, `add`/`put`/`del`, and `delete_channel`.
#[async_trait]
pub trait ChannelAuth: Send + Sync {
    async fn authorize(&self, channel: &str, password: &str, action: Action) -> bool;
}

/// Accepts every password for every channel.
///
/// This is the registry default: passwords are carried through the API but
/// not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

#[async_trait]
impl ChannelAuth for OpenAccess {
    async fn authorize(&self, _channel: &str, _password: &str, _action: Action) -> bool {
        true
    }
}

/// Per-channel shared secrets.
///
/// Only BLAKE3 digests of the secrets are kept, and comparisons go through
/// `blake3::Hash`'s constant-time equality. Channels without a secret of
/// their own fall back to the fallback secret; with neither, they are open.
#[derive(Clone, Default)]
pub struct SharedSecret {
    channels: HashMap<String, blake3::Hash>,
    fallback: Option<blake3::Hash>,
}

impl SharedSecret {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `secret` for `channel`.
    pub fn channel(mut self, channel: impl Into<String>, secret: &str) -> Self {
        self.channels
            .insert(channel.into(), blake3::hash(secret.as_bytes()));
        self
    }

    /// Require `secret` for every channel without its own secret.
    pub fn fallback(mut self, secret: &str) -> Self {
        self.fallback = Some(blake3::hash(secret.as_bytes()));
        self
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("channels", &self.channels.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[async_trait]
impl ChannelAuth for SharedSecret {
    async fn authorize(&self, channel: &str, password: &str, _action: Action) -> bool {
        match self.channels.get(channel).or(self.fallback.as_ref()) {
            Some(expected) => blake3::hash(password.as_bytes()) == *expected,
            None => true,
        }
    }
}
