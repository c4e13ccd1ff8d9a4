use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a logged operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpKind {
    /// Keyless insert; the payload hash becomes the effective key.
    Add,
    /// Keyed insert or overwrite.
    Put,
    /// Keyed tombstone.
    Del,
}

impl OpKind {
    /// Whether this kind contributes a value to last-write-wins reads.
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Add | Self::Put)
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Put => write!(f, "PUT"),
            Self::Del => write!(f, "DEL"),
        }
    }
}

/// A logical operation: the record a log entry's payload decodes to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub op: OpKind,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl Operation {
    pub fn add(value: Value) -> Self {
        Self {
            op: OpKind::Add,
            key: None,
            value,
        }
    }

    pub fn put(key: impl Into<String>, value: Value) -> Self {
        Self {
            op: OpKind::Put,
            key: Some(key.into()),
            value,
        }
    }

    /// A tombstone for `key`. Carries no value.
    pub fn del(key: impl Into<String>) -> Self {
        Self {
            op: OpKind::Del,
            key: Some(key.into()),
            value: Value::Null,
        }
    }
}

/// The JSON body actually stored for an operation.
///
/// Author and clock make every stored payload unique, so two `Add`s of the
/// same value by the same user still hash (and therefore key) differently.
/// Readers that only need the [`Operation`] can decode the same bytes into
/// it directly; the extra fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub op: OpKind,
    pub key: Option<String>,
    pub value: Value,
    pub author: String,
    pub clock: u64,
}

impl PayloadRecord {
    pub fn new(operation: Operation, author: impl Into<String>, clock: u64) -> Self {
        Self {
            op: operation.op,
            key: operation.key,
            value: operation.value,
            author: author.into(),
            clock,
        }
    }

    pub fn operation(&self) -> Operation {
        Operation {
            op: self.op,
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}
