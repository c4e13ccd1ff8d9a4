//! Last-write-wins reads over a channel's log.
//!
//! [`run_query`] is pure: it walks the entry sequence, resolves each entry
//! through the [`PayloadCache`], and never touches the store. Entries whose
//! payload is not cached yet are invisible.
//!
//! Scan direction depends on the bounds:
//!
//! - `key`: newest to oldest, only entries with that key, result is values
//! - `gt` / `gte`: oldest to newest, starting at the bound
//! - `lt` / `lte` / no bound: newest to oldest, starting at the bound, then
//!   put back into log order
//!
//! Within a scan the first occurrence of a key decides it. An insert is
//! yielded, a delete hides the key for the rest of the scan.

use std::collections::HashSet;
use std::sync::Arc;

use chanlog_log::LogEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CachedPayload, PayloadCache};

/// Recognized query options.
///
/// `limit` defaults to 1; any negative limit means "all". `gt` wins over
/// `gte` and `lt` over `lte` when both are given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub limit: Option<i64>,
    pub key: Option<String>,
    pub gt: Option<String>,
    pub gte: Option<String>,
    pub lt: Option<String>,
    pub lte: Option<String>,
    pub reverse: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the current value of a single key.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return every decided element.
    pub fn all(self) -> Self {
        self.limit(-1)
    }

    pub fn gt(mut self, bound: impl Into<String>) -> Self {
        self.gt = Some(bound.into());
        self
    }

    pub fn gte(mut self, bound: impl Into<String>) -> Self {
        self.gte = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<String>) -> Self {
        self.lt = Some(bound.into());
        self
    }

    pub fn lte(mut self, bound: impl Into<String>) -> Self {
        self.lte = Some(bound.into());
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Number of elements to return; `None` means unbounded.
    fn amount(&self) -> Option<usize> {
        match self.limit {
            None | Some(0) => Some(1),
            Some(n) if n < 0 => None,
            Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

/// Result of a query.
///
/// Key lookups unwrap to values; everything else returns the decided
/// records.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Values(Vec<Value>),
    Records(Vec<CachedPayload>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(v) => v.len(),
            Self::Records(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values in result order, whichever form the result has.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Self::Values(v) => v.iter().collect(),
            Self::Records(r) => r.iter().map(|p| &p.value).collect(),
        }
    }

    /// Keys of a record result; empty for value results.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Values(_) => Vec::new(),
            Self::Records(r) => r.iter().map(|p| p.key.as_str()).collect(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

struct Plan<'a> {
    direction: Direction,
    bound: Option<&'a str>,
    inclusive: bool,
    exact_key: bool,
    amount: Option<usize>,
}

impl<'a> Plan<'a> {
    fn new(opts: &'a QueryOptions) -> Self {
        if let Some(key) = opts.key.as_deref() {
            return Self {
                direction: Direction::Backward,
                bound: Some(key),
                inclusive: true,
                exact_key: true,
                amount: Some(1),
            };
        }
        let amount = opts.amount();
        if let Some(gt) = opts.gt.as_deref() {
            return Self::range(Direction::Forward, Some(gt), false, amount);
        }
        if let Some(gte) = opts.gte.as_deref() {
            return Self::range(Direction::Forward, Some(gte), true, amount);
        }
        match (opts.lt.as_deref(), opts.lte.as_deref()) {
            (Some(lt), _) => Self::range(Direction::Backward, Some(lt), false, amount),
            (None, lte) => Self::range(Direction::Backward, lte, true, amount),
        }
    }

    fn range(direction: Direction, bound: Option<&'a str>, inclusive: bool, amount: Option<usize>) -> Self {
        Self {
            direction,
            bound,
            inclusive,
            exact_key: false,
            amount,
        }
    }

    /// Walk `payloads` in scan order and return the decided inserts.
    fn decide<I>(&self, payloads: I) -> Vec<Arc<CachedPayload>>
    where
        I: Iterator<Item = Arc<CachedPayload>>,
    {
        let mut decided: HashSet<String> = HashSet::new();
        let mut reached = self.bound.is_none();
        let mut out = Vec::new();

        for payload in payloads {
            if self.amount.is_some_and(|n| out.len() >= n) {
                break;
            }
            let at_bound = self.bound == Some(payload.key.as_str());
            if self.exact_key && !at_bound {
                continue;
            }
            if !reached {
                if !at_bound {
                    continue;
                }
                reached = true;
                if !self.inclusive {
                    decided.insert(payload.key.clone());
                    continue;
                }
            }
            if !decided.insert(payload.key.clone()) {
                continue;
            }
            if payload.op.is_insert() {
                out.push(payload);
            }
        }
        out
    }
}

/// Run a last-write-wins query over `entries` (in log order).
pub fn run_query(entries: &[LogEntry], cache: &PayloadCache, opts: &QueryOptions) -> QueryResult {
    let plan = Plan::new(opts);
    let resolved = entries.iter().filter_map(|e| cache.get(&e.payload));

    let mut picked = match plan.direction {
        Direction::Forward => plan.decide(resolved),
        Direction::Backward => plan.decide(resolved.rev()),
    };

    if plan.exact_key {
        return QueryResult::Values(picked.iter().map(|p| p.value.clone()).collect());
    }
    if plan.direction == Direction::Backward {
        picked.reverse();
    }
    if opts.reverse {
        picked.reverse();
    }
    QueryResult::Records(picked.iter().map(|p| CachedPayload::clone(p)).collect())
}
