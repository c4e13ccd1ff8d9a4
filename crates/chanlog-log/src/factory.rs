use async_trait::async_trait;
use chanlog_store::{ContentStore, StoredObject};
use chanlog_types::Identity;

use crate::error::{LogError, LogResult};
use crate::log::{LogEntry, LogHandle};
use crate::operation::{Operation, PayloadRecord};

/// Result of appending an operation: the new entry and the logical record.
#[derive(Clone, Debug, PartialEq)]
pub struct AppendedOperation {
    pub entry: LogEntry,
    pub operation: Operation,
}

/// Builds an operation payload, stores it, and appends it to a log.
#[async_trait]
pub trait OperationFactory: Send + Sync {
    async fn create(
        &self,
        store: &dyn ContentStore,
        log: &mut LogHandle,
        identity: &Identity,
        operation: Operation,
    ) -> LogResult<AppendedOperation>;
}

/// Stock factory: stores a JSON [`PayloadRecord`] and appends its hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOperationFactory;

#[async_trait]
impl OperationFactory for JsonOperationFactory {
    async fn create(
        &self,
        store: &dyn ContentStore,
        log: &mut LogHandle,
        identity: &Identity,
        operation: Operation,
    ) -> LogResult<AppendedOperation> {
        let record = PayloadRecord::new(operation.clone(), identity.name(), log.next_clock());
        let bytes =
            serde_json::to_vec(&record).map_err(|e| LogError::Serialization(e.to_string()))?;
        let payload = store.put(StoredObject::payload(bytes)).await?;
        let entry = log.append(payload, identity);
        Ok(AppendedOperation { entry, operation })
    }
}
