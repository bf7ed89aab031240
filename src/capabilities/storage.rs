//! Key-value storage capability, used to keep a half-typed draft alive
//! across sessions. The shell decides where the bytes actually live.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOperation {
    Read {
        key: String,
    },
    Write {
        key: String,
        #[serde(with = "serde_bytes")]
        value: Vec<u8>,
    },
    Delete {
        key: String,
    },
}

impl Operation for StorageOperation {
    type Output = StorageResult;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOutput {
    /// Result of a read; `None` when the key does not exist.
    Value(Option<serde_bytes::ByteBuf>),
    /// A write or delete completed.
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

pub type StorageResult = Result<StorageOutput, StorageError>;

pub struct Storage<Ev> {
    context: CapabilityContext<StorageOperation, Ev>,
}

impl<Ev> Capability<Ev> for Storage<Ev> {
    type Operation = StorageOperation;
    type MappedSelf<MappedEv> = Storage<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Storage::new(self.context.map_event(f))
    }
}

impl<Ev> Storage<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<StorageOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn read<F>(&self, key: impl Into<String>, make_event: F)
    where
        Ev: Send,
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(StorageOperation::Read { key: key.into() }, make_event);
    }

    pub fn write<F>(&self, key: impl Into<String>, value: Vec<u8>, make_event: F)
    where
        Ev: Send,
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(
            StorageOperation::Write {
                key: key.into(),
                value,
            },
            make_event,
        );
    }

    pub fn delete<F>(&self, key: impl Into<String>, make_event: F)
    where
        Ev: Send,
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        self.request(StorageOperation::Delete { key: key.into() }, make_event);
    }

    fn request<F>(&self, operation: StorageOperation, make_event: F)
    where
        Ev: Send,
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(make_event(result));
        });
    }
}
