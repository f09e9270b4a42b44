//! RecordingGateway - scriptable gateway double for handler tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::store::TodoGateway;
use crate::todo::{NewTodo, Todo};
use crate::{Error, Result};

/// In-memory [`TodoGateway`] double that records every call
///
/// Handlers under test see a fully functional gateway. The test keeps a
/// second handle and asserts on what was called and with which payloads.
/// Failures and stalls can be scripted at construction to exercise the
/// error and timeout paths.
#[derive(Default)]
pub struct RecordingGateway {
    /// Number of connect calls received
    connects: AtomicU64,
    /// Records currently "persisted"
    records: Mutex<Vec<Todo>>,
    /// Every insert_many payload received, in call order
    inserts: Mutex<Vec<Vec<NewTodo>>>,
    /// Last assigned record id
    last_id: AtomicU64,
    /// Fail connect calls after recording them
    fail_connects: bool,
    /// Fail insert calls after recording them
    fail_inserts: bool,
    /// Fail read calls
    fail_reads: bool,
    /// Sleep this long inside every gateway call
    delay: Option<Duration>,
}

impl RecordingGateway {
    /// Create a gateway that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway pre-loaded with persisted records
    pub fn with_records(records: Vec<Todo>) -> Self {
        let last_id = records.iter().map(|todo| todo.id).max().unwrap_or(0);
        Self {
            records: Mutex::new(records),
            last_id: AtomicU64::new(last_id),
            ..Self::default()
        }
    }

    /// Create a gateway whose connect calls fail
    pub fn failing_connects() -> Self {
        Self {
            fail_connects: true,
            ..Self::default()
        }
    }

    /// Create a gateway whose insert calls fail
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    /// Create a gateway whose read calls fail
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Create a gateway that sleeps for `delay` inside every call
    pub fn stalling(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Number of connect calls received
    pub fn connect_calls(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of insert_many calls received
    pub fn insert_calls(&self) -> usize {
        self.inserts.lock().unwrap().len()
    }

    /// Every insert_many payload received, in call order
    pub fn inserted(&self) -> Vec<Vec<NewTodo>> {
        self.inserts.lock().unwrap().clone()
    }

    /// Records currently "persisted"
    pub fn records(&self) -> Vec<Todo> {
        self.records.lock().unwrap().clone()
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TodoGateway for RecordingGateway {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_connects {
            return Err(Error::storage("injected connect failure"));
        }
        Ok(())
    }

    async fn insert_many(&self, batch: &[NewTodo]) -> Result<Vec<Todo>> {
        self.inserts.lock().unwrap().push(batch.to_vec());
        self.stall().await;
        if self.fail_inserts {
            return Err(Error::storage("injected insert failure"));
        }

        let mut records = self.records.lock().unwrap();
        let mut inserted = Vec::with_capacity(batch.len());
        for record in batch {
            let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
            let todo = Todo {
                id,
                description: record.description.clone(),
                category: record.category.clone(),
                done: false,
            };
            records.push(todo.clone());
            inserted.push(todo);
        }
        Ok(inserted)
    }

    async fn all(&self) -> Result<Vec<Todo>> {
        self.stall().await;
        if self.fail_reads {
            return Err(Error::storage("injected read failure"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn count(&self) -> Result<u64> {
        self.stall().await;
        if self.fail_reads {
            return Err(Error::storage("injected read failure"));
        }
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_payloads() {
        let gateway = RecordingGateway::new();

        gateway.connect().await.unwrap();
        gateway.connect().await.unwrap();
        let inserted = gateway
            .insert_many(&[NewTodo::new("buy milk", "shopping")])
            .await
            .unwrap();

        assert_eq!(gateway.connect_calls(), 2);
        assert_eq!(gateway.insert_calls(), 1);
        assert_eq!(
            gateway.inserted(),
            vec![vec![NewTodo::new("buy milk", "shopping")]]
        );
        assert_eq!(inserted[0].id, 1);
        assert_eq!(gateway.records(), inserted);
    }

    #[tokio::test]
    async fn scripted_failures_surface_as_storage_errors() {
        let gateway = RecordingGateway::failing_inserts();
        gateway.connect().await.unwrap();

        let err = gateway
            .insert_many(&[NewTodo::new("buy milk", "shopping")])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(gateway.insert_calls(), 1);
        assert!(gateway.records().is_empty());
    }

    #[tokio::test]
    async fn preloaded_records_continue_the_id_sequence() {
        let gateway = RecordingGateway::with_records(vec![Todo {
            id: 4,
            description: "buy milk".to_string(),
            category: "shopping".to_string(),
            done: true,
        }]);

        let inserted = gateway
            .insert_many(&[NewTodo::new("water plants", "hobby")])
            .await
            .unwrap();

        assert_eq!(inserted[0].id, 5);
        assert_eq!(gateway.count().await.unwrap(), 2);
    }
}
