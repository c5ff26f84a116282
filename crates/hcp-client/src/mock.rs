//! Mock ClusterClient for unit testing
//!
//! Stores secrets in memory, records every write, and can be told to fail
//! the next call of a given kind so retry and error paths can be exercised
//! without an API server.

use crate::cluster_trait::{ClusterClient, object_key};
use crate::context::ReconcileContext;
use crate::error::ClientError;
use k8s_openapi::api::core::v1::Secret;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Client call kinds that can be failed on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

/// Failure returned instead of performing the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound,
    Conflict,
    Server(String),
}

/// A write that reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub operation: Operation,
    pub namespace: String,
    pub name: String,
}

type Key = (String, String);

/// In-memory ClusterClient
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
    secrets: Arc<Mutex<BTreeMap<Key, Secret>>>,
    writes: Arc<Mutex<Vec<WriteRecord>>>,
    failures: Arc<Mutex<VecDeque<(Operation, InjectedFailure)>>>,
    remove_after_get: Arc<Mutex<Option<Key>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store (for test setup)
    #[must_use]
    pub fn with_secret(self, secret: Secret) -> Self {
        self.insert_secret(secret);
        self
    }

    /// Add or replace a secret in the store without recording a write
    pub fn insert_secret(&self, secret: Secret) {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        lock(&self.secrets).insert((namespace, name), secret);
    }

    /// Current stored copy of a secret
    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        lock(&self.secrets).get(&key(namespace, name)).cloned()
    }

    /// Writes performed so far, in order
    pub fn writes(&self) -> Vec<WriteRecord> {
        lock(&self.writes).clone()
    }

    /// Fail the next call of `operation`. Failures queue up in order.
    pub fn fail_next(&self, operation: Operation, failure: InjectedFailure) {
        lock(&self.failures).push_back((operation, failure));
    }

    /// Drop the given secret right after the next successful get, to
    /// simulate a concurrent deletion
    pub fn remove_after_next_get(&self, namespace: &str, name: &str) {
        *lock(&self.remove_after_get) = Some(key(namespace, name));
    }

    fn check(
        &self,
        ctx: &ReconcileContext,
        operation: Operation,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        if ctx.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let mut failures = lock(&self.failures);
        let Some(index) = failures.iter().position(|(op, _)| *op == operation) else {
            return Ok(());
        };
        let Some((_, failure)) = failures.remove(index) else {
            return Ok(());
        };
        Err(match failure {
            InjectedFailure::NotFound => not_found(namespace, name),
            InjectedFailure::Conflict => ClientError::Conflict {
                kind: "Secret",
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: "the object has been modified".to_string(),
            },
            InjectedFailure::Server(message) => ClientError::Request(message),
        })
    }

    fn record(&self, operation: Operation, namespace: &str, name: &str) {
        lock(&self.writes).push(WriteRecord {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
    }
}

fn not_found(namespace: &str, name: &str) -> ClientError {
    ClientError::NotFound {
        kind: "Secret",
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

fn bump_resource_version(secret: &mut Secret, previous: Option<&Secret>) {
    let next = previous
        .and_then(|s| s.metadata.resource_version.as_deref())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    secret.metadata.resource_version = Some(next.to_string());
}

#[async_trait::async_trait]
impl ClusterClient for MockClusterClient {
    async fn get_secret(
        &self,
        ctx: &ReconcileContext,
        namespace: &str,
        name: &str,
    ) -> Result<Secret, ClientError> {
        self.check(ctx, Operation::Get, namespace, name)?;
        let k = key(namespace, name);
        let found = lock(&self.secrets).get(&k).cloned();
        let mut pending = lock(&self.remove_after_get);
        if found.is_some() && pending.as_ref() == Some(&k) {
            *pending = None;
            lock(&self.secrets).remove(&k);
        }
        found.ok_or_else(|| not_found(namespace, name))
    }

    async fn create_secret(
        &self,
        ctx: &ReconcileContext,
        secret: &Secret,
    ) -> Result<Secret, ClientError> {
        let (namespace, name) = object_key(secret)?;
        self.check(ctx, Operation::Create, namespace, name)?;
        let mut secrets = lock(&self.secrets);
        let k = key(namespace, name);
        if secrets.contains_key(&k) {
            return Err(ClientError::Conflict {
                kind: "Secret",
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: "already exists".to_string(),
            });
        }
        let mut stored = secret.clone();
        bump_resource_version(&mut stored, None);
        secrets.insert(k, stored.clone());
        drop(secrets);
        self.record(Operation::Create, namespace, name);
        Ok(stored)
    }

    async fn update_secret(
        &self,
        ctx: &ReconcileContext,
        secret: &Secret,
    ) -> Result<Secret, ClientError> {
        let (namespace, name) = object_key(secret)?;
        self.check(ctx, Operation::Update, namespace, name)?;
        let mut secrets = lock(&self.secrets);
        let k = key(namespace, name);
        let Some(previous) = secrets.get(&k) else {
            return Err(not_found(namespace, name));
        };
        let mut stored = secret.clone();
        bump_resource_version(&mut stored, Some(previous));
        secrets.insert(k, stored.clone());
        drop(secrets);
        self.record(Operation::Update, namespace, name);
        Ok(stored)
    }

    async fn delete_secret(
        &self,
        ctx: &ReconcileContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        self.check(ctx, Operation::Delete, namespace, name)?;
        if lock(&self.secrets).remove(&key(namespace, name)).is_none() {
            return Err(not_found(namespace, name));
        }
        self.record(Operation::Delete, namespace, name);
        Ok(())
    }
}
