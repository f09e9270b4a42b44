//! Todo document store - LMDB-backed persistence behind an async gateway
//!
//! Documents live in one LMDB environment with two named databases:
//! - `todos`: record id (u64, big-endian) -> JSON todo document
//! - `meta`: store metadata (storage format version)
//!
//! The connection is lazy. Nothing touches the filesystem until the first
//! [`TodoGateway::connect`] call, and concurrent first calls collapse into
//! a single environment open.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use heed::types::{SerdeJson, Str, U64};
use heed::{Database, Env, EnvOpenOptions, byteorder};
use tokio::sync::OnceCell;

use crate::todo::{CategoryPolicy, DEFAULT_CATEGORIES, NewTodo, Todo};
use crate::{Error, Result};

/// Storage format version written to the meta database
const STORE_VERSION: u32 = 1;

/// Key under which the metadata record lives
const META_KEY: &str = "main";

/// Storage-facing contract the HTTP handlers talk to
///
/// Implemented by [`TodoStore`] for real deployments and by the recording
/// double in [`crate::testing`] for handler tests.
#[async_trait]
pub trait TodoGateway: Send + Sync {
    /// Establish the backing connection if it is not already live
    ///
    /// Idempotent: repeated and concurrent calls result in at most one
    /// underlying connection attempt while the store stays healthy.
    async fn connect(&self) -> Result<()>;

    /// Append a batch of records, returning them with assigned ids
    ///
    /// All-or-nothing: if any record fails schema checks or the write
    /// fails, nothing is persisted.
    async fn insert_many(&self, batch: &[NewTodo]) -> Result<Vec<Todo>>;

    /// Every persisted todo, in ascending id order
    async fn all(&self) -> Result<Vec<Todo>>;

    /// Number of persisted todos
    async fn count(&self) -> Result<u64>;
}

/// Tuning and schema options for [`TodoStore`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maximum size of the LMDB memory map in bytes
    pub map_size: usize,

    /// Where category membership is enforced
    pub policy: CategoryPolicy,

    /// Known category labels, checked when `policy` is
    /// [`CategoryPolicy::Store`]
    pub categories: Vec<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            map_size: 10 * 1024 * 1024, // 10MB
            policy: CategoryPolicy::default(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Metadata stored alongside the documents
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreMeta {
    /// Storage format version
    version: u32,
}

/// Live LMDB handles, created once on first connect
struct StoreConn {
    env: Env,
    todos: Database<U64<byteorder::BigEndian>, SerdeJson<Todo>>,
    next_id: AtomicU64,
}

impl StoreConn {
    fn open(path: &Path, map_size: usize) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(2)
                .open(path)?
        };

        // Open/create databases
        let mut wtxn = env.write_txn()?;

        let todos: Database<U64<byteorder::BigEndian>, SerdeJson<Todo>> =
            env.create_database(&mut wtxn, Some("todos"))?;
        let meta: Database<Str, SerdeJson<StoreMeta>> =
            env.create_database(&mut wtxn, Some("meta"))?;

        // Initialize metadata if not exists
        if meta.get(&wtxn, META_KEY)?.is_none() {
            let metadata = StoreMeta {
                version: STORE_VERSION,
            };
            meta.put(&mut wtxn, META_KEY, &metadata)?;
        }

        wtxn.commit()?;

        // Recover the id counter from existing data. Keys are big-endian,
        // so the last entry holds the highest assigned id.
        let rtxn = env.read_txn()?;
        let next_id = todos.last(&rtxn)?.map(|(id, _)| id + 1).unwrap_or(1);
        drop(rtxn);

        Ok(Self {
            env,
            todos,
            next_id: AtomicU64::new(next_id),
        })
    }
}

/// LMDB-backed todo document store
///
/// Construct once per data directory and share behind an `Arc`. The store
/// carries its own lazy connection state, so a freshly built instance is
/// valid to hand to the server before any database exists on disk.
pub struct TodoStore {
    /// Directory for LMDB files
    path: PathBuf,

    /// Tuning and schema options
    options: StoreOptions,

    /// Live handles, set by the first successful connect
    conn: OnceCell<StoreConn>,

    /// Underlying open attempts, observable for idempotence checks
    connect_attempts: AtomicU64,
}

impl TodoStore {
    /// Create a store rooted at `path` with default options
    ///
    /// Nothing is opened or created until the first `connect` call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, StoreOptions::default())
    }

    /// Create a store with explicit options
    pub fn with_options(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            options,
            conn: OnceCell::new(),
            connect_attempts: AtomicU64::new(0),
        }
    }

    /// Whether the backing connection is live
    pub fn is_connected(&self) -> bool {
        self.conn.initialized()
    }

    /// How many underlying open attempts have been made
    ///
    /// Stays at 1 no matter how often `connect` is called, unless an
    /// attempt fails and a later call retries.
    pub fn connection_attempts(&self) -> u64 {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    fn live(&self) -> Result<&StoreConn> {
        self.conn.get().ok_or(Error::NotConnected)
    }

    fn check(&self, record: &NewTodo) -> Result<()> {
        if record.description.trim().is_empty() {
            return Err(Error::schema("description must not be empty"));
        }
        if record.category.trim().is_empty() {
            return Err(Error::schema("category must not be empty"));
        }
        if self.options.policy == CategoryPolicy::Store
            && !self.options.categories.iter().any(|c| c == &record.category)
        {
            return Err(Error::schema(format!(
                "unknown category '{}'",
                record.category
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TodoGateway for TodoStore {
    async fn connect(&self) -> Result<()> {
        self.conn
            .get_or_try_init(|| async {
                self.connect_attempts.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Opening todo store at {:?}", self.path);
                StoreConn::open(&self.path, self.options.map_size)
            })
            .await?;
        Ok(())
    }

    async fn insert_many(&self, batch: &[NewTodo]) -> Result<Vec<Todo>> {
        let conn = self.live()?;

        // Check the whole batch before anything is written
        for record in batch {
            self.check(record)?;
        }

        let mut wtxn = conn.env.write_txn()?;
        let mut inserted = Vec::with_capacity(batch.len());
        for record in batch {
            let id = conn.next_id.fetch_add(1, Ordering::SeqCst);
            let todo = Todo {
                id,
                description: record.description.clone(),
                category: record.category.clone(),
                done: false,
            };
            conn.todos.put(&mut wtxn, &id, &todo)?;
            inserted.push(todo);
        }
        wtxn.commit()?;

        tracing::debug!("Inserted {} todo(s)", inserted.len());
        Ok(inserted)
    }

    async fn all(&self) -> Result<Vec<Todo>> {
        let conn = self.live()?;

        let rtxn = conn.env.read_txn()?;
        let mut todos = Vec::new();
        for entry in conn.todos.iter(&rtxn)? {
            let (_, todo) = entry?;
            todos.push(todo);
        }
        Ok(todos)
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.live()?;

        let rtxn = conn.env.read_txn()?;
        Ok(conn.todos.len(&rtxn)?)
    }
}
