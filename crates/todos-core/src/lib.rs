//! Todos Core - Embedded Todo Document Store
//!
//! This crate provides the storage side of the Todos service, implementing:
//! - Todo entity model ([`Todo`], insert shape [`NewTodo`])
//! - LMDB-backed document store with lazy, idempotent connection
//! - Async gateway trait ([`TodoGateway`]) the HTTP layer talks to
//! - Recording gateway double for handler tests ([`testing`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             HTTP Handlers                    │
//! │        (todos-server, axum routes)          │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │            TodoGateway trait                 │
//! │      (connect, insert_many, all, count)     │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │              TodoStore                       │
//! │   (LMDB env, todos + meta databases)        │
//! └─────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod store;
pub mod testing;
pub mod todo;

pub use error::{Error, Result};
pub use store::{StoreOptions, TodoGateway, TodoStore};
pub use todo::{CategoryPolicy, DEFAULT_CATEGORIES, NewTodo, Todo};
