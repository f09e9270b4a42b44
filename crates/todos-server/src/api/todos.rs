//! Todo endpoints
//!
//! The create pipeline runs its checks in a fixed order (body, then
//! description, then category), touches the store only after every check
//! has passed, and answers each failure class with its exact message.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;

use todos_core::{CategoryPolicy, NewTodo};

use crate::TodosServer;

/// Reply body shared by acknowledgements and error responses
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Outcome description
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Client-side rejections from the create pipeline, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Body absent, unparseable, or not a JSON object
    NoBody,
    /// `description` missing, not a string, or blank
    NoDescription,
    /// `category` missing, not a string, or blank
    NoCategory,
    /// `category` not in the configured label set
    UnknownCategory,
}

impl Rejection {
    /// The exact client-facing message for this rejection
    pub fn message(self) -> &'static str {
        match self {
            Self::NoBody => "No body!",
            Self::NoDescription => "No description!",
            Self::NoCategory => "No category!",
            Self::UnknownCategory => "Unknown category!",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new(self.message())),
        )
            .into_response()
    }
}

/// Validated create request: what the pipeline hands to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTodoRequest {
    /// Trimmed, non-empty description
    pub description: String,
    /// Trimmed, non-empty category label
    pub category: String,
}

impl AddTodoRequest {
    /// Parse and validate a raw request body
    ///
    /// Checks run in a fixed order and stop at the first failure: body
    /// presence, then `description`, then `category`. A body that is
    /// empty, unparseable, or not a JSON object counts as missing. Fields
    /// that are absent, non-string, or blank after trimming count as
    /// missing too.
    pub fn from_body(body: &[u8]) -> Result<Self, Rejection> {
        if body.is_empty() {
            return Err(Rejection::NoBody);
        }
        let value: Value = serde_json::from_slice(body).map_err(|_| Rejection::NoBody)?;
        if !value.is_object() {
            return Err(Rejection::NoBody);
        }

        let description = match value.get("description").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(Rejection::NoDescription),
        };

        let category = match value.get("category").and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(Rejection::NoCategory),
        };

        Ok(Self {
            description,
            category,
        })
    }
}

/// Create a todo
pub async fn add_todo(State(server): State<TodosServer>, body: Bytes) -> Response {
    let request = match AddTodoRequest::from_body(&body) {
        Ok(request) => request,
        Err(rejection) => {
            tracing::debug!("add_todo rejected: {}", rejection.message());
            return rejection.into_response();
        }
    };

    if server.category_policy == CategoryPolicy::Handler
        && !server.categories.iter().any(|c| c == &request.category)
    {
        tracing::debug!("add_todo rejected: unknown category '{}'", request.category);
        return Rejection::UnknownCategory.into_response();
    }

    let record = NewTodo {
        description: request.description,
        category: request.category,
    };

    let outcome = timeout(server.insert_timeout, async {
        server.store.connect().await?;
        server.store.insert_many(std::slice::from_ref(&record)).await
    })
    .await;

    match outcome {
        Ok(Ok(inserted)) => {
            if let Some(todo) = inserted.first() {
                tracing::info!("Added todo {} in category '{}'", todo.id, todo.category);
            }
            Json(MessageResponse::new("addTodo")).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to persist todo: {}", e);
            storage_error()
        }
        Err(_) => {
            tracing::error!("Persistence timed out after {:?}", server.insert_timeout);
            storage_timeout()
        }
    }
}

/// List todos
pub async fn list_todos(State(server): State<TodosServer>) -> Response {
    let outcome = timeout(server.insert_timeout, async {
        server.store.connect().await?;
        server.store.all().await
    })
    .await;

    match outcome {
        Ok(Ok(todos)) => Json(todos).into_response(),
        Ok(Err(e)) => {
            tracing::error!("Failed to read todos: {}", e);
            storage_error()
        }
        Err(_) => {
            tracing::error!("Persistence timed out after {:?}", server.insert_timeout);
            storage_timeout()
        }
    }
}

fn storage_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::new("storage error")),
    )
        .into_response()
}

fn storage_timeout() -> Response {
    (
        StatusCode::GATEWAY_TIMEOUT,
        Json(MessageResponse::new("storage timeout")),
    )
        .into_response()
}
