//! Administrative HTTP adapter.
//!
//! A thin axum router over the registry: a stats snapshot, queue creation,
//! and a convenience enqueue that generates the item identifier server
//! side. It performs no queue logic of its own and shares the registry
//! handle with the datagram server.

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, post},
};
use queuic_core::QueueRegistry;
use queuic_proto::{Item, QueueName};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ServerError;

/// Default TCP port for the admin surface.
pub const DEFAULT_ADMIN_PORT: u16 = 8080;

/// One `/stats` row.
///
/// Field names, including the historical spelling of `enequeued`, are part
/// of the reported wire format.
#[derive(Debug, Serialize)]
pub struct StatsEntry {
    /// Queue name with its padding stripped.
    pub queue_name: String,
    /// Items held (backlog plus reservations).
    pub size: u64,
    /// Enqueues since start.
    #[serde(rename = "enequeued")]
    pub enqueued: u64,
    /// Accepts since start.
    pub dequeued: u64,
}

#[derive(Debug, Deserialize)]
struct CreateQueueRequest {
    #[serde(rename = "queueName")]
    queue_name: String,
}

#[derive(Debug, Deserialize)]
struct EnqueueRequest {
    #[serde(rename = "queueName")]
    queue_name: String,
    message: String,
}

/// Build the admin router over a registry handle.
pub fn router(registry: Arc<QueueRegistry>) -> Router {
    Router::new()
        .route("/stats", any(stats))
        .route("/createQueue", post(create_queue))
        .route("/enqueue", post(enqueue))
        .with_state(registry)
}

/// Bind `addr` and serve the admin router until the process exits.
pub async fn serve(addr: SocketAddr, registry: Arc<QueueRegistry>) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "admin interface listening");
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

async fn stats(State(registry): State<Arc<QueueRegistry>>) -> Response {
    let entries: Vec<StatsEntry> = registry
        .stats()
        .into_iter()
        .map(|stats| StatsEntry {
            queue_name: stats.name.to_string(),
            size: stats.size,
            enqueued: stats.enqueued,
            dequeued: stats.dequeued,
        })
        .collect();

    (StatusCode::CREATED, Json(entries)).into_response()
}

async fn create_queue(
    State(registry): State<Arc<QueueRegistry>>,
    body: Result<Json<CreateQueueRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return (StatusCode::BAD_REQUEST, Json("bad request")).into_response();
    };

    let name = match QueueName::from_str(&body.queue_name) {
        Ok(name) => name,
        Err(err) => {
            warn!(name = %body.queue_name, error = %err, "rejecting queue name");
            return (StatusCode::BAD_REQUEST, Json("bad request")).into_response();
        }
    };

    match registry.create(name) {
        Ok(_) => (StatusCode::CREATED, Json("queue created")).into_response(),
        Err(err) => {
            warn!(queue = %name, error = %err, "create queue failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json("internal server error")).into_response()
        }
    }
}

async fn enqueue(
    State(registry): State<Arc<QueueRegistry>>,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return (StatusCode::BAD_REQUEST, Json("bad request")).into_response();
    };

    let queue = match QueueName::from_str(&body.queue_name).ok().and_then(|n| registry.lookup(n))
    {
        Some(queue) => queue,
        None => {
            warn!(queue = %body.queue_name, "enqueue to unknown queue");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("internal server error"))
                .into_response();
        }
    };

    match queue.enqueue(Item::new(body.message.into_bytes())) {
        Ok(()) => (StatusCode::CREATED, Json("message enqueued")).into_response(),
        Err(err) => {
            warn!(queue = %queue.name(), error = %err, "enqueue failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json("internal server error")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_entry_serializes_the_reported_field_names() {
        let entry = StatsEntry {
            queue_name: "jobs".to_string(),
            size: 3,
            enqueued: 5,
            dequeued: 2,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "queue_name": "jobs",
                "size": 3,
                "enequeued": 5,
                "dequeued": 2,
            })
        );
    }

    #[test]
    fn request_bodies_use_camel_case_names() {
        let create: CreateQueueRequest =
            serde_json::from_str(r#"{"queueName": "jobs"}"#).unwrap();
        assert_eq!(create.queue_name, "jobs");

        let enqueue: EnqueueRequest =
            serde_json::from_str(r#"{"queueName": "jobs", "message": "hi"}"#).unwrap();
        assert_eq!(enqueue.queue_name, "jobs");
        assert_eq!(enqueue.message, "hi");
    }
}
