use crate::application::engine::OrderEngine;
use crate::domain::order::{NewOrder, OrderId};
use crate::error::{ErrorKind, OrderError, Result};
use crate::interfaces::json::dto::{
    CreateOrderRequest, ErrorResponse, OrderResponse, TransactionResponse, UpdateOrderRequest,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Outcome class of a handled request, carrying its HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Created,
    BadRequest,
    ServerError,
}

impl Outcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Ok => 200,
            Outcome::Created => 201,
            Outcome::BadRequest => 400,
            Outcome::ServerError => 500,
        }
    }

    /// Malformed or invalid input is the caller's fault. Everything else,
    /// including a missing order, is reported as a server error.
    pub fn for_error(err: &OrderError) -> Self {
        match err.kind() {
            ErrorKind::Validation | ErrorKind::Serialization => Outcome::BadRequest,
            ErrorKind::Reference | ErrorKind::NotFound | ErrorKind::Persistence => {
                Outcome::ServerError
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub outcome: Outcome,
    pub body: Option<Value>,
}

impl Response {
    fn success<T: Serialize>(outcome: Outcome, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                outcome,
                body: Some(body),
            },
            Err(err) => Self::failure(err.into()),
        }
    }

    fn empty() -> Self {
        Self {
            outcome: Outcome::Ok,
            body: None,
        }
    }

    fn failure(err: OrderError) -> Self {
        let outcome = Outcome::for_error(&err);
        let kind = err.kind().as_str();
        match outcome {
            Outcome::BadRequest => warn!(error = %err, kind, "request rejected"),
            _ => error!(error = %err, kind, "request failed"),
        }
        let body = ErrorResponse {
            error: kind,
            message: err.to_string(),
        };
        Self {
            outcome,
            body: serde_json::to_value(body).ok(),
        }
    }

    fn from_result<T: Serialize>(outcome: Outcome, result: Result<T>) -> Self {
        match result {
            Ok(body) => Self::success(outcome, &body),
            Err(err) => Self::failure(err),
        }
    }
}

/// Request handlers translating wire payloads into engine calls.
///
/// Ids and bodies are parsed before the engine is touched, so a malformed
/// request never opens a unit of work.
#[derive(Clone)]
pub struct OrderHandlers {
    engine: Arc<OrderEngine>,
}

impl OrderHandlers {
    pub fn new(engine: Arc<OrderEngine>) -> Self {
        Self { engine }
    }

    pub async fn create(&self, body: &[u8]) -> Response {
        let order = match serde_json::from_slice::<CreateOrderRequest>(body) {
            Ok(request) => NewOrder::from(request),
            Err(err) => return Response::failure(err.into()),
        };
        let result = self.engine.create_order(order).await;
        Response::from_result(Outcome::Created, result.map(OrderResponse::from))
    }

    pub async fn get(&self, id: &str) -> Response {
        let id = match id.parse::<OrderId>() {
            Ok(id) => id,
            Err(err) => return Response::failure(err),
        };
        let result = self.engine.get_order(id).await;
        Response::from_result(Outcome::Ok, result.map(OrderResponse::from))
    }

    pub async fn list(&self) -> Response {
        let result = self.engine.list_orders().await.map(|orders| {
            orders
                .into_iter()
                .map(OrderResponse::from)
                .collect::<Vec<_>>()
        });
        Response::from_result(Outcome::Ok, result)
    }

    pub async fn update(&self, id: &str, body: &[u8]) -> Response {
        let parsed = id.parse::<OrderId>().and_then(|id| {
            let request: UpdateOrderRequest = serde_json::from_slice(body)?;
            Ok((id, request.into_update()?))
        });
        let (id, update) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return Response::failure(err),
        };
        let result = self.engine.update_order(id, update).await;
        Response::from_result(Outcome::Ok, result.map(OrderResponse::from))
    }

    pub async fn delete(&self, id: &str) -> Response {
        let id = match id.parse::<OrderId>() {
            Ok(id) => id,
            Err(err) => return Response::failure(err),
        };
        match self.engine.delete_order(id).await {
            Ok(()) => Response::empty(),
            Err(err) => Response::failure(err),
        }
    }

    /// Returns the settlement transaction of an order, or `null` when it has
    /// none.
    pub async fn transaction(&self, order_id: &str) -> Response {
        let id = match order_id.parse::<OrderId>() {
            Ok(id) => id,
            Err(err) => return Response::failure(err),
        };
        let result = self.engine.find_transaction(id).await;
        Response::from_result(
            Outcome::Ok,
            result.map(|tx| tx.map(TransactionResponse::from)),
        )
    }
}
