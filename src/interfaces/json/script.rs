use crate::error::Result;
use crate::interfaces::json::handlers::{OrderHandlers, Outcome, Response};
use crate::interfaces::json::request_reader::{Request, RequestReader};
use crate::interfaces::json::response_writer::ResponseWriter;
use std::io::{BufRead, Write};
use tracing::debug;

/// Placeholder id resolving to the most recently created order.
pub const LAST_CREATED: &str = "$last";

/// Counts reported after a script has been replayed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSummary {
    pub handled: usize,
    pub skipped: usize,
}

/// Replays a JSON-lines request script against the handlers, one request at
/// a time and in file order.
pub struct ScriptRunner {
    handlers: OrderHandlers,
    last_created: Option<String>,
}

impl ScriptRunner {
    pub fn new(handlers: OrderHandlers) -> Self {
        Self {
            handlers,
            last_created: None,
        }
    }

    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        reader: RequestReader<R>,
        writer: &mut ResponseWriter<W>,
    ) -> Result<ScriptSummary> {
        let mut summary = ScriptSummary::default();
        for (line, request) in reader.requests() {
            match request {
                Ok(request) => {
                    let op = request.op();
                    let response = self.dispatch(request).await;
                    writer.write_response(op, &response)?;
                    summary.handled += 1;
                }
                Err(e) => {
                    eprintln!("Error reading request on line {}: {}", line, e);
                    summary.skipped += 1;
                }
            }
        }
        writer.flush()?;
        Ok(summary)
    }

    pub async fn dispatch(&mut self, request: Request) -> Response {
        match request {
            Request::Create { body } => {
                let response = self.handlers.create(body.to_string().as_bytes()).await;
                self.remember_created(&response);
                response
            }
            Request::Get { id } => self.handlers.get(self.resolve(&id)).await,
            Request::List => self.handlers.list().await,
            Request::Update { id, body } => {
                self.handlers
                    .update(self.resolve(&id), body.to_string().as_bytes())
                    .await
            }
            Request::Delete { id } => self.handlers.delete(self.resolve(&id)).await,
            Request::Transaction { id } => self.handlers.transaction(self.resolve(&id)).await,
        }
    }

    fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        if id == LAST_CREATED {
            self.last_created.as_deref().unwrap_or_default()
        } else {
            id
        }
    }

    fn remember_created(&mut self, response: &Response) {
        if response.outcome != Outcome::Created {
            return;
        }
        if let Some(id) = response
            .body
            .as_ref()
            .and_then(|body| body.get("id"))
            .and_then(|id| id.as_str())
        {
            debug!(order_id = id, "remembering last created order");
            self.last_created = Some(id.to_string());
        }
    }
}
