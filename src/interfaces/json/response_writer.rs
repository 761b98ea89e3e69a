use crate::error::Result;
use crate::interfaces::json::handlers::Response;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

#[derive(Serialize)]
struct ResponseLine<'a> {
    op: &'a str,
    status: u16,
    body: &'a Option<Value>,
}

/// Writes one JSON line per handled request.
pub struct ResponseWriter<W: Write> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { writer: sink }
    }

    pub fn write_response(&mut self, op: &str, response: &Response) -> Result<()> {
        let line = ResponseLine {
            op,
            status: response.outcome.status_code(),
            body: &response.body,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
