use crate::error::{OrderError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;

/// One scripted request, tagged by its `op` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Request {
    Create {
        body: Value,
    },
    Get {
        #[serde(default)]
        id: String,
    },
    List,
    Update {
        #[serde(default)]
        id: String,
        body: Value,
    },
    Delete {
        #[serde(default)]
        id: String,
    },
    Transaction {
        #[serde(default)]
        id: String,
    },
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Request::Create { .. } => "create",
            Request::Get { .. } => "get",
            Request::List => "list",
            Request::Update { .. } => "update",
            Request::Delete { .. } => "delete",
            Request::Transaction { .. } => "transaction",
        }
    }
}

/// Reads requests from a JSON-lines source.
///
/// Blank lines are skipped. Each remaining line yields its own result, so one
/// malformed line does not stop the stream.
pub struct RequestReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Returns an iterator that lazily reads and parses requests, paired with
    /// their 1-based line numbers.
    pub fn requests(self) -> impl Iterator<Item = (usize, Result<Request>)> {
        self.source
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|(index, line)| {
                let request = line
                    .map_err(OrderError::from)
                    .and_then(|line| serde_json::from_str(&line).map_err(OrderError::from));
                (index + 1, request)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = r#"{"op": "create", "body": {"customer": {"id": "C1"}}}

{"op": "list"}
{"op": "get", "id": "$last"}"#;
        let results: Vec<_> = RequestReader::new(data.as_bytes()).requests().collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].1.as_ref().unwrap().op(), "create");
        assert_eq!(results[1].0, 3);
        assert_eq!(results[1].1.as_ref().unwrap(), &Request::List);
        assert_eq!(
            results[2].1.as_ref().unwrap(),
            &Request::Get {
                id: "$last".to_string()
            }
        );
    }

    #[test]
    fn test_reader_missing_id_defaults_blank() {
        let data = r#"{"op": "delete"}"#;
        let results: Vec<_> = RequestReader::new(data.as_bytes()).requests().collect();

        assert_eq!(
            results[0].1.as_ref().unwrap(),
            &Request::Delete { id: String::new() }
        );
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "{\"op\": \"pay\"}\nnot json\n{\"op\": \"list\"}";
        let results: Vec<_> = RequestReader::new(data.as_bytes()).requests().collect();

        assert!(matches!(results[0].1, Err(OrderError::SerializationError(_))));
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }
}
