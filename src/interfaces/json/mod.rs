//! JSON surface of the order service: wire DTOs, request handlers, and the
//! JSON-lines script replay used by the command-line binary.

pub mod dto;
pub mod handlers;
pub mod request_reader;
pub mod response_writer;
pub mod script;
