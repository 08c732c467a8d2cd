//! HTTP companion server: control messages, pushed participant updates and
//! page ingestion.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;
