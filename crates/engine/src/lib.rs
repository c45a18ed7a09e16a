pub mod api;
pub mod commands;
pub mod config;
pub mod events;
pub mod graphs;
pub mod llm;
pub mod search;
pub mod telemetry;
pub mod transcoder;
