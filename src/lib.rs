pub mod collectors;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod routes;
