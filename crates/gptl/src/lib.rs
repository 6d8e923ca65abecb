//! gptl - A small command-line chat client for LLM HTTP APIs with file-based history.

pub mod cli;
pub mod config;
pub mod llm;
pub mod store;
