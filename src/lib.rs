//! Storefront search - hybrid product search over a local catalog.
//!
//! This crate provides the core functionality for the `sfs` CLI tool.
//!
//! # Architecture
//!
//! - [`search`] - Query planning, browse and semantic execution
//! - [`embeddings`] - Embedding providers (Ollama, HuggingFace) and the query cache
//! - [`storage`] - SQLite catalog store with a cosine similarity SQL function
//! - [`model`] - Product and catalog entry types
//! - [`sync`] - JSONL catalog import
//! - [`config`] - Configuration management
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod model;
pub mod search;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
