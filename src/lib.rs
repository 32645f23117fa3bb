//! Catalog Chat
//!
//! A console demo that seeds a product catalog with fake data and then chats
//! about it with a local (Ollama) or cloud (Azure `OpenAI`) model. The model
//! reads the catalog through a plugin of callable tools.
//!
//! # Architecture
//!
//! - **Catalog**: product generation and bulk insert into Postgres (or memory)
//! - **LLM Orchestration**: Chat Completions driver plus automatic tool loop
//! - **Plugin**: catalog lookup functions exposed to the model
//! - **Console**: startup prompts and the question/answer loop
//! - **Telemetry**: structured logging and optional OTLP span export
//!
//! # Modules
//!
//! - [`catalog`]: products, fake-data generator, catalog stores
//! - [`config`]: layered configuration (defaults, file, env, CLI)
//! - [`console`]: startup prompts
//! - [`llm`]: LLM driver trait, providers, chat events and orchestrator
//! - [`plugin`]: the catalog plugin
//! - [`repl`]: interactive chat loop
//! - [`session`]: conversation history
//! - [`telemetry`]: logging and tracing bootstrap
//! - [`tools`]: tool trait and registry

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod catalog;
pub mod config;
pub mod console;
pub mod error;
pub mod llm;
pub mod plugin;
pub mod repl;
pub mod session;
pub mod telemetry;
pub mod tools;

pub use error::AppError;
