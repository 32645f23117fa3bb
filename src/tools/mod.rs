//! Callable tools exposed to the model.
//!
//! A [`Tool`] is one function the model may invoke during a turn; a
//! [`Plugin`] groups related tools under a common name. The
//! [`ToolRegistry`] publishes them in `OpenAI` function-calling format and
//! dispatches the calls the model makes.
//!
//! # Tool Naming
//!
//! Plugin tools are registered as `plugin__tool` (e.g.
//! `catalog__count_products`). Names are sanitized to `[A-Za-z0-9_-]`, which
//! is what the function-calling APIs accept.

pub mod registry;

pub use registry::{Plugin, Tool, ToolRegistry};
