//! # workday-server
//!
//! HTTP front end for [`workday_engine`]: `GET /working-days?days=&hours=&date=`
//! answers with the resulting working instant in UTC.
//!
//! ## Modules
//!
//! - [`api`] — router, query validation, the JSON error envelope
//! - [`config`] — layered configuration (defaults, YAML, environment, CLI)
//! - [`logging`] — tracing subscriber setup
//! - [`server`] — wiring the provider and running the listener

pub mod api;
pub mod config;
pub mod logging;
pub mod server;
