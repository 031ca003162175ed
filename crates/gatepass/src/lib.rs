//! Core library for the out-gate leave workflow service.
//!
//! The interesting pieces live under [`workflows::leave`]: durable
//! application storage, the token-gated decision processor, and the email
//! fan-out that follows a decision. [`workflows::roster`] resolves student
//! and parent details from the registrar's master CSV at submission time.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
