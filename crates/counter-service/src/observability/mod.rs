//! Observability module for the counter service.
//!
//! Provides metrics definitions recorded by the HTTP middleware and services.

pub mod metrics;
