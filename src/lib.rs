//! A minimal GraphQL runtime serving a fixed user directory over HTTP.
//!
//! The pipeline maps one HTTP call to one query execution: the [`server`]
//! gateway decodes the request body into a [`graphql::Request`], the
//! [`execution`] service parses and validates the query text against the
//! [`schema`], coerces variables, and walks the operation's selection sets
//! calling resolvers against the seeded [`store`], producing a single
//! [`graphql::Response`] that the gateway encodes back as JSON.
//!
//! The schema and the store are built once at startup and shared read-only
//! across all concurrent requests.

pub mod error;
pub mod execution;
pub mod graphql;
pub mod schema;
pub mod server;
pub mod store;

pub use crate::execution::ExecutionService;
