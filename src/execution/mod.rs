//! Query execution: binds an incoming request to the schema and the user
//! store, producing a single [`graphql::Response`].
//!
//! Parsing and validation are delegated to `apollo-compiler`; field
//! collection, resolution and result coercion happen in [`engine`]. Every
//! query-level failure is recovered into the response's error list — only
//! transport-level decode failures (handled by the gateway) and startup-time
//! schema failures live elsewhere.

pub(crate) mod engine;
pub(crate) mod resolver;
pub(crate) mod variables;

use std::sync::Arc;

use apollo_compiler::ExecutableDocument;
use serde_json_bytes::Value;

use self::engine::PropagateNull;
use self::engine::execute_selection_set;
use self::resolver::QueryResolver;
use crate::error::ParseErrors;
use crate::error::ValidationErrors;
use crate::graphql;
use crate::graphql::IntoGraphQLErrors;
use crate::schema::Schema;
use crate::store::UserStore;

/// Executes GraphQL requests against the schema and the user store.
///
/// Cheap to clone; the shared state is read-only and lives behind [`Arc`]s,
/// so concurrent requests need no locking.
#[derive(Clone)]
pub struct ExecutionService {
    schema: Arc<Schema>,
    store: Arc<UserStore>,
}

impl ExecutionService {
    pub fn new(schema: Arc<Schema>, store: Arc<UserStore>) -> Self {
        Self { schema, store }
    }

    /// Run one request to completion.
    ///
    /// When the response carries errors, a diagnostic is also emitted through
    /// `tracing`; that diagnostic is advisory only and the response is
    /// returned unchanged.
    pub fn execute(&self, request: &graphql::Request) -> graphql::Response {
        let response = self.try_execute(request);
        if !response.is_ok() {
            tracing::warn!(errors = ?response.errors, "query execution produced errors");
        }
        response
    }

    fn try_execute(&self, request: &graphql::Request) -> graphql::Response {
        let schema = self.schema.definitions();
        let query = request.query.as_deref().unwrap_or("");

        let document = match ExecutableDocument::parse(schema, query, "query.graphql") {
            Ok(document) => document,
            Err(invalid) => {
                let errors = ParseErrors {
                    errors: invalid.errors,
                };
                return graphql::Response::builder()
                    .errors(errors.into_graphql_errors())
                    .build();
            }
        };
        let document = match document.validate(schema) {
            Ok(document) => document,
            Err(invalid) => {
                return graphql::Response::builder()
                    .errors(ValidationErrors::from(invalid).into_graphql_errors())
                    .build();
            }
        };

        let operation = match document.operations.get(request.operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(error) => {
                let mut error = graphql::Error::from(error.to_graphql_error(&document.sources));
                error
                    .extensions
                    .entry("code")
                    .or_insert("GRAPHQL_VALIDATION_FAILED".into());
                return graphql::Response::builder().error(error).build();
            }
        };

        let variable_values =
            match variables::coerce_variable_values(schema, operation, &request.variables) {
                Ok(values) => values,
                Err(errors) => return graphql::Response::builder().errors(errors).build(),
            };

        let mut errors = Vec::new();
        let root_resolver = QueryResolver { store: &self.store };
        let result = execute_selection_set(
            schema,
            &document,
            &variable_values,
            &mut errors,
            operation.selection_set.ty.as_str(),
            &root_resolver,
            &operation.selection_set.selections,
        );
        let data = match result {
            Ok(map) => Value::Object(map),
            // A field error propagated all the way up to the operation root
            Err(PropagateNull) => Value::Null,
        };
        graphql::Response::builder().data(data).errors(errors).build()
    }
}
