//! Startup and query-preparation error types.

use std::fmt;

use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::WithErrors;
use displaydoc::Display;
use thiserror::Error;

use crate::graphql;
use crate::graphql::IntoGraphQLErrors;

/// Error in the schema.
///
/// Schema construction happens once at startup; any of these aborts the
/// process before the listener accepts connections.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum SchemaError {
    /// GraphQL parser error: {0}
    Parse(ParseErrors),
    /// GraphQL validation error: {0}
    Validate(ValidationErrors),
}

/// Collection of GraphQL parse errors.
#[derive(Debug)]
pub struct ParseErrors {
    pub(crate) errors: DiagnosticList,
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = self.errors.iter();
        for (i, error) in errors.by_ref().take(5).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        let remaining = errors.count();
        if remaining > 0 {
            write!(f, "\n...and {remaining} other errors")?;
        }
        Ok(())
    }
}

impl IntoGraphQLErrors for ParseErrors {
    fn into_graphql_errors(self) -> Vec<graphql::Error> {
        self.errors
            .iter()
            .map(|diagnostic| {
                let mut error = graphql::Error::from(diagnostic.to_json());
                error
                    .extensions
                    .entry("code")
                    .or_insert("GRAPHQL_PARSING_FAILED".into());
                error
            })
            .collect()
    }
}

/// Collection of GraphQL validation errors.
#[derive(Debug)]
pub struct ValidationErrors {
    pub(crate) errors: DiagnosticList,
}

impl<T> From<WithErrors<T>> for ValidationErrors {
    fn from(WithErrors { errors, .. }: WithErrors<T>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl IntoGraphQLErrors for ValidationErrors {
    fn into_graphql_errors(self) -> Vec<graphql::Error> {
        self.errors
            .iter()
            .map(|diagnostic| {
                let mut error = graphql::Error::from(diagnostic.to_json());
                error
                    .extensions
                    .entry("code")
                    .or_insert("GRAPHQL_VALIDATION_FAILED".into());
                error
            })
            .collect()
    }
}
