//! GraphQL schema.

use apollo_compiler::validation::Valid;

use crate::error::ParseErrors;
use crate::error::SchemaError;

/// The SDL for the user directory: one object type and one root query field.
pub(crate) const SDL: &str = r#"
type Query {
  "Get user by id"
  user(id: String): User
}

type User {
  id: String
  name: String
}
"#;

/// A compiled GraphQL schema.
///
/// Built exactly once at startup and shared read-only across requests;
/// construction fails fast when the declared types are inconsistent.
#[derive(Debug)]
pub struct Schema {
    definitions: Valid<apollo_compiler::Schema>,
}

impl Schema {
    /// Compile and validate `raw_sdl`.
    pub fn parse(raw_sdl: &str) -> Result<Self, SchemaError> {
        let mut parser = apollo_compiler::parser::Parser::new();
        let result = parser.parse_ast(raw_sdl, "schema.graphql");

        let definitions = result
            .map_err(|invalid| {
                SchemaError::Parse(ParseErrors {
                    errors: invalid.errors,
                })
            })?
            .to_schema_validate()
            .map_err(|errors| SchemaError::Validate(errors.into()))?;

        Ok(Self { definitions })
    }

    /// The user-directory schema served by this process.
    pub fn user_directory() -> Result<Self, SchemaError> {
        Self::parse(SDL)
    }

    pub(crate) fn definitions(&self) -> &Valid<apollo_compiler::Schema> {
        &self.definitions
    }
}
