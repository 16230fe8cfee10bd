//! Field resolvers for the user directory.

use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;

use crate::store::User;
use crate::store::UserStore;

/// A GraphQL object whose fields can be resolved during execution
pub(crate) type ObjectValue<'a> = dyn Resolver + 'a;

/// Abstraction for implementing field resolvers. Used through [`ObjectValue`].
pub(crate) trait Resolver {
    /// Returns the name of the concrete object type this resolver represents
    ///
    /// That name is expected to be that of an object type defined in the schema.
    fn type_name(&self) -> &str;

    /// Resolves a field of this object with the given arguments
    ///
    /// The resolved value is expected to match the type of the corresponding
    /// field definition in the schema.
    fn resolve_field<'a>(
        &'a self,
        field_name: &'a str,
        arguments: &'a JsonMap,
    ) -> Result<ResolvedValue<'a>, ResolverError>;
}

/// Error returned by a resolver, reported as a field error in the response.
pub(crate) struct ResolverError {
    pub(crate) message: String,
}

/// The value of a resolved field
pub(crate) enum ResolvedValue<'a> {
    /// * JSON null represents GraphQL null
    /// * GraphQL built-in scalars are coerced according to their respective *Result Coercion* spec
    Leaf(JsonValue),

    /// Expected where the GraphQL type is an object type
    Object(Box<ObjectValue<'a>>),
}

impl<'a> ResolvedValue<'a> {
    /// Construct a null leaf resolved value
    pub(crate) fn null() -> Self {
        Self::Leaf(JsonValue::Null)
    }

    /// Construct a leaf resolved value from something that is convertible to JSON
    pub(crate) fn leaf(json: impl Into<JsonValue>) -> Self {
        Self::Leaf(json.into())
    }

    /// Construct an object resolved value or null, from an optional resolver
    pub(crate) fn opt_object(opt_resolver: Option<impl Resolver + 'a>) -> Self {
        match opt_resolver {
            Some(resolver) => Self::Object(Box::new(resolver)),
            None => Self::null(),
        }
    }
}

/// Resolver for the root `Query` type, bound to the user store.
pub(crate) struct QueryResolver<'a> {
    pub(crate) store: &'a UserStore,
}

impl Resolver for QueryResolver<'_> {
    fn type_name(&self) -> &str {
        "Query"
    }

    fn resolve_field<'a>(
        &'a self,
        field_name: &'a str,
        arguments: &'a JsonMap,
    ) -> Result<ResolvedValue<'a>, ResolverError> {
        match field_name {
            "user" => {
                // A missing or non-string `id` argument means "no id
                // provided" and resolves to null, not to an error.
                let id = arguments.get("id").and_then(JsonValue::as_str);
                Ok(ResolvedValue::opt_object(
                    id.and_then(|id| self.store.get(id))
                        .map(|user| UserResolver { user }),
                ))
            }
            _ => Err(ResolverError {
                message: format!(
                    "unexpected field name: {field_name} in type {}",
                    self.type_name()
                ),
            }),
        }
    }
}

/// Resolver for the `User` object type.
pub(crate) struct UserResolver<'a> {
    pub(crate) user: &'a User,
}

impl Resolver for UserResolver<'_> {
    fn type_name(&self) -> &str {
        "User"
    }

    fn resolve_field<'a>(
        &'a self,
        field_name: &'a str,
        _arguments: &'a JsonMap,
    ) -> Result<ResolvedValue<'a>, ResolverError> {
        match field_name {
            "id" => Ok(ResolvedValue::leaf(self.user.id.as_str())),
            "name" => Ok(ResolvedValue::leaf(self.user.name.as_str())),
            _ => Err(ResolverError {
                message: format!(
                    "unexpected field name: {field_name} in type {}",
                    self.type_name()
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json as bjson;

    use super::*;

    fn resolve_user<'a>(
        resolver: &'a QueryResolver<'a>,
        arguments: &'a JsonMap,
    ) -> Result<ResolvedValue<'a>, ResolverError> {
        resolver.resolve_field("user", arguments)
    }

    #[test]
    fn user_lookup_returns_the_matching_record() {
        let store = UserStore::seeded();
        let resolver = QueryResolver { store: &store };
        let arguments = bjson!({"id": "1"}).as_object().cloned().unwrap();
        match resolve_user(&resolver, &arguments) {
            Ok(ResolvedValue::Object(user)) => assert_eq!(user.type_name(), "User"),
            _ => panic!("expected an object value"),
        }
    }

    #[test]
    fn user_lookup_miss_is_absence_not_an_error() {
        let store = UserStore::seeded();
        let resolver = QueryResolver { store: &store };
        let arguments = bjson!({"id": "nonexistent"}).as_object().cloned().unwrap();
        match resolve_user(&resolver, &arguments) {
            Ok(ResolvedValue::Leaf(JsonValue::Null)) => {}
            _ => panic!("expected a null leaf"),
        }
    }

    #[test]
    fn missing_or_wrong_typed_id_resolves_to_null() {
        let store = UserStore::seeded();
        let resolver = QueryResolver { store: &store };
        for arguments in [bjson!({}), bjson!({"id": 1}), bjson!({"id": null})] {
            let arguments = arguments.as_object().cloned().unwrap();
            match resolve_user(&resolver, &arguments) {
                Ok(ResolvedValue::Leaf(JsonValue::Null)) => {}
                _ => panic!("expected a null leaf"),
            }
        }
    }

    #[test]
    fn unknown_fields_are_resolver_errors() {
        let store = UserStore::seeded();
        let arguments = JsonMap::new();
        let error = QueryResolver { store: &store }
            .resolve_field("nope", &arguments)
            .err()
            .expect("unknown fields must error");
        assert!(error.message.contains("nope"));
    }
}
