//! Selection-set execution.
//!
//! Implements the resolution algorithm of the GraphQL specification
//! (<https://spec.graphql.org/October2021/#sec-Executing-Selection-Sets>)
//! for object and scalar results, on top of documents parsed and validated
//! by `apollo-compiler`.

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::executable::Field;
use apollo_compiler::executable::Selection;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;

use super::resolver::ObjectValue;
use super::resolver::ResolvedValue;
use crate::graphql;

/// Marker for a field error being propagated towards the nearest nullable place.
pub(crate) struct PropagateNull;

/// <https://spec.graphql.org/October2021/#sec-Executing-Selection-Sets>
///
/// Returns `Err` when a field error reached a non-null position and must
/// propagate to the parent.
pub(crate) fn execute_selection_set<'a>(
    schema: &Valid<apollo_compiler::Schema>,
    document: &'a Valid<ExecutableDocument>,
    variable_values: &JsonMap,
    errors: &mut Vec<graphql::Error>,
    object_type_name: &str,
    object_value: &ObjectValue<'_>,
    selections: impl IntoIterator<Item = &'a Selection>,
) -> Result<JsonMap, PropagateNull> {
    let mut grouped_fields = Vec::new();
    collect_fields(
        document,
        object_type_name,
        variable_values,
        selections,
        &mut grouped_fields,
    );

    let mut response_map = JsonMap::new();
    for (response_key, fields) in grouped_fields {
        let field = fields[0];
        if field.name.as_str() == "__typename" {
            response_map.insert(response_key, JsonValue::from(object_value.type_name()));
            continue;
        }
        let field_type = &field.definition.ty;
        let arguments = coerce_argument_values(field, variable_values);
        let resolved = object_value
            .resolve_field(field.name.as_str(), &arguments)
            .map_err(|error| {
                errors.push(field_error(
                    format!("resolver error: {}", error.message),
                    field,
                    document,
                ));
                PropagateNull
            });
        let completed = resolved.and_then(|resolved| {
            complete_value(
                schema,
                document,
                variable_values,
                errors,
                field_type,
                resolved,
                &fields,
            )
        });
        // On field error, null the field or propagate towards the parent
        match try_nullify(field_type, completed) {
            Ok(value) => {
                response_map.insert(response_key, value);
            }
            Err(PropagateNull) => return Err(PropagateNull),
        }
    }
    Ok(response_map)
}

/// <https://spec.graphql.org/October2021/#CollectFields()>
///
/// Groups the fields of a selection set by response key, flattening fragments
/// whose type condition matches the current object type and honoring
/// `@skip` / `@include`.
fn collect_fields<'a>(
    document: &'a Valid<ExecutableDocument>,
    object_type_name: &str,
    variable_values: &JsonMap,
    selections: impl IntoIterator<Item = &'a Selection>,
    grouped_fields: &mut Vec<(&'a str, Vec<&'a Node<Field>>)>,
) {
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                if is_skipped(&field.directives, variable_values) {
                    continue;
                }
                let response_key = field.response_key().as_str();
                match grouped_fields
                    .iter_mut()
                    .find(|(key, _)| *key == response_key)
                {
                    Some((_, fields)) => fields.push(field),
                    None => grouped_fields.push((response_key, vec![field])),
                }
            }
            Selection::FragmentSpread(spread) => {
                if is_skipped(&spread.directives, variable_values) {
                    continue;
                }
                if let Some(fragment) = document.fragments.get(&spread.fragment_name) {
                    if fragment.type_condition().as_str() == object_type_name {
                        collect_fields(
                            document,
                            object_type_name,
                            variable_values,
                            &fragment.selection_set.selections,
                            grouped_fields,
                        );
                    }
                }
            }
            Selection::InlineFragment(inline) => {
                if is_skipped(&inline.directives, variable_values) {
                    continue;
                }
                let applies = inline
                    .type_condition
                    .as_ref()
                    .is_none_or(|condition| condition.as_str() == object_type_name);
                if applies {
                    collect_fields(
                        document,
                        object_type_name,
                        variable_values,
                        &inline.selection_set.selections,
                        grouped_fields,
                    );
                }
            }
        }
    }
}

/// <https://spec.graphql.org/October2021/#sec--skip>
fn is_skipped(directives: &ast::DirectiveList, variable_values: &JsonMap) -> bool {
    let condition = |directive_name: &str| {
        directives
            .get(directive_name)
            .and_then(|directive| directive.specified_argument_by_name("if"))
            .map(|value| match &**value {
                ast::Value::Boolean(on) => *on,
                ast::Value::Variable(name) => variable_values
                    .get(name.as_str())
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false),
                _ => false,
            })
    };
    condition("skip").unwrap_or(false) || !condition("include").unwrap_or(true)
}

/// <https://spec.graphql.org/October2021/#sec-Coercing-Field-Arguments>
///
/// Wrong-shaped or missing arguments deliberately coerce to "absent" rather
/// than to an error: resolvers treat a missing argument as "no value
/// provided", and the validation pass has already rejected arguments whose
/// literal shape contradicts the schema.
fn coerce_argument_values(field: &Field, variable_values: &JsonMap) -> JsonMap {
    let mut coerced = JsonMap::new();
    for argument_definition in &field.definition.arguments {
        let supplied = field
            .arguments
            .iter()
            .find(|argument| argument.name == argument_definition.name);
        let value = match supplied {
            Some(argument) => match &*argument.value {
                ast::Value::Variable(variable) => variable_values.get(variable.as_str()).cloned(),
                value => Some(ast_value_to_json(value, variable_values)),
            },
            None => argument_definition
                .default_value
                .as_deref()
                .map(|value| ast_value_to_json(value, variable_values)),
        };
        if let Some(value) = value {
            coerced.insert(argument_definition.name.as_str(), value);
        }
    }
    coerced
}

/// Convert a GraphQL literal into the JSON value space, substituting variables.
pub(crate) fn ast_value_to_json(value: &ast::Value, variable_values: &JsonMap) -> JsonValue {
    match value {
        ast::Value::Null => JsonValue::Null,
        ast::Value::Boolean(on) => JsonValue::from(*on),
        ast::Value::Enum(name) => JsonValue::from(name.as_str()),
        ast::Value::String(value) => JsonValue::from(value.as_str()),
        ast::Value::Int(value) => value
            .try_to_i32()
            .ok()
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        ast::Value::Float(value) => value
            .try_to_f64()
            .ok()
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
        ast::Value::Variable(name) => variable_values
            .get(name.as_str())
            .cloned()
            .unwrap_or(JsonValue::Null),
        ast::Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| ast_value_to_json(item, variable_values))
                .collect(),
        ),
        ast::Value::Object(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().into(),
                        ast_value_to_json(value, variable_values),
                    )
                })
                .collect(),
        ),
    }
}

/// <https://spec.graphql.org/October2021/#CompleteValue()>
///
/// Returns `Err` for a field error being propagated upwards to find a nullable place
fn complete_value<'a>(
    schema: &Valid<apollo_compiler::Schema>,
    document: &'a Valid<ExecutableDocument>,
    variable_values: &JsonMap,
    errors: &mut Vec<graphql::Error>,
    ty: &Type,
    resolved: ResolvedValue<'_>,
    fields: &[&'a Node<Field>],
) -> Result<JsonValue, PropagateNull> {
    macro_rules! field_error {
        ($($arg: tt)+) => {
            {
                errors.push(field_error(format!($($arg)+), fields[0], document));
                return Err(PropagateNull);
            }
        };
    }
    if let ResolvedValue::Leaf(JsonValue::Null) = resolved {
        if ty.is_non_null() {
            field_error!("Non-null type {ty} resolved to null")
        } else {
            return Ok(JsonValue::Null);
        }
    }
    let ty_name = match ty {
        Type::List(_) | Type::NonNullList(_) => {
            field_error!("List type {ty} resolved to a non-list value")
        }
        Type::Named(name) | Type::NonNullNamed(name) => name,
    };
    let Some(ty_def) = schema.types.get(ty_name) else {
        field_error!("Undefined type {ty_name}")
    };
    match resolved {
        ResolvedValue::Leaf(json_value) => {
            match ty_def {
                ExtendedType::Object(_)
                | ExtendedType::Interface(_)
                | ExtendedType::Union(_)
                | ExtendedType::InputObject(_) => {
                    field_error!(
                        "Resolver returned a leaf value \
                         but expected an object for type {ty_name}"
                    )
                }
                ExtendedType::Enum(enum_def) => {
                    // https://spec.graphql.org/October2021/#sec-Enums.Result-Coercion
                    if !json_value
                        .as_str()
                        .is_some_and(|str| enum_def.values.contains_key(str))
                    {
                        field_error!("Resolver returned {json_value}, expected enum {ty_name}")
                    }
                }
                ExtendedType::Scalar(_) => match ty_name.as_str() {
                    "Int" => {
                        // https://spec.graphql.org/October2021/#sec-Int.Result-Coercion
                        if !json_value
                            .as_i64()
                            .is_some_and(|int| i32::try_from(int).is_ok())
                        {
                            field_error!("Resolver returned {json_value}, expected Int")
                        }
                    }
                    "Float" => {
                        // https://spec.graphql.org/October2021/#sec-Float.Result-Coercion
                        if !json_value.is_f64() {
                            field_error!("Resolver returned {json_value}, expected Float")
                        }
                    }
                    "String" => {
                        // https://spec.graphql.org/October2021/#sec-String.Result-Coercion
                        if !json_value.is_string() {
                            field_error!("Resolver returned {json_value}, expected String")
                        }
                    }
                    "Boolean" => {
                        // https://spec.graphql.org/October2021/#sec-Boolean.Result-Coercion
                        if !json_value.is_boolean() {
                            field_error!("Resolver returned {json_value}, expected Boolean")
                        }
                    }
                    "ID" => {
                        // https://spec.graphql.org/October2021/#sec-ID.Result-Coercion
                        if !(json_value.is_string() || json_value.is_i64()) {
                            field_error!("Resolver returned {json_value}, expected ID")
                        }
                    }
                    _ => {
                        // Custom scalar: accept any JSON value
                    }
                },
            }
            Ok(json_value)
        }
        ResolvedValue::Object(resolved_obj) => {
            let object_type_name = match ty_def {
                ExtendedType::Enum(_) | ExtendedType::Scalar(_) | ExtendedType::InputObject(_) => {
                    field_error!("Resolver returned an object, expected {ty_name}")
                }
                ExtendedType::Interface(_) | ExtendedType::Union(_) => {
                    let object_type_name = resolved_obj.type_name();
                    if schema.get_object(object_type_name).is_none() {
                        field_error!(
                            "Resolver returned an object of type {object_type_name} \
                             not defined in the schema"
                        )
                    }
                    object_type_name
                }
                ExtendedType::Object(_) => ty_name.as_str(),
            };
            execute_selection_set(
                schema,
                document,
                variable_values,
                errors,
                object_type_name,
                &*resolved_obj,
                fields
                    .iter()
                    .flat_map(|field| &field.selection_set.selections),
            )
            .map(JsonValue::Object)
        }
    }
}

/// Try to insert a null in place of a field error, or propagate the error
/// towards the parent if the field's type is non-null.
fn try_nullify(
    ty: &Type,
    result: Result<JsonValue, PropagateNull>,
) -> Result<JsonValue, PropagateNull> {
    match result {
        Ok(json) => Ok(json),
        Err(PropagateNull) => {
            if ty.is_non_null() {
                Err(PropagateNull)
            } else {
                Ok(JsonValue::Null)
            }
        }
    }
}

/// Build a field error anchored at `field`'s location in the request document.
fn field_error(
    message: String,
    field: &Node<Field>,
    document: &Valid<ExecutableDocument>,
) -> graphql::Error {
    let mut error = graphql::Error::from(GraphQLError::new(
        message,
        field.name.location(),
        &document.sources,
    ));
    error
        .extensions
        .entry("code")
        .or_insert("INTERNAL_SERVER_ERROR".into());
    error
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Schema;
    use apollo_compiler::validation::Valid;
    use serde_json_bytes::json as bjson;

    use super::*;
    use crate::execution::resolver::Resolver;
    use crate::execution::resolver::ResolverError;

    const TEST_SCHEMA: &str = r#"
        type Query {
            greeting: String
            faulty: String
            strict: String!
            echo(value: String): String
            flag: Boolean
        }
    "#;

    struct TestResolver;

    impl Resolver for TestResolver {
        fn type_name(&self) -> &str {
            "Query"
        }

        fn resolve_field<'a>(
            &'a self,
            field_name: &'a str,
            arguments: &'a JsonMap,
        ) -> Result<ResolvedValue<'a>, ResolverError> {
            match field_name {
                "greeting" => Ok(ResolvedValue::leaf("hello")),
                "echo" => Ok(ResolvedValue::Leaf(
                    arguments.get("value").cloned().unwrap_or(JsonValue::Null),
                )),
                "flag" => Ok(ResolvedValue::leaf(true)),
                "faulty" | "strict" => Err(ResolverError {
                    message: format!("{field_name} blew up"),
                }),
                _ => Err(ResolverError {
                    message: format!("unexpected field name: {field_name}"),
                }),
            }
        }
    }

    fn execute(query: &str, variables: JsonMap) -> (Result<JsonMap, PropagateNull>, Vec<graphql::Error>) {
        let schema = Schema::parse_and_validate(TEST_SCHEMA, "schema.graphql")
            .expect("test schema must be valid");
        let document = ExecutableDocument::parse_and_validate(&schema, query, "query.graphql")
            .expect("test query must be valid");
        execute_parsed(&schema, &document, variables)
    }

    fn execute_parsed(
        schema: &Valid<Schema>,
        document: &Valid<ExecutableDocument>,
        variables: JsonMap,
    ) -> (Result<JsonMap, PropagateNull>, Vec<graphql::Error>) {
        let operation = document
            .operations
            .get(None)
            .expect("test query must have a single operation");
        let mut errors = Vec::new();
        let result = execute_selection_set(
            schema,
            document,
            &variables,
            &mut errors,
            operation.selection_set.ty.as_str(),
            &TestResolver,
            &operation.selection_set.selections,
        );
        (result, errors)
    }

    #[test]
    fn leaves_and_aliases_resolve_in_selection_order() {
        let (result, errors) = execute("{ hi: greeting greeting __typename }", JsonMap::new());
        assert!(errors.is_empty());
        assert_eq!(
            JsonValue::Object(result.ok().expect("execution must succeed")),
            bjson!({"hi": "hello", "greeting": "hello", "__typename": "Query"})
        );
    }

    #[test]
    fn resolver_errors_null_the_field_and_keep_siblings() {
        let (result, errors) = execute("{ faulty greeting }", JsonMap::new());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("faulty blew up"));
        assert_eq!(
            JsonValue::Object(result.ok().expect("nullable fields must not propagate")),
            bjson!({"faulty": null, "greeting": "hello"})
        );
    }

    #[test]
    fn non_null_field_errors_propagate_to_the_parent() {
        let (result, errors) = execute("{ strict }", JsonMap::new());
        assert_eq!(errors.len(), 1);
        assert!(result.is_err());
    }

    #[test]
    fn arguments_substitute_variables() {
        let variables = bjson!({"v": "ping"}).as_object().cloned().unwrap();
        let schema = Schema::parse_and_validate(TEST_SCHEMA, "schema.graphql").unwrap();
        let document = ExecutableDocument::parse_and_validate(
            &schema,
            "query Echo($v: String) { echo(value: $v) }",
            "query.graphql",
        )
        .unwrap();
        let (result, errors) = execute_parsed(&schema, &document, variables);
        assert!(errors.is_empty());
        assert_eq!(
            JsonValue::Object(result.ok().expect("execution must succeed")),
            bjson!({"echo": "ping"})
        );
    }

    #[test]
    fn skip_and_include_directives_are_honored() {
        let (result, errors) = execute(
            "{ greeting @skip(if: true) flag @include(if: true) }",
            JsonMap::new(),
        );
        assert!(errors.is_empty());
        assert_eq!(
            JsonValue::Object(result.ok().expect("execution must succeed")),
            bjson!({"flag": true})
        );
    }

    #[test]
    fn fragments_flatten_into_the_parent_selection() {
        let (result, errors) = execute(
            "{ ...Fields ... on Query { flag } } fragment Fields on Query { greeting }",
            JsonMap::new(),
        );
        assert!(errors.is_empty());
        assert_eq!(
            JsonValue::Object(result.ok().expect("execution must succeed")),
            bjson!({"greeting": "hello", "flag": true})
        );
    }
}
