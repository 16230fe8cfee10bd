//! Variable-value coercion.
//!
//! <https://spec.graphql.org/October2021/#sec-Coercing-Variable-Values>
//!
//! Request variables arrive as arbitrary-shape JSON; each one is checked
//! against the operation's declared variable type before execution starts,
//! and a mismatch is a validation error, never a crash during resolution.

use apollo_compiler::executable::Operation;
use apollo_compiler::response::JsonMap;
use apollo_compiler::response::JsonValue;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;

use super::engine::ast_value_to_json;
use crate::graphql;

/// Marker for a value that does not match its declared input type.
struct InvalidValue;

/// Coerce the request-supplied variable values against the operation's
/// variable definitions, producing the map consulted during execution.
///
/// Declared defaults apply to absent variables; an absent nullable variable
/// simply stays absent.
pub(crate) fn coerce_variable_values(
    schema: &Valid<apollo_compiler::Schema>,
    operation: &Operation,
    variables: &JsonMap,
) -> Result<JsonMap, Vec<graphql::Error>> {
    let mut coerced = JsonMap::new();
    let mut errors = Vec::new();
    for definition in &operation.variables {
        let name = definition.name.as_str();
        if let Some(value) = variables.get(name) {
            match validate_input_value(value, &definition.ty, schema) {
                Ok(()) => {
                    coerced.insert(name, value.clone());
                }
                Err(InvalidValue) => errors.push(invalid_type_error(name)),
            }
        } else if let Some(default) = definition.default_value.as_deref() {
            coerced.insert(name, ast_value_to_json(default, &JsonMap::new()));
        } else if definition.ty.is_non_null() {
            errors.push(invalid_type_error(name));
        }
    }
    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

fn invalid_type_error(name: &str) -> graphql::Error {
    graphql::Error::builder()
        .message(format!("invalid type for variable: '{name}'"))
        .extension_code("VALIDATION_INVALID_TYPE_VARIABLE")
        .extension("name", name)
        .build()
}

// Input values are validated against the "input coercion" rules of the
// GraphQL specification, with null accepted for any nullable type.
fn validate_input_value(
    value: &JsonValue,
    ty: &Type,
    schema: &Valid<apollo_compiler::Schema>,
) -> Result<(), InvalidValue> {
    if value.is_null() {
        return if ty.is_non_null() {
            Err(InvalidValue)
        } else {
            Ok(())
        };
    }
    match ty {
        Type::List(inner) | Type::NonNullList(inner) => match value {
            JsonValue::Array(items) => items
                .iter()
                .try_for_each(|item| validate_input_value(item, inner, schema)),
            // Coercion from a single value to a list of one
            value => validate_input_value(value, inner, schema),
        },
        Type::Named(name) | Type::NonNullNamed(name) => match name.as_str() {
            // Spec: https://spec.graphql.org/October2021/#sec-String.Input-Coercion
            "String" => ok_when(value.is_string()),
            // Spec: https://spec.graphql.org/October2021/#sec-Int.Input-Coercion
            "Int" => ok_when(is_valid_int_input(value)),
            // Spec: https://spec.graphql.org/October2021/#sec-Float.Input-Coercion
            "Float" => ok_when(is_valid_float_input(value)),
            // "The ID type is serialized in the same way as a String; however,
            // it is not intended to be human-readable. While it is often
            // numeric, it should always serialize as a String."
            //
            // In practice it seems Int works too
            "ID" => ok_when(value.is_string() || is_valid_int_input(value)),
            "Boolean" => ok_when(value.is_boolean()),
            _ => match schema.types.get(name.as_str()) {
                // Custom scalars accept any JSON value
                Some(ExtendedType::Scalar(_)) => Ok(()),
                Some(ExtendedType::Enum(enum_def)) => ok_when(
                    value
                        .as_str()
                        .is_some_and(|value| enum_def.values.contains_key(value)),
                ),
                Some(ExtendedType::InputObject(input_def)) => {
                    let Some(object) = value.as_object() else {
                        return Err(InvalidValue);
                    };
                    for (field_name, field_def) in &input_def.fields {
                        let supplied = object.get(field_name.as_str());
                        if supplied.is_none() && field_def.default_value.is_some() {
                            continue;
                        }
                        validate_input_value(
                            supplied.unwrap_or(&JsonValue::Null),
                            &field_def.ty,
                            schema,
                        )?;
                    }
                    Ok(())
                }
                // Output types are not valid variable types
                _ => Err(InvalidValue),
            },
        },
    }
}

fn ok_when(valid: bool) -> Result<(), InvalidValue> {
    if valid { Ok(()) } else { Err(InvalidValue) }
}

// GraphQL Int is a signed 32-bit integer
fn is_valid_int_input(value: &JsonValue) -> bool {
    value
        .as_i64()
        .is_some_and(|int| i32::try_from(int).is_ok())
}

fn is_valid_float_input(value: &JsonValue) -> bool {
    value.is_f64() || value.as_i64().is_some()
}
