use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::Value;

use crate::graphql::Error;

/// A GraphQL `Response` as returned to the client: the resolved data tree
/// plus the errors encountered while producing it.
///
/// Both can be present at once when execution produced a partial result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,
}

#[buildstructor::buildstructor]
impl Response {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(data: Option<Value>, errors: Vec<Error>) -> Self {
        Self { data, errors }
    }

    /// True when execution completed without recording any error.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use serde_json_bytes::json as bjson;

    use super::*;
    use crate::graphql::Location;

    #[test]
    fn test_response() {
        let result = serde_json::from_str::<Response>(
            json!(
            {
              "errors": [
                {
                  "message": "Name for user with ID 2 could not be fetched.",
                  "locations": [{ "line": 1, "column": 22 }],
                  "extensions": {
                    "code": "INTERNAL_SERVER_ERROR",
                  }
                }
              ],
              "data": {
                "user": {
                  "id": "2",
                  "name": null
                }
              }
            })
            .to_string()
            .as_str(),
        );
        assert_eq!(
            result.unwrap(),
            Response::builder()
                .data(bjson!({
                  "user": {
                    "id": "2",
                    "name": null
                  }
                }))
                .errors(vec![
                    Error::builder()
                        .message("Name for user with ID 2 could not be fetched.")
                        .location(Location {
                            line: 1,
                            column: 22
                        })
                        .extension_code("INTERNAL_SERVER_ERROR")
                        .build()
                ])
                .build()
        );
    }

    #[test]
    fn test_empty_errors_are_omitted() {
        let response = Response::builder()
            .data(bjson!({"user": null}))
            .build();
        assert!(response.is_ok());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"data": {"user": null}})
        );
    }

    #[test]
    fn test_data_is_omitted_when_absent() {
        let response = Response::builder()
            .error(Error::builder().message("syntax error").build())
            .build();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"errors": [{"message": "syntax error"}]})
        );
    }
}
