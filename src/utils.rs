//! Small helpers shared by the MCP handlers.

use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::mcp::protocol::{error_codes, Response};

/// Extracts a required argument from a JSON object, or builds the
/// `-32602` response to send back.
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null)).map_err(|_| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid required argument: '{}'", key),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_arguments_become_invalid_params() {
        let params = json!({"arguments": {}});
        let err = get_required_arg::<String>(&params, "name", &json!(7)).unwrap_err();
        assert_eq!(err.id, json!(7));
        assert_eq!(err.error.unwrap().code, error_codes::INVALID_PARAMS);

        let name: String = get_required_arg(&json!({"name": "get-address"}), "name", &json!(7)).unwrap();
        assert_eq!(name, "get-address");
    }
}
