use async_graphql_value::Variables;
use serde_json::{json, Value};

/// Whether the request payload opts out of caching.
pub(crate) fn is_bypassed(request: &Value, bypass_field: &str) -> bool {
    request.get(bypass_field).and_then(Value::as_bool).unwrap_or_default()
}

/// Content address of one root field of a request: the payload without its bypass flag,
/// the resolved variables and a discriminator naming the root field. Key order in the payload
/// is significant.
pub(crate) fn digest(discriminator: &str, request: &Value, bypass_field: &str, variables: &Variables) -> String {
    let request = match request {
        Value::Object(payload) => Value::Object(
            payload
                .iter()
                .filter(|(key, _)| key.as_str() != bypass_field)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    };

    let normalized = json!({
        "field": discriminator,
        "request": request,
        "variables": variables,
    });

    blake3::hash(normalized.to_string().as_bytes()).to_hex().to_string()
}
