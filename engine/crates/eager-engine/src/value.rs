use async_graphql_value::{ConstValue, Value, Variables};

use crate::Error;

/// Resolves an argument literal against the request variables.
///
/// A variable missing from the table resolves to `None`, which is not an error: whether that
/// means "not given" or gets handed to the filter is decided when the filter is applied.
/// Inside a list a missing variable becomes `null` so positions are kept.
pub fn resolve_value(value: &Value, variables: &Variables) -> Result<Option<ConstValue>, Error> {
    match value {
        Value::Variable(name) => Ok(variables.get(name.as_str()).cloned()),
        Value::Number(number) => Ok(Some(ConstValue::Number(number.clone()))),
        Value::String(string) => Ok(Some(ConstValue::String(string.clone()))),
        Value::Boolean(boolean) => Ok(Some(ConstValue::Boolean(*boolean))),
        Value::Enum(name) => Ok(Some(ConstValue::Enum(name.clone()))),
        Value::Binary(bytes) => Ok(Some(ConstValue::Binary(bytes.clone()))),
        Value::List(items) => {
            let items = items
                .iter()
                .map(|item| resolve_value(item, variables).map(Option::unwrap_or_default))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Some(ConstValue::List(items)))
        }
        Value::Null | Value::Object(_) => Err(Error::UnsupportedArgumentLiteral(value.to_string())),
    }
}
