//! JSON front-end for [`super::Node`].

use serde_json::Value;

use super::Node;
use crate::error::SourceError;

pub(super) fn parse(body: &str) -> Result<Node, SourceError> {
    let value: Value = serde_json::from_str(body)?;
    Ok(convert(value))
}

fn convert(value: Value) -> Node {
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Scalar(b.to_string()),
        Value::Number(n) => Node::Scalar(n.to_string()),
        Value::String(s) => Node::Scalar(s),
        Value::Array(items) => Node::Array(items.into_iter().map(convert).collect()),
        Value::Object(map) => Node::Object(map.into_iter().map(|(k, v)| (k, convert(v))).collect()),
    }
}
