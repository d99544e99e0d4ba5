//! JSON and YAML codecs
//!
//! Both syntaxes map one-to-one onto the value model. Numbers and booleans
//! are normalized to their canonical text on decode and re-emitted as native
//! literals on encode; strings always stay strings.

use crate::codec::Format;
use crate::error::{ConversionError, ConversionResult, DecodeError};
use crate::value::{Map, Scalar, ScalarKind, Value};

/// Parse JSON text into a value
pub fn decode_json(text: &str) -> Result<Value, DecodeError> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        let (line, column) = (e.line(), e.column());
        let decode = DecodeError::new(Format::Json, e.to_string());
        if line > 0 {
            decode.with_location(line, column)
        } else {
            decode
        }
    })?;
    Ok(from_json(json))
}

fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::boolean(b),
        serde_json::Value::Number(n) => Value::number(n.to_string()),
        serde_json::Value::String(s) => Value::text(s),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(object) => Value::Map(
            object
                .into_iter()
                .map(|(k, v)| (k, from_json(v)))
                .collect(),
        ),
    }
}

/// Render a value as JSON text, two-space indented when `pretty`
pub fn encode_json(value: &Value, pretty: bool) -> ConversionResult<String> {
    let json = to_json(value);
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    text.map_err(|e| ConversionError::encode(Format::Json, e))
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Scalar(scalar) => json_scalar(scalar),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), to_json(v)))
                .collect(),
        ),
    }
}

fn json_scalar(scalar: &Scalar) -> serde_json::Value {
    let text = scalar.as_str();
    match scalar.kind() {
        ScalarKind::Text => serde_json::Value::String(text.to_string()),
        ScalarKind::Boolean => match text {
            "true" => serde_json::Value::Bool(true),
            "false" => serde_json::Value::Bool(false),
            _ => serde_json::Value::String(text.to_string()),
        },
        ScalarKind::Number => json_number(text)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(text.to_string())),
    }
}

fn json_number(text: &str) -> Option<serde_json::Number> {
    if let Ok(n) = text.parse::<u64>() {
        return Some(n.into());
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(n.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

/// Parse a single YAML document into a value
pub fn decode_yaml(text: &str) -> Result<Value, DecodeError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        let decode = DecodeError::new(Format::Yaml, e.to_string());
        match e.location() {
            Some(loc) => decode.with_location(loc.line(), loc.column()),
            None => decode,
        }
    })?;
    from_yaml(yaml)
}

fn from_yaml(yaml: serde_yaml::Value) -> Result<Value, DecodeError> {
    Ok(match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::boolean(b),
        serde_yaml::Value::Number(n) => Value::number(n.to_string()),
        serde_yaml::Value::String(s) => Value::text(s),
        serde_yaml::Value::Sequence(items) => Value::List(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, from_yaml(value)?);
            }
            Value::Map(map)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

/// Scalar mapping keys become their text; collection keys are rejected
fn yaml_key(key: serde_yaml::Value) -> Result<String, DecodeError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => Err(DecodeError::new(
            Format::Yaml,
            "mapping keys must be scalars",
        )),
    }
}

/// Render a value as a block-style YAML document
pub fn encode_yaml(value: &Value) -> ConversionResult<String> {
    serde_yaml::to_string(&to_yaml(value)).map_err(|e| ConversionError::encode(Format::Yaml, e))
}

fn to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Scalar(scalar) => yaml_scalar(scalar),
        Value::List(items) => serde_yaml::Value::Sequence(items.iter().map(to_yaml).collect()),
        Value::Map(map) => {
            let mut mapping = serde_yaml::Mapping::with_capacity(map.len());
            for (k, v) in map.iter() {
                mapping.insert(serde_yaml::Value::String(k.to_string()), to_yaml(v));
            }
            serde_yaml::Value::Mapping(mapping)
        }
    }
}

fn yaml_scalar(scalar: &Scalar) -> serde_yaml::Value {
    let text = scalar.as_str();
    let fallback = || serde_yaml::Value::String(text.to_string());
    match scalar.kind() {
        ScalarKind::Text => fallback(),
        ScalarKind::Boolean => match text {
            "true" => serde_yaml::Value::Bool(true),
            "false" => serde_yaml::Value::Bool(false),
            _ => fallback(),
        },
        ScalarKind::Number => {
            if let Ok(n) = text.parse::<u64>() {
                serde_yaml::Value::Number(n.into())
            } else if let Ok(n) = text.parse::<i64>() {
                serde_yaml::Value::Number(n.into())
            } else {
                match text.parse::<f64>() {
                    Ok(n) if n.is_finite() => serde_yaml::Value::Number(n.into()),
                    _ => fallback(),
                }
            }
        }
    }
}
