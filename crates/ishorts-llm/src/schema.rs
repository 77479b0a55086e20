//! JSON schemas in the strict subset accepted by structured outputs.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::{Map, Value};

/// Keywords the strict mode rejects or ignores.
const STRIPPED_KEYWORDS: &[&str] = &["$schema", "title", "format", "definitions", "minimum"];

/// Build a self-contained schema for `T` where every object is closed and
/// every property is required.
pub fn strict_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(root).unwrap_or(Value::Null);
    tighten(&mut value);
    value
}

fn tighten(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in STRIPPED_KEYWORDS {
                map.remove(*key);
            }
            if map.contains_key("properties") {
                close_object(map);
            }
            for (key, child) in map.iter_mut() {
                if key == "properties" {
                    // Keys here are field names, not keywords.
                    if let Value::Object(props) = child {
                        props.values_mut().for_each(tighten);
                    }
                } else {
                    tighten(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(tighten),
        _ => {}
    }
}

fn close_object(map: &mut Map<String, Value>) {
    let required: Vec<Value> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    map.insert("required".to_string(), Value::Array(required));
    map.insert("additionalProperties".to_string(), Value::Bool(false));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SceneBreakdown, TitleResponse};

    #[test]
    fn test_title_schema_is_closed() {
        let schema = strict_schema::<TitleResponse>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], serde_json::json!(["title"]));
        assert!(schema.get("$schema").is_none());
        assert_eq!(
            schema["properties"]["title"]["description"],
            "A unique, engaging title for the video"
        );
    }

    #[test]
    fn test_nested_objects_are_inlined_and_closed() {
        let schema = strict_schema::<SceneBreakdown>();
        let item = &schema["properties"]["scenes"]["items"];
        assert_eq!(item["type"], "object");
        assert_eq!(item["additionalProperties"], false);
        assert!(item.get("$ref").is_none());
        assert!(schema.get("definitions").is_none());
        // f32 maps to number without a format keyword
        assert_eq!(item["properties"]["duration"]["type"], "number");
        assert!(item["properties"]["duration"].get("format").is_none());
    }
}
