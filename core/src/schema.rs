//! API schema metadata listing the outcomes an endpoint may return.
//!
//! Purely descriptive: the fragments are meant for OpenAPI documents and
//! have no effect on runtime behavior.

use serde_json::{Map, Value, json};

/// Schema fragment listing `kinds` as alternatives with a `kind`
/// discriminator, each referring to `#/components/schemas/<kind>`.
#[must_use]
pub fn one_of<'a>(kinds: impl IntoIterator<Item = &'a str>) -> Value {
    one_of_with(kinds, |kind| format!("#/components/schemas/{kind}"))
}

/// [`one_of`] with a custom reference builder.
#[must_use]
pub fn one_of_with<'a>(
    kinds: impl IntoIterator<Item = &'a str>,
    reference: impl Fn(&str) -> String,
) -> Value {
    let mut alternatives = Vec::new();
    let mut mapping = Map::new();
    for kind in kinds {
        let target = reference(kind);
        if mapping.contains_key(kind) {
            continue;
        }
        alternatives.push(json!({ "$ref": target }));
        mapping.insert(kind.to_string(), Value::String(target));
    }

    json!({
        "oneOf": alternatives,
        "discriminator": {
            "propertyName": "kind",
            "mapping": mapping,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_each_kind_once() {
        let schema = one_of(["Literal", "NotFound", "Literal"]);

        assert_eq!(schema["oneOf"].as_array().map(Vec::len), Some(2));
        assert_eq!(schema["discriminator"]["propertyName"], "kind");
        assert_eq!(
            schema["discriminator"]["mapping"]["NotFound"],
            "#/components/schemas/NotFound"
        );
    }

    #[test]
    fn custom_references() {
        let schema = one_of_with(["Empty"], |kind| format!("#/defs/{kind}"));
        assert_eq!(schema["oneOf"][0]["$ref"], "#/defs/Empty");
    }
}
