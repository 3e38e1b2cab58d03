//! Nested field accumulator addressed by dotted paths.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Sections every generated page contains, in their default order.
pub const DEFAULT_SECTIONS: [&str; 5] = ["header", "about", "tokenomics", "roadmap", "community"];

/// Errors raised when writing to the accumulator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Field path is empty")]
    EmptyPath,

    #[error("Field path '{path}' contains an empty segment")]
    EmptySegment { path: String },

    #[error("Cannot index into '{path}': value is not an object")]
    NotAnObject { path: String },
}

/// Fields collected during a dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(Map<String, Value>);

impl Default for FieldMap {
    fn default() -> Self {
        Self::defaults()
    }
}

impl FieldMap {
    /// Returns a fresh accumulator seeded with the default values.
    #[must_use]
    pub fn defaults() -> Self {
        let value = json!({
            "template_id": null,
            "coin_name": null,
            "formatted_name": null,
            "symbol": null,
            "slogan": null,
            "description": null,
            "logo_url": null,
            "theme": null,
            "colors": { "primary": null, "secondary": null, "accent": null },
            "social_links": {
                "telegram": null,
                "twitter": null,
                "discord": null,
                "medium": null,
                "github": null,
                "custom": []
            },
            "tokenomics": {
                "total_supply": null,
                "buy_tax": null,
                "sell_tax": null,
                "burn": null,
                "redistribution": null,
                "liquidity": null,
                "marketing": null,
                "distribution": []
            },
            "roadmap": [],
            "sections_order": DEFAULT_SECTIONS,
            "show_tokenomics": true,
            "hosting": { "method": "local", "custom_domain": null },
            "site_hash": null,
            "urls": { "raw_url": null, "preview_url": null, "repo_url": null }
        });

        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    /// Reads the value at `path`. Missing and null values both read as `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    /// Reads a string value at `path`.
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Whether `path` holds a non-null value.
    #[must_use]
    pub fn is_present(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Writes `value` at `path`, creating intermediate objects as needed.
    ///
    /// A null intermediate is replaced by an empty object.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(FieldError::EmptyPath);
        };

        let mut current = &mut self.0;
        let mut walked = String::new();
        for segment in parents {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let slot = current
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return Err(FieldError::NotAnObject { path: walked }),
            };
        }

        current.insert((*last).to_owned(), value.into());
        Ok(())
    }

    /// Appends `value` to the array at `path`, creating it if absent.
    pub fn push(&mut self, path: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let mut items = match self.get(path) {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(FieldError::NotAnObject {
                    path: path.to_owned(),
                });
            }
            None => Vec::new(),
        };
        items.push(value.into());
        self.set(path, Value::Array(items))
    }

    /// Flattens nested objects into dotted keys. Arrays stay whole.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        flatten_into(&self.0, "", &mut out);
        out
    }

    /// Returns the accumulator as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, FieldError> {
    if path.is_empty() {
        return Err(FieldError::EmptyPath);
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(FieldError::EmptySegment {
            path: path.to_owned(),
        });
    }
    Ok(segments)
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut BTreeMap<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(inner, &path, out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_shape() {
        let fields = FieldMap::defaults();
        assert!(fields.get("coin_name").is_none());
        assert_eq!(fields.get_str("hosting.method"), Some("local"));
        assert_eq!(fields.get("show_tokenomics"), Some(&Value::Bool(true)));
        assert_eq!(
            fields.get("sections_order"),
            Some(&json!(["header", "about", "tokenomics", "roadmap", "community"]))
        );
    }

    #[test]
    fn test_set_creates_intermediate_maps() {
        let mut fields = FieldMap::defaults();
        fields.set("a.b.c", "v").unwrap();
        assert_eq!(fields.get_str("a.b.c"), Some("v"));
        assert!(fields.get("a.b").unwrap().is_object());
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let mut fields = FieldMap::defaults();
        fields.set("theme", Value::Null).unwrap();
        fields.set("theme.name", "neon").unwrap();
        assert_eq!(fields.get_str("theme.name"), Some("neon"));
    }

    #[test]
    fn test_missing_paths_read_as_absent() {
        let fields = FieldMap::defaults();
        assert!(fields.get("nope").is_none());
        assert!(fields.get("colors.nope.deeper").is_none());
        assert!(fields.get("coin_name.inner").is_none());
        assert!(!fields.is_present("colors.primary"));
    }

    #[test]
    fn test_set_rejects_bad_paths() {
        let mut fields = FieldMap::defaults();
        assert_eq!(fields.set("", 1), Err(FieldError::EmptyPath));
        assert!(matches!(
            fields.set("a..b", 1),
            Err(FieldError::EmptySegment { .. })
        ));
        fields.set("coin_name", "Moon").unwrap();
        assert_eq!(
            fields.set("coin_name.inner", 1),
            Err(FieldError::NotAnObject {
                path: "coin_name".to_owned()
            })
        );
    }

    #[test]
    fn test_push_appends() {
        let mut fields = FieldMap::defaults();
        fields.push("social_links.custom", json!({"name": "blog"})).unwrap();
        fields.push("social_links.custom", json!({"name": "shop"})).unwrap();
        let custom = fields.get("social_links.custom").unwrap().as_array().unwrap();
        assert_eq!(custom.len(), 2);
    }

    #[test]
    fn test_flatten_uses_dotted_keys() {
        let mut fields = FieldMap::defaults();
        fields.set("colors.primary", "#FFFFFF").unwrap();
        let flat = fields.flatten();
        assert_eq!(flat.get("colors.primary"), Some(&json!("#FFFFFF")));
        assert!(flat.contains_key("tokenomics.distribution"));
        assert!(!flat.contains_key("colors"));
    }
}
