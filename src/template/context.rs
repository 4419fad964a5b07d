use crate::error::TemplateError;
use minijinja::value::ValueKind;
use minijinja::Value;
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

/// A mapping from variable name to template value.
///
/// Used both for the renderer's global variables and for per-call
/// variables. Values are engine values, so functions such as `url_for`
/// can live next to plain data.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Context {
    vars: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.vars.insert(key.into(), value.into())
    }

    /// Insert any serializable value under `key`
    pub fn insert_serialize<K: Into<String>, S: Serialize>(&mut self, key: K, value: &S) -> Option<Value> {
        self.vars.insert(key.into(), Value::from_serialize(value))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.vars.iter()
    }

    /// Copy every entry of `other` into `self`, shadowing existing keys
    pub fn merge(&mut self, other: &Context) {
        for (key, value) in other.iter() {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// Merge several mappings into one, later mappings shadowing earlier ones
    pub fn layer<I: IntoIterator<Item = Context>>(layers: I) -> Self {
        let mut merged = Context::new();
        for layer in layers {
            merged.vars.extend(layer.vars);
        }
        merged
    }

    /// Build a context from anything that serializes to a map.
    ///
    /// Unit and `none` produce an empty context.
    pub fn from_serialize<S: Serialize>(vars: &S) -> Result<Self, TemplateError> {
        Self::from_value(Value::from_serialize(vars))
    }

    /// Build a context from an engine map value
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        match value.kind() {
            ValueKind::Undefined | ValueKind::None => Ok(Context::new()),
            ValueKind::Map => {
                let mut context = Context::new();
                let keys = value.try_iter().map_err(|_| TemplateError::InvalidContext {
                    kind: "non-iterable map".to_string(),
                })?;
                for key in keys {
                    let item = value.get_item(&key).unwrap_or_default();
                    context.vars.insert(key.to_string(), item);
                }
                Ok(context)
            }
            kind => Err(TemplateError::InvalidContext {
                kind: format!("{:?}", kind).to_lowercase(),
            }),
        }
    }

    /// Build a context from a JSON object
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TemplateError> {
        match value {
            serde_json::Value::Object(map) => Ok(map
                .iter()
                .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
                .collect()),
            serde_json::Value::Null => Ok(Context::new()),
            other => Err(TemplateError::InvalidContext {
                kind: json_kind(other).to_string(),
            }),
        }
    }

    /// The engine value handed to a template: `self` overlaid by `vars`
    pub(crate) fn overlay<S: Serialize>(&self, vars: &S) -> Result<Value, TemplateError> {
        let overrides = Context::from_serialize(vars)?;
        let mut merged = self.vars.clone();
        merged.extend(overrides.vars);
        Ok(Value::from_serialize(&merged))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "none",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "seq",
        serde_json::Value::Object(_) => "map",
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl From<BTreeMap<String, Value>> for Context {
    fn from(vars: BTreeMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl<'a> IntoIterator for &'a Context {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use serde_json::json;

    #[test]
    fn test_from_serialize_struct() {
        #[derive(Serialize)]
        struct Page {
            title: String,
            views: u32,
        }

        let ctx = Context::from_serialize(&Page {
            title: "Home".to_string(),
            views: 12,
        })
        .unwrap();

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("title").unwrap().as_str(), Some("Home"));
        assert_eq!(ctx.get("views").unwrap(), &Value::from(12));
    }

    #[test]
    fn test_from_serialize_unit_is_empty() {
        assert!(Context::from_serialize(&()).unwrap().is_empty());
    }

    #[test]
    fn test_from_serialize_rejects_scalars() {
        match Context::from_serialize(&42) {
            Err(TemplateError::InvalidContext { kind }) => assert_eq!(kind, "number"),
            other => panic!("Expected InvalidContext, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_object() {
        let ctx = Context::from_json(&json!({"user": {"name": "Ana"}})).unwrap();
        let user = ctx.get("user").unwrap();
        assert_eq!(
            user.get_attr("name").unwrap().as_str(),
            Some("Ana")
        );
        assert!(Context::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_layer_later_shadows_earlier() {
        let merged = Context::layer([
            Context::new().with("a", 1).with("b", 1),
            Context::new().with("b", 2).with("c", 2),
            Context::new().with("c", 3),
        ]);

        assert_eq!(merged.get("a"), Some(&Value::from(1)));
        assert_eq!(merged.get("b"), Some(&Value::from(2)));
        assert_eq!(merged.get("c"), Some(&Value::from(3)));
    }

    #[test]
    fn test_merge_and_insert_serialize() {
        let mut ctx = Context::new().with("a", 1);
        ctx.insert_serialize("tags", &vec!["x", "y"]);
        ctx.merge(&Context::new().with("a", 2));

        assert_eq!(ctx.get("a"), Some(&Value::from(2)));
        assert_eq!(ctx.get("tags").unwrap().len(), Some(2));
        assert!(ctx.remove("a").is_some());
        assert!(!ctx.contains_key("a"));
    }

    #[test]
    fn test_overlay_does_not_touch_globals() {
        let globals = Context::new().with("site", "Example").with("title", "Default");
        let merged = globals.overlay(&context! { title => "Override" }).unwrap();

        assert_eq!(merged.get_attr("title").unwrap().as_str(), Some("Override"));
        assert_eq!(merged.get_attr("site").unwrap().as_str(), Some("Example"));
        assert_eq!(globals.get("title").unwrap().as_str(), Some("Default"));
    }
}
