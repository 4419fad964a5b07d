use serde_json::Value;

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key (overlay wins on conflict); any other
/// combination, arrays included, replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disjoint_keys() {
        let mut base = json!({"a": 1});
        deep_merge(&mut base, json!({"b": 2}));
        assert_eq!(base, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let mut base = json!({"page": {"title": "Home", "lang": "en"}});
        deep_merge(&mut base, json!({"page": {"title": "About"}}));
        assert_eq!(base, json!({"page": {"title": "About", "lang": "en"}}));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = json!({"tags": ["a", "b", "c"]});
        deep_merge(&mut base, json!({"tags": ["d"]}));
        assert_eq!(base, json!({"tags": ["d"]}));
    }

    #[test]
    fn test_type_change_replaces() {
        let mut base = json!({"count": "many"});
        deep_merge(&mut base, json!({"count": 7}));
        assert_eq!(base, json!({"count": 7}));
    }
}
