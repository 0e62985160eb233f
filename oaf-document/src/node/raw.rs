//! Format adapters: one [`RawNode`] implementation per parsed value type.

use std::fmt;

/// Shape of a raw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
    Scalar,
    Null,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Scalar => "scalar",
            NodeKind::Null => "null",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view over one parsed value, independent of its source format.
pub(crate) trait RawNode {
    fn kind(&self) -> NodeKind;
    /// Child of a mapping by key text.
    fn get(&self, key: &str) -> Option<&dyn RawNode>;
    /// Keys of a mapping, in declaration order.
    fn keys(&self) -> Vec<String>;
    /// Elements of a sequence.
    fn items(&self) -> Vec<&dyn RawNode>;
    /// Text of a scalar (strings, numbers and booleans).
    fn scalar(&self) -> Option<String>;
    /// A native boolean.
    fn boolean(&self) -> Option<bool>;
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

fn untagged(mut value: &serde_yaml::Value) -> &serde_yaml::Value {
    while let serde_yaml::Value::Tagged(tagged) = value {
        value = &tagged.value;
    }
    value
}

fn yaml_key_text(key: &serde_yaml::Value) -> Option<String> {
    match untagged(key) {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl RawNode for serde_yaml::Value {
    fn kind(&self) -> NodeKind {
        match untagged(self) {
            serde_yaml::Value::Null => NodeKind::Null,
            serde_yaml::Value::Mapping(_) => NodeKind::Mapping,
            serde_yaml::Value::Sequence(_) => NodeKind::Sequence,
            _ => NodeKind::Scalar,
        }
    }

    fn get(&self, key: &str) -> Option<&dyn RawNode> {
        let serde_yaml::Value::Mapping(mapping) = untagged(self) else {
            return None;
        };
        mapping
            .iter()
            .find(|(k, _)| yaml_key_text(k).as_deref() == Some(key))
            .map(|(_, v)| v as &dyn RawNode)
    }

    fn keys(&self) -> Vec<String> {
        match untagged(self) {
            serde_yaml::Value::Mapping(mapping) => {
                mapping.keys().filter_map(yaml_key_text).collect()
            }
            _ => Vec::new(),
        }
    }

    fn items(&self) -> Vec<&dyn RawNode> {
        match untagged(self) {
            serde_yaml::Value::Sequence(items) => {
                items.iter().map(|item| item as &dyn RawNode).collect()
            }
            _ => Vec::new(),
        }
    }

    fn scalar(&self) -> Option<String> {
        match untagged(self) {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn boolean(&self) -> Option<bool> {
        untagged(self).as_bool()
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(untagged(self))
    }
}

impl RawNode for serde_json::Value {
    fn kind(&self) -> NodeKind {
        match self {
            serde_json::Value::Null => NodeKind::Null,
            serde_json::Value::Object(_) => NodeKind::Mapping,
            serde_json::Value::Array(_) => NodeKind::Sequence,
            _ => NodeKind::Scalar,
        }
    }

    fn get(&self, key: &str) -> Option<&dyn RawNode> {
        self.as_object()
            .and_then(|object| object.get(key))
            .map(|v| v as &dyn RawNode)
    }

    fn keys(&self) -> Vec<String> {
        self.as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn items(&self) -> Vec<&dyn RawNode> {
        self.as_array()
            .map(|items| items.iter().map(|item| item as &dyn RawNode).collect())
            .unwrap_or_default()
    }

    fn scalar(&self) -> Option<String> {
        match self {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn boolean(&self) -> Option<bool> {
        self.as_bool()
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_numeric_keys_read_as_text() {
        let value: serde_yaml::Value = serde_yaml::from_str("200:\n  description: ok\n").unwrap();
        assert_eq!(value.keys(), vec!["200".to_string()]);
        assert_eq!(
            RawNode::get(&value, "200").map(|node| node.kind()),
            Some(NodeKind::Mapping)
        );
    }

    #[test]
    fn test_scalars_read_as_text() {
        let value: serde_yaml::Value = serde_yaml::from_str("a: 1\nb: true\nc: x\nd: ~\n").unwrap();
        assert_eq!(RawNode::get(&value, "a").and_then(|n| n.scalar()).as_deref(), Some("1"));
        assert_eq!(RawNode::get(&value, "b").and_then(|n| n.scalar()).as_deref(), Some("true"));
        assert_eq!(RawNode::get(&value, "c").and_then(|n| n.scalar()).as_deref(), Some("x"));
        assert_eq!(RawNode::get(&value, "d").map(|n| n.kind()), Some(NodeKind::Null));
    }

    #[test]
    fn test_json_preserves_key_order() {
        let value: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        assert_eq!(value.keys(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_yaml_to_json() {
        let value: serde_yaml::Value = serde_yaml::from_str("name: Rex\ntags: [a, b]\n").unwrap();
        assert_eq!(
            value.to_json().unwrap(),
            serde_json::json!({"name": "Rex", "tags": ["a", "b"]})
        );
    }

    #[test]
    fn test_yaml_keys_without_json_form_fail_to_convert() {
        let value: serde_yaml::Value = serde_yaml::from_str("? [a, b]\n: 1\n").unwrap();
        assert!(value.to_json().is_err());
    }
}
