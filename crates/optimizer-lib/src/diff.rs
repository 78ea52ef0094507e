//! Structural comparison of configuration trees
//!
//! [`diff_maps`] walks two JSON objects and records every key whose value
//! differs. Nested objects present on both sides are compared recursively;
//! arrays and scalars are compared as whole values.

use crate::models::ClusterConfig;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Change recorded for one key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Change {
    /// Old and new value; `None` means the key is absent on that side
    Value {
        old: Option<Value>,
        new: Option<Value>,
    },
    /// Changes inside a nested object present on both sides
    Nested(Delta),
}

/// Minimal set of attribute changes between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Delta(BTreeMap<String, Change>);

/// Flattened change addressed by a dotted path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub path: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Change> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.0.iter()
    }

    /// All leaf changes with dotted paths, in key order
    pub fn flatten(&self) -> Vec<FieldChange> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<FieldChange>) {
        for (key, change) in &self.0 {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match change {
                Change::Value { old, new } => out.push(FieldChange {
                    path,
                    old: old.clone(),
                    new: new.clone(),
                }),
                Change::Nested(inner) => inner.flatten_into(&path, out),
            }
        }
    }

    /// Write this delta's new values onto `target`
    pub fn apply_to(&self, target: &mut Map<String, Value>) {
        for (key, change) in &self.0 {
            match change {
                Change::Value { new: Some(value), .. } => {
                    target.insert(key.clone(), value.clone());
                }
                Change::Value { new: None, .. } => {
                    target.remove(key);
                }
                Change::Nested(inner) => {
                    let slot = target
                        .entry(key.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if !slot.is_object() {
                        *slot = Value::Object(Map::new());
                    }
                    if let Value::Object(nested) = slot {
                        inner.apply_to(nested);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let changes = self.flatten();
        for (i, change) in changes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{}: {} -> {}",
                change.path,
                render(change.old.as_ref()),
                render(change.new.as_ref())
            )?;
        }
        Ok(())
    }
}

/// Compact rendering of an optional value, `-` when absent
pub fn render(value: Option<&Value>) -> String {
    match value {
        None => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Differences between `desired` and `original`
pub fn diff_maps(desired: &Map<String, Value>, original: &Map<String, Value>) -> Delta {
    let mut changes = BTreeMap::new();

    for (key, new_value) in desired {
        match original.get(key) {
            None => {
                changes.insert(
                    key.clone(),
                    Change::Value {
                        old: None,
                        new: Some(new_value.clone()),
                    },
                );
            }
            Some(old_value) if old_value != new_value => {
                if let (Value::Object(new_map), Value::Object(old_map)) = (new_value, old_value) {
                    let inner = diff_maps(new_map, old_map);
                    if !inner.is_empty() {
                        changes.insert(key.clone(), Change::Nested(inner));
                    }
                } else {
                    changes.insert(
                        key.clone(),
                        Change::Value {
                            old: Some(old_value.clone()),
                            new: Some(new_value.clone()),
                        },
                    );
                }
            }
            Some(_) => {}
        }
    }

    for (key, old_value) in original {
        if !desired.contains_key(key) {
            changes.insert(
                key.clone(),
                Change::Value {
                    old: Some(old_value.clone()),
                    new: None,
                },
            );
        }
    }

    Delta(changes)
}

/// Differences between two cluster configurations
pub fn diff_configs(
    desired: &ClusterConfig,
    original: &ClusterConfig,
) -> Result<Delta, serde_json::Error> {
    Ok(diff_maps(&desired.to_map()?, &original.to_map()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_identical_maps_have_empty_delta() {
        let a = object(json!({
            "cluster_name": "team-AI-1_8-dev",
            "autoscale": {"min_workers": 1, "max_workers": 8},
            "init_scripts": [{"dbfs": {"destination": "dbfs:/init.sh"}}]
        }));

        assert!(diff_maps(&a, &a).is_empty());
        assert!(diff_maps(&Map::new(), &Map::new()).is_empty());
    }

    #[test]
    fn test_added_changed_and_removed_keys() {
        let desired = object(json!({"a": 1, "b": "x", "c": true}));
        let original = object(json!({"b": "y", "c": true, "d": 4}));

        let delta = diff_maps(&desired, &original);

        assert_eq!(delta.len(), 3);
        assert_eq!(
            delta.get("a"),
            Some(&Change::Value {
                old: None,
                new: Some(json!(1))
            })
        );
        assert_eq!(
            delta.get("b"),
            Some(&Change::Value {
                old: Some(json!("y")),
                new: Some(json!("x"))
            })
        );
        assert_eq!(
            delta.get("d"),
            Some(&Change::Value {
                old: Some(json!(4)),
                new: None
            })
        );
        assert!(delta.get("c").is_none());
    }

    #[test]
    fn test_nested_maps_recurse() {
        let desired = object(json!({
            "autoscale": {"min_workers": 1, "max_workers": 8, "target_workers": 1}
        }));
        let original = object(json!({
            "autoscale": {"min_workers": 2, "max_workers": 8}
        }));

        let delta = diff_maps(&desired, &original);

        let flat = delta.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].path, "autoscale.min_workers");
        assert_eq!(flat[0].old, Some(json!(2)));
        assert_eq!(flat[0].new, Some(json!(1)));
        assert_eq!(flat[1].path, "autoscale.target_workers");
        assert_eq!(flat[1].old, None);
        assert_eq!(flat[1].new, Some(json!(1)));
    }

    #[test]
    fn test_sequences_compared_whole() {
        let desired = object(json!({"ssh_public_keys": ["a", "b"]}));
        let original = object(json!({"ssh_public_keys": ["a"]}));

        let delta = diff_maps(&desired, &original);

        assert_eq!(
            delta.get("ssh_public_keys"),
            Some(&Change::Value {
                old: Some(json!(["a"])),
                new: Some(json!(["a", "b"]))
            })
        );
    }

    #[test]
    fn test_no_type_coercion() {
        let desired = object(json!({"autotermination_minutes": 1}));
        let original = object(json!({"autotermination_minutes": "1"}));

        assert_eq!(diff_maps(&desired, &original).len(), 1);
    }

    #[test]
    fn test_map_replaced_by_scalar_is_a_value_change() {
        let desired = object(json!({"custom_tags": "none"}));
        let original = object(json!({"custom_tags": {"Type": "AI"}}));

        let delta = diff_maps(&desired, &original);

        assert!(matches!(delta.get("custom_tags"), Some(Change::Value { .. })));
    }

    #[test]
    fn test_apply_reproduces_desired() {
        let desired = object(json!({
            "cluster_name": "team-Standard-0-dev",
            "custom_tags": {"Type": "Standard", "Workers": "SingleNode"},
            "autotermination_minutes": 30,
            "num_workers": 0
        }));
        let original = object(json!({
            "cluster_name": "team-prod-x",
            "custom_tags": {"Owner": "ops", "Type": "AI"},
            "autotermination_minutes": 120,
            "num_workers": 0,
            "policy_id": "abc"
        }));

        let delta = diff_maps(&desired, &original);
        let mut patched = original.clone();
        delta.apply_to(&mut patched);

        assert_eq!(patched, desired);
    }

    #[test]
    fn test_display_renders_dotted_paths() {
        let desired = object(json!({"autoscale": {"min_workers": 1}, "cluster_name": "b"}));
        let original = object(json!({"autoscale": {"min_workers": 3}, "cluster_name": "a"}));

        let rendered = diff_maps(&desired, &original).to_string();

        assert_eq!(rendered, "autoscale.min_workers: 3 -> 1\ncluster_name: a -> b");
    }
}
