// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

use crate::cfg::resolve::kind_name;
use crate::error::PostError;
use crate::ut::track;

/// A value that differs between the base and overlay configurations
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Section, parameter and optional subparameter
    pub path: Vec<String>,
    pub current: Value,
    pub incoming: Value,
}

impl Mismatch {
    pub fn key(&self) -> String {
        self.path.join("/")
    }
}

/// Result of comparing two configurations
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub config: Value,
    pub mismatches: Vec<Mismatch>,
}

impl MergeOutcome {
    /// Paths of every mismatched value
    pub fn keys(&self) -> BTreeSet<String> {
        self.mismatches.iter().map(Mismatch::key).collect()
    }
}

/// Compare an overlay configuration against a base configuration
///
/// Walks section -> parameter -> subparameter. Missing sections and
/// parameters are scaffolded in the returned configuration, mismatched
/// values are reported and, when `update_base` is set, replaced by the
/// overlay's value. Anything nested deeper is compared as a whole. The
/// base is never modified and keys are never removed.
///
/// # Examples
///
/// ```
/// use gdlpost_core::cfg::merge;
///
/// let base = serde_yaml::from_str("global: {num_classes: 4}").unwrap();
/// let overlay = serde_yaml::from_str("global: {num_classes: 1}").unwrap();
///
/// let outcome = merge(&base, &overlay, true).unwrap();
/// assert_eq!(outcome.mismatches.len(), 1);
///
/// let outcome = merge(&outcome.config, &overlay, true).unwrap();
/// assert!(outcome.mismatches.is_empty());
/// ```
pub fn merge(base: &Value, overlay: &Value, update_base: bool) -> Result<MergeOutcome, PostError> {
    let (Some(base_map), Some(overlay_map)) = (base.as_mapping(), overlay.as_mapping()) else {
        return Err(PostError::MergeTypeError(format!(
            "Base is of type {} and overlay is of type {}",
            kind_name(base),
            kind_name(overlay)
        )));
    };

    let mut merged = base_map.clone();
    let mut mismatches = Vec::new();

    for (section, params) in overlay_map {
        let section_name = key_name(section);

        let Some(params) = params.as_mapping() else {
            compare_leaf(
                &mut merged,
                section,
                params,
                vec![section_name],
                update_base,
                &mut mismatches,
            );
            continue;
        };

        let merged_section = child_mapping(&mut merged, section, &[section_name.clone()])?;

        for (param, value) in params {
            let param_name = key_name(param);
            let path = vec![section_name.clone(), param_name.clone()];

            let Some(subparams) = value.as_mapping() else {
                compare_leaf(merged_section, param, value, path, update_base, &mut mismatches);
                continue;
            };

            let merged_param = child_mapping(merged_section, param, &path)?;

            for (subparam, subvalue) in subparams {
                let path = vec![section_name.clone(), param_name.clone(), key_name(subparam)];
                compare_leaf(merged_param, subparam, subvalue, path, update_base, &mut mismatches);
            }
        }
    }

    Ok(MergeOutcome {
        config: Value::Mapping(merged),
        mismatches,
    })
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

/// Get the mapping stored at `key`, inserting an empty one if absent
fn child_mapping<'m>(
    parent: &'m mut Mapping,
    key: &Value,
    path: &[String],
) -> Result<&'m mut Mapping, PostError> {
    let child = parent
        .entry(key.clone())
        .or_insert(Value::Mapping(Mapping::new()));

    if child.is_null() {
        *child = Value::Mapping(Mapping::new());
    }

    let kind = kind_name(child);
    child.as_mapping_mut().ok_or_else(|| {
        PostError::MergeTypeError(format!(
            "Base value at {} is of type {} and overlay value is of type mapping",
            path.join("/"),
            kind
        ))
    })
}

fn compare_leaf(
    parent: &mut Mapping,
    key: &Value,
    incoming: &Value,
    path: Vec<String>,
    update_base: bool,
    mismatches: &mut Vec<Mismatch>,
) {
    let current = parent
        .entry(key.clone())
        .or_insert(Value::Null)
        .clone();

    if &current == incoming {
        return;
    }

    let mismatch = Mismatch {
        path,
        current,
        incoming: incoming.clone(),
    };

    track::progress_warn(&format!(
        "Configuration mismatch at {}. Current value: {:?}. Incoming value: {:?}.",
        mismatch.key(),
        mismatch.current,
        mismatch.incoming
    ));

    if update_base {
        parent.insert(key.clone(), incoming.clone());
        track::progress_warn(&format!("Value at {} updated.", mismatch.key()));
    }

    mismatches.push(mismatch);
}

#[cfg(test)]
mod test {

    use super::*;

    fn value(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    const BASE: &str = "
global:
  num_classes: 4
  number_of_bands: 3
post-processing:
  simptol: 0.2
  buildings:
    recttol: 0.7
";

    const OVERLAY: &str = "
global:
  num_classes: 1
  classes: {1: roads}
post-processing:
  buildings:
    recttol: 0.5
    patterntol: 0.3
training:
  epochs: 10
";

    #[test]
    fn test_merge_reports_mismatches() {
        let outcome = merge(&value(BASE), &value(OVERLAY), false).unwrap();

        let keys = outcome.keys();
        assert!(keys.contains("global/num_classes"));
        assert!(keys.contains("global/classes/1"));
        assert!(keys.contains("post-processing/buildings/recttol"));
        assert!(keys.contains("post-processing/buildings/patterntol"));
        assert!(keys.contains("training/epochs"));
        assert_eq!(outcome.mismatches.len(), 5);
    }

    #[test]
    fn test_merge_without_update_keeps_values() {
        let outcome = merge(&value(BASE), &value(OVERLAY), false).unwrap();
        assert_eq!(outcome.config["global"]["num_classes"], Value::from(4));
        assert_eq!(outcome.config["training"]["epochs"], Value::Null);
        assert!(outcome.config["training"].as_mapping().unwrap().contains_key("epochs"));
    }

    #[test]
    fn test_merge_with_update_overwrites() {
        let outcome = merge(&value(BASE), &value(OVERLAY), true).unwrap();
        assert_eq!(outcome.config["global"]["num_classes"], Value::from(1));
        assert_eq!(
            outcome.config["post-processing"]["buildings"]["recttol"],
            Value::from(0.5)
        );
        assert_eq!(outcome.config["training"]["epochs"], Value::from(10));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let overlay = value(OVERLAY);
        let first = merge(&value(BASE), &overlay, true).unwrap();
        let second = merge(&first.config, &overlay, true).unwrap();
        assert!(!first.mismatches.is_empty());
        assert!(second.mismatches.is_empty());
    }

    #[test]
    fn test_merge_never_removes_keys() {
        let base = value(BASE);
        let outcome = merge(&base, &value(OVERLAY), true).unwrap();
        assert_eq!(outcome.config["global"]["number_of_bands"], Value::from(3));
        assert_eq!(outcome.config["post-processing"]["simptol"], Value::from(0.2));
        assert_eq!(base["global"]["num_classes"], Value::from(4));
    }

    #[test]
    fn test_merge_deeper_values_are_leaves() {
        let base = value("a: {b: {c: {d: 1}}}");
        let overlay = value("a: {b: {c: {d: 2}}}");
        let outcome = merge(&base, &overlay, true).unwrap();
        assert_eq!(outcome.keys().into_iter().collect::<Vec<_>>(), vec!["a/b/c"]);
        assert_eq!(outcome.config["a"]["b"]["c"]["d"], Value::from(2));
    }

    #[test]
    fn test_merge_rejects_non_mappings() {
        let result = merge(&value("[1, 2]"), &value("a: 1"), false);
        match result {
            Err(PostError::MergeTypeError(message)) => {
                assert!(message.contains("sequence"));
                assert!(message.contains("mapping"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
