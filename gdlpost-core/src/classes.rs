// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::cfg::resolve::kind_name;
use crate::error::PostError;
use crate::ut::track;

/// Shape of a class table, which decides the simplification template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPlan {
    RoadsOnly,
    BuildingsOnly,
    FourClass,
}

/// Mapping from class id to class name
///
/// Id 0 is reserved for background. Tables declaring it are shifted so
/// that every id moves up by one.
///
/// # Examples
///
/// ```
/// use gdlpost_core::classes::{ClassPlan, ClassTable};
///
/// let table = ClassTable::new([(1, "roads")]).unwrap();
/// assert_eq!(table.plan().unwrap(), ClassPlan::RoadsOnly);
///
/// let table = ClassTable::new([(0, "forest"), (1, "roads"), (2, "buildings"), (3, "hydro")]).unwrap();
/// assert_eq!(table.ids(), vec![1, 2, 3, 4]);
/// assert_eq!(table.plan().unwrap(), ClassPlan::FourClass);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTable {
    classes: BTreeMap<u32, String>,
}

impl ClassTable {
    /// Initialize a class table, shifting ids if background id 0 is present
    pub fn new<I, S>(classes: I) -> Result<Self, PostError>
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let classes: BTreeMap<u32, String> = classes
            .into_iter()
            .map(|(id, name)| (id, name.into()))
            .collect();

        if classes.contains_key(&0) {
            track::progress_warn(
                "Class id 0 is reserved for background. Shifting all class ids by +1.",
            );

            let classes = classes
                .into_iter()
                .map(|(id, name)| match id.checked_add(1) {
                    Some(shifted) => Ok((shifted, name)),
                    None => Err(PostError::ConfigTypeError(format!(
                        "Class id {} cannot be shifted past background id 0",
                        id
                    ))),
                })
                .collect::<Result<BTreeMap<u32, String>, PostError>>()?;

            return Ok(ClassTable { classes });
        }

        Ok(ClassTable { classes })
    }

    /// Build a class table from a yaml mapping of id to name
    ///
    /// Ids may be written as integers or numeric strings.
    pub fn from_value(value: &Value) -> Result<Self, PostError> {
        let mapping = match value {
            Value::Null => return Ok(ClassTable::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(PostError::ConfigTypeError(format!(
                    "Classes must be a mapping of class id to class name, got {}",
                    kind_name(other)
                )));
            }
        };

        let mut classes = Vec::with_capacity(mapping.len());

        for (id, name) in mapping {
            let parsed = match id {
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(s) => s.trim().parse::<u32>().ok(),
                _ => None,
            };

            let Some(parsed) = parsed else {
                return Err(PostError::ConfigTypeError(format!(
                    "Class id {:?} is not a non-negative integer",
                    id
                )));
            };

            let name = match name {
                Value::String(s) => s.clone(),
                other => {
                    return Err(PostError::ConfigTypeError(format!(
                        "Class name for id {} is of type {}, expected string",
                        parsed,
                        kind_name(other)
                    )));
                }
            };

            classes.push((parsed, name));
        }

        ClassTable::new(classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.classes.keys().copied().collect()
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.classes.get(&id).map(String::as_str)
    }

    /// Iterate over (id, name) in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.classes.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Select the simplification template matching the table's shape
    pub fn plan(&self) -> Result<ClassPlan, PostError> {
        match self.classes.len() {
            1 => match self.classes.values().next().map(String::as_str) {
                Some("roads") => Ok(ClassPlan::RoadsOnly),
                Some("buildings") => Ok(ClassPlan::BuildingsOnly),
                _ => Err(PostError::UnsupportedClassesError(1)),
            },
            4 => Ok(ClassPlan::FourClass),
            n => Err(PostError::UnsupportedClassesError(n)),
        }
    }
}
