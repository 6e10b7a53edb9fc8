//! Declarative translation between flat parameter maps and XML leaves.
//!
//! A key map names the XML tag for each semantic field. A value map
//! rewrites enumerated values. Read-side value maps are keyed by XML tag
//! (device text to semantic value); [`reverse_value_map`] turns one into a
//! write-side map keyed by semantic field (semantic value to device text),
//! so one table serves both directions.
//!
//! Lookups never fail: a field with no key mapping is passed through or
//! dropped, a value with no value mapping is sent as is, and a tag missing
//! from a reply is simply absent from the result.

use std::fmt;

use indexmap::IndexMap;

use super::namespace::{ElementMaker, NCDATA, NETCONFBASE};
use super::{Attribute, Element};

/// Semantic field name to value.
pub type ParamMap = IndexMap<String, String>;

/// Semantic field name to XML tag.
pub type KeyMap = IndexMap<String, String>;

/// Key (field or tag) to a table of value substitutions.
pub type ValueMap = IndexMap<String, IndexMap<String, String>>;

/// NETCONF `operation` attribute values for `edit-config` subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOperation {
    Merge,
    Create,
    Replace,
    Delete,
    Remove,
}

impl EditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditOperation::Merge => "merge",
            EditOperation::Create => "create",
            EditOperation::Replace => "replace",
            EditOperation::Delete => "delete",
            EditOperation::Remove => "remove",
        }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes marking a subtree's edit semantics.
///
/// `None` yields no attribute, which the device treats as an implicit merge.
pub fn operation_attribute(operation: Option<EditOperation>) -> Vec<Attribute> {
    match operation {
        None => Vec::new(),
        Some(op) => vec![Attribute::new(Some(NETCONFBASE), "operation", op.as_str())],
    }
}

/// Turn parameters into leaf elements, in parameter order.
///
/// `value_map` is keyed by semantic field. With `keep_unmapped` set, fields
/// missing from `key_map` keep their own name as the tag; otherwise they are
/// dropped.
pub fn params_to_elements(
    params: &ParamMap,
    key_map: &KeyMap,
    value_map: Option<&ValueMap>,
    maker: ElementMaker,
    keep_unmapped: bool,
) -> Vec<Element> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let tag = match key_map.get(key) {
                Some(tag) => tag.as_str(),
                None if keep_unmapped => key.as_str(),
                None => return None,
            };
            if tag.is_empty() {
                return None;
            }
            let value = value_map
                .and_then(|vm| vm.get(key))
                .and_then(|values| values.get(value))
                .unwrap_or(value);
            Some(maker.leaf(tag, value.as_str()))
        })
        .collect()
}

/// Read fields out of a reply.
///
/// `value_map` is keyed by XML tag. Each tag is searched among the
/// descendants of `element` in `namespace`; tags not found are left out.
pub fn element_to_dict(
    element: &Element,
    namespace: &str,
    key_map: &KeyMap,
    value_map: Option<&ValueMap>,
) -> ParamMap {
    let mut dict = ParamMap::new();
    for (key, tag) in key_map {
        if let Some(field) = element.find(namespace, tag) {
            let text = field.text().unwrap_or_default();
            let value = value_map
                .and_then(|vm| vm.get(tag))
                .and_then(|values| values.get(text))
                .map(String::as_str)
                .unwrap_or(text);
            dict.insert(key.clone(), value.to_string());
        }
    }
    dict
}

/// [`element_to_dict`] in the data namespace.
pub fn data_element_to_dict(
    element: &Element,
    key_map: &KeyMap,
    value_map: Option<&ValueMap>,
) -> ParamMap {
    element_to_dict(element, NCDATA, key_map, value_map)
}

/// Swap keys and values of a key map (tag to field).
pub fn reverse_key_map(key_map: &KeyMap) -> KeyMap {
    key_map
        .iter()
        .map(|(field, tag)| (tag.clone(), field.clone()))
        .collect()
}

/// Build the write-side value map from a read-side one.
///
/// `key_map` maps each tag of `value_map` to the field it should be
/// addressed by (usually [`reverse_key_map`] of the forward map), and every
/// substitution table is inverted. Tags with no entry in `key_map` are
/// skipped.
pub fn reverse_value_map(key_map: &KeyMap, value_map: &ValueMap) -> ValueMap {
    value_map
        .iter()
        .filter_map(|(tag, values)| {
            let field = key_map.get(tag)?;
            let inverted = values
                .iter()
                .map(|(raw, mapped)| (mapped.clone(), raw.clone()))
                .collect();
            Some((field.clone(), inverted))
        })
        .collect()
}
