//! Element classification and attribute capture
//!
//! Elements nested inside multi-element containers often carry no
//! classification or attributes of their own. Lookups therefore climb the
//! parent chain until a value is found, the source reports the element as
//! unknown, or the chain ends. The climb tracks visited elements so a cyclic
//! parent relation terminates.

use std::collections::HashSet;

use crate::host::{Lookup, PropertySource};

/// Category written for elements without a resolvable classification
pub const DEFAULT_CATEGORY: &str = "IFCBUILDINGELEMENTPROXY";

fn lookup_inherited<T>(
    source: &dyn PropertySource,
    guid: &str,
    lookup: impl Fn(&dyn PropertySource, &str) -> Lookup<T>,
) -> Option<T> {
    let mut visited = HashSet::new();
    let mut current = guid.to_string();
    loop {
        if !visited.insert(current.clone()) {
            tracing::warn!("Cyclic parent relation at element {}", current);
            return None;
        }
        match lookup(source, &current) {
            Lookup::Found(value) => return Some(value),
            Lookup::Unavailable => return None,
            Lookup::Inherit => match source.parent(&current) {
                Some(parent) => current = parent,
                None => return None,
            },
        }
    }
}

/// Resolve the upper-cased category of an element
pub fn resolve_category(source: &dyn PropertySource, guid: &str) -> String {
    lookup_inherited(source, guid, |source, guid| source.classification(guid))
        .map(|class| class.to_uppercase())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Serialize one attribute as a `["name","value","TYPE"]` JSON triple
pub fn serialize_attribute(name: &str, value: &str, value_type: &str) -> String {
    serde_json::json!([name, value, value_type.to_uppercase()]).to_string()
}

/// Collect the serialized attributes of an element
///
/// Attributes without a value are dropped. The list is empty when neither
/// the element nor any ancestor has attributes.
pub fn collect_attributes(source: &dyn PropertySource, guid: &str) -> Vec<String> {
    lookup_inherited(source, guid, |source, guid| source.attributes(guid))
        .unwrap_or_default()
        .into_iter()
        .filter_map(|attribute| {
            attribute
                .value
                .map(|value| serialize_attribute(&attribute.name, &value, &attribute.value_type))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{AttributeValue, NoProperties};
    use crate::scene::PropertyTable;

    #[test]
    fn test_default_category_without_properties() {
        assert_eq!(resolve_category(&NoProperties, "any"), DEFAULT_CATEGORY);
        assert!(collect_attributes(&NoProperties, "any").is_empty());
    }

    #[test]
    fn test_category_is_upper_cased() {
        let mut table = PropertyTable::new();
        table.set_classification("slab", "IfcSlab");
        assert_eq!(resolve_category(&table, "slab"), "IFCSLAB");
    }

    #[test]
    fn test_category_inherited_from_grandparent() {
        let mut table = PropertyTable::new();
        table.set_classification("stair", "IfcStair");
        table.set_parent("flight", "stair");
        table.set_parent("tread", "flight");
        assert_eq!(resolve_category(&table, "tread"), "IFCSTAIR");
    }

    #[test]
    fn test_parent_cycle_falls_back_to_default() {
        let mut table = PropertyTable::new();
        table.set_parent("a", "b");
        table.set_parent("b", "a");
        assert_eq!(resolve_category(&table, "a"), DEFAULT_CATEGORY);
        assert!(collect_attributes(&table, "a").is_empty());
    }

    #[test]
    fn test_attributes_serialized_and_filtered() {
        let mut table = PropertyTable::new();
        table.add_attribute("door", AttributeValue::new("Name", "Door 01", "IfcLabel"));
        table.add_attribute(
            "door",
            AttributeValue {
                name: "Tag".to_string(),
                value: None,
                value_type: "IfcIdentifier".to_string(),
            },
        );
        let attributes = collect_attributes(&table, "door");
        assert_eq!(attributes, vec![r#"["Name","Door 01","IFCLABEL"]"#.to_string()]);
    }

    #[test]
    fn test_attribute_escaping() {
        let serialized = serialize_attribute("Description", "say \"hi\"", "IfcText");
        assert_eq!(serialized, r#"["Description","say \"hi\"","IFCTEXT"]"#);
    }

    #[test]
    fn test_attributes_inherited_from_parent() {
        let mut table = PropertyTable::new();
        table.add_attribute("curtain", AttributeValue::new("Name", "CW-1", "IfcLabel"));
        table.set_parent("mullion", "curtain");
        assert_eq!(collect_attributes(&table, "mullion").len(), 1);
    }
}
