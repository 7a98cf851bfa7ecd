//! Schema document format and the derived field-set definition.
//!
//! One JSON document per entity type declares its fields. A field either
//! renders as a `"Key: value"` metadata entry or, when it carries a
//! `relationship` block, emits typed edges to the nodes it names.
//! [`EntitySchema::definition`] distils a document into the field sets the
//! entity engine consumes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One entity-type schema document (`<type>.schema.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    /// The entity type this schema defines, e.g. `"npc"`. Doubles as the
    /// `node_type` of entities created from it.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Field declarations, keyed by field name. Sorted keys keep derived
    /// output deterministic.
    pub properties: BTreeMap<String, PropertySpec>,
    /// Whether callers may pass fields beyond the declared set. Carried for
    /// tool-surface generators; undeclared fields always pass through to
    /// metadata here.
    #[serde(default)]
    pub additional_properties: bool,
}

/// Declaration of a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    /// `"string"` or `"array"`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Allowed values, carried for presentation; not enforced on writes.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    /// When present, values of this field become edges instead of metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipSpec>,
}

/// Relationship configuration for a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSpec {
    /// Edge type emitted for each value of the field.
    pub edge_type: String,
    #[serde(default)]
    pub description: String,
    /// Expected node type of targets, for presentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
}

/// Field sets driving entity derivation and diffing.
///
/// `name` never appears in any set: it is the node identity, checked
/// separately and immutable through updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDefinition {
    /// Fields that must be present in entity data.
    pub required_fields: BTreeSet<String>,
    /// Declared fields that may be present.
    pub optional_fields: BTreeSet<String>,
    /// Fields folded into metadata verbatim even when a relationship is
    /// configured for them. Empty when derived from a document; embedders
    /// populate it to demote a relationship field.
    pub exclude_fields: BTreeSet<String>,
    /// Field name to edge type, for relationship-bearing fields.
    pub relationships: BTreeMap<String, String>,
}

impl SchemaDefinition {
    /// The edge type for `field`, unless the field is excluded from
    /// relationship handling.
    pub fn relationship_edge_type(&self, field: &str) -> Option<&str> {
        if self.exclude_fields.contains(field) {
            return None;
        }
        self.relationships.get(field).map(String::as_str)
    }
}

impl EntitySchema {
    /// Distil the document into the field sets the engine consumes.
    pub fn definition(&self) -> SchemaDefinition {
        let mut definition = SchemaDefinition::default();
        for (field, spec) in &self.properties {
            if field == "name" {
                continue;
            }
            if spec.required {
                definition.required_fields.insert(field.clone());
            } else {
                definition.optional_fields.insert(field.clone());
            }
            if let Some(relationship) = &spec.relationship {
                definition
                    .relationships
                    .insert(field.clone(), relationship.edge_type.clone());
            }
        }
        definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NPC: &str = r#"{
        "name": "npc",
        "description": "A non-player character",
        "properties": {
            "name": { "type": "string", "description": "Unique name", "required": true },
            "race": { "type": "string", "required": true },
            "demeanor": { "type": "string" },
            "location": {
                "type": "string",
                "relationship": { "edgeType": "located_in", "nodeType": "location" }
            },
            "allies": {
                "type": "array",
                "relationship": { "edgeType": "ally_of" }
            }
        },
        "additionalProperties": true
    }"#;

    #[test]
    fn document_parses_with_camel_case_keys() {
        let schema: EntitySchema = serde_json::from_str(NPC).unwrap();
        assert_eq!(schema.name, "npc");
        assert!(schema.additional_properties);
        assert_eq!(schema.properties.len(), 5);

        let location = &schema.properties["location"];
        assert_eq!(
            location.relationship.as_ref().unwrap().edge_type,
            "located_in"
        );
        assert_eq!(
            location.relationship.as_ref().unwrap().node_type.as_deref(),
            Some("location")
        );
    }

    #[test]
    fn definition_sorts_fields_and_skips_name() {
        let schema: EntitySchema = serde_json::from_str(NPC).unwrap();
        let definition = schema.definition();

        assert!(!definition.required_fields.contains("name"));
        assert!(definition.required_fields.contains("race"));
        assert!(definition.optional_fields.contains("demeanor"));
        assert!(definition.optional_fields.contains("location"));
        assert_eq!(
            definition.relationship_edge_type("location"),
            Some("located_in")
        );
        assert_eq!(definition.relationship_edge_type("allies"), Some("ally_of"));
        assert_eq!(definition.relationship_edge_type("race"), None);
    }

    #[test]
    fn excluded_field_loses_its_relationship() {
        let schema: EntitySchema = serde_json::from_str(NPC).unwrap();
        let mut definition = schema.definition();
        definition.exclude_fields.insert("location".into());

        assert_eq!(definition.relationship_edge_type("location"), None);
        assert_eq!(definition.relationship_edge_type("allies"), Some("ally_of"));
    }
}
