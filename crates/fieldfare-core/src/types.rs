use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Block graph model
// =============================================================================

/// The kind of node in a document-analysis block graph.
///
/// Serialized in the analysis engine's wire form (`KEY_VALUE_SET`, `WORD`,
/// ...). Kinds this pipeline never inspects collapse into `Other` so new
/// engine output does not break deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    /// A form label (KEY role) or its associated value (no KEY role).
    KeyValueSet,
    /// A single word token carrying text.
    Word,
    /// A checkbox or radio mark.
    SelectionElement,
    Line,
    Page,
    Table,
    Cell,
    #[serde(other)]
    Other,
}

/// Role of a KEY_VALUE_SET block within a form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityRole {
    Key,
    Value,
}

/// Kind of edge between blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Targets are the word/mark tokens composing this block's text.
    Child,
    /// Targets link a KEY block to the VALUE block holding its answer.
    Value,
    #[serde(other)]
    Other,
}

/// State of a SELECTION_ELEMENT block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionState {
    Selected,
    NotSelected,
}

/// An ordered edge set from one block to others, referenced by id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "Type")]
    pub rel_type: RelationshipType,
    #[serde(rename = "Ids")]
    pub ids: Vec<String>,
}

/// A node in the document-analysis graph.
///
/// Blocks cross-reference each other by opaque id rather than by embedded
/// references, so a whole block set must be indexed before any single block
/// can be resolved. Blocks are immutable once received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "BlockType")]
    pub block_type: BlockType,
    /// Only meaningful for KEY_VALUE_SET blocks: contains `Key` for the
    /// label side, is empty (or `Value`) for the value side.
    #[serde(rename = "EntityTypes", default, skip_serializing_if = "Vec::is_empty")]
    pub entity_roles: Vec<EntityRole>,
    #[serde(rename = "Relationships", default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    /// Present for WORD blocks.
    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Present for SELECTION_ELEMENT blocks.
    #[serde(
        rename = "SelectionStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selection_state: Option<SelectionState>,
}

impl Block {
    /// A WORD block carrying `text`.
    pub fn word(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: BlockType::Word,
            entity_roles: Vec::new(),
            relationships: Vec::new(),
            text: Some(text.into()),
            selection_state: None,
        }
    }

    /// A SELECTION_ELEMENT block in the given state.
    pub fn selection(id: impl Into<String>, state: SelectionState) -> Self {
        Self {
            id: id.into(),
            block_type: BlockType::SelectionElement,
            entity_roles: Vec::new(),
            relationships: Vec::new(),
            text: None,
            selection_state: Some(state),
        }
    }

    /// A KEY_VALUE_SET block on the label side.
    pub fn key(id: impl Into<String>, relationships: Vec<Relationship>) -> Self {
        Self {
            id: id.into(),
            block_type: BlockType::KeyValueSet,
            entity_roles: vec![EntityRole::Key],
            relationships,
            text: None,
            selection_state: None,
        }
    }

    /// A KEY_VALUE_SET block on the value side.
    pub fn value(id: impl Into<String>, relationships: Vec<Relationship>) -> Self {
        Self {
            id: id.into(),
            block_type: BlockType::KeyValueSet,
            entity_roles: Vec::new(),
            relationships,
            text: None,
            selection_state: None,
        }
    }

    /// True for the label side of a form field.
    pub fn is_key(&self) -> bool {
        self.block_type == BlockType::KeyValueSet && self.entity_roles.contains(&EntityRole::Key)
    }

    /// All relationships of the given type, in declared order.
    pub fn relationships_of(
        &self,
        rel_type: RelationshipType,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.rel_type == rel_type)
    }

    /// First relationship of the given type, if any.
    pub fn relationship(&self, rel_type: RelationshipType) -> Option<&Relationship> {
        self.relationships_of(rel_type).next()
    }
}

/// Convenience edge constructors used by mocks and tests.
impl Relationship {
    pub fn child(ids: Vec<String>) -> Self {
        Self {
            rel_type: RelationshipType::Child,
            ids,
        }
    }

    pub fn value(ids: Vec<String>) -> Self {
        Self {
            rel_type: RelationshipType::Value,
            ids,
        }
    }
}

// =============================================================================
// Persisted records and tags
// =============================================================================

/// Access-control tags attached to a stored object, copied verbatim from
/// source to destination.
pub type ObjectTags = BTreeMap<String, String>;

/// The persisted unit: a flat field-name to JSON-value map holding the
/// pass-through fields plus the `<sourceField>_embeddings` vector.
///
/// Transparent serialization so the wire form is the plain JSON object both
/// the destination bucket and the index service expect. Created once per
/// source document, never mutated after indexing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexedRecord(pub serde_json::Map<String, serde_json::Value>);

impl IndexedRecord {
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    /// Set a field, replacing any prior value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_str())
    }

    /// Extract the embedding vector stored under `vector_field`.
    ///
    /// Returns `None` if the field is absent or not a numeric array.
    pub fn embedding(&self, vector_field: &str) -> Option<Vec<f32>> {
        let values = self.0.get(vector_field)?.as_array()?;
        values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect()
    }

    /// Merge each tag in as a plain field, overwriting collisions.
    ///
    /// Applied at index time so term filters on tag values work.
    pub fn merge_tags(&mut self, tags: &ObjectTags) {
        for (key, value) in tags {
            self.0
                .insert(key.clone(), serde_json::Value::String(value.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
