//! Key-value resolution over document-analysis block graphs.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use fieldfare_core::types::{Block, BlockType, RelationshipType};

use crate::text::{assemble_text, BlockIndex};

/// Resolved form fields: field name to the values seen under that name.
///
/// Iteration order is the insertion order of first occurrence. A name
/// appearing on several key blocks accumulates all of its values.
pub type FieldMap = IndexMap<String, Vec<String>>;

/// Resolve a flat analysis block set into a [`FieldMap`].
///
/// A single forward pass partitions the set into the full id index plus the
/// KEY and VALUE sides of every KEY_VALUE_SET. Each key block then follows
/// its first VALUE edge to the first target id present on the value side,
/// and the key and value texts are assembled independently and
/// right-trimmed. A key whose VALUE link cannot be resolved is logged and
/// skipped; it never aborts resolution of the remaining keys.
pub fn resolve_fields(blocks: &[Block]) -> FieldMap {
    let mut block_index = BlockIndex::with_capacity(blocks.len());
    let mut key_blocks: Vec<&Block> = Vec::new();
    let mut value_index: HashMap<&str, &Block> = HashMap::new();

    for block in blocks {
        block_index.insert(block.id.as_str(), block);
        if block.block_type == BlockType::KeyValueSet {
            if block.is_key() {
                key_blocks.push(block);
            } else {
                value_index.insert(block.id.as_str(), block);
            }
        }
    }

    let mut fields = FieldMap::new();
    for key_block in key_blocks {
        let key_text = assemble_text(key_block, &block_index);
        let Some(value_block) = find_value_block(key_block, &value_index) else {
            warn!(
                key = %key_text.trim_end(),
                id = %key_block.id,
                "Key block has no resolvable VALUE link, skipping"
            );
            continue;
        };
        let value_text = assemble_text(value_block, &block_index);
        fields
            .entry(key_text.trim_end().to_string())
            .or_default()
            .push(value_text.trim_end().to_string());
    }
    fields
}

/// Follow a key block's first VALUE edge to the value-side block.
///
/// Within that edge, the first target id present in the value index wins.
fn find_value_block<'a>(
    key_block: &Block,
    value_index: &HashMap<&str, &'a Block>,
) -> Option<&'a Block> {
    let relationship = key_block.relationship(RelationshipType::Value)?;
    relationship
        .ids
        .iter()
        .find_map(|id| value_index.get(id.as_str()).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldfare_core::types::{Relationship, SelectionState};

    /// One key/value pair: `name: value` with single-word tokens.
    fn field_blocks(n: usize, name: &str, value: &str) -> Vec<Block> {
        vec![
            Block::word(format!("kw{}", n), name),
            Block::word(format!("vw{}", n), value),
            Block::key(
                format!("k{}", n),
                vec![
                    Relationship::value(vec![format!("v{}", n)]),
                    Relationship::child(vec![format!("kw{}", n)]),
                ],
            ),
            Block::value(
                format!("v{}", n),
                vec![Relationship::child(vec![format!("vw{}", n)])],
            ),
        ]
    }

    #[test]
    fn test_resolve_single_field() {
        let blocks = vec![
            Block::word("kw1", "Review"),
            Block::word("kw2", "ID"),
            Block::word("vw1", "4821"),
            Block::key(
                "k1",
                vec![
                    Relationship::value(vec!["v1".into()]),
                    Relationship::child(vec!["kw1".into(), "kw2".into()]),
                ],
            ),
            Block::value("v1", vec![Relationship::child(vec!["vw1".into()])]),
        ];
        let fields = resolve_fields(&blocks);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["Review ID"], vec!["4821"]);
    }

    #[test]
    fn test_value_count_equals_key_block_count() {
        let mut blocks = Vec::new();
        blocks.extend(field_blocks(1, "Name", "Ada"));
        blocks.extend(field_blocks(2, "Email", "ada@example.com"));
        blocks.extend(field_blocks(3, "City", "London"));

        let fields = resolve_fields(&blocks);
        let total_values: usize = fields.values().map(Vec::len).sum();
        assert_eq!(total_values, 3);
    }

    #[test]
    fn test_repeated_label_accumulates_values() {
        let mut blocks = field_blocks(1, "Email", "first@example.com");
        blocks.extend(field_blocks(2, "Email", "second@example.com"));

        let fields = resolve_fields(&blocks);
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields["Email"],
            vec!["first@example.com", "second@example.com"]
        );
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut blocks = Vec::new();
        blocks.extend(field_blocks(1, "Zebra", "1"));
        blocks.extend(field_blocks(2, "Apple", "2"));
        blocks.extend(field_blocks(3, "Mango", "3"));

        let fields = resolve_fields(&blocks);
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn test_unresolved_value_link_is_isolated() {
        let mut blocks = field_blocks(1, "Good", "kept");
        // Key whose VALUE edge points at an id that is not on the value side.
        blocks.push(Block::word("kw9", "Broken"));
        blocks.push(Block::key(
            "k9",
            vec![
                Relationship::value(vec!["nowhere".into()]),
                Relationship::child(vec!["kw9".into()]),
            ],
        ));

        let fields = resolve_fields(&blocks);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["Good"], vec!["kept"]);
        assert!(!fields.contains_key("Broken"));
    }

    #[test]
    fn test_key_without_value_relationship_is_skipped() {
        let mut blocks = field_blocks(1, "Good", "kept");
        blocks.push(Block::word("kw9", "Orphan"));
        blocks.push(Block::key(
            "k9",
            vec![Relationship::child(vec!["kw9".into()])],
        ));

        let fields = resolve_fields(&blocks);
        assert_eq!(fields.len(), 1);
        assert!(!fields.contains_key("Orphan"));
    }

    #[test]
    fn test_first_resolvable_target_id_wins() {
        let blocks = vec![
            Block::word("kw1", "Field"),
            Block::word("vw1", "right"),
            Block::word("vw2", "wrong"),
            Block::key(
                "k1",
                vec![
                    Relationship::value(vec!["missing".into(), "v1".into(), "v2".into()]),
                    Relationship::child(vec!["kw1".into()]),
                ],
            ),
            Block::value("v1", vec![Relationship::child(vec!["vw1".into()])]),
            Block::value("v2", vec![Relationship::child(vec!["vw2".into()])]),
        ];
        let fields = resolve_fields(&blocks);
        assert_eq!(fields["Field"], vec!["right"]);
    }

    #[test]
    fn test_first_value_relationship_wins() {
        let blocks = vec![
            Block::word("kw1", "Field"),
            Block::word("vw1", "first"),
            Block::word("vw2", "second"),
            Block::key(
                "k1",
                vec![
                    Relationship::value(vec!["v1".into()]),
                    Relationship::value(vec!["v2".into()]),
                    Relationship::child(vec!["kw1".into()]),
                ],
            ),
            Block::value("v1", vec![Relationship::child(vec!["vw1".into()])]),
            Block::value("v2", vec![Relationship::child(vec!["vw2".into()])]),
        ];
        let fields = resolve_fields(&blocks);
        assert_eq!(fields["Field"], vec!["first"]);
    }

    #[test]
    fn test_selected_mark_resolves_to_x() {
        let blocks = vec![
            Block::word("kw1", "Subscribed"),
            Block::selection("s1", SelectionState::Selected),
            Block::key(
                "k1",
                vec![
                    Relationship::value(vec!["v1".into()]),
                    Relationship::child(vec!["kw1".into()]),
                ],
            ),
            Block::value("v1", vec![Relationship::child(vec!["s1".into()])]),
        ];
        let fields = resolve_fields(&blocks);
        assert_eq!(fields["Subscribed"], vec!["X"]);
    }

    #[test]
    fn test_empty_value_block_resolves_to_empty_string() {
        let blocks = vec![
            Block::word("kw1", "Notes"),
            Block::key(
                "k1",
                vec![
                    Relationship::value(vec!["v1".into()]),
                    Relationship::child(vec!["kw1".into()]),
                ],
            ),
            Block::value("v1", vec![]),
        ];
        let fields = resolve_fields(&blocks);
        assert_eq!(fields["Notes"], vec![""]);
    }

    #[test]
    fn test_empty_block_set() {
        let fields = resolve_fields(&[]);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_non_key_value_blocks_are_ignored() {
        let mut blocks = field_blocks(1, "Name", "Ada");
        // Stray tokens not attached to any key/value pair.
        blocks.push(Block::word("stray", "noise"));
        blocks.push(Block::selection("mark", SelectionState::Selected));

        let fields = resolve_fields(&blocks);
        assert_eq!(fields.len(), 1);
    }
}
