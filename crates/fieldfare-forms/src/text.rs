//! Text assembly from CHILD token walks.

use std::collections::HashMap;

use fieldfare_core::types::{Block, BlockType, RelationshipType, SelectionState};

/// Lookup table from block id to block, built once per resolution pass.
///
/// Blocks reference each other by opaque id, so the whole set is indexed
/// up front rather than chased through embedded references.
pub type BlockIndex<'a> = HashMap<&'a str, &'a Block>;

/// Build a [`BlockIndex`] over a block set.
pub fn index_blocks(blocks: &[Block]) -> BlockIndex<'_> {
    let mut index = BlockIndex::with_capacity(blocks.len());
    for block in blocks {
        index.insert(block.id.as_str(), block);
    }
    index
}

/// Reconstruct the display text of a block from its CHILD tokens.
///
/// Walks every CHILD relationship in declared order. WORD children append
/// their text followed by a single space; SELECTED selection marks append
/// the literal `"X "`. Unselected marks, unknown child ids, and other block
/// kinds contribute nothing, and a block without CHILD edges produces the
/// empty string. The result keeps one trailing space per token; callers
/// trim.
pub fn assemble_text(block: &Block, index: &BlockIndex<'_>) -> String {
    let mut text = String::new();
    for relationship in block.relationships_of(RelationshipType::Child) {
        for child_id in &relationship.ids {
            let Some(child) = index.get(child_id.as_str()) else {
                continue;
            };
            match child.block_type {
                BlockType::Word => {
                    if let Some(word) = &child.text {
                        text.push_str(word);
                        text.push(' ');
                    }
                }
                BlockType::SelectionElement => {
                    if child.selection_state == Some(SelectionState::Selected) {
                        text.push_str("X ");
                    }
                }
                _ => {}
            }
        }
    }
    text
}
