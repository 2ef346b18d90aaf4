//! SGF record parsing.
//!
//! The whole record is scanned once, left to right. Each unescaped `;`
//! starts a node; `(` and `)` open and close variations and only move the
//! builder between parents. Variations are tracked with an explicit stack
//! rather than recursion, so nesting depth is bounded by memory only.

mod keys;
mod properties;
mod scanner;

use crate::error::SgfError;
use crate::game::{Game, GameNode, NodeId};

use properties::parse_properties;
use scanner::{is_escaped, scan_node};

/// Parses one SGF record into a [`Game`].
///
/// Fails only on a property key outside the supported vocabulary; nothing
/// is returned for the partially built tree in that case.
pub fn parse(input: &str) -> Result<Game, SgfError> {
    TreeBuilder::new(input).build()
}

/// Per-call parse state. Never reused across records.
struct TreeBuilder<'a> {
    input: &'a str,
    game: Game,
    parent: Option<NodeId>,
    branches: Vec<NodeId>,
    next_move_no: u32,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            game: Game::default(),
            parent: None,
            branches: Vec::new(),
            next_move_no: 1,
        }
    }

    fn build(mut self) -> Result<Game, SgfError> {
        let bytes = self.input.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b';' if !is_escaped(bytes, i) => {
                    let token = scan_node(self.input, i);
                    self.add_node(token.text)?;
                    // Resume on the delimiter that ended the node.
                    i = token.end;
                    continue;
                }
                b'(' => self.open_branch(),
                b')' => self.close_branch(),
                _ => {}
            }
            i += 1;
        }

        // Unmatched `(` entries left on the stack are dropped with the builder.
        Ok(self.game)
    }

    fn add_node(&mut self, token: &str) -> Result<(), SgfError> {
        let properties = parse_properties(token, &mut self.game)?;
        let mut node = GameNode::new(self.parent, properties);
        if node.is_move() {
            node.set_move_no(self.next_move_no);
            self.next_move_no += 1;
        }

        self.parent = Some(self.game.push_node(node));
        Ok(())
    }

    fn open_branch(&mut self) {
        if let Some(parent) = self.parent {
            self.branches.push(parent);
        }
    }

    fn close_branch(&mut self) {
        let Some(restored) = self.branches.pop() else {
            return;
        };

        self.parent = Some(restored);
        self.next_move_no = self.last_move_no_at(restored) + 1;
    }

    /// Move number of `id`, or of its nearest numbered ancestor; 0 if none.
    fn last_move_no_at(&self, id: NodeId) -> u32 {
        let mut current = self.game.node(id);
        while let Some(node) = current {
            if let Some(move_no) = node.move_no() {
                return move_no;
            }
            current = node.parent();
        }
        0
    }
}
