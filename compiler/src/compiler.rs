//! Lowers a parsed regex into the runtime's byte-encoded program.
//!
//! Emission is a single pass over the tree. Jump and split operands whose
//! targets are not yet known are reserved as placeholder offsets, collected
//! per node, and patched once the target position is reached.

use weft_runtime::{Opcode, Program, OFFSET_SIZE, SEARCH_PREFIX_LEN};

use crate::ast::{AstNode, AstOp, ParsedRegex};

/// Lowers a parse product into an executable program.
pub fn lower(parsed: ParsedRegex) -> Program {
    let mut emitter = Emitter::default();

    emitter.write_search_prefix();
    emitter.compile_node(&parsed.ast);
    emitter.push_opcode(Opcode::Match);

    Program {
        bytecode: emitter.bytecode,
        matchers: parsed.matchers,
        save_slot_count: parsed.capture_count * 2,
    }
}

#[derive(Default)]
struct Emitter {
    bytecode: Vec<u8>,
}

impl Emitter {
    fn here(&self) -> usize {
        self.bytecode.len()
    }

    fn push_opcode(&mut self, opcode: Opcode) {
        self.bytecode.push(opcode as u8);
    }

    fn push_codepoint(&mut self, cp: char) {
        let mut buf = [0u8; 4];
        self.bytecode
            .extend_from_slice(cp.encode_utf8(&mut buf).as_bytes());
    }

    /// Reserves an offset operand, returning its position for later
    /// patching.
    fn alloc_offset(&mut self) -> usize {
        let at = self.here();
        self.bytecode.extend_from_slice(&[0u8; OFFSET_SIZE]);
        at
    }

    fn patch_offset(&mut self, at: usize, target: usize) {
        let target = weft_runtime::Offset::try_from(target)
            .expect("program exceeds the addressable offset range");
        self.bytecode[at..at + OFFSET_SIZE].copy_from_slice(&target.to_le_bytes());
    }

    /// Emits the unanchored entry loop: either enter the pattern right
    /// here (the higher-priority branch, so the earliest entry wins), or
    /// consume one codepoint and retry.
    fn write_search_prefix(&mut self) {
        debug_assert!(self.bytecode.is_empty());

        self.push_opcode(Opcode::SplitPrioritizeChild);
        let enter = self.alloc_offset();
        self.patch_offset(enter, SEARCH_PREFIX_LEN);

        self.push_opcode(Opcode::AnyChar);
        self.push_opcode(Opcode::SplitPrioritizeParent);
        let retry = self.alloc_offset();
        self.patch_offset(retry, 1 + OFFSET_SIZE);
    }

    /// Emits a node with its quantifier expansion and returns its start
    /// position.
    fn compile_node(&mut self, node: &AstNode) -> usize {
        let start = self.here();
        let mut goto_end = Vec::new();

        if node.quantifier.allows_none() {
            self.push_opcode(Opcode::SplitPrioritizeParent);
            goto_end.push(self.alloc_offset());
        }

        let mut body = self.compile_node_inner(node);
        // mandatory repetitions are unrolled
        for _ in 1..node.quantifier.min_repeats() {
            body = self.compile_node_inner(node);
        }

        if node.quantifier.allows_infinite_repeat() {
            // looping back is the higher-priority branch; quantifiers are
            // greedy
            self.push_opcode(Opcode::SplitPrioritizeChild);
            let back = self.alloc_offset();
            self.patch_offset(back, body);
        } else {
            let max = node
                .quantifier
                .max_repeats()
                .expect("bounded quantifier has an upper bound");
            for _ in node.quantifier.min_repeats().max(1)..max {
                self.push_opcode(Opcode::SplitPrioritizeParent);
                goto_end.push(self.alloc_offset());
                self.compile_node_inner(node);
            }
        }

        let end = self.here();
        for at in goto_end {
            self.patch_offset(at, end);
        }

        start
    }

    /// Emits one instance of the node body, wrapped in its save pair when
    /// the node opens a capture group.
    fn compile_node_inner(&mut self, node: &AstNode) -> usize {
        let start = self.here();

        let capture = node.capture();
        if let Some(group) = capture {
            self.push_save(group * 2);
        }

        match &node.op {
            AstOp::Literal(value) => {
                self.push_opcode(Opcode::Literal);
                self.push_codepoint(*value);
            }
            AstOp::AnyChar => self.push_opcode(Opcode::AnyChar),
            AstOp::Matcher(id) => {
                assert!(
                    *id <= u8::MAX as usize,
                    "matcher id exceeds the one-byte operand range"
                );
                self.push_opcode(Opcode::Matcher);
                self.bytecode.push(*id as u8);
            }
            AstOp::Sequence { children, .. } => {
                for child in children {
                    self.compile_node(child);
                }
            }
            AstOp::Alternation { lhs, rhs, .. } => {
                self.push_opcode(Opcode::SplitPrioritizeParent);
                let to_rhs = self.alloc_offset();

                self.compile_node(lhs);
                self.push_opcode(Opcode::Jump);
                let to_end = self.alloc_offset();

                let rhs_start = self.compile_node(rhs);
                self.patch_offset(to_rhs, rhs_start);
                let end = self.here();
                self.patch_offset(to_end, end);
            }
            AstOp::LineStart => self.push_opcode(Opcode::LineStart),
            AstOp::LineEnd => self.push_opcode(Opcode::LineEnd),
            AstOp::WordBoundary => self.push_opcode(Opcode::WordBoundary),
            AstOp::NotWordBoundary => self.push_opcode(Opcode::NotWordBoundary),
            AstOp::SubjectBegin => self.push_opcode(Opcode::SubjectBegin),
            AstOp::SubjectEnd => self.push_opcode(Opcode::SubjectEnd),
        }

        if let Some(group) = capture {
            self.push_save(group * 2 + 1);
        }

        start
    }

    fn push_save(&mut self, slot: usize) {
        assert!(
            slot <= u8::MAX as usize,
            "save slot exceeds the one-byte operand range"
        );
        self.push_opcode(Opcode::Save);
        self.bytecode.push(slot as u8);
    }
}
