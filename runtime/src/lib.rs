//! Execution half of the weft regex engine: the byte-encoded program model
//! and the threaded virtual machine that runs it against a subject.
//!
//! A program is produced by the `weft-compiler` crate and executed here:
//!
//! ```rust
//! use weft_runtime::{execute, ExecOptions, Mode};
//!
//! // Programs are normally produced by `weft_compiler::compile`; this one
//! // was assembled by hand and matches the pattern `a`.
//! use weft_runtime::{Opcode, Program};
//!
//! let program = Program {
//!     bytecode: vec![
//!         // search prefix
//!         Opcode::SplitPrioritizeChild as u8, 11, 0, 0, 0,
//!         Opcode::AnyChar as u8,
//!         Opcode::SplitPrioritizeParent as u8, 5, 0, 0, 0,
//!         // the pattern itself
//!         Opcode::Save as u8, 0,
//!         Opcode::Literal as u8, b'a',
//!         Opcode::Save as u8, 1,
//!         Opcode::Match as u8,
//!     ],
//!     matchers: vec![],
//!     save_slot_count: 2,
//! };
//!
//! let captures = execute(&program, "xay", ExecOptions::new(Mode::Search))
//!     .expect("subject contains an 'a'");
//! assert_eq!(Some((1, 2)), captures.group(0));
//! ```

use std::fmt::Display;

use thiserror::Error;

pub mod classes;
pub mod cursor;
mod sparse_set;
pub mod vm;

pub use classes::{class_escape, is_word, CharClass, ClassEscape, ClassMatcher, CLASS_ESCAPES};
pub use vm::{execute, Captures, ExecOptions, Mode, ThreadedVm};

/// Jump and split operands: byte offsets into the program, fixed-width
/// little-endian.
pub type Offset = u32;

/// Encoded width of an [`Offset`] operand.
pub const OFFSET_SIZE: usize = std::mem::size_of::<Offset>();

/// Byte length of the search prefix every program starts with: a split, an
/// any-char and a second split, with one offset operand per split.
///
/// Anchored execution enters the program immediately past the prefix.
pub const SEARCH_PREFIX_LEN: usize = 3 + 2 * OFFSET_SIZE;

/// One-byte instruction tags of the program encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Match = 0,
    Literal,
    AnyChar,
    Matcher,
    Jump,
    SplitPrioritizeParent,
    SplitPrioritizeChild,
    Save,
    LineStart,
    LineEnd,
    WordBoundary,
    NotWordBoundary,
    SubjectBegin,
    SubjectEnd,
}

impl Opcode {
    /// Decodes an opcode tag from its byte representation.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let opcode = match byte {
            0 => Opcode::Match,
            1 => Opcode::Literal,
            2 => Opcode::AnyChar,
            3 => Opcode::Matcher,
            4 => Opcode::Jump,
            5 => Opcode::SplitPrioritizeParent,
            6 => Opcode::SplitPrioritizeChild,
            7 => Opcode::Save,
            8 => Opcode::LineStart,
            9 => Opcode::LineEnd,
            10 => Opcode::WordBoundary,
            11 => Opcode::NotWordBoundary,
            12 => Opcode::SubjectBegin,
            13 => Opcode::SubjectEnd,
            _ => return None,
        };

        Some(opcode)
    }
}

/// A decoded instruction: an opcode together with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    Literal(char),
    AnyChar,
    Matcher(usize),
    Jump(Offset),
    SplitPrioritizeParent(Offset),
    SplitPrioritizeChild(Offset),
    Save(usize),
    LineStart,
    LineEnd,
    WordBoundary,
    NotWordBoundary,
    SubjectBegin,
    SubjectEnd,
    Match,
}

impl Display for Inst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inst::Literal(value) => write!(f, "literal {:?}", value),
            Inst::AnyChar => write!(f, "any char"),
            Inst::Matcher(id) => write!(f, "matcher {}", id),
            Inst::Jump(target) => write!(f, "jump {}", target),
            Inst::SplitPrioritizeParent(target) => {
                write!(f, "split (prioritize parent) {}", target)
            }
            Inst::SplitPrioritizeChild(target) => {
                write!(f, "split (prioritize child) {}", target)
            }
            Inst::Save(slot) => write!(f, "save {}", slot),
            Inst::LineStart => write!(f, "line start"),
            Inst::LineEnd => write!(f, "line end"),
            Inst::WordBoundary => write!(f, "word boundary"),
            Inst::NotWordBoundary => write!(f, "not word boundary"),
            Inst::SubjectBegin => write!(f, "subject begin"),
            Inst::SubjectEnd => write!(f, "subject end"),
            Inst::Match => write!(f, "match"),
        }
    }
}

/// Ways a byte stream can fail to decode as a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("offset {at} is outside the program")]
    OutOfBounds { at: usize },

    #[error("unknown opcode byte {byte:#04x} at offset {at}")]
    UnknownOpcode { byte: u8, at: usize },

    #[error("truncated operand at offset {at}")]
    TruncatedOperand { at: usize },

    #[error("literal operand at offset {at} is not valid utf-8")]
    InvalidLiteral { at: usize },
}

/// A compiled regex: the byte-encoded instruction stream, the matcher table
/// referenced by `Matcher` instructions, and the number of save slots
/// execution needs (two per capture group).
///
/// A program is read-only during execution and may be shared across
/// concurrent executions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub bytecode: Vec<u8>,
    pub matchers: Vec<ClassMatcher>,
    pub save_slot_count: usize,
}

impl Program {
    /// Decodes the instruction at `pos`, returning it along with the offset
    /// of the following instruction.
    pub fn decode_at(&self, pos: usize) -> Result<(Inst, usize), DecodeError> {
        let byte = *self
            .bytecode
            .get(pos)
            .ok_or(DecodeError::OutOfBounds { at: pos })?;
        let opcode =
            Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode { byte, at: pos })?;
        let operand_at = pos + 1;

        let decoded = match opcode {
            Opcode::Match => (Inst::Match, operand_at),
            Opcode::AnyChar => (Inst::AnyChar, operand_at),
            Opcode::LineStart => (Inst::LineStart, operand_at),
            Opcode::LineEnd => (Inst::LineEnd, operand_at),
            Opcode::WordBoundary => (Inst::WordBoundary, operand_at),
            Opcode::NotWordBoundary => (Inst::NotWordBoundary, operand_at),
            Opcode::SubjectBegin => (Inst::SubjectBegin, operand_at),
            Opcode::SubjectEnd => (Inst::SubjectEnd, operand_at),
            Opcode::Literal => {
                let (value, width) = cursor::decode_utf8(&self.bytecode[operand_at..])
                    .ok_or(DecodeError::InvalidLiteral { at: operand_at })?;
                (Inst::Literal(value), operand_at + width)
            }
            Opcode::Matcher => {
                let id = *self
                    .bytecode
                    .get(operand_at)
                    .ok_or(DecodeError::TruncatedOperand { at: operand_at })?;
                (Inst::Matcher(id as usize), operand_at + 1)
            }
            Opcode::Save => {
                let slot = *self
                    .bytecode
                    .get(operand_at)
                    .ok_or(DecodeError::TruncatedOperand { at: operand_at })?;
                (Inst::Save(slot as usize), operand_at + 1)
            }
            Opcode::Jump | Opcode::SplitPrioritizeParent | Opcode::SplitPrioritizeChild => {
                let target = self.read_offset(operand_at)?;
                let inst = match opcode {
                    Opcode::Jump => Inst::Jump(target),
                    Opcode::SplitPrioritizeParent => Inst::SplitPrioritizeParent(target),
                    _ => Inst::SplitPrioritizeChild(target),
                };
                (inst, operand_at + OFFSET_SIZE)
            }
        };

        Ok(decoded)
    }

    /// Walks the whole byte stream, classifying every byte as an opcode or
    /// an operand of the preceding opcode. Fails if any byte is left over.
    pub fn disassemble(&self) -> Result<Vec<(usize, Inst)>, DecodeError> {
        let mut insts = Vec::new();
        let mut pos = 0;

        while pos < self.bytecode.len() {
            let (inst, next) = self.decode_at(pos)?;
            insts.push((pos, inst));
            pos = next;
        }

        Ok(insts)
    }

    fn read_offset(&self, at: usize) -> Result<Offset, DecodeError> {
        self.bytecode
            .get(at..at + OFFSET_SIZE)
            .and_then(|bytes| bytes.try_into().ok())
            .map(Offset::from_le_bytes)
            .ok_or(DecodeError::TruncatedOperand { at })
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.disassemble() {
            Ok(insts) => {
                for (pos, inst) in insts {
                    writeln!(f, "{:04}: {}", pos, inst)?;
                }
                Ok(())
            }
            Err(err) => writeln!(f, "invalid program: {}", err),
        }
    }
}

/// Renders the disassembly of a program, one instruction per line prefixed
/// with its byte offset.
pub fn dump(program: &Program) -> Result<String, DecodeError> {
    program.disassemble().map(|insts| {
        insts
            .into_iter()
            .map(|(pos, inst)| format!("{:04}: {}\n", pos, inst))
            .collect()
    })
}
