//! Compilation half of the weft regex engine: parsing a pattern in the
//! supported ECMAScript-like subset and lowering it to the byte-encoded
//! program executed by the `weft-runtime` crate.
//!
//! # Supported syntax
//!
//! - alternation `|`, grouping `( )` (every group captures), any-char `.`
//! - quantifiers `*`, `+`, `?`, `{n}`, `{n,}`, `{n,m}`, `{,m}` — all greedy
//! - anchors `^`, `$`, `\b`, `\B`, `` \` ``, `\'`
//! - class escapes `\d \D \w \W \s \S`, control escapes `\f \n \r \t \v`
//! - bracket expressions with ranges, negation and class escapes
//!
//! # Example
//!
//! ```rust
//! use weft_compiler::compile;
//! use weft_runtime::{execute, ExecOptions, Mode};
//!
//! let program = compile(r"(\w+)@(\w+)").expect("pattern compiles");
//!
//! let subject = "mail me at kath@example";
//! let options = ExecOptions::new(Mode::Search).longest();
//! let captures = execute(&program, subject, options)
//!     .expect("subject contains an address");
//!
//! assert_eq!(Some("kath@example"), captures.group_str(subject, 0));
//! assert_eq!(Some("kath"), captures.group_str(subject, 1));
//! assert_eq!(Some("example"), captures.group_str(subject, 2));
//! ```

pub mod ast;
pub mod compiler;
pub mod parser;

pub use compiler::lower;
pub use parser::{parse, ParseError, ParseErrorKind};

use weft_runtime::Program;

/// Compiles a pattern into an executable program.
pub fn compile(pattern: &str) -> Result<Program, ParseError> {
    parser::parse(pattern).map(compiler::lower)
}

/// Report-only variant of [`compile`]: checks that a pattern parses and
/// hands back the diagnostic instead of aborting the caller. The
/// diagnostic is also emitted on the debug log so interactive hosts can
/// surface it without interrupting a session.
pub fn validate(pattern: &str) -> Option<ParseError> {
    match parser::parse(pattern) {
        Ok(_) => None,
        Err(err) => {
            log::debug!("{}", err);
            Some(err)
        }
    }
}
