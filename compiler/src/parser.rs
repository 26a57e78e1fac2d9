//! Recursive descent parser for the supported pattern syntax.
//!
//! The grammar follows the naming of the ECMAScript specification, though
//! the accepted syntax is deliberately a subset: no lookaround, no
//! backreferences, no numeric escapes. See the crate documentation for the
//! full surface.

use thiserror::Error;

use weft_runtime::{class_escape, ClassMatcher};

use crate::ast::{AstNode, AstOp, ParsedRegex, Quantifier};

/// Codepoints that must be escaped to be matched literally.
const SYNTAX_CHARACTERS: &str = "^$\\.*+?()[]{}|";

/// What went wrong while parsing a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty alternative")]
    EmptyAlternative,

    #[error("unclosed parenthesis")]
    UnclosedGroup,

    #[error("unclosed character class")]
    UnclosedClass,

    #[error("invalid range specified")]
    InvalidRange,

    #[error("expected closing brace")]
    MissingClosingBrace,

    #[error("unknown atom escape '{0}'")]
    UnknownEscape(char),

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
}

/// A parse failure, carrying the pattern split at the offending position so
/// the diagnostic can point into the pattern text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("regex parse error: {kind} at '{before}«HERE»{after}'")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    before: String,
    after: String,
}

impl ParseError {
    fn new(kind: ParseErrorKind, pattern: &str, offset: usize) -> Self {
        Self {
            kind,
            before: pattern[..offset].to_string(),
            after: pattern[offset..].to_string(),
        }
    }

    /// Byte offset of the position the diagnostic points at.
    pub fn offset(&self) -> usize {
        self.before.len()
    }
}

/// Parses a pattern into its syntax tree, capture count and matcher table.
pub fn parse(pattern: &str) -> Result<ParsedRegex, ParseError> {
    Parser::new(pattern).run()
}

struct Parser<'a> {
    pattern: &'a str,
    chars: Vec<(usize, char)>,
    idx: usize,
    capture_count: usize,
    matchers: Vec<ClassMatcher>,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            chars: pattern.char_indices().collect(),
            idx: 0,
            capture_count: 1,
            matchers: Vec::new(),
        }
    }

    fn run(mut self) -> Result<ParsedRegex, ParseError> {
        let ast = self.disjunction(Some(0))?;

        // a stray `)` or quantifier would otherwise be silently dropped
        if let Some(cp) = self.peek() {
            return Err(self.error(ParseErrorKind::UnexpectedChar(cp)));
        }

        Ok(ParsedRegex {
            ast,
            capture_count: self.capture_count,
            matchers: self.matchers,
        })
    }

    // Disjunction :: Alternative | Alternative `|` Disjunction
    //
    // Only the outermost node of a disjunction carries the capture group of
    // the enclosing parentheses.
    fn disjunction(&mut self, capture: Option<usize>) -> Result<AstNode, ParseError> {
        let lhs = self.alternative()?;

        if self.peek() != Some('|') {
            let mut node = lhs;
            if let AstOp::Sequence { capture: slot, .. } = &mut node.op {
                *slot = capture;
            }
            return Ok(node);
        }

        self.bump();
        let rhs = self.disjunction(None)?;

        Ok(AstNode::new(AstOp::Alternation {
            capture,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    // Alternative :: Term+
    fn alternative(&mut self) -> Result<AstNode, ParseError> {
        let mut children = Vec::new();
        while let Some(node) = self.term()? {
            children.push(node);
        }

        if children.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyAlternative));
        }

        Ok(AstNode::new(AstOp::Sequence {
            capture: None,
            children,
        }))
    }

    // Term :: Assertion | Atom Quantifier?
    fn term(&mut self) -> Result<Option<AstNode>, ParseError> {
        if let Some(node) = self.assertion() {
            return Ok(Some(node));
        }

        match self.atom()? {
            Some(mut node) => {
                node.quantifier = self.quantifier()?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    // Assertion :: `^` | `$` | `\b` | `\B` | `\`` | `\'`
    fn assertion(&mut self) -> Option<AstNode> {
        let op = match self.peek()? {
            '^' => AstOp::LineStart,
            '$' => AstOp::LineEnd,
            '\\' => {
                let op = match self.peek_second()? {
                    'b' => AstOp::WordBoundary,
                    'B' => AstOp::NotWordBoundary,
                    '`' => AstOp::SubjectBegin,
                    '\'' => AstOp::SubjectEnd,
                    _ => return None,
                };
                self.bump();
                op
            }
            _ => return None,
        };

        self.bump();
        Some(AstNode::new(op))
    }

    // Atom :: `.` | `(` Disjunction `)` | `\` AtomEscape
    //       | `[` CharacterClass `]` | PatternCharacter
    fn atom(&mut self) -> Result<Option<AstNode>, ParseError> {
        let cp = match self.peek() {
            Some(cp) => cp,
            None => return Ok(None),
        };

        match cp {
            '.' => {
                self.bump();
                Ok(Some(AstNode::new(AstOp::AnyChar)))
            }
            '(' => {
                self.bump();
                // groups number in source order of their open parenthesis
                let capture = self.capture_count;
                self.capture_count += 1;

                let content = self.disjunction(Some(capture))?;
                if self.peek() != Some(')') {
                    return Err(self.error(ParseErrorKind::UnclosedGroup));
                }
                self.bump();
                Ok(Some(content))
            }
            '\\' => {
                self.bump();
                self.atom_escape().map(Some)
            }
            '[' => {
                self.bump();
                self.character_class().map(Some)
            }
            _ if SYNTAX_CHARACTERS.contains(cp) => Ok(None),
            _ => {
                self.bump();
                Ok(Some(AstNode::new(AstOp::Literal(cp))))
            }
        }
    }

    // AtomEscape :: CharacterClassEscape | ControlEscape | SyntaxCharacter
    fn atom_escape(&mut self) -> Result<AstNode, ParseError> {
        let cp = match self.bump() {
            Some(cp) => cp,
            None => return Err(self.error(ParseErrorKind::UnknownEscape('\\'))),
        };

        if let Some(entry) = class_escape(cp) {
            let matcher_id = self.matchers.len();
            self.matchers.push(ClassMatcher::from(entry));
            return Ok(AstNode::new(AstOp::Matcher(matcher_id)));
        }

        if let Some(value) = control_escape(cp) {
            return Ok(AstNode::new(AstOp::Literal(value)));
        }

        if SYNTAX_CHARACTERS.contains(cp) {
            return Ok(AstNode::new(AstOp::Literal(cp)));
        }

        Err(self.error(ParseErrorKind::UnknownEscape(cp)))
    }

    // CharacterClass :: `^`? ClassItem* — consumed up to the closing `]`.
    //
    // Items are single codepoints, ranges, a literal `-` where no range can
    // be formed, and class escapes, which contribute their class predicate
    // with the appropriate polarity plus their extra codepoints.
    fn character_class(&mut self) -> Result<AstNode, ParseError> {
        let negated = self.peek() == Some('^');
        if negated {
            self.bump();
        }

        let mut matcher = ClassMatcher::new(negated);

        loop {
            let cp = match self.peek() {
                None => return Err(self.error(ParseErrorKind::UnclosedClass)),
                Some(']') => break,
                Some(cp) => cp,
            };
            self.bump();

            if cp == '-' {
                matcher.push_range('-', '-');
                continue;
            }

            let cp = if cp == '\\' {
                let escaped = match self.peek() {
                    Some(escaped) => escaped,
                    None => return Err(self.error(ParseErrorKind::UnclosedClass)),
                };

                if let Some(entry) = class_escape(escaped) {
                    self.bump();
                    matcher.push_class(entry.class, !entry.negated);
                    for extra in entry.extra_chars.chars() {
                        matcher.push_range(extra, extra);
                    }
                    continue;
                }

                self.bump();
                control_escape(escaped).unwrap_or(escaped)
            } else {
                cp
            };

            if self.peek() == Some('-') {
                self.bump();
                let max = match self.peek() {
                    None => return Err(self.error(ParseErrorKind::UnclosedClass)),
                    Some(max) => max,
                };
                self.bump();
                if cp > max {
                    return Err(self.error(ParseErrorKind::InvalidRange));
                }
                matcher.push_range(cp, max);
            } else {
                matcher.push_range(cp, cp);
            }
        }
        self.bump();

        let matcher_id = self.matchers.len();
        self.matchers.push(matcher);
        Ok(AstNode::new(AstOp::Matcher(matcher_id)))
    }

    // Quantifier :: `*` | `+` | `?` | `{` n? (`,` m?)? `}`
    fn quantifier(&mut self) -> Result<Quantifier, ParseError> {
        let quantifier = match self.peek() {
            Some('*') => Quantifier::ZeroOrMore,
            Some('+') => Quantifier::OneOrMore,
            Some('?') => Quantifier::ZeroOrOne,
            Some('{') => {
                self.bump();
                let min = self.integer();
                let max = if self.peek() == Some(',') {
                    self.bump();
                    self.integer()
                } else {
                    min
                };

                if self.peek() != Some('}') {
                    return Err(self.error(ParseErrorKind::MissingClosingBrace));
                }
                self.bump();

                return match (min, max) {
                    (None, None) => Err(self.error(ParseErrorKind::InvalidRange)),
                    (Some(min), Some(max)) if min > max => {
                        Err(self.error(ParseErrorKind::InvalidRange))
                    }
                    // `{,m}` counts from zero
                    (min, max) => Ok(Quantifier::Range {
                        min: min.unwrap_or(0),
                        max,
                    }),
                };
            }
            _ => return Ok(Quantifier::One),
        };

        self.bump();
        Ok(quantifier)
    }

    fn integer(&mut self) -> Option<usize> {
        let mut value = 0usize;
        let mut digits = 0;

        while let Some(digit) = self.peek().and_then(|cp| cp.to_digit(10)) {
            self.bump();
            value = value.saturating_mul(10).saturating_add(digit as usize);
            digits += 1;
        }

        (digits > 0).then_some(value)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|&(_, cp)| cp)
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.idx + 1).map(|&(_, cp)| cp)
    }

    fn bump(&mut self) -> Option<char> {
        let cp = self.peek()?;
        self.idx += 1;
        Some(cp)
    }

    /// Byte offset of the current position, for diagnostics.
    fn offset(&self) -> usize {
        self.chars
            .get(self.idx)
            .map(|&(offset, _)| offset)
            .unwrap_or(self.pattern.len())
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pattern, self.offset())
    }
}

fn control_escape(cp: char) -> Option<char> {
    match cp {
        'f' => Some('\u{0c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0b}'),
        _ => None,
    }
}
