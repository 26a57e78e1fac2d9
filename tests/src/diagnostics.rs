//! Pattern diagnostics and program inspection: parse errors with their
//! position markers, the report-only validator, and disassembly.

use pretty_assertions::assert_eq;

use weft_compiler::{compile, validate, ParseErrorKind};
use weft_runtime::{dump, Inst, SEARCH_PREFIX_LEN};

#[test]
fn should_render_diagnostics_with_a_position_marker() {
    let cases = [
        (
            "a(b",
            "regex parse error: unclosed parenthesis at 'a(b«HERE»'",
        ),
        (
            "a[b-",
            "regex parse error: unclosed character class at 'a[b-«HERE»'",
        ),
        (
            "x|",
            "regex parse error: empty alternative at 'x|«HERE»'",
        ),
        (
            r"a\jb",
            "regex parse error: unknown atom escape 'j' at 'a\\j«HERE»b'",
        ),
    ];

    for (pattern, rendered) in cases {
        let err = compile(pattern).unwrap_err();
        assert_eq!(rendered, err.to_string(), "{}", pattern);
    }
}

#[test]
fn should_validate_without_aborting_the_caller() {
    assert!(validate("a*b").is_none());
    assert!(validate("^(foo|bar)$").is_none());

    let diagnostic = validate("a{2,1}").expect("quantifier bounds are inverted");
    assert_eq!(ParseErrorKind::InvalidRange, diagnostic.kind);
}

#[test]
fn should_disassemble_every_compiled_pattern_without_leftover_bytes() {
    let patterns = [
        "a*b",
        "^a.*b$",
        "^(foo|qux|baz)+(bar)?baz$",
        r".*\b(foo|bar)\b.*",
        "a{3,5}b",
        r"f.*a(.*o)",
        "[àb-dX-Z]{3,5}",
        r"\d{3}",
        r"[-\d]+",
        r"\`(\w+)\'",
    ];

    for pattern in patterns {
        let program = compile(pattern).expect("pattern compiles");
        let decoded = program
            .disassemble()
            .unwrap_or_else(|err| panic!("pattern {:?}: {}", pattern, err));

        // every byte is classified; the walk ends exactly on the final
        // Match terminator
        let (last_pos, last_inst) = decoded.last().copied().unwrap();
        assert_eq!(Inst::Match, last_inst, "{}", pattern);
        assert_eq!(program.bytecode.len(), last_pos + 1, "{}", pattern);

        // every jump and split lands on a decoded instruction boundary
        let boundaries: Vec<usize> = decoded.iter().map(|&(pos, _)| pos).collect();
        for &(pos, inst) in &decoded {
            let target = match inst {
                Inst::Jump(target)
                | Inst::SplitPrioritizeParent(target)
                | Inst::SplitPrioritizeChild(target) => target as usize,
                _ => continue,
            };
            assert!(
                boundaries.contains(&target),
                "{}: target {} of instruction at {} is not a boundary",
                pattern,
                target,
                pos
            );
        }
    }
}

#[test]
fn should_start_every_dump_with_the_search_prefix() {
    let program = compile("ab").expect("pattern compiles");
    let rendered = dump(&program).expect("program decodes");

    let expected_first = format!("0000: split (prioritize child) {}", SEARCH_PREFIX_LEN);
    assert!(
        rendered.starts_with(&expected_first),
        "unexpected dump head: {}",
        rendered
    );
    assert!(rendered.trim_end().ends_with("match"));
}
