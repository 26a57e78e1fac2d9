//! Match/no-match grids over the supported syntax, mostly in full-match
//! mode where the whole subject must be covered.

use pretty_assertions::assert_eq;

use weft_compiler::compile;
use weft_runtime::{execute, ExecOptions, Mode, Program};

fn program(pattern: &str) -> Program {
    compile(pattern).expect("pattern compiles")
}

fn assert_full_matches(pattern: &str, cases: &[(&str, bool)]) {
    let program = program(pattern);

    for &(subject, expected) in cases {
        let matched = execute(&program, subject, ExecOptions::new(Mode::Full)).is_some();
        assert_eq!(
            (pattern, subject, expected),
            (pattern, subject, matched),
            "pattern {:?} against {:?}",
            pattern,
            subject
        );
    }
}

#[test]
fn should_match_star_quantified_literals() {
    assert_full_matches(
        "a*b",
        &[
            ("b", true),
            ("ab", true),
            ("aaab", true),
            ("acb", false),
            ("abc", false),
            ("", false),
        ],
    );
}

#[test]
fn should_match_anchored_any_char_runs() {
    assert_full_matches(
        "^a.*b$",
        &[
            ("afoob", true),
            ("ab", true),
            ("bab", false),
            ("", false),
        ],
    );
}

#[test]
fn should_match_alternating_groups_with_optional_tail() {
    assert_full_matches(
        "^(foo|qux|baz)+(bar)?baz$",
        &[
            ("fooquxbarbaz", true),
            ("fooquxbarbaze", false),
            ("quxbar", false),
            ("blahblah", false),
            ("bazbaz", true),
            ("quxbaz", true),
        ],
    );
}

#[test]
fn should_require_full_coverage_in_full_mode() {
    assert_full_matches(
        "(foo|bar)",
        &[("foo", true), ("bar", true), ("foobar", false)],
    );
}

#[test]
fn should_enforce_bounded_range_quantifiers() {
    assert_full_matches(
        "a{3,5}b",
        &[
            ("aab", false),
            ("aaab", true),
            ("aaaaab", true),
            ("aaaaaab", false),
        ],
    );

    assert_full_matches("a{3}b", &[("aab", false), ("aaab", true), ("aaaab", false)]);

    assert_full_matches(
        "a{3,}b",
        &[("aab", false), ("aaab", true), ("aaaaab", true)],
    );

    assert_full_matches(
        "a{,3}b",
        &[("b", true), ("ab", true), ("aaab", true), ("aaaab", false)],
    );
}

#[test]
fn should_gate_words_on_boundaries() {
    assert_full_matches(
        r".*\b(foo|bar)\b.*",
        &[
            ("qux foo baz", true),
            ("quxfoobaz", false),
            ("bar", true),
            ("foobar", false),
        ],
    );
}

#[test]
fn should_match_bracket_classes_over_multibyte_codepoints() {
    assert_full_matches(
        "[àb-dX-Z]{3,5}",
        &[
            ("càY", true),
            ("àeY", false),
            ("dcbàX", true),
            ("efg", false),
        ],
    );
}

#[test]
fn should_match_digit_class_escapes() {
    assert_full_matches(r"\d{3}", &[("123", true), ("1x3", false)]);
}

#[test]
fn should_keep_literal_dash_alongside_class_escapes() {
    assert_full_matches(r"[-\d]+", &[("123-456", true), ("123_456", false)]);
}

#[test]
fn should_find_substrings_in_search_mode() {
    let program = program("qux");

    let captures = execute(&program, "bazquxfoo", ExecOptions::new(Mode::Search))
        .expect("subject contains qux");
    assert_eq!(Some((3, 6)), captures.group(0));

    assert!(execute(&program, "bazfoo", ExecOptions::new(Mode::Search)).is_none());
}

#[test]
fn should_honor_subject_anchors_against_newlines() {
    // `^` matches after a newline, `\`` only at the very beginning
    let line_anchored = program("^foo");
    let subject_anchored = program(r"\`foo");

    let subject = "bar\nfoo";
    assert!(execute(&line_anchored, subject, ExecOptions::new(Mode::Search)).is_some());
    assert!(execute(&subject_anchored, subject, ExecOptions::new(Mode::Search)).is_none());
    assert!(execute(&subject_anchored, "foobar", ExecOptions::new(Mode::Search)).is_some());
}

#[test]
fn should_treat_negated_boundary_as_the_complement() {
    let program = program(r"a\Bb");

    assert!(execute(&program, "ab", ExecOptions::new(Mode::Full)).is_some());
    // a boundary between `a` and the end of a word run fails `\B`
    assert!(execute(&program, "a b", ExecOptions::new(Mode::Search)).is_none());
}

#[test]
fn should_match_control_escapes_literally() {
    assert_full_matches(r"a\tb", &[("a\tb", true), ("a b", false)]);
    assert_full_matches(r"a\nb", &[("a\nb", true), ("anb", false)]);
}

#[test]
fn should_return_identical_results_across_repeated_executions() {
    let program = program("^(foo|qux|baz)+(bar)?baz$");
    let subject = "fooquxbarbaz";

    let first = execute(&program, subject, ExecOptions::new(Mode::Full));
    let second = execute(&program, subject, ExecOptions::new(Mode::Full));

    assert_eq!(first, second);
}
