//! Submatch extraction scenarios: group numbering, participation, and the
//! interaction of priority order with greedy quantifiers.

use pretty_assertions::assert_eq;

use weft_compiler::compile;
use weft_runtime::{execute, Captures, ExecOptions, Mode, Program};

fn program(pattern: &str) -> Program {
    compile(pattern).expect("pattern compiles")
}

fn full(pattern: &str, subject: &str) -> Captures {
    execute(&program(pattern), subject, ExecOptions::new(Mode::Full))
        .unwrap_or_else(|| panic!("pattern {:?} should match {:?}", pattern, subject))
}

fn search_longest(pattern: &str, subject: &str) -> Captures {
    execute(
        &program(pattern),
        subject,
        ExecOptions::new(Mode::Search).longest(),
    )
    .unwrap_or_else(|| panic!("pattern {:?} should match {:?}", pattern, subject))
}

#[test]
fn should_report_the_last_iteration_of_a_repeated_group() {
    let subject = "fooquxbarbaz";
    let captures = full("^(foo|qux|baz)+(bar)?baz$", subject);

    assert_eq!(Some(subject), captures.group_str(subject, 0));
    assert_eq!(Some("qux"), captures.group_str(subject, 1));
    assert_eq!(Some("bar"), captures.group_str(subject, 2));
}

#[test]
fn should_leave_skipped_optional_groups_unset() {
    let subject = "fooquxbaz";
    let captures = full("^(foo|qux|baz)+(bar)?baz$", subject);

    assert_eq!(Some("qux"), captures.group_str(subject, 1));
    assert_eq!(None, captures.group(2));
}

#[test]
fn should_capture_the_boundary_delimited_word() {
    let subject = "qux foo baz";
    let captures = full(r".*\b(foo|bar)\b.*", subject);

    assert_eq!(Some(subject), captures.group_str(subject, 0));
    assert_eq!(Some("foo"), captures.group_str(subject, 1));
}

#[test]
fn should_maximize_greedy_spans_in_longest_search() {
    let subject = "blahfoobarfoobaz";
    let captures = search_longest(r"f.*a(.*o)", subject);

    assert_eq!(Some("foobarfoo"), captures.group_str(subject, 0));
    assert_eq!(Some("rfoo"), captures.group_str(subject, 1));
}

#[test]
fn should_maximize_greedy_spans_over_prose() {
    let subject = "mais que fais la police";
    let captures = search_longest(r"f.*a(.*o)", subject);

    assert_eq!(Some("fais la po"), captures.group_str(subject, 0));
    assert_eq!(Some(" po"), captures.group_str(subject, 1));
}

#[test]
fn should_number_nested_groups_in_open_paren_order() {
    let subject = "ab";
    let captures = full("(a(b))", subject);

    assert_eq!(3, captures.group_count());
    assert_eq!(Some((0, 2)), captures.group(0));
    assert_eq!(Some((0, 2)), captures.group(1));
    assert_eq!(Some((1, 2)), captures.group(2));
}

#[test]
fn should_leave_the_losing_alternation_branch_unset() {
    let subject = "b";
    let captures = full("(a)|(b)", subject);

    assert_eq!(None, captures.group(1));
    assert_eq!(Some((0, 1)), captures.group(2));
}

#[test]
fn should_span_group_zero_over_the_search_match_only() {
    let subject = "xxabyy";
    let captures = execute(
        &program("a(b)"),
        subject,
        ExecOptions::new(Mode::Search),
    )
    .expect("subject contains ab");

    assert_eq!(Some((2, 4)), captures.group(0));
    assert_eq!(Some((3, 4)), captures.group(1));
}

#[test]
fn should_report_byte_spans_for_multibyte_subjects() {
    let subject = "héllo";
    let captures = execute(
        &program("(l+)"),
        subject,
        ExecOptions::new(Mode::Search).longest(),
    )
    .expect("subject contains an l run");

    // é takes two bytes, so the l-run starts at byte 3
    assert_eq!(Some((3, 5)), captures.group(1));
    assert_eq!(Some("ll"), captures.group_str(subject, 1));
}

#[test]
fn should_pair_save_slots_for_every_participating_group() {
    let subject = "fooquxbarbaz";
    let captures = full("^(foo|qux|baz)+(bar)?baz$", subject);

    for group in 0..captures.group_count() {
        if let Some((start, end)) = captures.group(group) {
            assert!(start <= end, "group {} spans backwards", group);
            assert!(end <= subject.len(), "group {} exceeds the subject", group);
        }
    }
}
