//! Purpose: Regression coverage for parse-failure category mapping.
//! Exports: Integration tests only.
//! Role: Verify stable category labels used in `MalformedJson` hints.
//! Invariants: Category mapping remains deterministic for representative errors.
//! Notes: Uses source include to exercise internal helper logic without widening API surface.

#[path = "../src/json/parse.rs"]
#[allow(dead_code)]
mod parse;

use parse::ParseFailureCategory;

#[test]
fn category_mapping_handles_syntax_and_eof() {
    let syntax_err = parse::from_slice(br#"{"a":}"#).unwrap_err();
    assert_eq!(
        parse::categorize_error(&syntax_err),
        ParseFailureCategory::Syntax
    );

    let eof_err = parse::from_slice(br#"{"Channels": ["#).unwrap_err();
    assert_eq!(parse::categorize_error(&eof_err), ParseFailureCategory::Eof);
}

#[test]
fn invalid_utf8_is_a_syntax_failure() {
    let err = parse::from_slice(&[b'"', 0xff, b'"']).unwrap_err();
    assert_eq!(parse::categorize_error(&err), ParseFailureCategory::Syntax);
}

#[test]
fn deep_nesting_is_rejected() {
    let depth = 256usize;
    let mut payload = String::with_capacity(depth * 2 + 1);
    for _ in 0..depth {
        payload.push('[');
    }
    payload.push('0');
    for _ in 0..depth {
        payload.push(']');
    }
    assert!(parse::from_slice(payload.as_bytes()).is_err());
}

#[test]
fn duplicate_keys_keep_the_last_value() {
    let value = parse::from_slice(br#"{"a":1,"a":2}"#).expect("parse");
    assert_eq!(value["a"], 2);
}

#[test]
fn hint_contains_category_position_and_context() {
    let err = parse::from_slice(b"{\n  \"a\": tru }").unwrap_err();
    let hint = parse::hint_for_error(&err, "test.context");
    assert!(hint.contains("parse category: syntax"));
    assert!(hint.contains("line 2"));
    assert!(hint.contains("context: test.context"));
}
