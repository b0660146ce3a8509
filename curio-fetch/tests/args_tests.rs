//! Tests for args.rs: argument templates and the quote-aware splitter.

use curio_fetch::args::{build_arguments, is_quoted, quote_term, split_arguments, substitute};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── split_arguments ─────────────────────────────────────────────

#[test]
fn quoted_text_is_one_argument() {
    assert_eq!(
        split_arguments(r#"dogs "and cats" here"#),
        vec!["dogs", "and cats", "here"]
    );
}

#[test]
fn single_quotes_group_too() {
    assert_eq!(
        split_arguments("-t 'The Hobbit' --xml"),
        vec!["-t", "The Hobbit", "--xml"]
    );
}

#[test]
fn quotes_of_the_other_kind_are_kept_inside() {
    assert_eq!(
        split_arguments(r#"-q "it's here""#),
        vec!["-q", "it's here"]
    );
}

#[test]
fn empty_quotes_give_an_empty_argument() {
    assert_eq!(split_arguments(r#"a "" b"#), vec!["a", "", "b"]);
}

#[test]
fn unmatched_quote_is_plain_text() {
    assert_eq!(split_arguments(r#"a "b c"#), vec!["a", "\"b", "c"]);
}

#[test]
fn whitespace_only_gives_nothing() {
    assert!(split_arguments("  \t ").is_empty());
}

// ── quoting ─────────────────────────────────────────────────────

#[test]
fn quoting_detection() {
    assert!(is_quoted("\"dune\""));
    assert!(is_quoted("'dune'"));
    assert!(!is_quoted("\"dune'"));
    assert!(!is_quoted("\""));
    assert!(!is_quoted("dune"));
}

#[test]
fn terms_are_quoted_once() {
    assert_eq!(quote_term("dune"), "\"dune\"");
    assert_eq!(quote_term("'dune'"), "'dune'");
}

// ── substitute ──────────────────────────────────────────────────

#[test]
fn placeholder_is_replaced_by_quoted_term() {
    assert_eq!(substitute("-t %1 --xml", "The Hobbit"), "-t \"The Hobbit\" --xml");
}

#[test]
fn quoted_placeholder_is_not_quoted_twice() {
    assert_eq!(substitute("-t \"%1\"", "The Hobbit"), "-t \"The Hobbit\"");
    assert_eq!(substitute("-t '%1'", "The Hobbit"), "-t \"The Hobbit\"");
}

#[test]
fn every_placeholder_is_replaced() {
    assert_eq!(
        build_arguments("--title %1 --alt %1", "Dune"),
        vec!["--title", "Dune", "--alt", "Dune"]
    );
}

// ── properties ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn unquoted_words_split_on_whitespace(words in prop::collection::vec("[a-zA-Z0-9_.-]{1,8}", 0..6)) {
        let text = words.join("  ");
        prop_assert_eq!(split_arguments(&text), words);
    }

    #[test]
    fn substituted_term_stays_one_argument(term in "[a-zA-Z0-9 ]{0,20}") {
        let args = build_arguments("--search %1 --xml", &term);
        prop_assert_eq!(args, vec!["--search".to_string(), term, "--xml".to_string()]);
    }
}
