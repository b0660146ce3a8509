//! Command-line argument templates for external programs.
//!
//! A template is a single string such as `-t %1 --xml`; `%1` stands for the
//! search term. After substitution the string is split into arguments with
//! shell-like quoting: text between a pair of matching quotes is one
//! argument, everything else splits on whitespace.

use regex_lite::Regex;
use std::sync::LazyLock;

static QUOTED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""(.*?)"|'(.*?)'"#).ok());

/// Placeholder for the search term.
pub const TERM: &str = "%1";

/// Splits `text` into arguments.
///
/// `dogs "and cats" here` → `["dogs", "and cats", "here"]`. Quoted text is
/// kept as is, even when empty; an unmatched quote is ordinary text.
pub fn split_arguments(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut pos = 0;
    if let Some(re) = QUOTED.as_ref() {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_words(&mut args, &text[pos..whole.start()]);
            let inner = caps.get(1).or_else(|| caps.get(2));
            args.push(inner.map(|m| m.as_str()).unwrap_or_default().to_string());
            pos = whole.end();
        }
    }
    push_words(&mut args, &text[pos..]);
    args
}

fn push_words(args: &mut Vec<String>, text: &str) {
    args.extend(text.split_whitespace().map(String::from));
}

/// Whether `term` is already enclosed in a pair of matching quotes.
pub fn is_quoted(term: &str) -> bool {
    let mut chars = term.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('"' | '\'')), Some(last)) => first == last,
        _ => false,
    }
}

/// Wraps `term` in double quotes unless it is quoted already.
pub fn quote_term(term: &str) -> String {
    if is_quoted(term) {
        term.to_string()
    } else {
        format!("\"{term}\"")
    }
}

/// Puts `term` into `template` in place of every `%1`.
///
/// The term is quoted so it stays one argument; a `%1` the template already
/// quotes loses its quotes first so the term is not quoted twice.
pub fn substitute(template: &str, term: &str) -> String {
    let quoted = quote_term(term);
    template
        .replace("\"%1\"", TERM)
        .replace("'%1'", TERM)
        .replace(TERM, &quoted)
}

/// Builds the argument vector for `template` with `term` substituted.
pub fn build_arguments(template: &str, term: &str) -> Vec<String> {
    split_arguments(&substitute(template, term))
}
