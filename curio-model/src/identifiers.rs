//! Library of Congress control numbers and ISBNs.

use regex_lite::Regex;
use std::sync::LazyLock;

static LCCN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?i)[a-z]{0,3}\s*(\d{2}|\d{4})-?\d{1,6}$").ok());

/// Expands an LCCN to its normalized form: whitespace removed and the serial
/// number after the hyphen zero-padded to six digits.
///
/// `"89-456"` → `"89000456"`, `"gm 71-2450"` → `"gm71002450"`.
pub fn formalize_lccn(value: &str) -> String {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.split_once('-') {
        Some((prefix, serial)) => format!("{prefix}{serial:0>6}"),
        None => compact,
    }
}

pub fn is_valid_lccn(value: &str) -> bool {
    LCCN.as_ref().is_some_and(|re| re.is_match(value.trim()))
}

/// Removes hyphens and spaces from an ISBN.
pub fn normalize_isbn(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Checks the length and check digit of an ISBN-10 or ISBN-13.
pub fn is_valid_isbn(value: &str) -> bool {
    let isbn = normalize_isbn(value);
    let digits: Vec<u32> = isbn
        .chars()
        .enumerate()
        .filter_map(|(i, c)| match c {
            'X' if i == 9 && isbn.len() == 10 => Some(10),
            _ => c.to_digit(10),
        })
        .collect();
    if digits.len() != isbn.len() {
        return false;
    }
    match digits.len() {
        10 => {
            let sum: u32 = digits
                .iter()
                .zip((1..=10).rev())
                .map(|(d, w)| d * w)
                .sum();
            sum % 11 == 0
        }
        13 => {
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
                .sum();
            sum % 10 == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lccn_formalization() {
        assert_eq!(formalize_lccn("89-456"), "89000456");
        assert_eq!(formalize_lccn("2001-1114"), "2001001114");
        assert_eq!(formalize_lccn("gm 71-2450"), "gm71002450");
    }

    #[test]
    fn lccn_validation() {
        assert!(is_valid_lccn("89-456"));
        assert!(is_valid_lccn("2001-1114"));
        assert!(is_valid_lccn("gm 71-2450"));
        assert!(!is_valid_lccn("not an lccn"));
    }

    #[test]
    fn isbn_check_digits() {
        assert!(is_valid_isbn("0-596-00048-0"));
        assert!(is_valid_isbn("978-0-596-00048-6"));
        assert!(is_valid_isbn("0-8044-2957-X"));
        assert!(!is_valid_isbn("0-596-00048-1"));
        assert!(!is_valid_isbn("12345"));
    }
}
