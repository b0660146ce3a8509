//! Multi-value delimiters and display formatting of field values.

use crate::field::FormatFlag;

/// Separates the values of a simple multi-valued field.
pub const DELIMITER: &str = "; ";
/// Separates the rows of a table field (and person lists such as cast).
pub const ROW_DELIMITER: &str = "\n";
/// Separates the columns within one table row.
pub const COLUMN_DELIMITER: &str = "::";

/// Splits a simple multi-valued string on `;`, trimming each value.
pub fn split_values(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Splits a table value into its rows.
pub fn split_rows(value: &str) -> Vec<String> {
    value
        .split(ROW_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Splits one table row into its columns. Empty columns are kept so that
/// positions stay meaningful.
pub fn split_columns(row: &str) -> Vec<String> {
    row.split(COLUMN_DELIMITER).map(|s| s.trim().to_string()).collect()
}

pub fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join_with(values, DELIMITER)
}

pub fn join_rows<I, S>(rows: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join_with(rows, ROW_DELIMITER)
}

fn join_with<I, S>(values: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for value in values {
        let value = value.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str(delimiter);
        }
        out.push_str(value);
    }
    out
}

/// Strips BibTeX markup from a value: unescaped braces are removed, escaped
/// special characters are unescaped and `~` becomes a space.
pub fn clean_bibtex_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('&' | '%' | '$' | '#' | '_' | '{' | '}')) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            '{' | '}' => {}
            '~' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Formats raw field values for display and grouping.
///
/// Installed on a [`CollectionSchema`](crate::CollectionSchema); every entry of
/// that collection formats through it.
pub trait FieldFormatter: Send + Sync {
    /// Formats `value` according to `flag`.
    fn format(&self, value: &str, flag: FormatFlag) -> String;

    /// Text cleaning applied before formatting in bibliography collections.
    fn clean_text(&self, value: &str) -> String {
        clean_bibtex_text(value)
    }
}

/// Word lists and switches used by [`StandardFormatter`].
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Upper-case the first letter of words.
    pub capitalize: bool,
    /// Apply title and name reordering. Capitalization still applies when off.
    pub reorder: bool,
    /// Leading articles moved to the end of titles.
    pub articles: Vec<String>,
    /// Words left lower-case unless they start the value.
    pub no_capitalize: Vec<String>,
    /// Particles that belong to a surname ("van", "de", …).
    pub surname_prefixes: Vec<String>,
    /// Generational suffixes kept after the given names ("Jr.", "III", …).
    pub name_suffixes: Vec<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            capitalize: true,
            reorder: true,
            articles: words(&["the", "a", "an"]),
            no_capitalize: words(&[
                "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "nor",
                "of", "on", "or", "the", "to", "with",
            ]),
            surname_prefixes: words(&[
                "de", "del", "della", "der", "di", "du", "la", "le", "van", "von",
            ]),
            name_suffixes: words(&["jr", "jr.", "sr", "sr.", "ii", "iii", "iv"]),
        }
    }
}

/// The default formatter.
#[derive(Debug, Clone, Default)]
pub struct StandardFormatter {
    options: FormatOptions,
}

impl StandardFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    fn format_one(&self, value: &str, flag: FormatFlag) -> String {
        match flag {
            FormatFlag::None => value.to_string(),
            FormatFlag::Plain => self.capitalize(value),
            FormatFlag::Title => self.format_title(value),
            FormatFlag::Name => self.format_name(value),
            FormatFlag::Date => format_date(value),
        }
    }

    fn capitalize(&self, value: &str) -> String {
        if !self.options.capitalize {
            return value.to_string();
        }
        let mut out = String::with_capacity(value.len());
        for (i, word) in value.split(' ').enumerate() {
            if i > 0 {
                out.push(' ');
            }
            if i > 0 && contains_word(&self.options.no_capitalize, word) {
                out.push_str(word);
            } else {
                out.push_str(&upper_first(word));
            }
        }
        out
    }

    fn format_title(&self, value: &str) -> String {
        if self.options.reorder {
            if let Some((first, rest)) = value.split_once(' ') {
                let rest = rest.trim();
                if !rest.is_empty() && contains_word(&self.options.articles, first) {
                    return format!("{}, {}", self.capitalize(rest), upper_first(first));
                }
            }
        }
        self.capitalize(value)
    }

    fn format_name(&self, value: &str) -> String {
        if !self.options.reorder || value.contains(',') {
            return self.capitalize(value);
        }
        let mut words: Vec<&str> = value.split_whitespace().collect();
        if words.len() < 2 {
            return self.capitalize(value);
        }
        let suffix = match words.last() {
            Some(last) if words.len() > 2 && contains_word(&self.options.name_suffixes, last) => {
                words.pop()
            }
            _ => None,
        };
        let mut surname_start = words.len() - 1;
        while surname_start > 1
            && contains_word(&self.options.surname_prefixes, words[surname_start - 1])
        {
            surname_start -= 1;
        }
        let given = self.capitalize(&words[..surname_start].join(" "));
        // prefixes stay lower-case, only the last word is capitalized
        let surname_words = &words[surname_start..];
        let mut surname = surname_words[..surname_words.len() - 1].join(" ");
        if !surname.is_empty() {
            surname.push(' ');
        }
        surname.push_str(&upper_first(surname_words[surname_words.len() - 1]));
        match suffix {
            Some(suffix) => format!("{surname}, {given}, {suffix}"),
            None => format!("{surname}, {given}"),
        }
    }
}

impl FieldFormatter for StandardFormatter {
    fn format(&self, value: &str, flag: FormatFlag) -> String {
        if flag == FormatFlag::None || value.is_empty() {
            return value.to_string();
        }
        // rows first, then the simple values inside each row
        let rows: Vec<String> = value
            .split(ROW_DELIMITER)
            .map(|row| {
                let values: Vec<String> = row
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|v| self.format_one(v, flag))
                    .collect();
                values.join(DELIMITER)
            })
            .collect();
        rows.join(ROW_DELIMITER)
    }
}

fn contains_word(list: &[String], word: &str) -> bool {
    list.iter().any(|w| w.eq_ignore_ascii_case(word))
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_date(value: &str) -> String {
    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return value.to_string();
    }
    format!("{:0>4}-{:0>2}-{:0>2}", parts[0], parts[1], parts[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_moves_article() {
        let f = StandardFormatter::default();
        assert_eq!(f.format("the man from snowy river", FormatFlag::Title), "Man from Snowy River, The");
    }

    #[test]
    fn name_keeps_surname_prefix() {
        let f = StandardFormatter::default();
        assert_eq!(f.format("ludwig van beethoven", FormatFlag::Name), "van Beethoven, Ludwig");
    }

    #[test]
    fn date_is_zero_padded() {
        assert_eq!(format_date("2001-2-3"), "2001-02-03");
        assert_eq!(format_date("spring 2001"), "spring 2001");
    }
}
