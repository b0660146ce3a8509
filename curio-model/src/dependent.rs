//! Evaluation of dependent-field templates such as `"%{author} (%{year})"`.

use crate::entry::Entry;
use tracing::warn;

/// Dependent fields may reference other dependent fields; chains deeper than
/// this are treated as cycles and evaluate to nothing.
pub(crate) const MAX_DEPTH: usize = 8;

/// Expands `template` against `entry`.
///
/// `%{name}` is replaced by the value of the field with that name, or failing
/// that the field with that title. `%{id}` is the entry's id. A token naming
/// nothing is kept verbatim, and an unterminated `%{` drops the rest of the
/// template. Runs of whitespace in the result collapse to one space.
///
/// With `formatted`, sub-values are the formatted field values.
pub fn dependent_value(entry: &Entry, template: &str, formatted: bool) -> String {
    evaluate(entry, template, formatted, 0)
}

pub(crate) fn evaluate(entry: &Entry, template: &str, formatted: bool, depth: usize) -> String {
    if depth > MAX_DEPTH {
        warn!(template, "dependent field nesting too deep, ignoring");
        return String::new();
    }
    let schema = entry.collection();
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pct) = rest.find('%') {
        let (before, token) = rest.split_at(pct);
        result.push_str(before);
        let tail = &token[1..];
        if !tail.starts_with('{') {
            result.push('%');
            rest = tail;
            continue;
        }
        let Some(end) = tail[1..].find('}') else {
            rest = "";
            break;
        };
        let name = &tail[1..=end];
        let field = schema
            .field_by_name(name)
            .or_else(|| schema.field_by_title(name));
        match field {
            Some(field) => result.push_str(&entry.lookup(field.name(), formatted, depth + 1)),
            None if name == "id" => result.push_str(&entry.id().to_string()),
            None => result.push_str(&token[..end + 3]),
        }
        rest = &tail[end + 2..];
    }
    result.push_str(rest);
    simplify(&result)
}

fn simplify(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
