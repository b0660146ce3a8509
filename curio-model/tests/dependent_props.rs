use curio_model::{CollectionSchema, CollectionType, Entry, Field, dependent_value};
use proptest::prelude::*;

fn entry() -> Entry {
    let schema = CollectionSchema::new(
        CollectionType::Base,
        "Props",
        vec![Field::line("author", "Author"), Field::line("year", "Year")],
    )
    .into_shared();
    let mut entry = Entry::new(schema);
    entry.set_field("author", "Smith");
    entry.set_field("year", "2020");
    entry
}

proptest! {
    #[test]
    fn plain_text_only_has_whitespace_simplified(template in "[a-zA-Z0-9 ().,\t]{0,40}") {
        let expected = template.split_whitespace().collect::<Vec<_>>().join(" ");
        prop_assert_eq!(dependent_value(&entry(), &template, false), expected);
    }

    #[test]
    fn result_is_always_simplified(template in "[%{}a-z ]{0,40}") {
        let value = dependent_value(&entry(), &template, false);
        prop_assert_eq!(value.trim(), value.as_str());
        prop_assert!(!value.contains("  "));
    }

    #[test]
    fn known_tokens_are_substituted(prefix in "[a-z]{0,8}", suffix in "[a-z]{0,8}") {
        let template = format!("{prefix}%{{author}}{suffix}");
        prop_assert_eq!(dependent_value(&entry(), &template, false), format!("{prefix}Smith{suffix}"));
    }
}
