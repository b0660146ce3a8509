use super::{Importer, simplify_whitespace};
use crate::collection::Collection;
use crate::entry::Entry;
use crate::format::DELIMITER;
use crate::kind::CollectionType;
use crate::xml::{XmlElement, parse_document};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name parts of a BibTeXML `<person>`, in display order.
const PERSON_PARTS: [&str; 6] = ["initials", "first", "middle", "prelast", "last", "lineage"];

/// Imports BibTeXML into a bibliography collection.
///
/// ```xml
/// <file>
///   <entry id="herbert1965">
///     <book>
///       <title>Dune</title>
///       <authorlist><person><first>Frank</first><last>Herbert</last></person></authorlist>
///     </book>
///   </entry>
/// </file>
/// ```
#[derive(Debug, Default)]
pub struct BibtexmlImporter {
    text: String,
    status: Option<String>,
}

impl BibtexmlImporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Importer for BibtexmlImporter {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.status = None;
    }

    fn collection(&mut self) -> Option<Collection> {
        let root = match parse_document(&self.text) {
            Ok(root) if root.name == "file" => root,
            Ok(_) => {
                self.status = Some("The file is not a BibTeXML document.".into());
                warn!("bibtexml root element is not <file>");
                return None;
            }
            Err(e) => {
                self.status = Some(format!("The file is not valid XML: {e}"));
                warn!(error = %e, "bibtexml import failed");
                return None;
            }
        };

        let mut collection = Collection::for_kind(CollectionType::Bibtex);
        let schema = Arc::clone(collection.schema());
        for element in root.descendants_named("entry") {
            let mut entry = Entry::new(Arc::clone(&schema));
            read_entry(element, &mut entry);
            collection.add_entry(entry);
        }
        debug!(entries = collection.entry_count(), "bibtexml collection imported");
        Some(collection)
    }

    fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

fn read_entry(element: &XmlElement, entry: &mut Entry) {
    if let Some(key) = element.attribute("id") {
        set_value(entry, "key", key);
    }
    let Some(body) = element.elements().next() else {
        return;
    };
    set_value(entry, "entry-type", &body.name);

    for node in body.elements() {
        if !node.has_element_children() {
            set_value(entry, &node.name, &node.text());
            continue;
        }
        // a list such as <authorlist> or <keywords>; items are named after the field
        let Some(first) = node.elements().next() else {
            continue;
        };
        let name = match first.name.as_str() {
            "person" => node.name.strip_suffix("list").unwrap_or(&node.name),
            "keyword" => "keywords",
            other => other,
        };
        let items: Vec<String> = node.elements().map(list_item).collect();
        set_value(entry, name, &items.join(DELIMITER));
    }
}

fn list_item(item: &XmlElement) -> String {
    if item.name != "person" || !item.has_element_children() {
        return simplify_whitespace(&item.text());
    }
    let parts: Vec<String> = PERSON_PARTS
        .iter()
        .filter_map(|part| item.child(part))
        .map(|e| simplify_whitespace(&e.text()))
        .filter(|s| !s.is_empty())
        .collect();
    parts.join(" ")
}

/// Stores a value under the field carrying `bibtex_name` as its bibtex
/// property, or failing that the field of that name.
fn set_value(entry: &mut Entry, bibtex_name: &str, value: &str) {
    let value = simplify_whitespace(value);
    if value.is_empty() {
        return;
    }
    let schema = Arc::clone(entry.collection());
    let field = schema
        .field_by_bibtex_name(bibtex_name)
        .or_else(|| schema.field_by_name(bibtex_name));
    match field {
        Some(field) => {
            if !entry.set_field(field.name(), &value) {
                debug!(field = field.name(), %value, "bibtex value rejected");
            }
        }
        None => debug!(name = bibtex_name, "no field for bibtex value"),
    }
}
