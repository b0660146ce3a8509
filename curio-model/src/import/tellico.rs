use super::{Importer, simplify_whitespace};
use crate::collection::Collection;
use crate::entry::Entry;
use crate::field::{Field, FieldFlags, FieldType, FormatFlag};
use crate::format::{COLUMN_DELIMITER, DELIMITER, ROW_DELIMITER};
use crate::ids::EntryId;
use crate::kind::CollectionType;
use crate::schema::CollectionSchema;
use crate::xml::{XmlElement, parse_document};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Imports the native collection XML format:
///
/// ```xml
/// <tellico>
///   <collection type="2" title="My Books">
///     <fields><field name="_default"/></fields>
///     <entry id="1">
///       <title>Dune</title>
///       <authors><author>Frank Herbert</author></authors>
///     </entry>
///   </collection>
/// </tellico>
/// ```
#[derive(Debug, Default)]
pub struct TellicoImporter {
    text: String,
    base_url: Option<Url>,
    status: Option<String>,
}

impl TellicoImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of the document; relative url values resolve against it.
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    fn fail(&mut self, message: impl Into<String>) -> Option<Collection> {
        let message = message.into();
        warn!(%message, "tellico import failed");
        self.status = Some(message);
        None
    }
}

impl Importer for TellicoImporter {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.status = None;
    }

    fn collection(&mut self) -> Option<Collection> {
        let root = match parse_document(&self.text) {
            Ok(root) => root,
            Err(e) => return self.fail(format!("The file is not valid XML: {e}")),
        };
        if root.name != "tellico" && root.name != "bookcase" {
            return self.fail("The file is not a collection data file.");
        }
        let Some(coll) = root.child("collection") else {
            return self.fail("The file contains no collection.");
        };
        let kind = match coll.attribute("type").unwrap_or("1").parse::<CollectionType>() {
            Ok(kind) => kind,
            Err(e) => return self.fail(e.to_string()),
        };

        let schema = read_schema(coll, kind, self.base_url.clone()).into_shared();
        let mut collection = Collection::new(Arc::clone(&schema));
        for element in coll.children_named("entry") {
            let entry = read_entry(element, &schema);
            collection.add_entry(entry);
        }
        debug!(
            kind = %kind,
            entries = collection.entry_count(),
            "tellico collection imported"
        );
        Some(collection)
    }

    fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

fn read_schema(coll: &XmlElement, kind: CollectionType, base_url: Option<Url>) -> CollectionSchema {
    let title = coll.attribute("title").unwrap_or(kind.default_title());
    let mut fields = Vec::new();
    match coll.child("fields") {
        Some(list) => {
            for element in list.children_named("field") {
                match element.attribute("name") {
                    Some("_default") => fields.extend(kind.default_fields()),
                    Some(_) => fields.extend(read_field(element)),
                    None => {}
                }
            }
        }
        None => fields = kind.default_fields(),
    }
    let schema = CollectionSchema::new(kind, title, fields);
    match base_url {
        Some(url) => schema.with_base_url(url),
        None => schema,
    }
}

fn read_field(element: &XmlElement) -> Option<Field> {
    let name = element.attribute("name")?;
    let title = element.attribute("title").unwrap_or(name);
    let field_type = element
        .attribute("type")
        .and_then(|t| t.parse::<u8>().ok())
        .and_then(FieldType::from_code)
        .unwrap_or(FieldType::Line);
    let flags = element
        .attribute("flags")
        .and_then(|f| f.parse::<u32>().ok())
        .map(FieldFlags::from_bits_truncate)
        .unwrap_or_default();
    let format = element
        .attribute("format")
        .and_then(|f| f.parse::<u8>().ok())
        .map(FormatFlag::from_code)
        .unwrap_or_default();

    let mut field = Field::new(name, title, field_type)
        .with_category(element.attribute("category").unwrap_or_default())
        .with_flags(flags)
        .with_format(format)
        .with_description(element.attribute("description").unwrap_or_default());
    if let Some(allowed) = element.attribute("allowed") {
        field = field.with_allowed(
            allowed
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        );
    }
    for prop in element.children_named("prop") {
        if let Some(key) = prop.attribute("name") {
            field = field.with_property(key, &prop.text());
        }
    }
    Some(field)
}

fn read_entry(element: &XmlElement, schema: &Arc<CollectionSchema>) -> Entry {
    let mut entry = match element.attribute("id").and_then(|id| id.parse::<EntryId>().ok()) {
        Some(id) => Entry::with_id(Arc::clone(schema), id),
        None => Entry::new(Arc::clone(schema)),
    };
    for child in element.elements() {
        let Some((name, value)) = field_value(child, schema) else {
            debug!(element = %child.name, "no field for element");
            continue;
        };
        if !entry.set_field(name, &value) {
            debug!(field = name, "value rejected");
        }
    }
    entry
}

/// Maps one child of `<entry>` to a field name and raw value.
///
/// Multi-valued fields are wrapped in a container element whose children
/// are named after the field (`<authors><author/></authors>`). Table rows
/// hold `<column>` children; dates hold year, month and day.
fn field_value<'a>(element: &'a XmlElement, schema: &CollectionSchema) -> Option<(&'a str, String)> {
    if let Some(field) = schema.field_by_name(&element.name) {
        let value = if field.field_type() == FieldType::Date {
            date_value(element)
        } else if element.has_element_children() {
            let rows: Vec<String> = element.elements().map(item_value).collect();
            rows.join(delimiter_for(field))
        } else {
            element.text()
        };
        return Some((element.name.as_str(), value.trim().to_string()));
    }

    let first = element.elements().next()?;
    let field = schema.field_by_name(&first.name)?;
    let values: Vec<String> = element
        .children_named(&first.name)
        .map(item_value)
        .filter(|v| !v.is_empty())
        .collect();
    Some((first.name.as_str(), values.join(delimiter_for(field))))
}

fn delimiter_for(field: &Field) -> &'static str {
    if field.field_type() == FieldType::Table {
        ROW_DELIMITER
    } else {
        DELIMITER
    }
}

fn item_value(item: &XmlElement) -> String {
    if item.child("column").is_some() {
        let columns: Vec<String> = item
            .children_named("column")
            .map(|c| simplify_whitespace(&c.text()))
            .collect();
        return columns.join(COLUMN_DELIMITER);
    }
    simplify_whitespace(&item.text())
}

fn date_value(element: &XmlElement) -> String {
    if !element.has_element_children() {
        return element.text();
    }
    let part = |name: &str| element.child(name).map(|e| e.text().trim().to_string());
    match (part("year"), part("month"), part("day")) {
        (Some(y), Some(m), Some(d)) => format!("{y}-{m}-{d}"),
        (Some(y), _, _) => y,
        _ => String::new(),
    }
}
