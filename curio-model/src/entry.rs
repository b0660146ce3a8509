use crate::dependent;
use crate::field::{FieldType, FormatFlag};
use crate::format::{COLUMN_DELIMITER, ROW_DELIMITER, split_values};
use crate::group::EMPTY_GROUP_TITLE;
use crate::ids::{EntryId, GroupId};
use crate::kind::CollectionType;
use crate::schema::CollectionSchema;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// One cataloged item: a set of field values bound to a collection schema.
///
/// Values are stored raw. Formatted values are computed on demand and cached
/// per field until the field changes. Dependent fields are never stored;
/// they are evaluated from their template on every read.
///
/// Group membership is maintained by the owning
/// [`Collection`](crate::Collection); an entry only records the ids.
#[derive(Debug)]
pub struct Entry {
    id: Option<EntryId>,
    collection: Arc<CollectionSchema>,
    values: BTreeMap<Arc<str>, String>,
    formatted: RefCell<HashMap<Arc<str>, String>>,
    groups: Vec<GroupId>,
}

impl Entry {
    /// Creates an empty entry bound to `collection`, with no id.
    pub fn new(collection: Arc<CollectionSchema>) -> Self {
        Self {
            id: None,
            collection,
            values: BTreeMap::new(),
            formatted: RefCell::new(HashMap::new()),
            groups: Vec::new(),
        }
    }

    /// Creates an empty entry with a known id, as when loading a saved
    /// collection. The owning collection keeps the id unless it is taken.
    pub fn with_id(collection: Arc<CollectionSchema>, id: EntryId) -> Self {
        let mut entry = Self::new(collection);
        entry.id = Some(id);
        entry
    }

    /// The numeric id, or -1 while the entry belongs to no collection.
    pub fn id(&self) -> i64 {
        self.id.map_or(-1, |id| i64::from(id.get()))
    }

    pub fn entry_id(&self) -> Option<EntryId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntryId) {
        self.id = Some(id);
    }

    pub fn collection(&self) -> &Arc<CollectionSchema> {
        &self.collection
    }

    /// Rebinds the entry to another collection schema and resets its id.
    ///
    /// A book moved into a bibliography gains `entry-type = book` when the
    /// book schema had no entry type of its own.
    pub fn set_collection(&mut self, collection: Arc<CollectionSchema>) {
        if Arc::ptr_eq(&self.collection, &collection) {
            warn!("entry already belongs to this collection");
            return;
        }
        let add_entry_type = self.collection.kind() == CollectionType::Book
            && collection.kind() == CollectionType::Bibtex
            && !self.collection.has_field("entry-type");
        self.collection = collection;
        self.id = None;
        self.groups.clear();
        self.formatted.get_mut().clear();
        // after rebinding, set_field validates against the new schema
        if add_entry_type {
            self.set_field("entry-type", "book");
        }
    }

    /// The formatted title.
    pub fn title(&self) -> String {
        self.formatted_field("title")
    }

    /// The raw value of `name`, or `""` if the field is unknown or unset.
    pub fn field(&self, name: &str) -> String {
        self.raw_value(name, 0)
    }

    /// The formatted value of `name`, or `""` if the field is unknown or unset.
    pub fn formatted_field(&self, name: &str) -> String {
        self.formatted_value(name, 0)
    }

    pub fn field_value(&self, name: &str, formatted: bool) -> String {
        self.lookup(name, formatted, 0)
    }

    /// The individual values of a multi-valued field.
    ///
    /// Table values split into rows; other values split on the row delimiter
    /// and then on `;`.
    pub fn fields(&self, name: &str, formatted: bool) -> Vec<String> {
        let value = self.field_value(name, formatted);
        if value.is_empty() {
            return Vec::new();
        }
        let is_table = self
            .collection
            .field_by_name(name)
            .is_some_and(|f| f.field_type() == FieldType::Table);
        let rows = value
            .split(ROW_DELIMITER)
            .map(str::trim)
            .filter(|row| !row.is_empty());
        if is_table {
            rows.map(String::from).collect()
        } else {
            rows.flat_map(split_values).collect()
        }
    }

    /// Sets a raw value. An empty value removes the field and always
    /// succeeds. Unknown fields, values the schema does not allow, and
    /// values for dependent fields are rejected without any change.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        if name.is_empty() {
            warn!(value, "empty field name");
            return false;
        }
        if value.is_empty() {
            self.values.remove(name);
            self.invalidate_formatted(Some(name));
            return true;
        }
        let Some(field) = self.collection.field_by_name(name) else {
            debug!(field = name, "unknown field");
            return false;
        };
        if field.is_dependent() {
            debug!(field = name, "dependent fields cannot be set");
            return false;
        }
        if !self.collection.is_allowed(name, value) {
            debug!(field = name, value, "value is not allowed");
            return false;
        }
        let key = Arc::clone(field.shared_name());
        self.values.insert(key, value.to_string());
        self.invalidate_formatted(Some(name));
        true
    }

    /// The names of the groups this entry falls into for `name`.
    ///
    /// Empty values group under [`EMPTY_GROUP_TITLE`]. Table fields group by
    /// the first column of each row.
    pub fn group_names_by_field_name(&self, name: &str) -> Vec<String> {
        let Some(field) = self.collection.field_by_name(name) else {
            return Vec::new();
        };
        if !field.is_multiple() {
            let value = self.formatted_field(name);
            return if value.is_empty() {
                vec![EMPTY_GROUP_TITLE.to_string()]
            } else {
                vec![value]
            };
        }
        let values = self.fields(name, true);
        if values.is_empty() {
            return vec![EMPTY_GROUP_TITLE.to_string()];
        }
        if field.field_type() != FieldType::Table {
            return values;
        }
        values
            .iter()
            .filter_map(|row| {
                let first = row.split(COLUMN_DELIMITER).next().unwrap_or_default().trim();
                (!first.is_empty()).then(|| first.to_string())
            })
            .collect()
    }

    /// Drops the cached formatted value of `name`, or of every field.
    pub fn invalidate_formatted(&self, name: Option<&str>) {
        let mut cache = self.formatted.borrow_mut();
        match name {
            Some(name) => {
                cache.remove(name);
            }
            None => cache.clear(),
        }
    }

    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Forgets group membership without touching the groups themselves.
    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    pub(crate) fn groups_mut(&mut self) -> &mut Vec<GroupId> {
        &mut self.groups
    }

    /// Stored raw values, by field name.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    pub(crate) fn lookup(&self, name: &str, formatted: bool, depth: usize) -> String {
        if formatted {
            self.formatted_value(name, depth)
        } else {
            self.raw_value(name, depth)
        }
    }

    fn raw_value(&self, name: &str, depth: usize) -> String {
        let Some(field) = self.collection.field_by_name(name) else {
            return String::new();
        };
        if field.is_dependent() {
            return dependent::evaluate(self, field.description(), false, depth);
        }
        self.values.get(name).cloned().unwrap_or_default()
    }

    fn formatted_value(&self, name: &str, depth: usize) -> String {
        let Some(field) = self.collection.field_by_name(name) else {
            return String::new();
        };
        let flag = field.format();
        let formatter = self.collection.formatter();
        if field.is_dependent() {
            if flag == FormatFlag::None {
                return dependent::evaluate(self, field.description(), false, depth);
            }
            let value = dependent::evaluate(self, field.description(), true, depth);
            return formatter.format(&value, flag);
        }
        if flag == FormatFlag::None {
            return self.raw_value(name, depth);
        }
        if let Some(cached) = self.formatted.borrow().get(name) {
            return cached.clone();
        }
        let raw = self.raw_value(name, depth);
        if raw.is_empty() {
            return raw;
        }
        let cleaned = if self.collection.kind() == CollectionType::Bibtex {
            formatter.clean_text(&raw)
        } else {
            raw
        };
        let value = formatter.format(&cleaned, flag);
        if !value.is_empty() {
            self.formatted
                .borrow_mut()
                .insert(Arc::clone(field.shared_name()), value.clone());
        }
        value
    }

    fn same_file(&self, other: &Entry) -> Option<bool> {
        let url = self.values.get("url").filter(|u| !u.is_empty())?;
        let other_url = other.values.get("url").map(String::as_str).unwrap_or_default();
        let theirs = normalize_url(other_url);
        if normalize_url(url).is_some_and(|u| Some(&u) == theirs.as_ref()) || url == other_url {
            return Some(true);
        }
        let relative = self
            .collection
            .field_by_name("url")
            .is_some_and(|f| f.property("relative") == Some("true"));
        if !relative {
            return None;
        }
        let resolved = self.collection.base_url()?.join(url).ok()?;
        Some(Some(resolved) == theirs)
    }
}

/// Parses a url value. Values saved without a scheme are taken as local
/// absolute paths.
fn normalize_url(value: &str) -> Option<Url> {
    if value.starts_with('/') {
        return Url::parse(&format!("file://{value}")).ok();
    }
    Url::parse(value).ok()
}

impl Clone for Entry {
    /// Copies values and cached formatting. The copy has no id and no
    /// group membership.
    fn clone(&self) -> Self {
        Self {
            id: None,
            collection: Arc::clone(&self.collection),
            values: self.values.clone(),
            formatted: RefCell::new(self.formatted.borrow().clone()),
            groups: Vec::new(),
        }
    }
}

impl PartialEq for Entry {
    /// Entries are equal when their raw values are. File catalog entries
    /// compare by url first.
    fn eq(&self, other: &Self) -> bool {
        if self.collection.kind() == CollectionType::File
            && other.collection.kind() == CollectionType::File
        {
            if let Some(same) = self.same_file(other) {
                return same;
            }
        }
        self.values == other.values
    }
}
