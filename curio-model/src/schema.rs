use crate::field::{Field, FieldType};
use crate::format::{FieldFormatter, StandardFormatter, split_values};
use crate::kind::CollectionType;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// The field definitions and kind of one collection.
///
/// Shared by `Arc` between the [`Collection`](crate::Collection) and every
/// [`Entry`](crate::Entry) bound to it; two entries belong to the same
/// collection exactly when they hold the same `Arc`.
#[derive(Clone)]
pub struct CollectionSchema {
    kind: CollectionType,
    title: String,
    fields: Vec<Field>,
    /// Location of the document the collection was loaded from. Relative
    /// url values are resolved against it.
    base_url: Option<Url>,
    formatter: Arc<dyn FieldFormatter>,
}

impl CollectionSchema {
    /// Creates a schema. A later field replaces an earlier one of the same name.
    pub fn new(kind: CollectionType, title: &str, fields: Vec<Field>) -> Self {
        let schema = Self {
            kind,
            title: title.into(),
            fields: Vec::with_capacity(fields.len()),
            base_url: None,
            formatter: Arc::new(StandardFormatter::default()),
        };
        fields.into_iter().fold(schema, Self::with_field)
    }

    /// Creates the built-in schema for `kind`.
    pub fn for_kind(kind: CollectionType) -> Self {
        Self::new(kind, kind.default_title(), kind.default_fields())
    }

    pub fn with_field(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn FieldFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn kind(&self) -> CollectionType {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn formatter(&self) -> &dyn FieldFormatter {
        self.formatter.as_ref()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_by_title(&self, title: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.title() == title)
    }

    /// Looks up a field carrying the given `bibtex` property.
    pub fn field_by_bibtex_name(&self, bibtex: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.property("bibtex") == Some(bibtex))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_by_name(name).is_some()
    }

    /// Fields whose values cluster entries into group indexes.
    pub fn groupable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_groupable())
    }

    /// Whether `value` may be stored in the field `name`.
    ///
    /// An empty value is always allowed; an unknown field allows nothing.
    pub fn is_allowed(&self, name: &str, value: &str) -> bool {
        if value.is_empty() {
            return true;
        }
        let Some(field) = self.field_by_name(name) else {
            return false;
        };
        let tokens = if field.is_multiple() {
            split_values(value)
        } else {
            vec![value.to_string()]
        };
        match field.field_type() {
            FieldType::Choice if !field.allowed().is_empty() => tokens
                .iter()
                .all(|t| field.allowed().iter().any(|a| a == t)),
            FieldType::Bool => matches!(value, "true" | "false"),
            FieldType::Number => tokens.iter().all(|t| t.parse::<f64>().is_ok()),
            _ => true,
        }
    }
}

impl fmt::Debug for CollectionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSchema")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("fields", &self.fields.len())
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
