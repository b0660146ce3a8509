use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Describes one named attribute the entries of a collection may carry.
///
/// Fields are immutable once added to a [`CollectionSchema`](crate::CollectionSchema).
/// The name is shared (`Arc<str>`) with every entry value stored under it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: Arc<str>,
    title: String,
    category: String,
    field_type: FieldType,
    flags: FieldFlags,
    format: FormatFlag,
    /// For a `Dependent` field, the template its value is computed from.
    description: String,
    /// Allowed values. Only meaningful when the type is `Choice`.
    allowed: Vec<String>,
    properties: BTreeMap<String, String>,
}

impl Field {
    /// Creates a field of the given type with no flags and no formatting.
    ///
    /// Table fields always allow multiple values.
    pub fn new(name: &str, title: &str, field_type: FieldType) -> Self {
        let flags = if field_type == FieldType::Table {
            FieldFlags::ALLOW_MULTIPLE
        } else {
            FieldFlags::empty()
        };
        Self {
            name: Arc::from(name),
            title: title.into(),
            category: String::new(),
            field_type,
            flags,
            format: FormatFlag::None,
            description: String::new(),
            allowed: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Shorthand for a single-line text field.
    pub fn line(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Line)
    }

    /// Shorthand for a multi-line text field.
    pub fn para(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Para)
    }

    /// Shorthand for a choice field with a fixed list of values.
    pub fn choice(name: &str, title: &str, allowed: &[&str]) -> Self {
        let mut field = Self::new(name, title, FieldType::Choice);
        field.allowed = allowed.iter().map(|s| s.to_string()).collect();
        field
    }

    /// Shorthand for a checkbox field.
    pub fn bool(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Bool)
    }

    /// Shorthand for a numeric field.
    pub fn number(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Number)
    }

    /// Shorthand for a URL field.
    pub fn url(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Url)
    }

    /// Shorthand for a table field (rows of `::`-separated columns).
    pub fn table(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Table)
    }

    /// Shorthand for an image field. The value is an image id.
    pub fn image(name: &str, title: &str) -> Self {
        Self::new(name, title, FieldType::Image)
    }

    /// Shorthand for a date field.
    pub fn date(name: &str, title: &str) -> Self {
        let mut field = Self::new(name, title, FieldType::Date);
        field.format = FormatFlag::Date;
        field
    }

    /// Shorthand for a dependent field computed from `template`,
    /// e.g. `"%{author} (%{year})"`.
    pub fn dependent(name: &str, title: &str, template: &str) -> Self {
        let mut field = Self::new(name, title, FieldType::Dependent);
        field.description = template.into();
        field
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        if self.field_type == FieldType::Table {
            self.flags |= FieldFlags::ALLOW_MULTIPLE;
        }
        self
    }

    pub fn with_format(mut self, format: FormatFlag) -> Self {
        self.format = format;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_allowed(mut self, allowed: Vec<String>) -> Self {
        self.allowed = allowed;
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared name, for use as a map key.
    pub fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn format(&self) -> FormatFlag {
        self.format
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn is_dependent(&self) -> bool {
        self.field_type == FieldType::Dependent
    }

    pub fn is_multiple(&self) -> bool {
        self.flags.contains(FieldFlags::ALLOW_MULTIPLE)
    }

    pub fn is_groupable(&self) -> bool {
        self.flags.contains(FieldFlags::ALLOW_GROUPED)
    }
}

/// The data type of a field.
///
/// The numeric codes are the ones used by the XML exchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Line,
    Para,
    Choice,
    Bool,
    ReadOnly,
    Number,
    Url,
    Table,
    Image,
    Dependent,
    Date,
    Rating,
}

impl FieldType {
    pub const fn code(self) -> u8 {
        match self {
            Self::Line => 1,
            Self::Para => 2,
            Self::Choice => 3,
            Self::Bool => 4,
            Self::ReadOnly => 5,
            Self::Number => 6,
            Self::Url => 7,
            Self::Table => 8,
            Self::Image => 10,
            Self::Dependent => 11,
            Self::Date => 12,
            Self::Rating => 14,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Line,
            2 => Self::Para,
            3 => Self::Choice,
            4 => Self::Bool,
            5 => Self::ReadOnly,
            6 => Self::Number,
            7 => Self::Url,
            // 9 was the two-column table, folded into Table
            8 | 9 => Self::Table,
            10 => Self::Image,
            11 => Self::Dependent,
            12 => Self::Date,
            14 => Self::Rating,
            _ => return None,
        })
    }
}

bitflags! {
    /// Behavior flags of a field. Bit values match the XML exchange format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u32 {
        const ALLOW_MULTIPLE = 0x01;
        const ALLOW_GROUPED = 0x02;
        const ALLOW_COMPLETION = 0x04;
        const NO_DELETE = 0x08;
        const NO_EDIT = 0x10;
    }
}

/// How a field's value is formatted for display and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatFlag {
    /// Capitalization only.
    Plain,
    /// Capitalize and move a leading article to the end.
    Title,
    /// Personal names, "First Last" → "Last, First".
    Name,
    /// Zero-padded year-month-day.
    Date,
    /// Value is shown as stored.
    #[default]
    None,
}

impl FormatFlag {
    pub const fn code(self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::Title => 1,
            Self::Name => 2,
            Self::Date => 3,
            Self::None => 4,
        }
    }

    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Plain,
            1 => Self::Title,
            2 => Self::Name,
            3 => Self::Date,
            _ => Self::None,
        }
    }
}
