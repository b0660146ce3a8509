//! Collection data model for curio.
//!
//! Defines the types every other curio crate builds on:
//! - [`Field`] and [`CollectionSchema`]: a collection's field definitions,
//!   lookup and value validation
//! - [`Entry`]: one record of field values, with lazily formatted values and
//!   template-computed dependent fields
//! - [`Collection`]: an arena of entries plus the per-field [`EntryGroup`]
//!   indexes used to browse them
//! - [`Importer`]: the boundary through which text formats become collections
//! - [`ImageStore`]: where fetched cover images end up
//!
//! Entries and groups reference each other by id ([`EntryId`], [`GroupId`])
//! rather than by pointer; the owning [`Collection`] keeps both sides of the
//! membership in agreement.

mod collection;
mod dependent;
mod entry;
mod error;
mod field;
mod format;
mod group;
mod ids;
pub mod identifiers;
mod images;
pub mod import;
mod kind;
mod schema;
pub mod xml;

pub use collection::Collection;
pub use dependent::dependent_value;
pub use entry::Entry;
pub use error::{ModelError, ModelResult};
pub use field::{Field, FieldFlags, FieldType, FormatFlag};
pub use format::{
    COLUMN_DELIMITER, DELIMITER, FieldFormatter, FormatOptions, ROW_DELIMITER,
    StandardFormatter, clean_bibtex_text, join_rows, join_values, split_columns, split_rows,
    split_values,
};
pub use group::{EMPTY_GROUP_TITLE, EntryGroup};
pub use ids::{EntryId, GroupId};
pub use images::{DirectoryImageStore, ImageStore, MemoryImageStore, image_id};
pub use import::{ImportFormat, Importer};
pub use kind::CollectionType;
pub use schema::CollectionSchema;
