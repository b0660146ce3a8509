use crate::ids::{EntryId, GroupId};
use std::sync::Arc;

/// Group name of entries whose value for the grouping field is empty.
pub const EMPTY_GROUP_TITLE: &str = "(Empty)";

/// The entries sharing one value of one field, in insertion order.
///
/// Groups live in their [`Collection`](crate::Collection) and exist only
/// while they have members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryGroup {
    id: GroupId,
    field: Arc<str>,
    name: String,
    members: Vec<EntryId>,
}

impl EntryGroup {
    pub(crate) fn new(id: GroupId, field: Arc<str>, name: String) -> Self {
        Self {
            id,
            field,
            name,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn group_name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[EntryId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, entry: EntryId) -> bool {
        self.members.contains(&entry)
    }

    pub(crate) fn shared_field(&self) -> &Arc<str> {
        &self.field
    }

    pub(crate) fn members_mut(&mut self) -> &mut Vec<EntryId> {
        &mut self.members
    }
}
