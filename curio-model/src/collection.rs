//! The collection arena: entries, group indexes, and the table mapping
//! `(field, group name)` to a group.
//!
//! Entries and groups refer to one another by id only. Every mutation that
//! can change grouping goes through [`Collection`] so that membership stays
//! symmetric: an entry lists a group exactly when the group lists the entry.

use crate::entry::Entry;
use crate::group::EntryGroup;
use crate::ids::{EntryId, GroupId};
use crate::kind::CollectionType;
use crate::schema::CollectionSchema;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Collection {
    schema: Arc<CollectionSchema>,
    entries: BTreeMap<EntryId, Entry>,
    next_entry_id: u32,
    groups: HashMap<GroupId, EntryGroup>,
    next_group_id: u32,
    group_table: HashMap<Arc<str>, BTreeMap<String, GroupId>>,
}

impl Collection {
    pub fn new(schema: Arc<CollectionSchema>) -> Self {
        Self {
            schema,
            entries: BTreeMap::new(),
            next_entry_id: 1,
            groups: HashMap::new(),
            next_group_id: 0,
            group_table: HashMap::new(),
        }
    }

    /// An empty collection with the built-in schema of `kind`.
    pub fn for_kind(kind: CollectionType) -> Self {
        Self::new(CollectionSchema::for_kind(kind).into_shared())
    }

    pub fn schema(&self) -> &Arc<CollectionSchema> {
        &self.schema
    }

    pub fn kind(&self) -> CollectionType {
        self.schema.kind()
    }

    pub fn title(&self) -> &str {
        self.schema.title()
    }

    // ── Entries ──────────────────────────────────────────────────

    /// Adds an entry and indexes it under every groupable field.
    ///
    /// An entry bound to another schema is rebound first. An entry carrying
    /// an id keeps it unless another entry already has it.
    pub fn add_entry(&mut self, mut entry: Entry) -> EntryId {
        if !Arc::ptr_eq(entry.collection(), &self.schema) {
            entry.set_collection(Arc::clone(&self.schema));
        }
        let id = match entry.entry_id() {
            Some(id) if !self.entries.contains_key(&id) => id,
            Some(id) => {
                debug!(%id, "entry id already taken, assigning a new one");
                self.allocate_entry_id()
            }
            None => self.allocate_entry_id(),
        };
        self.next_entry_id = self.next_entry_id.max(id.get().saturating_add(1));
        entry.assign_id(id);
        entry.clear_groups();
        self.entries.insert(id, entry);

        let fields: Vec<Arc<str>> = self
            .schema
            .groupable_fields()
            .map(|f| Arc::clone(f.shared_name()))
            .collect();
        for field in &fields {
            self.update_groups(id, field);
        }
        id
    }

    pub fn add_entries<I>(&mut self, entries: I) -> Vec<EntryId>
    where
        I: IntoIterator<Item = Entry>,
    {
        entries.into_iter().map(|e| self.add_entry(e)).collect()
    }

    /// Removes an entry, taking it out of every group first.
    pub fn remove_entry(&mut self, id: EntryId) -> Option<Entry> {
        let groups = self.entries.get(&id)?.groups().to_vec();
        for group in groups {
            self.remove_from_group(id, group);
        }
        self.entries.remove(&id)
    }

    /// Sets a field value on an owned entry and regroups it.
    ///
    /// Besides the field itself, every groupable dependent field is
    /// regrouped since its value may derive from the one that changed.
    pub fn set_entry_field(&mut self, id: EntryId, name: &str, value: &str) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            debug!(%id, "no such entry");
            return false;
        };
        if !entry.set_field(name, value) {
            return false;
        }
        let fields: Vec<Arc<str>> = self
            .schema
            .groupable_fields()
            .filter(|f| f.name() == name || f.is_dependent())
            .map(|f| Arc::clone(f.shared_name()))
            .collect();
        for field in &fields {
            self.update_groups(id, field);
        }
        true
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.entries.keys().copied()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dismantles the collection, returning its entries with their group
    /// membership cleared.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
            .into_values()
            .map(|mut e| {
                e.clear_groups();
                e
            })
            .collect()
    }

    fn allocate_entry_id(&mut self) -> EntryId {
        while self.entries.contains_key(&EntryId::new(self.next_entry_id)) {
            self.next_entry_id += 1;
        }
        let id = EntryId::new(self.next_entry_id);
        self.next_entry_id += 1;
        id
    }

    // ── Groups ───────────────────────────────────────────────────

    /// Brings an entry's membership for one field in line with its value.
    fn update_groups(&mut self, id: EntryId, field: &Arc<str>) {
        let Some(entry) = self.entries.get(&id) else {
            return;
        };
        let wanted = entry.group_names_by_field_name(field);
        let current: Vec<(GroupId, String)> = entry
            .groups()
            .iter()
            .filter_map(|g| self.groups.get(g))
            .filter(|g| g.field_name() == field.as_ref())
            .map(|g| (g.id(), g.group_name().to_string()))
            .collect();

        for (group, name) in &current {
            if !wanted.contains(name) {
                self.remove_from_group(id, *group);
            }
        }
        for name in wanted {
            if current.iter().any(|(_, n)| *n == name) {
                continue;
            }
            let group = self.group_for_key(field, name);
            self.add_to_group(id, group);
        }
    }

    /// Finds or creates the group for `(field, name)`.
    fn group_for_key(&mut self, field: &Arc<str>, name: String) -> GroupId {
        if let Some(id) = self.group_table.get(field).and_then(|t| t.get(&name)) {
            return *id;
        }
        let id = GroupId::new(self.next_group_id);
        self.next_group_id += 1;
        self.group_table
            .entry(Arc::clone(field))
            .or_default()
            .insert(name.clone(), id);
        self.groups
            .insert(id, EntryGroup::new(id, Arc::clone(field), name));
        id
    }

    /// Adds an entry to a group. Fails when either is unknown or the entry
    /// is already a member.
    pub fn add_to_group(&mut self, entry: EntryId, group: GroupId) -> bool {
        let (Some(e), Some(g)) = (self.entries.get_mut(&entry), self.groups.get_mut(&group))
        else {
            debug!(%entry, %group, "cannot add to group, unknown entry or group");
            return false;
        };
        if e.groups().contains(&group) {
            return false;
        }
        e.groups_mut().push(group);
        g.members_mut().push(entry);
        true
    }

    /// Removes an entry from a group. Both sides are checked before either
    /// changes. A group left empty is destroyed.
    pub fn remove_from_group(&mut self, entry: EntryId, group: GroupId) -> bool {
        let (Some(e), Some(g)) = (self.entries.get_mut(&entry), self.groups.get_mut(&group))
        else {
            warn!(%entry, %group, "cannot remove from group, unknown entry or group");
            return false;
        };
        let (Some(in_entry), Some(in_group)) = (
            e.groups().iter().position(|id| *id == group),
            g.entries().iter().position(|id| *id == entry),
        ) else {
            warn!(%entry, %group, "membership is not recorded on both sides");
            return false;
        };
        e.groups_mut().remove(in_entry);
        g.members_mut().remove(in_group);
        if g.is_empty() {
            self.destroy_group(group);
        }
        true
    }

    /// Forgets an entry's membership records without touching the groups.
    pub fn clear_groups(&mut self, entry: EntryId) {
        if let Some(e) = self.entries.get_mut(&entry) {
            e.clear_groups();
        }
    }

    /// Removes a group, detaching every member.
    pub fn remove_group(&mut self, group: GroupId) -> bool {
        let Some(g) = self.groups.get(&group) else {
            return false;
        };
        for member in g.entries().to_vec() {
            if let Some(e) = self.entries.get_mut(&member) {
                e.groups_mut().retain(|id| *id != group);
            }
        }
        self.destroy_group(group);
        true
    }

    fn destroy_group(&mut self, group: GroupId) {
        let Some(g) = self.groups.remove(&group) else {
            return;
        };
        if let Some(table) = self.group_table.get_mut(g.shared_field()) {
            table.remove(g.group_name());
            if table.is_empty() {
                self.group_table.remove(g.shared_field());
            }
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&EntryGroup> {
        self.groups.get(&id)
    }

    pub fn group_by_name(&self, field: &str, name: &str) -> Option<&EntryGroup> {
        let id = self.group_table.get(field)?.get(name)?;
        self.groups.get(id)
    }

    /// The groups of one field, ordered by group name.
    pub fn groups_for_field(&self, field: &str) -> Vec<&EntryGroup> {
        self.group_table
            .get(field)
            .map(|table| table.values().filter_map(|id| self.groups.get(id)).collect())
            .unwrap_or_default()
    }

    /// The groups an entry belongs to, in the order it joined them.
    pub fn entry_groups(&self, entry: EntryId) -> Vec<&EntryGroup> {
        self.entries
            .get(&entry)
            .map(|e| e.groups().iter().filter_map(|g| self.groups.get(g)).collect())
            .unwrap_or_default()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
