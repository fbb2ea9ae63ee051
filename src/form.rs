//! The form: a tree of fields generated from the schema, bound to document paths.
//!
//! Fields live in an arena keyed by [`FieldId`]. Ids are never reused, and a field
//! keeps its id for as long as its place in the form exists, so renderers can hang
//! focus, collapse and in-progress input state off it. Text-originated patches
//! reconcile containers in place: array items are matched by position, map
//! entries by key, and only fields whose content really changed are reported
//! through [`FormEvent`]s.

use crate::diff::ChangeSet;
use crate::path::{self, MAP_KEY_MARKER, Path, index_segment, is_marker};
use crate::schema::{
    InputError, PropertyOrder, RequiredRule, SchemaKind, SchemaNode, SchemaWalker,
    SiblingFlagRule,
};
use crate::Value;
use indexmap::IndexMap;
use std::{cmp::Ordering, collections::HashMap, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u64);

/// What a user edit does to the `overridden` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverridePolicy {
    /// Any explicit edit marks the field overridden until it is reset or the text removes it.
    #[default]
    Sticky,
    /// Editing a field back to its schema default (or to blank) drops the override.
    MatchDefaultClears,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormOptions {
    pub order: PropertyOrder,
    pub override_policy: OverridePolicy,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("no form field at `{0}`")]
    UnknownPath(Path),
    #[error("`{path}` is not {expected}")]
    WrongKind { path: Path, expected: &'static str },
    #[error("index {index} is out of range for `{path}` ({len} items)")]
    IndexOutOfRange { path: Path, index: usize, len: usize },
    #[error("key `{key}` already exists in `{path}`")]
    DuplicateKey { path: Path, key: String },
    #[error("numeric key `{key}` in `{path}` keeps its sorted position")]
    NumericKeyPinned { path: Path, key: String },
    #[error(transparent)]
    InvalidInput(#[from] InputError),
}

/// Change notifications for the renderer, drained with [`FormModel::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    ValueChanged(FieldId),
    ItemsChanged(FieldId),
    ErrorChanged(FieldId),
    Removed(FieldId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Empty while the user has not typed a key yet; such entries are not serialized.
    pub key: String,
    pub value: FieldId,
    pub error: Option<FormError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Object {
        /// Display order; serialization follows schema declaration order.
        children: IndexMap<String, FieldId>,
        /// The `enabled` child rendered in this object's header instead of its body.
        toggle: Option<FieldId>,
        /// Document keys without a schema property, kept verbatim.
        extras: IndexMap<String, Value>,
    },
    Map {
        entries: Vec<MapEntry>,
    },
    Array {
        items: Vec<FieldId>,
    },
    /// Plain scalars and enums; `None` means "not set, show the default".
    Scalar {
        value: Option<Value>,
    },
}

#[derive(Debug, Clone)]
pub struct FormField {
    id: FieldId,
    parent: Option<FieldId>,
    schema: Rc<SchemaNode>,
    kind: FieldKind,
    overridden: bool,
    error: Option<FormError>,
    unmapped: Option<Value>,
}

impl FormField {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    pub fn schema(&self) -> &Rc<SchemaNode> {
        &self.schema
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn overridden(&self) -> bool {
        self.overridden
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    /// A document value whose shape this field cannot represent; serialized as-is.
    pub fn unmapped(&self) -> Option<&Value> {
        self.unmapped.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            FieldKind::Scalar { value } => value.as_ref(),
            _ => None,
        }
    }

    /// The current value, or the schema default when nothing is set.
    pub fn display_value(&self) -> Option<&Value> {
        self.value().or(self.schema.default.as_ref())
    }

    pub fn differs_from_default(&self) -> bool {
        self.overridden && self.value() != self.schema.default.as_ref()
    }
}

/// Where a path lands in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Field(FieldId),
    /// The key input of the map entry at `index`.
    MapKey { map: FieldId, index: usize },
}

/// One user-driven mutation. Indexes refer to the container at `path`.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEdit {
    SetValue { path: Path, value: Value },
    Reset { path: Path },
    AddItem { path: Path },
    RemoveItem { path: Path, index: usize },
    MoveItem { path: Path, from: usize, to: usize },
    AddEntry { path: Path },
    RenameEntry { path: Path, index: usize, key: String },
    RemoveEntry { path: Path, index: usize },
    MoveEntry { path: Path, from: usize, to: usize },
}

/// Purely numeric map keys sort ahead of everything else, ascending.
pub fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (is_numeric_key(a), is_numeric_key(b)) {
        (true, true) => {
            let (ta, tb) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
            ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb)).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

pub struct FormModel {
    fields: HashMap<FieldId, FormField>,
    root: FieldId,
    next_id: u64,
    options: FormOptions,
    rule: Box<dyn RequiredRule>,
    events: Vec<FormEvent>,
}

impl FormModel {
    pub fn build(schema: Rc<SchemaNode>, options: FormOptions) -> Self {
        let mut model = FormModel {
            fields: HashMap::new(),
            root: FieldId(0),
            next_id: 0,
            options,
            rule: Box::new(SiblingFlagRule),
            events: Vec::new(),
        };
        model.root = model.build_subtree(schema, None, Path::root());
        model
    }

    pub fn with_required_rule(mut self, rule: impl RequiredRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn set_override_policy(&mut self, policy: OverridePolicy) {
        self.options.override_policy = policy;
    }

    pub fn root(&self) -> FieldId {
        self.root
    }

    pub fn field(&self, id: FieldId) -> Option<&FormField> {
        self.fields.get(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn take_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    fn alloc(&mut self, parent: Option<FieldId>, schema: Rc<SchemaNode>) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        let kind = match schema.kind() {
            SchemaKind::Object => FieldKind::Object {
                children: IndexMap::new(),
                toggle: None,
                extras: IndexMap::new(),
            },
            SchemaKind::Map => FieldKind::Map {
                entries: Vec::new(),
            },
            SchemaKind::Array => FieldKind::Array { items: Vec::new() },
            SchemaKind::Enum | SchemaKind::Scalar(_) => FieldKind::Scalar { value: None },
        };
        self.fields.insert(
            id,
            FormField {
                id,
                parent,
                schema,
                kind,
                overridden: false,
                error: None,
                unmapped: None,
            },
        );
        id
    }

    fn attach_child(&mut self, parent: FieldId, name: &str, child: FieldId, toggle: bool) {
        if let Some(FieldKind::Object {
            children,
            toggle: slot,
            ..
        }) = self.kind_mut(parent)
        {
            children.insert(name.to_owned(), child);
            if toggle {
                *slot = Some(child);
            }
        }
    }

    /// Create the fields for `schema` from the walker's output; returns the subtree root.
    fn build_subtree(&mut self, schema: Rc<SchemaNode>, parent: Option<FieldId>, base: Path) -> FieldId {
        let mut by_path: HashMap<Path, FieldId> = HashMap::new();
        let mut top = None;
        for entry in SchemaWalker::new(schema.clone(), base, self.options.order) {
            let owner = match top {
                None => parent,
                Some(_) => entry.path.parent().and_then(|p| by_path.get(&p).copied()),
            };
            let id = self.alloc(owner, entry.schema.clone());
            if top.is_some()
                && let (Some(owner), Some(name)) = (owner, entry.name.as_deref())
            {
                self.attach_child(owner, name, id, false);
            }
            if let Some(toggle_schema) = entry.toggle {
                let toggle = self.alloc(Some(id), toggle_schema);
                self.attach_child(id, crate::schema::ENABLED_PROPERTY, toggle, true);
            }
            by_path.insert(entry.path, id);
            top.get_or_insert(id);
        }
        match top {
            Some(id) => id,
            None => self.alloc(parent, schema),
        }
    }

    fn kind_mut(&mut self, id: FieldId) -> Option<&mut FieldKind> {
        self.fields.get_mut(&id).map(|f| &mut f.kind)
    }

    fn free(&mut self, id: FieldId) {
        let Some(field) = self.fields.remove(&id) else {
            return;
        };
        match field.kind {
            FieldKind::Object { children, .. } => children.into_values().for_each(|c| self.free(c)),
            FieldKind::Map { entries } => entries.into_iter().for_each(|e| self.free(e.value)),
            FieldKind::Array { items } => items.into_iter().for_each(|c| self.free(c)),
            FieldKind::Scalar { .. } => {}
        }
        self.events.push(FormEvent::Removed(id));
    }

    /// The document path of a field. Map entries without a key yet are addressed by position.
    pub fn path_of(&self, id: FieldId) -> Option<Path> {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.fields.get(&current)?.parent {
            match &self.fields.get(&parent)?.kind {
                FieldKind::Object { children, .. } => {
                    let (name, _) = children.iter().find(|(_, c)| **c == current)?;
                    segments.push(name.clone());
                }
                FieldKind::Array { items } => {
                    let pos = items.iter().position(|c| *c == current)?;
                    segments.push(pos.to_string());
                }
                FieldKind::Map { entries } => {
                    let pos = entries.iter().position(|e| e.value == current)?;
                    if entries[pos].key.is_empty() {
                        segments.push(crate::path::MAP_VALUE_MARKER.to_owned());
                        segments.push(pos.to_string());
                    } else {
                        segments.push(entries[pos].key.clone());
                    }
                }
                FieldKind::Scalar { .. } => return None,
            }
            current = parent;
        }
        segments.reverse();
        Some(segments.into_iter().collect())
    }

    /// Resolve a form path, including `<map>.<index>.[key]` / `<map>.<index>.[value]` addresses.
    pub fn resolve(&self, path: &Path) -> Option<Target> {
        let segments = path.segments();
        let mut id = self.root;
        let mut i = 0;
        while i < segments.len() {
            let segment = &segments[i];
            id = match &self.fields.get(&id)?.kind {
                FieldKind::Object { children, .. } => *children.get(segment)?,
                FieldKind::Array { items } => *items.get(index_segment(segment)?)?,
                FieldKind::Map { entries } => {
                    let marker = segments.get(i + 1).filter(|s| is_marker(s));
                    match (marker, index_segment(segment)) {
                        (Some(marker), Some(index)) => {
                            let entry = entries.get(index)?;
                            i += 1;
                            if marker == MAP_KEY_MARKER {
                                return (i + 1 == segments.len())
                                    .then_some(Target::MapKey { map: id, index });
                            }
                            entry.value
                        }
                        _ => entries.iter().find(|e| e.key == *segment)?.value,
                    }
                }
                FieldKind::Scalar { .. } => return None,
            };
            i += 1;
        }
        Some(Target::Field(id))
    }

    pub fn field_at(&self, path: &Path) -> Option<FieldId> {
        match self.resolve(path)? {
            Target::Field(id) => Some(id),
            Target::MapKey { .. } => None,
        }
    }

    /// The array field owning `path` and the item index, when `path` points inside an array item.
    pub fn owning_array(&self, path: &Path) -> Option<(FieldId, usize)> {
        let mut prefix = Path::root();
        for segment in path.segments() {
            let id = self.field_at(&prefix)?;
            if let FieldKind::Array { .. } = self.fields.get(&id)?.kind {
                return Some((id, index_segment(segment)?));
            }
            prefix = prefix.child(segment.clone());
        }
        None
    }

    /// The deepest field along `path` and how many segments it consumed.
    fn deepest_field(&self, path: &Path) -> (FieldId, usize) {
        let mut id = self.root;
        for (depth, segment) in path.segments().iter().enumerate() {
            let next = match self.fields.get(&id).map(|f| &f.kind) {
                Some(FieldKind::Object { children, .. }) => children.get(segment).copied(),
                Some(FieldKind::Array { items }) => {
                    index_segment(segment).and_then(|i| items.get(i)).copied()
                }
                Some(FieldKind::Map { entries }) => {
                    entries.iter().find(|e| e.key == *segment).map(|e| e.value)
                }
                _ => None,
            };
            match next {
                Some(next) => id = next,
                None => return (id, depth),
            }
        }
        (id, path.len())
    }

    pub fn is_required(&self, id: FieldId) -> bool {
        let Some(field) = self.fields.get(&id) else {
            return false;
        };
        let Some(parent) = field.parent.and_then(|p| self.fields.get(&p)) else {
            return false;
        };
        let FieldKind::Object { children, .. } = &parent.kind else {
            return false;
        };
        let Some((name, _)) = children.iter().find(|(_, c)| **c == id) else {
            return false;
        };
        let siblings = match self.serialize_field(parent.id) {
            Some(Value::Object(map)) => map,
            _ => IndexMap::new(),
        };
        self.rule
            .evaluate(name, &field.schema, &siblings)
            .unwrap_or_else(|| parent.schema.is_required(name))
    }

    /// Document paths the schema has no field for; their values are preserved verbatim.
    pub fn mismatches(&self) -> Vec<Path> {
        let mut out = Vec::new();
        let mut ids: Vec<_> = self.fields.keys().copied().collect();
        ids.sort();
        for id in ids {
            let Some(field) = self.fields.get(&id) else {
                continue;
            };
            let Some(at) = self.path_of(id) else {
                continue;
            };
            if field.unmapped.is_some() {
                out.push(at.clone());
            }
            if let FieldKind::Object { extras, .. } = &field.kind {
                out.extend(extras.keys().map(|k| at.child(k.clone())));
            }
        }
        out
    }

    // ---- text -> form ------------------------------------------------------------------

    /// Bring the fields touched by `changes` in line with `doc`.
    ///
    /// Objects only refresh their own shape (unknown keys, mismatched values); their
    /// children are reached through their own changed paths. Arrays, maps and scalars
    /// are reloaded from `doc`, re-using existing item fields.
    pub fn patch(&mut self, changes: &ChangeSet, doc: &Value) {
        let mut settled: Vec<Path> = Vec::new();
        for changed in changes.paths() {
            if settled.iter().any(|s| changed.starts_with(s)) {
                continue;
            }
            let (id, depth) = self.deepest_field(changed);
            let at: Path = changed.segments()[..depth].iter().cloned().collect();
            let value = path::get(doc, &at);
            let is_object = matches!(
                self.fields.get(&id).map(|f| &f.kind),
                Some(FieldKind::Object { .. })
            );
            if is_object {
                self.load_object_shape(id, value, &at);
                if depth < changed.len() {
                    settled.push(changed.clone());
                }
            } else {
                self.load(id, value, &at);
                settled.push(at);
            }
        }
    }

    /// Reload a whole subtree from `value`.
    fn load(&mut self, id: FieldId, value: Option<&Value>, at: &Path) {
        let incoming = value.filter(|v| !v.is_effectively_empty());
        let Some(kind) = self.fields.get(&id).map(|f| f.kind.clone()) else {
            return;
        };
        match kind {
            FieldKind::Scalar { .. } => self.load_scalar(id, incoming, at),
            FieldKind::Object { children, .. } => {
                self.load_object_shape(id, incoming, at);
                let map = incoming.and_then(Value::as_object);
                for (name, child) in children {
                    let child_value = map.and_then(|m| m.get(&name));
                    self.load(child, child_value, &at.child(name));
                }
            }
            FieldKind::Array { .. } => {
                let values: &[Value] = match incoming {
                    Some(Value::Array(values)) => {
                        self.set_unmapped(id, None, at);
                        values.as_slice()
                    }
                    other => {
                        self.set_unmapped(id, other.cloned(), at);
                        &[]
                    }
                };
                let items = self.resize_array(id, values.len(), at);
                for (i, (item, v)) in items.into_iter().zip(values).enumerate() {
                    self.load(item, Some(v), &at.index(i));
                }
            }
            FieldKind::Map { .. } => {
                let empty = IndexMap::new();
                let map = match incoming {
                    Some(Value::Object(map)) => {
                        self.set_unmapped(id, None, at);
                        map
                    }
                    other => {
                        self.set_unmapped(id, other.cloned(), at);
                        &empty
                    }
                };
                let entries = self.reconcile_entries(id, map, at);
                for (key, value_id) in entries {
                    self.load(value_id, map.get(&key), &at.child(key));
                }
            }
        }
    }

    fn load_scalar(&mut self, id: FieldId, incoming: Option<&Value>, at: &Path) {
        let (value, unmapped) = match incoming {
            Some(v) if v.is_container() => (None, Some(v.clone())),
            Some(v) => (Some(v.clone()), None),
            None => (None, None),
        };
        if unmapped.is_some() {
            log::warn!("`{at}` holds a {} where the schema expects a scalar; kept verbatim", unmapped.as_ref().map_or("value", Value::type_name));
        }
        let Some(field) = self.fields.get_mut(&id) else {
            return;
        };
        let overridden = value.is_some();
        let current = match &field.kind {
            FieldKind::Scalar { value } => value.as_ref(),
            _ => None,
        };
        if current == value.as_ref() && field.overridden == overridden && field.unmapped == unmapped {
            return;
        }
        field.kind = FieldKind::Scalar { value };
        field.overridden = overridden;
        field.unmapped = unmapped;
        let had_error = field.error.take().is_some();
        self.events.push(FormEvent::ValueChanged(id));
        if had_error {
            self.events.push(FormEvent::ErrorChanged(id));
        }
    }

    fn set_unmapped(&mut self, id: FieldId, unmapped: Option<Value>, at: &Path) {
        let Some(field) = self.fields.get_mut(&id) else {
            return;
        };
        if field.unmapped == unmapped {
            return;
        }
        if let Some(v) = &unmapped {
            log::warn!("`{at}` holds a {} the schema cannot represent; kept verbatim", v.type_name());
        }
        field.unmapped = unmapped;
        self.events.push(FormEvent::ValueChanged(id));
    }

    /// Refresh an object's unknown keys and mismatch state without touching its children.
    fn load_object_shape(&mut self, id: FieldId, value: Option<&Value>, at: &Path) {
        let value = value.filter(|v| !v.is_effectively_empty());
        let (unmapped, extras) = match (value, self.fields.get(&id).map(|f| &f.kind)) {
            (Some(Value::Object(map)), Some(FieldKind::Object { children, .. })) => {
                let extras: IndexMap<_, _> = map
                    .iter()
                    .filter(|(k, _)| !children.contains_key(*k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (None, extras)
            }
            (Some(other), _) => (Some(other.clone()), IndexMap::new()),
            (None, _) => (None, IndexMap::new()),
        };
        for key in extras.keys() {
            log::warn!("`{}` has no schema property; kept verbatim", at.child(key.clone()));
        }
        self.set_unmapped(id, unmapped, at);
        if let Some(FieldKind::Object { extras: slot, .. }) = self.kind_mut(id)
            && *slot != extras
        {
            *slot = extras;
            self.events.push(FormEvent::ValueChanged(id));
        }
    }

    /// Grow or shrink an array to `len` items; surviving items keep their ids.
    fn resize_array(&mut self, id: FieldId, len: usize, at: &Path) -> Vec<FieldId> {
        let Some(field) = self.fields.get(&id) else {
            return Vec::new();
        };
        let item_schema = field.schema.item_schema();
        let FieldKind::Array { items } = &field.kind else {
            return Vec::new();
        };
        let mut items = items.clone();
        if items.len() == len {
            return items;
        }
        for removed in items.split_off(len.min(items.len())) {
            self.free(removed);
        }
        while items.len() < len {
            let item = self.build_subtree(item_schema.clone(), Some(id), at.index(items.len()));
            items.push(item);
        }
        if let Some(FieldKind::Array { items: slot }) = self.kind_mut(id) {
            *slot = items.clone();
        }
        self.events.push(FormEvent::ItemsChanged(id));
        items
    }

    /// Match map entries to `map` by key. Entries still waiting for a key stay at the end.
    fn reconcile_entries(
        &mut self,
        id: FieldId,
        map: &IndexMap<String, Value>,
        at: &Path,
    ) -> Vec<(String, FieldId)> {
        let Some(field) = self.fields.get_mut(&id) else {
            return Vec::new();
        };
        let value_schema = field.schema.value_schema();
        let FieldKind::Map { entries } = &mut field.kind else {
            return Vec::new();
        };
        let mut pool = std::mem::take(entries);
        let before: Vec<FieldId> = pool.iter().map(|e| e.value).collect();

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort_by(|a, b| compare_keys(a, b));

        let mut next = Vec::with_capacity(keys.len());
        for key in keys {
            let entry = match pool.iter().position(|e| e.key == *key) {
                Some(pos) => pool.remove(pos),
                None => {
                    let value = self.build_subtree(value_schema.clone(), Some(id), at.child(key.clone()));
                    MapEntry {
                        key: key.clone(),
                        value,
                        error: None,
                    }
                }
            };
            next.push(entry);
        }
        for leftover in pool {
            if leftover.key.is_empty() {
                next.push(leftover);
            } else {
                self.free(leftover.value);
            }
        }

        let loaded = next
            .iter()
            .filter(|e| !e.key.is_empty())
            .map(|e| (e.key.clone(), e.value))
            .collect();
        let after: Vec<FieldId> = next.iter().map(|e| e.value).collect();
        if let Some(FieldKind::Map { entries }) = self.kind_mut(id) {
            *entries = next;
        }
        if before != after {
            self.events.push(FormEvent::ItemsChanged(id));
        }
        loaded
    }

    // ---- user edits --------------------------------------------------------------------

    pub fn apply(&mut self, edit: FormEdit) -> Result<(), FormError> {
        match edit {
            FormEdit::SetValue { path, value } => self.set_value(&path, value),
            FormEdit::Reset { path } => self.reset(&path),
            FormEdit::AddItem { path } => self.add_item(&path).map(|_| ()),
            FormEdit::RemoveItem { path, index } => self.remove_item(&path, index),
            FormEdit::MoveItem { path, from, to } => self.move_item(&path, from, to),
            FormEdit::AddEntry { path } => self.add_entry(&path).map(|_| ()),
            FormEdit::RenameEntry { path, index, key } => self.rename_entry(&path, index, key),
            FormEdit::RemoveEntry { path, index } => self.remove_entry(&path, index),
            FormEdit::MoveEntry { path, from, to } => self.move_entry(&path, from, to),
        }
    }

    /// Set one scalar field from user input.
    ///
    /// Paths inside an array item one past the end grow the owning array first, so
    /// `ports.1` on a one-item array appends.
    pub fn set_value(&mut self, path: &Path, value: Value) -> Result<(), FormError> {
        let target = match self.resolve(path) {
            Some(target) => target,
            None => {
                let (array, index) = self
                    .owning_array(path)
                    .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
                let len = match self.fields.get(&array).map(|f| &f.kind) {
                    Some(FieldKind::Array { items }) => items.len(),
                    _ => 0,
                };
                if index != len {
                    return Err(FormError::UnknownPath(path.clone()));
                }
                let array_path = self
                    .path_of(array)
                    .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
                self.add_item(&array_path)?;
                self.resolve(path)
                    .ok_or_else(|| FormError::UnknownPath(path.clone()))?
            }
        };

        let id = match target {
            Target::MapKey { map, index } => {
                let map_path = self
                    .path_of(map)
                    .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
                let key = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.preview(),
                };
                return self.rename_entry(&map_path, index, key);
            }
            Target::Field(id) => id,
        };

        let policy = self.options.override_policy;
        let Some(field) = self.fields.get_mut(&id) else {
            return Err(FormError::UnknownPath(path.clone()));
        };
        if !matches!(field.kind, FieldKind::Scalar { .. }) {
            return Err(FormError::WrongKind {
                path: path.clone(),
                expected: "a scalar field",
            });
        }
        let (value, overridden) = match policy {
            OverridePolicy::Sticky => (Some(value), true),
            OverridePolicy::MatchDefaultClears => {
                if value.is_blank() || Some(&value) == field.schema.default.as_ref() {
                    (None, false)
                } else {
                    (Some(value), true)
                }
            }
        };
        field.kind = FieldKind::Scalar { value };
        field.overridden = overridden;
        field.unmapped = None;
        let had_error = field.error.take().is_some();
        self.events.push(FormEvent::ValueChanged(id));
        if had_error {
            self.events.push(FormEvent::ErrorChanged(id));
        }
        Ok(())
    }

    /// Parse renderer text for a scalar field and set it; the parse error is kept on the field.
    pub fn set_input(&mut self, path: &Path, text: &str) -> Result<(), FormError> {
        let id = self
            .field_at(path)
            .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
        let schema = self
            .fields
            .get(&id)
            .map(|f| f.schema.clone())
            .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
        match schema.parse_input(text) {
            Ok(value) => self.set_value(path, value),
            Err(err) => {
                let err = FormError::from(err);
                if let Some(field) = self.fields.get_mut(&id) {
                    field.error = Some(err.clone());
                    self.events.push(FormEvent::ErrorChanged(id));
                }
                Err(err)
            }
        }
    }

    /// Forget everything set at `path`: scalars fall back to their default, containers empty out.
    pub fn reset(&mut self, path: &Path) -> Result<(), FormError> {
        let id = self
            .field_at(path)
            .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
        self.reset_field(id, path);
        Ok(())
    }

    fn reset_field(&mut self, id: FieldId, at: &Path) {
        let Some(kind) = self.fields.get(&id).map(|f| f.kind.clone()) else {
            return;
        };
        match kind {
            FieldKind::Object { children, .. } => {
                self.load_object_shape(id, None, at);
                for (name, child) in children {
                    self.reset_field(child, &at.child(name));
                }
            }
            FieldKind::Array { .. } | FieldKind::Map { .. } => self.load(id, None, at),
            FieldKind::Scalar { .. } => {
                self.load_scalar(id, None, at);
            }
        }
        if let Some(field) = self.fields.get_mut(&id)
            && field.error.take().is_some()
        {
            self.events.push(FormEvent::ErrorChanged(id));
        }
    }

    fn array_items(&self, path: &Path) -> Result<(FieldId, &Vec<FieldId>), FormError> {
        let id = self
            .field_at(path)
            .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
        match self.fields.get(&id).map(|f| &f.kind) {
            Some(FieldKind::Array { items }) => Ok((id, items)),
            _ => Err(FormError::WrongKind {
                path: path.clone(),
                expected: "an array",
            }),
        }
    }

    /// Append an empty item built from the `items` schema.
    pub fn add_item(&mut self, path: &Path) -> Result<FieldId, FormError> {
        let (id, items) = self.array_items(path)?;
        let index = items.len();
        let Some(item_schema) = self.fields.get(&id).map(|f| f.schema.item_schema()) else {
            return Err(FormError::UnknownPath(path.clone()));
        };
        let item = self.build_subtree(item_schema, Some(id), path.index(index));
        if let Some(FieldKind::Array { items }) = self.kind_mut(id) {
            items.push(item);
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(item)
    }

    pub fn remove_item(&mut self, path: &Path, index: usize) -> Result<(), FormError> {
        let (id, items) = self.array_items(path)?;
        if index >= items.len() {
            return Err(FormError::IndexOutOfRange {
                path: path.clone(),
                index,
                len: items.len(),
            });
        }
        let mut removed = None;
        if let Some(FieldKind::Array { items }) = self.kind_mut(id) {
            removed = Some(items.remove(index));
        }
        if let Some(removed) = removed {
            self.free(removed);
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(())
    }

    /// Move an item; the item keeps its field (and everything under it).
    pub fn move_item(&mut self, path: &Path, from: usize, to: usize) -> Result<(), FormError> {
        let (id, items) = self.array_items(path)?;
        let len = items.len();
        for index in [from, to] {
            if index >= len {
                return Err(FormError::IndexOutOfRange {
                    path: path.clone(),
                    index,
                    len,
                });
            }
        }
        if from == to {
            return Ok(());
        }
        if let Some(FieldKind::Array { items }) = self.kind_mut(id) {
            let item = items.remove(from);
            items.insert(to, item);
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(())
    }

    fn map_entries(&self, path: &Path) -> Result<(FieldId, &Vec<MapEntry>), FormError> {
        let id = self
            .field_at(path)
            .ok_or_else(|| FormError::UnknownPath(path.clone()))?;
        match self.fields.get(&id).map(|f| &f.kind) {
            Some(FieldKind::Map { entries }) => Ok((id, entries)),
            _ => Err(FormError::WrongKind {
                path: path.clone(),
                expected: "a key/value map",
            }),
        }
    }

    /// Append an entry without a key; it is not serialized until it gets one.
    pub fn add_entry(&mut self, path: &Path) -> Result<usize, FormError> {
        let (id, entries) = self.map_entries(path)?;
        let index = entries.len();
        let Some(value_schema) = self.fields.get(&id).map(|f| f.schema.value_schema()) else {
            return Err(FormError::UnknownPath(path.clone()));
        };
        let value = self.build_subtree(value_schema, Some(id), path.index(index));
        if let Some(FieldKind::Map { entries }) = self.kind_mut(id) {
            entries.push(MapEntry {
                key: String::new(),
                value,
                error: None,
            });
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(index)
    }

    /// Give the entry at `index` a new key.
    ///
    /// A key already used by another entry is rejected: the entry loses its key and
    /// value and carries a `DuplicateKey` error; the rest of the map is untouched.
    pub fn rename_entry(&mut self, path: &Path, index: usize, key: String) -> Result<(), FormError> {
        let (id, entries) = self.map_entries(path)?;
        let Some(entry) = entries.get(index) else {
            return Err(FormError::IndexOutOfRange {
                path: path.clone(),
                index,
                len: entries.len(),
            });
        };
        if entry.key == key {
            return Ok(());
        }
        let duplicate = !key.is_empty()
            && entries
                .iter()
                .enumerate()
                .any(|(i, e)| i != index && e.key == key);
        let old_value = entry.value;

        if duplicate {
            let err = FormError::DuplicateKey {
                path: path.clone(),
                key,
            };
            let Some(value_schema) = self.fields.get(&id).map(|f| f.schema.value_schema()) else {
                return Err(err);
            };
            self.free(old_value);
            let fresh = self.build_subtree(value_schema, Some(id), path.index(index));
            if let Some(FieldKind::Map { entries }) = self.kind_mut(id) {
                entries[index] = MapEntry {
                    key: String::new(),
                    value: fresh,
                    error: Some(err.clone()),
                };
            }
            self.events.push(FormEvent::ItemsChanged(id));
            self.events.push(FormEvent::ErrorChanged(id));
            return Err(err);
        }

        if let Some(FieldKind::Map { entries }) = self.kind_mut(id) {
            entries[index].key = key;
            entries[index].error = None;
            entries.sort_by(|a, b| compare_keys(&a.key, &b.key));
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(())
    }

    pub fn remove_entry(&mut self, path: &Path, index: usize) -> Result<(), FormError> {
        let (id, entries) = self.map_entries(path)?;
        if index >= entries.len() {
            return Err(FormError::IndexOutOfRange {
                path: path.clone(),
                index,
                len: entries.len(),
            });
        }
        let mut removed = None;
        if let Some(FieldKind::Map { entries }) = self.kind_mut(id) {
            removed = Some(entries.remove(index).value);
        }
        if let Some(removed) = removed {
            self.free(removed);
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(())
    }

    /// Reorder non-numeric entries among themselves; numeric keys stay sorted up front.
    pub fn move_entry(&mut self, path: &Path, from: usize, to: usize) -> Result<(), FormError> {
        let (id, entries) = self.map_entries(path)?;
        let len = entries.len();
        for index in [from, to] {
            let Some(entry) = entries.get(index) else {
                return Err(FormError::IndexOutOfRange {
                    path: path.clone(),
                    index,
                    len,
                });
            };
            if is_numeric_key(&entry.key) {
                return Err(FormError::NumericKeyPinned {
                    path: path.clone(),
                    key: entry.key.clone(),
                });
            }
        }
        if from == to {
            return Ok(());
        }
        if let Some(FieldKind::Map { entries }) = self.kind_mut(id) {
            let entry = entries.remove(from);
            entries.insert(to, entry);
        }
        self.events.push(FormEvent::ItemsChanged(id));
        Ok(())
    }

    // ---- form -> document --------------------------------------------------------------

    /// Rebuild the document. Blank, non-overridden fields are left out and containers
    /// that end up empty are pruned; the root is always an object (possibly empty).
    pub fn serialize(&self) -> Value {
        self.serialize_field(self.root)
            .unwrap_or_else(Value::object)
    }

    fn serialize_field(&self, id: FieldId) -> Option<Value> {
        let field = self.fields.get(&id)?;
        if let Some(unmapped) = &field.unmapped {
            return Some(unmapped.clone());
        }
        match &field.kind {
            FieldKind::Scalar { value } => match value {
                Some(v) if field.overridden || !v.is_blank() => Some(v.clone()),
                _ => None,
            },
            FieldKind::Object {
                children, extras, ..
            } => {
                let mut map = IndexMap::new();
                for name in field.schema.properties.keys() {
                    if let Some(child) = children.get(name)
                        && let Some(v) = self.serialize_field(*child)
                    {
                        map.insert(name.clone(), v);
                    }
                }
                for (k, v) in extras {
                    map.insert(k.clone(), v.clone());
                }
                (!map.is_empty()).then_some(Value::Object(map))
            }
            FieldKind::Array { items } => {
                let values: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.serialize_field(*item))
                    .collect();
                (!values.is_empty()).then_some(Value::Array(values))
            }
            FieldKind::Map { entries } => {
                let mut map = IndexMap::new();
                for entry in entries.iter().filter(|e| !e.key.is_empty()) {
                    if let Some(v) = self.serialize_field(entry.value) {
                        map.insert(entry.key.clone(), v);
                    }
                }
                (!map.is_empty()).then_some(Value::Object(map))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FieldKind, FormEdit, FormError, FormEvent, FormModel, FormOptions, OverridePolicy, Target,
        compare_keys,
    };
    use crate::codec::decode;
    use crate::diff::{ChangeSet, diff};
    use crate::path::Path;
    use crate::schema::{InputError, SchemaNode};
    use crate::Value;
    use pretty_assertions::assert_eq;
    use std::cmp::Ordering;
    use std::rc::Rc;

    const SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "replicas": { "type": "integer", "default": 1, "minimum": 0, "maximum": 10 },
            "securityContext": { "type": "object", "additionalProperties": false },
            "image": {
                "type": "object",
                "properties": {
                    "repository": { "type": "string" },
                    "tag": { "type": "string" }
                }
            },
            "ingress": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean", "default": false },
                    "host": { "type": "string", "x-required-if": "enabled" }
                }
            },
            "labels": { "type": "object" },
            "ports": { "type": "array", "items": { "type": "integer" } },
            "env": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "value": { "type": "string" }
                    }
                }
            }
        }
    }"#;

    fn model() -> FormModel {
        let schema = Rc::new(SchemaNode::parse_json(SCHEMA).unwrap());
        FormModel::build(schema, FormOptions::default())
    }

    fn loaded(text: &str) -> FormModel {
        let mut form = model();
        let doc = decode(text).unwrap();
        form.patch(&ChangeSet::full(&doc), &doc);
        form.take_events();
        form
    }

    fn path(s: &str) -> Path {
        Path::from(s)
    }

    #[test]
    fn build_binds_fields_to_paths() {
        let form = model();
        for p in ["replicas", "image.tag", "ingress.enabled", "ingress.host", "labels", "env"] {
            let id = form.field_at(&path(p)).unwrap();
            assert_eq!(form.path_of(id), Some(path(p)));
        }
        let ingress = form.field(form.field_at(&path("ingress")).unwrap()).unwrap();
        let FieldKind::Object { toggle, .. } = ingress.kind() else {
            panic!("ingress should be an object");
        };
        assert_eq!(*toggle, form.field_at(&path("ingress.enabled")));
    }

    #[test]
    fn load_then_serialize_round_trips() {
        let text = "replicas: 3\nimage:\n  repository: nginx\nlabels:\n  '1': z\n  app: web\nports:\n- 80\n- 443\nenv:\n- name: A\n  value: '1'\n";
        let form = loaded(text);
        assert_eq!(form.serialize(), decode(text).unwrap());
    }

    #[test]
    fn overridden_default_scenario() {
        let mut form = loaded("replicas: 3\n");
        let id = form.field_at(&path("replicas")).unwrap();
        let field = form.field(id).unwrap();
        assert_eq!(field.value(), Some(&Value::from(3_i64)));
        assert!(field.overridden());
        assert!(field.differs_from_default());

        let prev = form.serialize();
        let next = decode("").unwrap();
        let changes = diff(&prev, &next);
        assert_eq!(changes.get(&path("replicas")), Some(crate::diff::Change::Removed));
        form.patch(&changes, &next);

        let field = form.field(id).unwrap();
        assert_eq!(field.value(), None);
        assert!(!field.overridden());
        assert_eq!(field.display_value(), Some(&Value::from(1_i64)));
        assert_eq!(form.serialize(), Value::object());
        assert_eq!(form.take_events(), vec![FormEvent::ValueChanged(id)]);
    }

    #[test]
    fn override_policies_differ_on_default_values() {
        let mut form = model();
        form.set_value(&path("replicas"), Value::from(1_i64)).unwrap();
        assert_eq!(form.serialize(), decode("replicas: 1\n").unwrap());

        form.set_override_policy(OverridePolicy::MatchDefaultClears);
        form.set_value(&path("replicas"), Value::from(1_i64)).unwrap();
        assert_eq!(form.serialize(), Value::object());
        form.set_value(&path("replicas"), Value::from(4_i64)).unwrap();
        assert_eq!(form.serialize(), decode("replicas: 4\n").unwrap());
    }

    #[test]
    fn patch_leaves_untouched_array_items_alone() {
        let mut form = loaded("env:\n- {name: A, value: '1'}\n- {name: B, value: '2'}\nreplicas: 2\n");
        let items_before = match form.field(form.field_at(&path("env")).unwrap()).unwrap().kind() {
            FieldKind::Array { items } => items.clone(),
            _ => panic!("env should be an array"),
        };
        let prev = form.serialize();
        let next = decode("env:\n- {name: A, value: '1'}\n- {name: B, value: '2'}\nreplicas: 5\n").unwrap();
        form.patch(&diff(&prev, &next), &next);
        let items_after = match form.field(form.field_at(&path("env")).unwrap()).unwrap().kind() {
            FieldKind::Array { items } => items.clone(),
            _ => panic!("env should be an array"),
        };
        assert_eq!(items_before, items_after);
        let replicas = form.field_at(&path("replicas")).unwrap();
        assert_eq!(form.take_events(), vec![FormEvent::ValueChanged(replicas)]);
    }

    #[test]
    fn array_shrink_removes_trailing_items_only() {
        let mut form = loaded("ports: [1, 2, 3]\n");
        let first = form.field_at(&path("ports.0")).unwrap();
        let third = form.field_at(&path("ports.2")).unwrap();
        let prev = form.serialize();
        let next = decode("ports: [9, 2]\n").unwrap();
        form.patch(&diff(&prev, &next), &next);
        assert_eq!(form.field_at(&path("ports.0")), Some(first));
        assert_eq!(form.field(third).map(|f| f.id()), None);
        assert_eq!(form.serialize(), next);
    }

    #[test]
    fn move_item_keeps_nested_fields() {
        let mut form = loaded("env:\n- {name: A}\n- {name: B}\n- {name: C}\n");
        let ids: Vec<_> = (0..3)
            .map(|i| form.field_at(&path(&format!("env.{i}"))).unwrap())
            .collect();
        form.apply(FormEdit::MoveItem { path: path("env"), from: 2, to: 0 }).unwrap();
        let moved: Vec<_> = (0..3)
            .map(|i| form.field_at(&path(&format!("env.{i}"))).unwrap())
            .collect();
        assert_eq!(moved, vec![ids[2], ids[0], ids[1]]);
        assert_eq!(form.serialize(), decode("env:\n- {name: C}\n- {name: A}\n- {name: B}\n").unwrap());
    }

    #[test]
    fn set_value_one_past_the_end_appends_an_item() {
        let mut form = loaded("ports: [80]\n");
        form.set_value(&path("ports.1"), Value::from(443_i64)).unwrap();
        assert_eq!(form.serialize(), decode("ports: [80, 443]\n").unwrap());
        assert!(matches!(
            form.set_value(&path("ports.5"), Value::from(1_i64)),
            Err(FormError::UnknownPath(_))
        ));
    }

    #[test]
    fn owning_array_only_matches_real_arrays() {
        let form = loaded("ports: [80]\nlabels: {'0': zero}\n");
        let ports = form.field_at(&path("ports")).unwrap();
        assert_eq!(form.owning_array(&path("ports.0")), Some((ports, 0)));
        assert_eq!(form.owning_array(&path("labels.0")), None);
    }

    #[test]
    fn map_rejects_duplicate_keys() {
        let mut form = loaded("labels:\n  foo: a\n");
        let index = form.add_entry(&path("labels")).unwrap();
        form.set_value(&path(&format!("labels.{index}.[value]")), Value::from("b")).unwrap();
        let err = form
            .set_value(&path(&format!("labels.{index}.[key]")), Value::from("foo"))
            .unwrap_err();
        assert!(matches!(err, FormError::DuplicateKey { .. }));

        let labels = form.field(form.field_at(&path("labels")).unwrap()).unwrap();
        let FieldKind::Map { entries } = labels.kind() else {
            panic!("labels should be a map");
        };
        assert_eq!(entries.iter().filter(|e| e.key == "foo").count(), 1);
        assert!(entries[index].error.is_some());
        assert_eq!(form.serialize(), decode("labels:\n  foo: a\n").unwrap());
    }

    #[test]
    fn numeric_keys_sort_first() {
        let form = loaded("labels:\n  '2': x\n  apple: y\n  '1': z\n");
        let keys: Vec<_> = form
            .serialize()
            .get("labels")
            .and_then(Value::as_object)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["1", "2", "apple"]);
        assert_eq!(compare_keys("10", "9"), Ordering::Greater);
        assert_eq!(compare_keys("b", "a"), Ordering::Equal);
    }

    #[test]
    fn numeric_keys_cannot_be_moved() {
        let mut form = loaded("labels:\n  '1': z\n  b: x\n  a: y\n");
        assert!(matches!(
            form.move_entry(&path("labels"), 0, 2),
            Err(FormError::NumericKeyPinned { .. })
        ));
        form.move_entry(&path("labels"), 2, 1).unwrap();
        let keys: Vec<_> = form
            .serialize()
            .get("labels")
            .and_then(Value::as_object)
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["1", "a", "b"]);
    }

    #[test]
    fn map_entries_are_matched_by_key_on_patch() {
        let mut form = loaded("labels:\n  a: '1'\n  b: '2'\n");
        let b = form.field_at(&path("labels.b")).unwrap();
        let prev = form.serialize();
        let next = decode("labels:\n  b: '2'\n  c: '3'\n").unwrap();
        form.patch(&diff(&prev, &next), &next);
        assert_eq!(form.field_at(&path("labels.b")), Some(b));
        assert_eq!(form.serialize(), next);
    }

    #[test]
    fn pending_entries_survive_patches() {
        let mut form = loaded("labels:\n  a: '1'\n");
        let index = form.add_entry(&path("labels")).unwrap();
        let prev = form.serialize();
        let next = decode("labels:\n  a: '2'\n").unwrap();
        form.patch(&diff(&prev, &next), &next);
        assert_eq!(
            form.resolve(&path(&format!("labels.{index}.[key]"))),
            Some(Target::MapKey {
                map: form.field_at(&path("labels")).unwrap(),
                index
            })
        );
    }

    #[test]
    fn unknown_keys_and_mismatched_values_are_preserved() {
        let text = "replicas: 2\nextra:\n  anything: [1, 2]\nimage: latest\nports: {a: 1}\n";
        let form = loaded(text);
        assert_eq!(form.serialize(), decode(text).unwrap());
        assert_eq!(
            form.mismatches(),
            vec![path("extra"), path("image"), path("ports")]
        );
    }

    #[test]
    fn required_if_follows_sibling_toggle() {
        let mut form = model();
        let host = form.field_at(&path("ingress.host")).unwrap();
        assert!(!form.is_required(host));
        form.set_value(&path("ingress.enabled"), Value::Bool(true)).unwrap();
        assert!(form.is_required(host));
    }

    #[test]
    fn invalid_input_is_reported_on_the_field() {
        let mut form = model();
        let err = form.set_input(&path("replicas"), "many").unwrap_err();
        assert!(matches!(err, FormError::InvalidInput(_)));
        let id = form.field_at(&path("replicas")).unwrap();
        assert!(form.field(id).unwrap().error().is_some());
        form.set_input(&path("replicas"), "4").unwrap();
        assert!(form.field(id).unwrap().error().is_none());
        assert_eq!(form.serialize(), decode("replicas: 4\n").unwrap());
    }

    #[test]
    fn out_of_range_input_is_kept_on_the_field() {
        let mut form = loaded("replicas: 3\n");
        let id = form.field_at(&path("replicas")).unwrap();
        for text in ["-5", "99"] {
            let err = form.set_input(&path("replicas"), text).unwrap_err();
            assert!(matches!(err, FormError::InvalidInput(InputError::OutOfRange { .. })));
            assert_eq!(form.field(id).unwrap().error(), Some(&err));
        }
        assert_eq!(form.serialize(), decode("replicas: 3\n").unwrap());
        form.set_input(&path("replicas"), "10").unwrap();
        assert!(form.field(id).unwrap().error().is_none());
        assert_eq!(form.serialize(), decode("replicas: 10\n").unwrap());
    }

    #[test]
    fn closed_object_keeps_document_keys_as_extras() {
        let text = "securityContext:\n  runAsUser: 1000\n";
        let form = loaded(text);
        let id = form.field_at(&path("securityContext")).unwrap();
        let FieldKind::Object { children, extras, .. } = form.field(id).unwrap().kind() else {
            panic!("securityContext should be an object");
        };
        assert!(children.is_empty());
        assert_eq!(extras.get("runAsUser"), Some(&Value::from(1000_i64)));
        assert_eq!(form.serialize(), decode(text).unwrap());
        assert_eq!(form.mismatches(), vec![path("securityContext.runAsUser")]);
    }

    #[test]
    fn reset_clears_overrides_and_items() {
        let mut form = loaded("replicas: 3\nports: [1]\n");
        form.reset(&path("replicas")).unwrap();
        form.reset(&path("ports")).unwrap();
        assert_eq!(form.serialize(), Value::object());
    }
}
