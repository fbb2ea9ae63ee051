//! Changed-path computation between two document snapshots.
//!
//! Absent values and effectively empty ones (`null`, `[]`, `{}`) compare equal.
//! When a subtree appears or disappears, every path inside it is reported with the
//! same `Added`/`Removed` tag so consumers can clear or populate the whole subtree.
//! Any path whose subtree changed is reported `Modified`, up to (not including)
//! the document root.

use crate::path::{self, Path};
use crate::Value;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Modified,
    Added,
    Removed,
}

/// Ordered set of changed paths. Parents are always listed before their children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: IndexMap<Path, Change>,
}

impl ChangeSet {
    /// Every path of `doc` marked `Added`; drives the initial, non-diffed load.
    pub fn full(doc: &Value) -> ChangeSet {
        diff(&Value::object(), doc)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, path: &Path) -> Option<Change> {
        self.entries.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Change)> {
        self.entries.iter().map(|(p, c)| (p, *c))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys()
    }

    fn mark(&mut self, path: Path, change: Change) {
        if path.is_root() {
            return;
        }
        // An Added/Removed tag is never downgraded by a later Modified.
        self.entries.entry(path).or_insert(change);
    }

    fn mark_subtree(&mut self, value: &Value, at: &Path, change: Change) {
        let mut below = Vec::new();
        path::descendants(value, at, &mut below);
        for p in below {
            self.mark(p, change);
        }
    }
}

pub fn diff(old: &Value, new: &Value) -> ChangeSet {
    let mut changes = ChangeSet::default();
    diff_at(Some(old), Some(new), &Path::root(), &mut changes);
    changes
}

/// Returns whether anything at or below `at` changed.
fn diff_at(old: Option<&Value>, new: Option<&Value>, at: &Path, out: &mut ChangeSet) -> bool {
    let old = old.filter(|v| !v.is_effectively_empty());
    let new = new.filter(|v| !v.is_effectively_empty());

    match (old, new) {
        (None, None) => false,
        (Some(old), None) => {
            out.mark(at.clone(), Change::Removed);
            out.mark_subtree(old, at, Change::Removed);
            true
        }
        (None, Some(new)) => {
            out.mark(at.clone(), Change::Added);
            out.mark_subtree(new, at, Change::Added);
            true
        }
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            // Reserve the parent's slot first so it precedes its children.
            let slot = out.entries.len();
            let mut changed = false;
            for key in a.keys().chain(b.keys().filter(|k| !a.contains_key(*k))) {
                changed |= diff_at(a.get(key), b.get(key), &at.child(key.clone()), out);
            }
            if changed {
                insert_parent(out, slot, at);
            }
            changed
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            let slot = out.entries.len();
            let mut changed = a.len() != b.len();
            for i in 0..a.len().max(b.len()) {
                changed |= diff_at(a.get(i), b.get(i), &at.index(i), out);
            }
            if changed {
                insert_parent(out, slot, at);
            }
            changed
        }
        (Some(old), Some(new)) if old.is_container() || new.is_container() => {
            // Type mismatch: the path itself changed and so did everything under both sides.
            out.mark(at.clone(), Change::Modified);
            if old.is_container() {
                out.mark_subtree(old, at, Change::Removed);
            }
            if new.is_container() {
                out.mark_subtree(new, at, Change::Added);
            }
            true
        }
        (Some(old), Some(new)) => {
            let changed = old != new;
            if changed {
                out.mark(at.clone(), Change::Modified);
            }
            changed
        }
    }
}

fn insert_parent(out: &mut ChangeSet, slot: usize, at: &Path) {
    if at.is_root() || out.entries.contains_key(at) {
        return;
    }
    out.entries.shift_insert(slot, at.clone(), Change::Modified);
}
