//! Identifier-level diffs between two ordered collections.
//!
//! Used to build the payload of a [`StoreEvent::Change`](super::StoreEvent)
//! after a bulk replace or a move. An item counts as updated when it
//! exists on both sides and either its contents differ or it was moved.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::Identified;

/// Which collection a change set describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    Groups,
    Sensors,
}

/// Inserted, updated and deleted identifiers after a store mutation.
///
/// Identifiers are stored as strings so group and sensor changes share one
/// payload type; `scope` says which kind they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub scope: ChangeScope,
    pub inserted: BTreeSet<String>,
    pub updated: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new(scope: ChangeScope) -> Self {
        Self {
            scope,
            inserted: BTreeSet::new(),
            updated: BTreeSet::new(),
            deleted: BTreeSet::new(),
        }
    }

    /// Number of identifiers across all three sets.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Compute the change set that turns `old` into `new`.
///
/// A surviving item is updated when its contents differ or when it left
/// its place. The items that stay in place are the longest run of
/// survivors whose old order is kept in `new`, so moving one item marks
/// only that item, and an insertion or deletion marks nothing around it.
pub fn diff<'a, T, I, J>(scope: ChangeScope, old: I, new: J) -> ChangeSet
where
    T: Identified + PartialEq + 'a,
    T::Id: ToString,
    I: IntoIterator<Item = &'a T>,
    J: IntoIterator<Item = &'a T>,
{
    let old: Vec<&T> = old.into_iter().collect();
    let new: Vec<&T> = new.into_iter().collect();

    let new_ids: HashSet<&T::Id> = new.iter().map(|item| item.id()).collect();
    let old_index: HashMap<&T::Id, (usize, &T)> = old
        .iter()
        .enumerate()
        .map(|(index, item)| (item.id(), (index, *item)))
        .collect();

    let mut changes = ChangeSet::new(scope);

    // (new item, old index, old item) for each survivor, in new order
    let mut survivors = Vec::with_capacity(new.len());
    for item in &new {
        match old_index.get(item.id()) {
            Some(&(index, old_item)) => survivors.push((*item, index, old_item)),
            None => {
                changes.inserted.insert(item.id().to_string());
            }
        }
    }

    let indices: Vec<usize> = survivors.iter().map(|&(_, index, _)| index).collect();
    let in_place = longest_increasing(&indices);
    for (position, &(item, _, old_item)) in survivors.iter().enumerate() {
        if !in_place.contains(&position) || old_item != item {
            changes.updated.insert(item.id().to_string());
        }
    }

    for item in &old {
        if !new_ids.contains(item.id()) {
            changes.deleted.insert(item.id().to_string());
        }
    }

    changes
}

/// Positions in `values` forming one longest strictly increasing run.
fn longest_increasing(values: &[usize]) -> HashSet<usize> {
    // tails[k] is the position ending the best run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (position, &value) in values.iter().enumerate() {
        let k = tails.partition_point(|&tail| values[tail] < value);
        if k > 0 {
            previous[position] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(position);
        } else {
            tails[k] = position;
        }
    }

    let mut run = HashSet::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        run.insert(position);
        cursor = previous[position];
    }
    run
}
