// ── Keyed entity collection ──
//
// Ordered storage with O(1) lookups by EntityId. The map key is the
// record's own id, so two records can never share one.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::model::{Entity, EntityId};

/// The records of one entity type, keyed by id.
///
/// Keeps arrival order for display. Replacing a record keeps its position;
/// removing one shifts later records up.
#[derive(Clone, PartialEq)]
pub struct EntityCollection<T> {
    items: IndexMap<EntityId, Arc<T>>,
}

impl<T: Entity> EntityCollection<T> {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    /// Insert or replace a record. Returns `true` if the id was new.
    pub fn upsert(&mut self, entity: T) -> bool {
        let id = entity.id().clone();
        self.items.insert(id, Arc::new(entity)).is_none()
    }

    /// Remove a record by id. Returns the removed record if it existed.
    pub fn remove(&mut self, id: &EntityId) -> Option<Arc<T>> {
        self.items.shift_remove(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Arc<T>> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.items.keys()
    }

    /// Records in order, as cheap `Arc` clones.
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.items.values().cloned().collect()
    }
}

impl<T: Entity> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Later records win when the input repeats an id.
impl<T: Entity> FromIterator<T> for EntityCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        for entity in iter {
            collection.upsert(entity);
        }
        collection
    }
}

impl<T: fmt::Debug> fmt::Debug for EntityCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.values()).finish()
    }
}

// Persisted as a plain JSON array of records.

impl<T: Entity> Serialize for EntityCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values().map(AsRef::as_ref))
    }
}

impl<'de, T: Entity> Deserialize<'de> for EntityCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Supplier;
    use serde_json::json;

    fn supplier(id: i64, name: &str) -> Supplier {
        serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
    }

    fn ids(col: &EntityCollection<Supplier>) -> Vec<EntityId> {
        col.ids().cloned().collect()
    }

    #[test]
    fn upsert_returns_true_for_new_id() {
        let mut col = EntityCollection::new();
        assert!(col.upsert(supplier(1, "Acme")));
        assert!(!col.upsert(supplier(1, "Acme Corp")));
        assert_eq!(col.len(), 1);
        assert_eq!(col.get(&EntityId::from(1)).unwrap().name, "Acme Corp");
    }

    #[test]
    fn replace_keeps_position() {
        let mut col: EntityCollection<Supplier> =
            [supplier(1, "a"), supplier(2, "b"), supplier(3, "c")]
                .into_iter()
                .collect();
        col.upsert(supplier(2, "B"));
        assert_eq!(ids(&col), vec![1.into(), 2.into(), 3.into()]);
    }

    #[test]
    fn remove_shifts_order() {
        let mut col: EntityCollection<Supplier> =
            [supplier(1, "a"), supplier(5, "b"), supplier(9, "c")]
                .into_iter()
                .collect();
        let removed = col.remove(&EntityId::from(5));
        assert_eq!(removed.unwrap().name, "b");
        assert_eq!(ids(&col), vec![1.into(), 9.into()]);
        assert!(col.remove(&EntityId::from(5)).is_none());
    }

    #[test]
    fn from_iter_collapses_duplicate_ids() {
        let col: EntityCollection<Supplier> = [supplier(1, "first"), supplier(1, "second")]
            .into_iter()
            .collect();
        assert_eq!(col.len(), 1);
        assert_eq!(col.iter().next().unwrap().name, "second");
    }

    #[test]
    fn serializes_as_array() {
        let col: EntityCollection<Supplier> = [supplier(7, "x")].into_iter().collect();
        let v = serde_json::to_value(&col).unwrap();
        assert_eq!(v, json!([{ "id": 7, "name": "x", "contact_name": null, "email": null, "phone": null, "address": null }]));

        let back: EntityCollection<Supplier> = serde_json::from_value(v).unwrap();
        assert_eq!(back, col);
    }
}
