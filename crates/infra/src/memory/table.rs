use std::collections::HashMap;

use folio_core::Entity;

/// One in-memory table keyed by entity id.
#[derive(Debug)]
pub(crate) struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self { rows: HashMap::new() }
    }
}

impl<E: Entity + Clone> Table<E> {
    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: E::Id) -> Option<&mut E> {
        self.rows.get_mut(&id)
    }

    pub fn contains(&self, id: E::Id) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn insert(&mut self, row: E) {
        self.rows.insert(row.id(), row);
    }

    pub fn remove(&mut self, id: E::Id) -> Option<E> {
        self.rows.remove(&id)
    }

    pub fn find(&self, mut pred: impl FnMut(&E) -> bool) -> Option<&E> {
        self.rows.values().find(|row| pred(row))
    }

    pub fn any(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.rows.values().any(|row| pred(row))
    }

    pub fn filter(&self, mut pred: impl FnMut(&E) -> bool) -> Vec<E> {
        self.rows.values().filter(|row| pred(row)).cloned().collect()
    }

    pub fn all(&self) -> Vec<E> {
        self.rows.values().cloned().collect()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        self.rows.retain(|_, row| keep(row));
    }
}
