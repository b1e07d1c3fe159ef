use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    avatar::{AvatarPatch, AvatarRecord},
    types::AvatarId,
};

/// Version number written into every [`CatalogDocument`].
pub const DOCUMENT_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("avatar {0} is not in the catalog")]
    MissingAvatar(AvatarId),
    #[error("avatar {0} is already in the catalog")]
    AlreadyExists(AvatarId),
}

/// Whole-catalog persisted form. Always written and read as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub format_version: u16,
    pub avatars: Vec<AvatarRecord>,
}

impl CatalogDocument {
    pub fn new(avatars: Vec<AvatarRecord>) -> Self {
        Self {
            format_version: DOCUMENT_FORMAT_VERSION,
            avatars,
        }
    }
}

/// Authoritative in-memory catalog, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct CatalogStore {
    records: HashMap<AvatarId, AvatarRecord>,
    order: Vec<AvatarId>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: CatalogDocument) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for rec in doc.avatars {
            store.add(rec)?;
        }
        Ok(store)
    }

    pub fn export_document(&self) -> CatalogDocument {
        CatalogDocument::new(self.get_all())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&AvatarRecord> {
        self.records.get(id)
    }

    pub fn get_cloned(&self, id: &str) -> Option<AvatarRecord> {
        self.get(id).cloned()
    }

    pub fn ordered_ids(&self) -> &[AvatarId] {
        &self.order
    }

    pub fn get_all(&self) -> Vec<AvatarRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    /// Appends `rec`. Callers are expected to check [`Self::contains`] first
    /// so duplicates get reported; this is only the last guard.
    pub fn add(&mut self, rec: AvatarRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&rec.id) {
            return Err(StoreError::AlreadyExists(rec.id));
        }
        self.order.push(rec.id.clone());
        self.records.insert(rec.id.clone(), rec);
        Ok(())
    }

    /// Applies `patch` and returns the record as it was before.
    pub fn update(&mut self, id: &str, patch: &AvatarPatch) -> Result<AvatarRecord, StoreError> {
        let rec = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingAvatar(id.to_string()))?;
        let prev = rec.clone();
        patch.apply_to(rec);
        Ok(prev)
    }

    /// Removes one record and returns it.
    pub fn delete(&mut self, id: &str) -> Result<AvatarRecord, StoreError> {
        let rec = self
            .records
            .remove(id)
            .ok_or_else(|| StoreError::MissingAvatar(id.to_string()))?;
        if let Some(pos) = self.order.iter().position(|x| x == id) {
            self.order.remove(pos);
        }
        Ok(rec)
    }

    /// Removes every record whose id is in `ids`; absent ids are ignored.
    /// Returns the removed records in catalog order.
    pub fn delete_many<'a, I>(&mut self, ids: I) -> Vec<AvatarRecord>
    where
        I: IntoIterator<Item = &'a AvatarId>,
    {
        let doomed: HashSet<&str> = ids.into_iter().map(String::as_str).collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        let mut removed = Vec::new();
        let records = &mut self.records;
        self.order.retain(|id| {
            if !doomed.contains(id.as_str()) {
                return true;
            }
            if let Some(rec) = records.remove(id) {
                removed.push(rec);
            }
            false
        });
        removed
    }

    /// Replaces the whole catalog. Fails without touching state if `records`
    /// repeats an id.
    pub fn replace_all(&mut self, records: Vec<AvatarRecord>) -> Result<(), StoreError> {
        let next = Self::from_document(CatalogDocument::new(records))?;
        *self = next;
        Ok(())
    }
}
