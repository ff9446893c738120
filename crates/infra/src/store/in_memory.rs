use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_analytics::StoreFilter;
use tally_core::{DomainResult, EventId, OwnerId, SaleLineId, SkuId};
use tally_ledger::{Event, SaleLine, SaleLineRecord, Sku};

use crate::error::{StoreError, StoreResult};
use crate::store::{LedgerSnapshot, LedgerStore};

/// One table, partitioned by owner so a scan never touches other owners' rows.
#[derive(Debug)]
struct OwnerTable<K, V>(BTreeMap<OwnerId, BTreeMap<K, V>>);

impl<K, V> Default for OwnerTable<K, V> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<K: Ord, V> OwnerTable<K, V> {
    fn get(&self, owner: &OwnerId, id: &K) -> Option<&V> {
        self.0.get(owner)?.get(id)
    }

    fn get_mut(&mut self, owner: &OwnerId, id: &K) -> Option<&mut V> {
        self.0.get_mut(owner)?.get_mut(id)
    }

    fn contains(&self, owner: &OwnerId, id: &K) -> bool {
        self.get(owner, id).is_some()
    }

    fn rows<'a>(&'a self, owner: &'a OwnerId) -> impl Iterator<Item = &'a V> {
        self.0.get(owner).into_iter().flat_map(BTreeMap::values)
    }

    fn insert(&mut self, owner: &OwnerId, id: K, row: V) {
        self.0.entry(owner.clone()).or_default().insert(id, row);
    }

    fn remove(&mut self, owner: &OwnerId, id: &K) -> Option<V> {
        self.0.get_mut(owner)?.remove(id)
    }

    /// Drops the owner's rows failing `keep`; returns how many went.
    fn retain(&mut self, owner: &OwnerId, mut keep: impl FnMut(&V) -> bool) -> usize {
        let Some(rows) = self.0.get_mut(owner) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|_, row| keep(row));
        before - rows.len()
    }
}

#[derive(Debug, Default)]
struct Tables {
    events: OwnerTable<EventId, Event>,
    skus: OwnerTable<SkuId, Sku>,
    sale_lines: OwnerTable<SaleLineId, SaleLine>,
}

impl Tables {
    fn check_references(&self, line: &SaleLine) -> StoreResult<()> {
        if !self.events.contains(&line.owner, &line.event_id) {
            return Err(StoreError::missing("event", line.event_id));
        }
        if !self.skus.contains(&line.owner, &line.sku_id) {
            return Err(StoreError::missing("sku", line.sku_id));
        }
        Ok(())
    }

    fn check_sku_unique(&self, sku: &Sku) -> StoreResult<()> {
        let clash = self
            .skus
            .rows(&sku.owner)
            .any(|s| s.id != sku.id && s.same_identity(sku));
        if clash {
            return Err(StoreError::Unique(format!(
                "sku '{}' of type {} already exists",
                sku.name, sku.item_type
            )));
        }
        Ok(())
    }

    fn count_lines(&self, owner: &OwnerId, pred: impl Fn(&SaleLine) -> bool) -> usize {
        self.sale_lines.rows(owner).filter(|l| pred(*l)).count()
    }
}

/// In-memory ledger for tests and the CLI, loaded from JSON snapshots.
///
/// Rows are partitioned by owner behind a single `RwLock`, so reads that
/// join sale lines with SKUs and events see one consistent state.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot, applying the same field, referential
    /// and uniqueness rules as live writes.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> StoreResult<Self> {
        let store = Self::new();
        let invalid = |e: StoreError| StoreError::Snapshot(e.to_string());

        for event in snapshot.events {
            checked("event", &event.id, event.validate())?;
            store.insert_event(event).map_err(invalid)?;
        }
        for sku in snapshot.skus {
            checked("sku", &sku.id, sku.validate())?;
            store.insert_sku(sku).map_err(invalid)?;
        }
        for line in snapshot.sale_lines {
            checked("sale line", &line.id, line.validate())?;
            store.insert_sale_line(line).map_err(invalid)?;
        }
        Ok(store)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| StoreError::Poisoned("ledger"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| StoreError::Poisoned("ledger"))
    }
}

fn checked(entity: &str, id: &dyn core::fmt::Display, result: DomainResult<()>) -> StoreResult<()> {
    result.map_err(|e| StoreError::Snapshot(format!("{entity} {id}: {e}")))
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<Option<Event>> {
        Ok(self.read()?.events.get(owner, &id).cloned())
    }

    fn list_events(&self, owner: &OwnerId) -> StoreResult<Vec<Event>> {
        Ok(self.read()?.events.rows(owner).cloned().collect())
    }

    fn insert_event(&self, event: Event) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.events.contains(&event.owner, &event.id) {
            return Err(StoreError::Unique(format!("event {} already exists", event.id)));
        }
        let owner = event.owner.clone();
        t.events.insert(&owner, event.id, event);
        Ok(())
    }

    fn update_event(&self, event: Event) -> StoreResult<()> {
        let mut t = self.write()?;
        match t.events.get_mut(&event.owner, &event.id) {
            Some(slot) => {
                *slot = event;
                Ok(())
            }
            None => Err(StoreError::missing("event", event.id)),
        }
    }

    fn delete_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<usize> {
        let mut t = self.write()?;
        if t.events.remove(owner, &id).is_none() {
            return Err(StoreError::missing("event", id));
        }
        Ok(t.sale_lines.retain(owner, |line| line.event_id != id))
    }

    fn get_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<Option<Sku>> {
        Ok(self.read()?.skus.get(owner, &id).cloned())
    }

    fn list_skus(&self, owner: &OwnerId) -> StoreResult<Vec<Sku>> {
        Ok(self.read()?.skus.rows(owner).cloned().collect())
    }

    fn insert_sku(&self, sku: Sku) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.skus.contains(&sku.owner, &sku.id) {
            return Err(StoreError::Unique(format!("sku {} already exists", sku.id)));
        }
        t.check_sku_unique(&sku)?;
        let owner = sku.owner.clone();
        t.skus.insert(&owner, sku.id, sku);
        Ok(())
    }

    fn update_sku(&self, sku: Sku) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.skus.contains(&sku.owner, &sku.id) {
            return Err(StoreError::missing("sku", sku.id));
        }
        t.check_sku_unique(&sku)?;
        let owner = sku.owner.clone();
        t.skus.insert(&owner, sku.id, sku);
        Ok(())
    }

    fn delete_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.skus.contains(owner, &id) {
            return Err(StoreError::missing("sku", id));
        }
        let refs = t.count_lines(owner, |l| l.sku_id == id);
        if refs > 0 {
            return Err(StoreError::Referenced(format!(
                "sku {id} is used by {refs} sale line(s)"
            )));
        }
        t.skus.remove(owner, &id);
        Ok(())
    }

    fn get_sale_line(&self, owner: &OwnerId, id: SaleLineId) -> StoreResult<Option<SaleLine>> {
        Ok(self.read()?.sale_lines.get(owner, &id).cloned())
    }

    fn insert_sale_line(&self, line: SaleLine) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.sale_lines.contains(&line.owner, &line.id) {
            return Err(StoreError::Unique(format!("sale line {} already exists", line.id)));
        }
        t.check_references(&line)?;
        let owner = line.owner.clone();
        t.sale_lines.insert(&owner, line.id, line);
        Ok(())
    }

    fn update_sale_line(&self, line: SaleLine) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.sale_lines.contains(&line.owner, &line.id) {
            return Err(StoreError::missing("sale", line.id));
        }
        t.check_references(&line)?;
        let owner = line.owner.clone();
        t.sale_lines.insert(&owner, line.id, line);
        Ok(())
    }

    fn delete_sale_line(&self, owner: &OwnerId, id: SaleLineId) -> StoreResult<()> {
        match self.write()?.sale_lines.remove(owner, &id) {
            Some(_) => Ok(()),
            None => Err(StoreError::missing("sale", id)),
        }
    }

    fn count_sale_lines_for_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<usize> {
        Ok(self.read()?.count_lines(owner, |l| l.event_id == id))
    }

    fn count_sale_lines_for_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<usize> {
        Ok(self.read()?.count_lines(owner, |l| l.sku_id == id))
    }

    fn list_sale_lines(
        &self,
        owner: &OwnerId,
        filter: &StoreFilter,
    ) -> StoreResult<Vec<SaleLineRecord>> {
        let t = self.read()?;
        let records = t
            .sale_lines
            .rows(owner)
            .filter(|line| filter.matches(line))
            .filter_map(|line| {
                let sku = t.skus.get(owner, &line.sku_id);
                let event = t.events.get(owner, &line.event_id);
                match (sku, event) {
                    (Some(sku), Some(event)) => Some(SaleLineRecord::new(line.clone(), sku, event)),
                    _ => {
                        tracing::warn!(sale_line = %line.id, "sale line with dangling reference skipped");
                        None
                    }
                }
            })
            .collect();
        Ok(records)
    }
}
