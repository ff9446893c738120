//! Owner-scoped ledger storage boundary.
//!
//! Every read takes the owner explicitly and every write takes an entity that
//! carries its owner, so one owner can never observe or touch another owner's
//! rows. The in-memory implementation serves tests, the CLI and snapshots;
//! a SQL backend would implement the same trait.

pub mod in_memory;
pub mod snapshot;

use std::sync::Arc;

use tally_analytics::StoreFilter;
use tally_core::{EventId, OwnerId, SaleLineId, SkuId};
use tally_ledger::{Event, SaleLine, SaleLineRecord, Sku};

use crate::error::StoreResult;

pub use in_memory::InMemoryLedgerStore;
pub use snapshot::LedgerSnapshot;

/// Ledger persistence.
///
/// Referential rules enforced here (like foreign keys would be):
/// - a sale line must reference an event and a SKU of its own owner
///   (`StoreError::Missing` otherwise)
/// - deleting an event removes its sale lines
/// - deleting a SKU that sale lines reference fails with
///   `StoreError::Referenced`
/// - `(owner, name, item_type)` is unique among SKUs (`StoreError::Unique`)
///
/// Whether a delete should be attempted at all is the service's call.
pub trait LedgerStore: Send + Sync {
    fn get_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<Option<Event>>;
    fn list_events(&self, owner: &OwnerId) -> StoreResult<Vec<Event>>;
    fn insert_event(&self, event: Event) -> StoreResult<()>;
    fn update_event(&self, event: Event) -> StoreResult<()>;
    /// Deletes the event and its sale lines; returns how many lines went with it.
    fn delete_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<usize>;

    fn get_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<Option<Sku>>;
    fn list_skus(&self, owner: &OwnerId) -> StoreResult<Vec<Sku>>;
    fn insert_sku(&self, sku: Sku) -> StoreResult<()>;
    fn update_sku(&self, sku: Sku) -> StoreResult<()>;
    fn delete_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<()>;

    fn get_sale_line(&self, owner: &OwnerId, id: SaleLineId) -> StoreResult<Option<SaleLine>>;
    fn insert_sale_line(&self, line: SaleLine) -> StoreResult<()>;
    fn update_sale_line(&self, line: SaleLine) -> StoreResult<()>;
    fn delete_sale_line(&self, owner: &OwnerId, id: SaleLineId) -> StoreResult<()>;

    fn count_sale_lines_for_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<usize>;
    fn count_sale_lines_for_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<usize>;

    /// Sale lines passing the pushed-down filter, joined with their SKU and
    /// event, in insertion order.
    fn list_sale_lines(
        &self,
        owner: &OwnerId,
        filter: &StoreFilter,
    ) -> StoreResult<Vec<SaleLineRecord>>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn get_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<Option<Event>> {
        (**self).get_event(owner, id)
    }

    fn list_events(&self, owner: &OwnerId) -> StoreResult<Vec<Event>> {
        (**self).list_events(owner)
    }

    fn insert_event(&self, event: Event) -> StoreResult<()> {
        (**self).insert_event(event)
    }

    fn update_event(&self, event: Event) -> StoreResult<()> {
        (**self).update_event(event)
    }

    fn delete_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<usize> {
        (**self).delete_event(owner, id)
    }

    fn get_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<Option<Sku>> {
        (**self).get_sku(owner, id)
    }

    fn list_skus(&self, owner: &OwnerId) -> StoreResult<Vec<Sku>> {
        (**self).list_skus(owner)
    }

    fn insert_sku(&self, sku: Sku) -> StoreResult<()> {
        (**self).insert_sku(sku)
    }

    fn update_sku(&self, sku: Sku) -> StoreResult<()> {
        (**self).update_sku(sku)
    }

    fn delete_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<()> {
        (**self).delete_sku(owner, id)
    }

    fn get_sale_line(&self, owner: &OwnerId, id: SaleLineId) -> StoreResult<Option<SaleLine>> {
        (**self).get_sale_line(owner, id)
    }

    fn insert_sale_line(&self, line: SaleLine) -> StoreResult<()> {
        (**self).insert_sale_line(line)
    }

    fn update_sale_line(&self, line: SaleLine) -> StoreResult<()> {
        (**self).update_sale_line(line)
    }

    fn delete_sale_line(&self, owner: &OwnerId, id: SaleLineId) -> StoreResult<()> {
        (**self).delete_sale_line(owner, id)
    }

    fn count_sale_lines_for_event(&self, owner: &OwnerId, id: EventId) -> StoreResult<usize> {
        (**self).count_sale_lines_for_event(owner, id)
    }

    fn count_sale_lines_for_sku(&self, owner: &OwnerId, id: SkuId) -> StoreResult<usize> {
        (**self).count_sale_lines_for_sku(owner, id)
    }

    fn list_sale_lines(
        &self,
        owner: &OwnerId,
        filter: &StoreFilter,
    ) -> StoreResult<Vec<SaleLineRecord>> {
        (**self).list_sale_lines(owner, filter)
    }
}
