//! Owner-scoped ledger service.
//!
//! `LedgerService` is the one entry point request handlers and the CLI call.
//! It owns the deletion policy, resolves references under the caller's owner
//! and runs the analytics over rows the store hands back.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tally_analytics::{
    BundleComponent, BundleQuote, FilterOutcome, GroupBy, GroupSummary, HypotheticalReport,
    Metric, PricingRule, RankReport, SaleLineView, SaleQueryParams, TypeCostAverage,
    sort_newest_first,
};
use tally_core::{EventId, Money, OwnerId, SaleLineId, SkuId, ValidationErrors};
use tally_ledger::{
    Event, EventPatch, NewEvent, NewSaleLine, NewSku, SaleLine, SaleLinePatch, SaleLineRecord,
    Sku, SkuPatch,
};

use crate::error::{ServiceError, ServiceResult};
use crate::store::LedgerStore;

/// One component of a bundle quote. `cost_unit` defaults to the SKU's
/// `default_cost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLine {
    pub sku_id: SkuId,
    pub units: u32,
    #[serde(default)]
    pub cost_unit: Option<Money>,
}

/// Parses a path-style id for a detail read. Malformed ids are reported as
/// `NotFound`, the same as ids that parse but do not exist.
pub fn parse_id<T: FromStr>(entity: &'static str, raw: &str) -> ServiceResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::not_found(entity, raw))
}

pub struct LedgerService<S> {
    store: S,
}

impl<S> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: LedgerStore> LedgerService<S> {
    // ---- events ----

    pub fn create_event(&self, owner: &OwnerId, input: NewEvent) -> ServiceResult<Event> {
        let event = input.into_event(EventId::new(), owner.clone())?;
        self.store.insert_event(event.clone())?;
        info!(owner = %owner, event_id = %event.id, name = %event.name, "event created");
        Ok(event)
    }

    pub fn get_event(&self, owner: &OwnerId, id: EventId) -> ServiceResult<Event> {
        self.store
            .get_event(owner, id)?
            .ok_or_else(|| ServiceError::not_found("event", id))
    }

    pub fn list_events(&self, owner: &OwnerId) -> ServiceResult<Vec<Event>> {
        Ok(self.store.list_events(owner)?)
    }

    pub fn update_event(
        &self,
        owner: &OwnerId,
        id: EventId,
        patch: &EventPatch,
    ) -> ServiceResult<Event> {
        let updated = self.get_event(owner, id)?.patched(patch)?;
        self.store.update_event(updated.clone())?;
        info!(owner = %owner, event_id = %id, "event updated");
        Ok(updated)
    }

    /// Deletes an event. With sale lines still attached this is refused
    /// unless `force` is set, in which case the lines go too. Returns the
    /// number of sale lines removed.
    ///
    /// The reference count and the delete are separate store calls: a sale
    /// recorded in between is removed with the event even without `force`.
    pub fn delete_event(&self, owner: &OwnerId, id: EventId, force: bool) -> ServiceResult<usize> {
        self.get_event(owner, id)?;

        let refs = self.store.count_sale_lines_for_event(owner, id)?;
        if refs > 0 && !force {
            warn!(owner = %owner, event_id = %id, refs, "event delete refused");
            return Err(ServiceError::ConflictBlocked(format!(
                "event {id} has {refs} sale line(s); delete with force to remove them too"
            )));
        }

        let removed = self.store.delete_event(owner, id)?;
        info!(owner = %owner, event_id = %id, removed, force, "event deleted");
        Ok(removed)
    }

    // ---- skus ----

    pub fn create_sku(&self, owner: &OwnerId, input: NewSku) -> ServiceResult<Sku> {
        let sku = input.into_sku(SkuId::new(), owner.clone())?;
        self.store.insert_sku(sku.clone())?;
        info!(owner = %owner, sku_id = %sku.id, name = %sku.name, item_type = %sku.item_type, "sku created");
        Ok(sku)
    }

    pub fn get_sku(&self, owner: &OwnerId, id: SkuId) -> ServiceResult<Sku> {
        self.store
            .get_sku(owner, id)?
            .ok_or_else(|| ServiceError::not_found("sku", id))
    }

    pub fn list_skus(&self, owner: &OwnerId) -> ServiceResult<Vec<Sku>> {
        Ok(self.store.list_skus(owner)?)
    }

    pub fn update_sku(&self, owner: &OwnerId, id: SkuId, patch: &SkuPatch) -> ServiceResult<Sku> {
        let updated = self.get_sku(owner, id)?.patched(patch)?;
        self.store.update_sku(updated.clone())?;
        info!(owner = %owner, sku_id = %id, "sku updated");
        Ok(updated)
    }

    /// Deletes a SKU no sale line references. There is no override.
    pub fn delete_sku(&self, owner: &OwnerId, id: SkuId) -> ServiceResult<()> {
        self.get_sku(owner, id)?;

        let refs = self.store.count_sale_lines_for_sku(owner, id)?;
        if refs > 0 {
            warn!(owner = %owner, sku_id = %id, refs, "sku delete refused");
            return Err(ServiceError::ConflictBlocked(format!(
                "sku {id} is used by {refs} sale line(s)"
            )));
        }

        self.store.delete_sku(owner, id)?;
        info!(owner = %owner, sku_id = %id, "sku deleted");
        Ok(())
    }

    // ---- sale lines ----

    pub fn record_sale(&self, owner: &OwnerId, input: NewSaleLine) -> ServiceResult<SaleLineView> {
        let line = input.into_sale_line(SaleLineId::new(), owner.clone())?;
        let record = self.join(line)?;
        self.store.insert_sale_line(record.line.clone())?;
        info!(
            owner = %owner,
            sale_id = %record.line.id,
            sku = %record.sku.name,
            units = record.line.units,
            "sale recorded"
        );
        Ok(SaleLineView::from(&record))
    }

    pub fn get_sale(&self, owner: &OwnerId, id: SaleLineId) -> ServiceResult<SaleLineView> {
        let line = self.sale_line(owner, id)?;
        Ok(SaleLineView::from(&self.join(line)?))
    }

    /// Applies a partial update. The merged line is re-validated as a whole
    /// and its event and SKU are resolved again under `owner`.
    pub fn update_sale(
        &self,
        owner: &OwnerId,
        id: SaleLineId,
        patch: &SaleLinePatch,
    ) -> ServiceResult<SaleLineView> {
        let updated = self.sale_line(owner, id)?.patched(patch)?;
        let record = self.join(updated)?;
        self.store.update_sale_line(record.line.clone())?;
        info!(owner = %owner, sale_id = %id, "sale updated");
        Ok(SaleLineView::from(&record))
    }

    pub fn delete_sale(&self, owner: &OwnerId, id: SaleLineId) -> ServiceResult<()> {
        self.store.delete_sale_line(owner, id)?;
        info!(owner = %owner, sale_id = %id, "sale deleted");
        Ok(())
    }

    /// Sale lines matching `params`, newest first.
    pub fn list_sales(
        &self,
        owner: &OwnerId,
        params: &SaleQueryParams,
    ) -> ServiceResult<Vec<SaleLineView>> {
        let mut rows = self.select(owner, params)?;
        sort_newest_first(&mut rows);
        Ok(rows.iter().map(SaleLineView::from).collect())
    }

    // ---- analytics ----

    pub fn summary(
        &self,
        owner: &OwnerId,
        params: &SaleQueryParams,
        group_by: GroupBy,
    ) -> ServiceResult<Vec<GroupSummary>> {
        let rows = self.select(owner, params)?;
        Ok(tally_analytics::summarize(&rows, group_by))
    }

    pub fn top_bottom(
        &self,
        owner: &OwnerId,
        params: &SaleQueryParams,
        metric: Metric,
        limit: usize,
    ) -> ServiceResult<RankReport> {
        let rows = self.select(owner, params)?;
        Ok(tally_analytics::rank(&rows, metric, limit)?)
    }

    pub fn hypothetical(
        &self,
        owner: &OwnerId,
        params: &SaleQueryParams,
        rules: &[PricingRule],
    ) -> ServiceResult<HypotheticalReport> {
        tally_analytics::validate_rules(rules)?;
        let rows = self.select(owner, params)?;
        debug!(owner = %owner, rows = rows.len(), rules = rules.len(), "simulating prices");
        Ok(tally_analytics::simulate(&rows, rules))
    }

    pub fn average_cost_by_type(&self, owner: &OwnerId) -> ServiceResult<Vec<TypeCostAverage>> {
        let skus = self.store.list_skus(owner)?;
        Ok(tally_analytics::average_cost_by_type(&skus))
    }

    /// Prices a prospective bundle from the owner's SKUs.
    pub fn quote_bundle(
        &self,
        owner: &OwnerId,
        lines: &[BundleLine],
        bundle_price: Money,
    ) -> ServiceResult<BundleQuote> {
        let mut errors = ValidationErrors::new();
        if let Some(problem) = bundle_price.input_problem() {
            errors.push("bundle_price", problem);
        }
        for (i, line) in lines.iter().enumerate() {
            if line.units == 0 {
                errors.push("lines", format!("line {i}: units must be at least 1"));
            }
            if let Some(problem) = line.cost_unit.and_then(|c| c.input_problem()) {
                errors.push("lines", format!("line {i}: cost_unit {problem}"));
            }
        }
        errors.into_result()?;

        let components = lines
            .iter()
            .map(|line| {
                let sku = self.get_sku(owner, line.sku_id)?;
                Ok(BundleComponent {
                    units: line.units,
                    cost_unit: line.cost_unit.unwrap_or(sku.default_cost),
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        Ok(tally_analytics::quote_bundle(&components, bundle_price))
    }

    // ---- helpers ----

    fn sale_line(&self, owner: &OwnerId, id: SaleLineId) -> ServiceResult<SaleLine> {
        self.store
            .get_sale_line(owner, id)?
            .ok_or_else(|| ServiceError::not_found("sale", id))
    }

    /// Resolves the line's event and SKU under its own owner.
    fn join(&self, line: SaleLine) -> ServiceResult<SaleLineRecord> {
        let event = self.get_event(&line.owner, line.event_id)?;
        let sku = self.get_sku(&line.owner, line.sku_id)?;
        Ok(SaleLineRecord::new(line, &sku, &event))
    }

    /// Two-phase selection: the store evaluates the pushed-down part, then
    /// every row is re-checked against the full filter.
    fn select(
        &self,
        owner: &OwnerId,
        params: &SaleQueryParams,
    ) -> ServiceResult<Vec<SaleLineRecord>> {
        match params.parse() {
            FilterOutcome::Empty { reason } => {
                debug!(owner = %owner, %reason, "malformed filter, empty result");
                Ok(Vec::new())
            }
            FilterOutcome::Apply(filter) => {
                let mut rows = self.store.list_sale_lines(owner, filter.store_filter())?;
                let fetched = rows.len();
                filter.retain(&mut rows);
                debug!(owner = %owner, fetched, kept = rows.len(), "sale lines selected");
                Ok(rows)
            }
        }
    }
}
