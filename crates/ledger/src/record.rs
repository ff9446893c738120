//! Sale lines joined with the SKU and event fields analytics need.

use serde::{Deserialize, Serialize};

use tally_core::{EventId, SkuId};

use crate::event::Event;
use crate::sale_line::SaleLine;
use crate::sku::{ItemType, Sku};

/// SKU fields carried alongside a sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRef {
    pub id: SkuId,
    pub name: String,
    pub item_type: ItemType,
}

impl From<&Sku> for SkuRef {
    fn from(sku: &Sku) -> Self {
        Self {
            id: sku.id,
            name: sku.name.clone(),
            item_type: sku.item_type,
        }
    }
}

/// Event fields carried alongside a sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub id: EventId,
    pub name: String,
}

impl From<&Event> for EventRef {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
        }
    }
}

/// A sale line with its references resolved (what the store hands to analytics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineRecord {
    pub line: SaleLine,
    pub sku: SkuRef,
    pub event: EventRef,
}

impl SaleLineRecord {
    pub fn new(line: SaleLine, sku: &Sku, event: &Event) -> Self {
        Self {
            line,
            sku: SkuRef::from(sku),
            event: EventRef::from(event),
        }
    }
}
