//! Sales ledger entities.
//!
//! Events, SKUs and sale lines with their create/patch inputs and write-time
//! validation. Pure domain logic (no IO, no storage).

pub mod event;
pub mod patch;
pub mod record;
pub mod sale_line;
pub mod sku;

pub use event::{Event, EventPatch, NewEvent};
pub use record::{EventRef, SaleLineRecord, SkuRef};
pub use sale_line::{Bundle, NewSaleLine, SaleLine, SaleLinePatch};
pub use sku::{ItemType, NewSku, Sku, SkuPatch};
