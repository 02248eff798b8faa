//! Turns raw recordsets into the documents served by the gateway.

pub mod accounting;
pub mod inventory;
pub mod invoice;
pub mod labelled;
pub mod payroll;
pub mod purchase;
pub mod tagged;

pub use accounting::{AccountingEntry, shape_accounting_entry};
pub use inventory::{InventoryAdjustment, shape_adjustment};
pub use invoice::{InvoiceDetail, SaleSummary, shape_invoice};
pub use labelled::parse_labelled_number;
pub use payroll::{Payroll, PeriodFilter, PeriodFilterError, shape_payroll};
pub use purchase::{PurchaseOrder, PurchaseSummary, shape_purchase_order};
pub use tagged::{TaggedDocument, TaggedLayout, demux};
