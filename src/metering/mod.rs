//! Usage metering: plan quotas, per-conversion pricing and the event ledger.

pub mod clock;
pub mod event;
pub mod gate;
pub mod ledger;
pub mod plan;
pub mod store;

pub use clock::{month_start, Clock, ManualClock, SystemClock};
pub use event::ConversionEvent;
pub use gate::{Allowance, QuotaGate};
pub use ledger::{
    Invoice, InvoiceLine, MeteringLedger, MonthlyBill, RecordedConversion, UsageReport,
};
pub use plan::{Account, AccountId, Cents, PlanTier, PricingPolicy};
pub use store::{EventStore, MemoryEventStore, StoreError};

pub use crate::error::{MeteringError, MeteringResult};
