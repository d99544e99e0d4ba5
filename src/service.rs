//! Gated, metered conversions: the call surface offered to a host API layer.

use crate::codec::{ConversionKind, Format};
use crate::conversion::{ConversionEngine, ConvertedData};
use crate::error::ServiceError;
use crate::metering::{
    Account, AccountId, Cents, ConversionEvent, MeteringLedger, PlanTier, UsageReport,
};
use serde::Serialize;
use tracing::debug;

/// What a completed conversion cost the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingSummary {
    pub charged: bool,
    pub amount: Cents,
    pub free_remaining: u64,
    pub message: String,
}

impl BillingSummary {
    pub fn for_event(event: &ConversionEvent, plan: PlanTier, free_remaining: u64) -> Self {
        let message = if event.charged() {
            format!("Charged {}", event.amount())
        } else if plan == PlanTier::Free {
            format!("{} free conversions left", free_remaining)
        } else {
            "No charge (included in plan)".to_string()
        };

        Self {
            charged: event.charged(),
            amount: event.amount(),
            free_remaining,
            message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub output: ConvertedData,
    pub billing: BillingSummary,
}

/// Conversion engine composed with the metering ledger
pub struct ConverterService {
    engine: ConversionEngine,
    ledger: MeteringLedger,
}

impl ConverterService {
    pub fn new(engine: ConversionEngine, ledger: MeteringLedger) -> Self {
        Self { engine, ledger }
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &MeteringLedger {
        &self.ledger
    }

    /// Check the quota, convert, then record the conversion
    ///
    /// A conversion that fails leaves the ledger untouched. Nothing is read
    /// from the store once the event is appended, so an error here always
    /// means the account was not charged. On `LedgerWriteConflict` the whole
    /// call may be repeated.
    pub fn gate_and_convert(
        &self,
        account: &Account,
        from: Format,
        to: Format,
        input: &[u8],
    ) -> Result<ConversionOutcome, ServiceError> {
        let allowance = self.ledger.check_quota(account)?;
        debug!(account = %account.id, plan = %account.plan, %allowance, "quota check passed");

        let output = self.engine.convert(from, to, input)?;

        let recorded = self
            .ledger
            .record_conversion(account, ConversionKind::new(from, to))?;
        let free_remaining = self.ledger.policy().free_remaining(recorded.monthly_usage);

        Ok(ConversionOutcome {
            output,
            billing: BillingSummary::for_event(&recorded.event, account.plan, free_remaining),
        })
    }

    pub fn usage_report(&self, account: &AccountId) -> Result<UsageReport, ServiceError> {
        Ok(self.ledger.usage_report(account)?)
    }
}
