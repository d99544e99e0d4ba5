//! Metering ledger: records conversion events and answers usage and billing queries.
//!
//! Counting prior events, re-checking the quota, pricing the new event and
//! appending it run as one serialized step per account. Two concurrent
//! conversions for the same account therefore never both see themselves
//! inside the free allowance, and never both take the last pro slot.

use crate::codec::ConversionKind;
use crate::error::{MeteringError, MeteringResult};
use crate::metering::clock::{month_start, Clock, SystemClock};
use crate::metering::event::ConversionEvent;
use crate::metering::gate::{Allowance, QuotaGate};
use crate::metering::plan::{Account, AccountId, Cents, PlanTier, PricingPolicy};
use crate::metering::store::{EventStore, StoreError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Usage for the current calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub account: AccountId,
    pub conversions_this_month: u64,
    pub free_remaining: u64,
    /// Sum of per-event amounts; plan fees are not included
    pub estimated_charge: Cents,
}

/// Current month's bill including the plan's flat fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBill {
    pub account: AccountId,
    pub plan: PlanTier,
    pub conversions: u64,
    pub conversion_charge: Cents,
    pub plan_charge: Cents,
    pub total: Cents,
    pub currency: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    pub kind: ConversionKind,
    pub amount: Cents,
    pub timestamp: DateTime<Utc>,
}

/// An appended event together with the monthly count it was priced against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedConversion {
    pub event: ConversionEvent,
    /// Events this month including `event`
    pub monthly_usage: u64,
}

/// Itemised bill for the current month, e.g. "October 2026"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub month: String,
    pub bill: MonthlyBill,
    pub lines: Vec<InvoiceLine>,
}

pub struct MeteringLedger {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    policy: PricingPolicy,
    gate: QuotaGate,
    /// Writer locks, dropped again once no recording holds them
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl MeteringLedger {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        let policy = PricingPolicy::default();
        Self {
            store,
            clock: Arc::new(SystemClock),
            gate: QuotaGate::new(policy.clone()),
            policy,
            locks: DashMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.gate = QuotaGate::new(policy.clone());
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Gate check against this month's usage
    ///
    /// Advisory only: `record_conversion` evaluates the gate again under the
    /// account lock before appending.
    pub fn check_quota(&self, account: &Account) -> MeteringResult<Allowance> {
        let used = self.monthly_usage(&account.id)?;
        self.gate.evaluate(account.plan, used)
    }

    /// Append an event for a completed conversion
    ///
    /// Fails with `QuotaExceeded` and appends nothing when the plan's
    /// ceiling was reached by a concurrent recording.
    pub fn record_conversion(
        &self,
        account: &Account,
        kind: ConversionKind,
    ) -> MeteringResult<RecordedConversion> {
        let lock = self.account_lock(&account.id);
        let recorded = match lock.lock() {
            Ok(_guard) => self.append_locked(account, kind),
            Err(_) => Err(MeteringError::LedgerWriteConflict {
                account: account.id.clone(),
                message: "account lock poisoned by an earlier writer".to_string(),
            }),
        };
        drop(lock);
        self.release_lock(&account.id);
        recorded
    }

    fn append_locked(
        &self,
        account: &Account,
        kind: ConversionKind,
    ) -> MeteringResult<RecordedConversion> {
        let now = self.clock.now();
        let prior = self.count_since(&account.id, month_start(now))?;
        self.gate.evaluate(account.plan, prior)?;

        let amount = self.policy.unit_price(account.plan, prior);
        let event = ConversionEvent::new(account.id.clone(), kind, amount, now);

        self.store
            .append(event.clone())
            .map_err(|e| store_error(&account.id, e))?;

        info!(
            account = %account.id,
            plan = %account.plan,
            kind = %kind,
            amount_cents = amount.0,
            charged = event.charged(),
            prior,
            "conversion recorded"
        );

        Ok(RecordedConversion {
            event,
            monthly_usage: prior + 1,
        })
    }

    /// Events recorded for the account since the start of the current UTC month
    pub fn monthly_events(&self, account: &AccountId) -> MeteringResult<Vec<ConversionEvent>> {
        let since = month_start(self.clock.now());
        self.store
            .query_by_account_since(account, since)
            .map_err(|e| store_error(account, e))
    }

    pub fn monthly_usage(&self, account: &AccountId) -> MeteringResult<u64> {
        self.count_since(account, month_start(self.clock.now()))
    }

    pub fn free_remaining(&self, account: &AccountId) -> MeteringResult<u64> {
        Ok(self.policy.free_remaining(self.monthly_usage(account)?))
    }

    pub fn usage_report(&self, account: &AccountId) -> MeteringResult<UsageReport> {
        let events = self.monthly_events(account)?;
        let used = events.len() as u64;

        Ok(UsageReport {
            account: account.clone(),
            conversions_this_month: used,
            free_remaining: self.policy.free_remaining(used),
            estimated_charge: events.iter().map(ConversionEvent::amount).sum(),
        })
    }

    pub fn monthly_bill(&self, account: &Account) -> MeteringResult<MonthlyBill> {
        let events = self.monthly_events(&account.id)?;
        Ok(self.bill_for(account, &events))
    }

    pub fn invoice(&self, account: &Account) -> MeteringResult<Invoice> {
        let now = self.clock.now();
        let events = self.monthly_events(&account.id)?;
        let bill = self.bill_for(account, &events);

        let lines = events
            .iter()
            .map(|e| InvoiceLine {
                kind: e.kind(),
                amount: e.amount(),
                timestamp: e.timestamp(),
            })
            .collect();

        Ok(Invoice {
            month: now.format("%B %Y").to_string(),
            bill,
            lines,
        })
    }

    fn bill_for(&self, account: &Account, events: &[ConversionEvent]) -> MonthlyBill {
        let conversion_charge: Cents = events.iter().map(ConversionEvent::amount).sum();
        let plan_charge = self.policy.monthly_fee(account.plan);

        MonthlyBill {
            account: account.id.clone(),
            plan: account.plan,
            conversions: events.len() as u64,
            conversion_charge,
            plan_charge,
            total: conversion_charge + plan_charge,
            currency: "USD",
        }
    }

    fn count_since(&self, account: &AccountId, since: DateTime<Utc>) -> MeteringResult<u64> {
        let count = self
            .store
            .query_by_account_since(account, since)
            .map_err(|e| store_error(account, e))?
            .len() as u64;
        debug!(account = %account, count, "counted monthly events");
        Ok(count)
    }

    fn account_lock(&self, account: &AccountId) -> Arc<Mutex<()>> {
        self.locks.entry(account.clone()).or_default().clone()
    }

    /// Remove the account's lock when the map holds the only reference.
    ///
    /// `remove_if` and `account_lock` both take the shard lock, so no
    /// clone can be handed out between the count check and the removal.
    fn release_lock(&self, account: &AccountId) {
        self.locks
            .remove_if(account, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn store_error(account: &AccountId, err: StoreError) -> MeteringError {
    match err {
        StoreError::Conflict(message) => MeteringError::LedgerWriteConflict {
            account: account.clone(),
            message,
        },
        StoreError::Backend(message) => MeteringError::Store { message },
    }
}
