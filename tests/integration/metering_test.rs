//! Integration tests for quota gating, pricing and the event ledger

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dataconv::codec::{ConversionKind, Format};
use dataconv::conversion::{ConversionConfig, ConversionEngine};
use dataconv::error::{ConversionError, MeteringError, ServiceError};
use dataconv::metering::{
    Account, AccountId, Cents, ConversionEvent, EventStore, ManualClock, MemoryEventStore,
    MeteringLedger, PlanTier, StoreError,
};
use dataconv::service::ConverterService;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration as StdDuration;

const CSV: &[u8] = b"name,age\nJohn,25\n";

fn mid_month() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap()
}

struct Harness {
    service: ConverterService,
    store: Arc<MemoryEventStore>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryEventStore::new());
    let clock = Arc::new(ManualClock::new(mid_month()));
    let ledger = MeteringLedger::new(store.clone()).with_clock(clock.clone());
    Harness {
        service: ConverterService::new(ConversionEngine::new(ConversionConfig::compact()), ledger),
        store,
        clock,
    }
}

/// Seed `count` prior events for the account earlier this month
fn seed(store: &MemoryEventStore, account: &AccountId, count: usize, at: DateTime<Utc>) {
    let kind = ConversionKind::new(Format::Csv, Format::Json);
    for _ in 0..count {
        store
            .append(ConversionEvent::new(account.clone(), kind, Cents::ZERO, at))
            .unwrap();
    }
}

#[cfg(test)]
mod pricing_tests {
    use super::*;

    #[test]
    fn test_free_tier_charge_is_monotonic() {
        let h = harness();
        let account = Account::new("acct-free", PlanTier::Free);

        for n in 1..=60u64 {
            let outcome = h
                .service
                .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
                .unwrap();
            let expected = if n <= 50 { Cents::ZERO } else { Cents(5) };
            assert_eq!(outcome.billing.amount, expected, "conversion {}", n);
            assert_eq!(outcome.billing.charged, n > 50);
        }

        let report = h.service.usage_report(&account.id).unwrap();
        assert_eq!(report.conversions_this_month, 60);
        assert_eq!(report.free_remaining, 0);
        assert_eq!(report.estimated_charge, Cents(50));
    }

    #[test]
    fn test_forty_nine_prior_events() {
        let h = harness();
        let account = Account::new("acct-49", PlanTier::Free);
        seed(&h.store, &account.id, 49, mid_month() - Duration::days(3));

        let outcome = h
            .service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();
        assert_eq!(outcome.billing.amount, Cents::ZERO);
        assert_eq!(outcome.billing.free_remaining, 0);
        assert_eq!(outcome.billing.message, "0 free conversions left");
        assert_eq!(h.service.ledger().free_remaining(&account.id).unwrap(), 0);

        let outcome = h
            .service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();
        assert_eq!(outcome.billing.amount, Cents(5));
        assert_eq!(outcome.billing.message, "Charged $0.05");
    }

    #[test]
    fn test_last_months_events_do_not_count() {
        let h = harness();
        let account = Account::new("acct-1", PlanTier::Free);
        seed(&h.store, &account.id, 80, Utc.with_ymd_and_hms(2026, 9, 30, 23, 59, 59).unwrap());

        assert_eq!(h.service.ledger().monthly_usage(&account.id).unwrap(), 0);
        let outcome = h
            .service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();
        assert_eq!(outcome.billing.amount, Cents::ZERO);
        assert_eq!(outcome.billing.free_remaining, 49);
    }

    #[test]
    fn test_plan_refreshed_per_call() {
        let h = harness();
        let id = AccountId::new("acct-upgrade");
        seed(&h.store, &id, 60, mid_month());

        let free = Account::new(id.clone(), PlanTier::Free);
        let premium = Account::new(id.clone(), PlanTier::Premium);

        let outcome = h.service.gate_and_convert(&free, Format::Csv, Format::Json, CSV).unwrap();
        assert_eq!(outcome.billing.amount, Cents(5));

        let outcome = h.service.gate_and_convert(&premium, Format::Csv, Format::Json, CSV).unwrap();
        assert_eq!(outcome.billing.amount, Cents::ZERO);
        assert_eq!(outcome.billing.message, "No charge (included in plan)");
    }

    #[test]
    fn test_monthly_bill_for_pro() {
        let h = harness();
        let account = Account::new("acct-pro", PlanTier::Pro);
        for _ in 0..10 {
            h.service
                .gate_and_convert(&account, Format::Json, Format::Yaml, br#"{"k":1}"#)
                .unwrap();
        }

        let bill = h.service.ledger().monthly_bill(&account).unwrap();
        assert_eq!(bill.conversions, 10);
        assert_eq!(bill.conversion_charge, Cents(30));
        assert_eq!(bill.plan_charge, Cents(999));
        assert_eq!(bill.total, Cents(1029));

        let invoice = h.service.ledger().invoice(&account).unwrap();
        assert_eq!(invoice.month, "October 2026");
        assert_eq!(invoice.lines.len(), 10);
        assert!(invoice
            .lines
            .iter()
            .all(|line| line.kind.to_string() == "json_to_yaml"));
    }
}

#[cfg(test)]
mod quota_tests {
    use super::*;

    #[test]
    fn test_pro_allowed_up_to_ceiling_then_denied() {
        let h = harness();
        let account = Account::new("acct-pro", PlanTier::Pro);
        seed(&h.store, &account.id, 499, mid_month() - Duration::hours(1));

        let outcome = h
            .service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();
        assert_eq!(outcome.billing.amount, Cents(3));
        assert_eq!(h.service.ledger().monthly_usage(&account.id).unwrap(), 500);

        let err = h
            .service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::Metering(MeteringError::QuotaExceeded {
                plan: PlanTier::Pro,
                limit: 500,
                used: 500
            })
        );
        assert!(err.user_message().contains("pro limit (500/month)"));
        assert_eq!(h.service.ledger().monthly_usage(&account.id).unwrap(), 500);
    }

    #[test]
    fn test_pro_quota_resets_next_month() {
        let h = harness();
        let account = Account::new("acct-pro", PlanTier::Pro);
        seed(&h.store, &account.id, 500, mid_month());

        assert!(h.service.gate_and_convert(&account, Format::Csv, Format::Json, CSV).is_err());

        h.clock.set(Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());
        assert!(h.service.gate_and_convert(&account, Format::Csv, Format::Json, CSV).is_ok());
    }

    #[test]
    fn test_premium_and_free_never_denied() {
        let h = harness();
        let premium = Account::new("acct-prem", PlanTier::Premium);
        let free = Account::new("acct-free", PlanTier::Free);
        seed(&h.store, &premium.id, 2_000, mid_month());
        seed(&h.store, &free.id, 2_000, mid_month());

        assert!(h.service.gate_and_convert(&premium, Format::Csv, Format::Json, CSV).is_ok());
        assert!(h.service.gate_and_convert(&free, Format::Csv, Format::Json, CSV).is_ok());
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_failed_conversions_leave_usage_unchanged() {
        let h = harness();
        let account = Account::new("acct-1", PlanTier::Free);
        h.service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();

        let failures: [(Format, Format, &[u8]); 3] = [
            (Format::Json, Format::Csv, b"{not json"),
            (Format::Json, Format::Csv, br#"{"a":1}"#),
            (Format::Yaml, Format::Xml, b"a: 1"),
        ];
        for (from, to, input) in failures {
            let before = h.service.ledger().monthly_usage(&account.id).unwrap();
            assert!(h.service.gate_and_convert(&account, from, to, input).is_err());
            let after = h.service.ledger().monthly_usage(&account.id).unwrap();
            assert_eq!(before, after);
        }
        assert_eq!(h.store.len().unwrap(), 1);
    }

    #[test]
    fn test_error_retryability() {
        let h = harness();
        let account = Account::new("acct-1", PlanTier::Free);

        let decode = h
            .service
            .gate_and_convert(&account, Format::Json, Format::Csv, b"[")
            .unwrap_err();
        assert!(decode.is_retryable());

        let shape = h
            .service
            .gate_and_convert(&account, Format::Json, Format::Csv, b"{}")
            .unwrap_err();
        assert_matches!(shape, ServiceError::Conversion(ConversionError::Shape(_)));
        assert!(!shape.is_retryable());

        let pair = h
            .service
            .gate_and_convert(&account, Format::Xml, Format::Yaml, b"<a/>")
            .unwrap_err();
        assert!(!pair.is_retryable());
    }

    /// Store that loses the first `conflicts` appends to a concurrent writer
    struct FlakyStore {
        inner: MemoryEventStore,
        conflicts: AtomicUsize,
    }

    impl EventStore for FlakyStore {
        fn append(&self, event: ConversionEvent) -> Result<(), StoreError> {
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict("sequence moved".to_string()));
            }
            self.inner.append(event)
        }

        fn query_by_account_since(
            &self,
            account: &AccountId,
            since: DateTime<Utc>,
        ) -> Result<Vec<ConversionEvent>, StoreError> {
            self.inner.query_by_account_since(account, since)
        }
    }

    #[test]
    fn test_write_conflict_is_retryable_and_records_nothing() {
        let store = Arc::new(FlakyStore {
            inner: MemoryEventStore::new(),
            conflicts: AtomicUsize::new(1),
        });
        let service = ConverterService::new(
            ConversionEngine::default(),
            MeteringLedger::new(store.clone()),
        );
        let account = Account::new("acct-1", PlanTier::Free);

        let err = service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap_err();
        assert_matches!(err, ServiceError::Metering(MeteringError::LedgerWriteConflict { .. }));
        assert!(err.is_retryable());
        assert!(store.inner.is_empty().unwrap());

        service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();
        assert_eq!(store.inner.len().unwrap(), 1);
    }
}

#[cfg(test)]
mod charged_once_tests {
    use super::*;

    /// Store whose reads fail once anything has been appended
    struct ReadAfterWriteFails {
        inner: MemoryEventStore,
        written: AtomicBool,
    }

    impl EventStore for ReadAfterWriteFails {
        fn append(&self, event: ConversionEvent) -> Result<(), StoreError> {
            self.inner.append(event)?;
            self.written.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn query_by_account_since(
            &self,
            account: &AccountId,
            since: DateTime<Utc>,
        ) -> Result<Vec<ConversionEvent>, StoreError> {
            if self.written.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("replica unavailable".to_string()));
            }
            self.inner.query_by_account_since(account, since)
        }
    }

    #[test]
    fn test_recorded_conversion_returns_output_without_rereading() {
        let store = Arc::new(ReadAfterWriteFails {
            inner: MemoryEventStore::new(),
            written: AtomicBool::new(false),
        });
        let service = ConverterService::new(
            ConversionEngine::new(ConversionConfig::compact()),
            MeteringLedger::new(store.clone()),
        );
        let account = Account::new("acct-1", PlanTier::Free);

        let outcome = service
            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
            .unwrap();

        assert_eq!(outcome.output.as_text(), Some(r#"[{"name":"John","age":"25"}]"#));
        assert_eq!(outcome.billing.free_remaining, 49);
        assert_eq!(outcome.billing.message, "49 free conversions left");
        assert_eq!(store.inner.len().unwrap(), 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[test]
    fn test_concurrent_free_conversions_get_exactly_fifty_free() {
        let h = Arc::new(harness());
        let account = Account::new("acct-race", PlanTier::Free);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let h = Arc::clone(&h);
                let account = account.clone();
                thread::spawn(move || {
                    (0..10)
                        .map(|_| {
                            h.service
                                .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
                                .unwrap()
                                .billing
                                .amount
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let amounts: Vec<Cents> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(amounts.len(), 80);
        assert_eq!(amounts.iter().filter(|a| a.is_zero()).count(), 50);
        assert_eq!(amounts.iter().filter(|a| **a == Cents(5)).count(), 30);
    }

    #[test]
    fn test_accounts_are_independent() {
        let h = Arc::new(harness());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let h = Arc::clone(&h);
                thread::spawn(move || {
                    let account = Account::new(format!("acct-{i}").as_str(), PlanTier::Free);
                    for _ in 0..5 {
                        h.service
                            .gate_and_convert(&account, Format::Csv, Format::Json, CSV)
                            .unwrap();
                    }
                    h.service.ledger().free_remaining(&account.id).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 45);
        }
    }

    /// Memory store with slow reads, widening the gate-to-record window
    struct SlowReads {
        inner: MemoryEventStore,
    }

    impl EventStore for SlowReads {
        fn append(&self, event: ConversionEvent) -> Result<(), StoreError> {
            self.inner.append(event)
        }

        fn query_by_account_since(
            &self,
            account: &AccountId,
            since: DateTime<Utc>,
        ) -> Result<Vec<ConversionEvent>, StoreError> {
            thread::sleep(StdDuration::from_millis(30));
            self.inner.query_by_account_since(account, since)
        }
    }

    #[test]
    fn test_concurrent_pro_conversions_respect_ceiling() {
        let store = Arc::new(SlowReads {
            inner: MemoryEventStore::new(),
        });
        let account = Account::new("acct-pro-race", PlanTier::Pro);
        seed(&store.inner, &account.id, 499, mid_month() - Duration::hours(1));

        let ledger = MeteringLedger::new(store.clone())
            .with_clock(Arc::new(ManualClock::new(mid_month())));
        let service = Arc::new(ConverterService::new(ConversionEngine::default(), ledger));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let account = account.clone();
                thread::spawn(move || {
                    barrier.wait();
                    service.gate_and_convert(&account, Format::Csv, Format::Json, CSV)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.into_iter().filter_map(Result::err) {
            assert_matches!(
                err,
                ServiceError::Metering(MeteringError::QuotaExceeded { limit: 500, .. })
            );
        }
        assert_eq!(service.ledger().monthly_usage(&account.id).unwrap(), 500);
    }
}
