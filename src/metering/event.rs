//! Conversion events: the append-only records behind usage and billing.

use crate::codec::ConversionKind;
use crate::metering::plan::{AccountId, Cents};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed conversion, immutable once created
///
/// Corrections are made by appending compensating events, never by editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionEvent {
    id: Uuid,
    account: AccountId,
    kind: ConversionKind,
    amount: Cents,
    timestamp: DateTime<Utc>,
    charged: bool,
}

impl ConversionEvent {
    /// Create a new event; it is marked charged when the amount is non-zero
    pub fn new(
        account: AccountId,
        kind: ConversionKind,
        amount: Cents,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account,
            kind,
            amount,
            timestamp,
            charged: !amount.is_zero(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn kind(&self) -> ConversionKind {
        self.kind
    }

    pub fn amount(&self) -> Cents {
        self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn charged(&self) -> bool {
        self.charged
    }
}
