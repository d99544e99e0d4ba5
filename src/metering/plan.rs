//! Accounts, plan tiers and per-conversion pricing.
//!
//! Free:    50 conversions/month at $0, then $0.05 each (always billed)
//! Pro:     hard ceiling of 500/month, $0.03 each, $9.99 monthly fee
//! Premium: unlimited, $0 each, $29.99 monthly fee
//!
//! Monthly fees are billed outside the ledger; they only appear on bills.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Opaque account identifier issued by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Premium,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "premium" => Ok(PlanTier::Premium),
            other => Err(format!("Unknown plan '{}'. Use free, pro or premium", other)),
        }
    }
}

/// Read-only account snapshot supplied by the host on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub plan: PlanTier,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, plan: PlanTier) -> Self {
        Self {
            id: id.into(),
            plan,
        }
    }
}

/// Amount of money in US cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

/// Quotas and prices applied by the gate and the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Conversions per month included at no charge on the free plan
    pub free_allowance: u64,
    /// Price of each free-plan conversion beyond the allowance
    pub free_overage_price: Cents,
    /// Hard monthly ceiling on the pro plan
    pub pro_monthly_limit: u64,
    pub pro_unit_price: Cents,
    pub premium_unit_price: Cents,
    pub pro_monthly_fee: Cents,
    pub premium_monthly_fee: Cents,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_allowance: 50,
            free_overage_price: Cents(5),
            pro_monthly_limit: 500,
            pro_unit_price: Cents(3),
            premium_unit_price: Cents::ZERO,
            pro_monthly_fee: Cents(999),
            premium_monthly_fee: Cents(2999),
        }
    }
}

impl PricingPolicy {
    /// Price of a conversion given the number of earlier conversions this month
    pub fn unit_price(&self, plan: PlanTier, prior_this_month: u64) -> Cents {
        match plan {
            PlanTier::Free if prior_this_month < self.free_allowance => Cents::ZERO,
            PlanTier::Free => self.free_overage_price,
            PlanTier::Pro => self.pro_unit_price,
            PlanTier::Premium => self.premium_unit_price,
        }
    }

    /// Hard monthly ceiling, if the plan has one
    pub fn monthly_limit(&self, plan: PlanTier) -> Option<u64> {
        match plan {
            PlanTier::Pro => Some(self.pro_monthly_limit),
            PlanTier::Free | PlanTier::Premium => None,
        }
    }

    pub fn monthly_fee(&self, plan: PlanTier) -> Cents {
        match plan {
            PlanTier::Free => Cents::ZERO,
            PlanTier::Pro => self.pro_monthly_fee,
            PlanTier::Premium => self.premium_monthly_fee,
        }
    }

    pub fn free_remaining(&self, used_this_month: u64) -> u64 {
        self.free_allowance.saturating_sub(used_this_month)
    }
}
