//! Quota gate: decides whether a plan may run another conversion this month.

use crate::error::{MeteringError, MeteringResult};
use crate::metering::plan::{Cents, PlanTier, PricingPolicy};
use std::fmt;
use tracing::warn;

/// Allowance left after a successful gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    /// No ceiling applies
    Unlimited,
    /// Conversions left before the plan's hard ceiling
    Remaining(u64),
    /// Free conversions left this month
    FreeRemaining(u64),
    /// Free allowance used up; every conversion is billed at this price
    Overage(Cents),
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allowance::Unlimited => write!(f, "unlimited"),
            Allowance::Remaining(n) => write!(f, "{} left", n),
            Allowance::FreeRemaining(n) => write!(f, "{} free left", n),
            Allowance::Overage(price) => write!(f, "Will charge {}", price),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuotaGate {
    policy: PricingPolicy,
}

impl QuotaGate {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    /// Allow or deny a conversion given this month's usage so far
    pub fn evaluate(&self, plan: PlanTier, used_this_month: u64) -> MeteringResult<Allowance> {
        match plan {
            PlanTier::Premium => Ok(Allowance::Unlimited),
            PlanTier::Pro => {
                let limit = self.policy.pro_monthly_limit;
                if used_this_month >= limit {
                    warn!(%plan, used = used_this_month, limit, "monthly quota exceeded");
                    return Err(MeteringError::QuotaExceeded {
                        plan,
                        limit,
                        used: used_this_month,
                    });
                }
                if used_this_month * 5 >= limit * 4 {
                    warn!(%plan, used = used_this_month, limit, "approaching monthly quota (80%+)");
                }
                Ok(Allowance::Remaining(limit - used_this_month))
            }
            PlanTier::Free => {
                if used_this_month < self.policy.free_allowance {
                    Ok(Allowance::FreeRemaining(
                        self.policy.free_remaining(used_this_month),
                    ))
                } else {
                    Ok(Allowance::Overage(self.policy.free_overage_price))
                }
            }
        }
    }
}
