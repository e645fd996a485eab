use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanId {
    #[serde(rename = "FREE_30")]
    Free30,
    #[serde(rename = "PLAN_6M")]
    Plan6M,
    #[serde(rename = "PLAN_12M")]
    Plan12M,
}

/// A purchasable entitlement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub name: &'static str,
    pub price: Money,
    pub duration_days: i64,
    pub features: &'static [&'static str],
}

pub const PLANS: [Plan; 3] = [
    Plan {
        id: PlanId::Free30,
        name: "Free trial",
        price: Money::from_dinars(0),
        duration_days: 30,
        features: &["basic_usage"],
    },
    Plan {
        id: PlanId::Plan6M,
        name: "Six months",
        price: Money::from_dinars(6_500),
        duration_days: 180,
        features: &["full_features"],
    },
    Plan {
        id: PlanId::Plan12M,
        name: "Twelve months",
        price: Money::from_dinars(9_500),
        duration_days: 365,
        features: &["full_features", "priority_support"],
    },
];

impl PlanId {
    pub const fn plan(self) -> Plan {
        match self {
            Self::Free30 => PLANS[0],
            Self::Plan6M => PLANS[1],
            Self::Plan12M => PLANS[2],
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free30 => "FREE_30",
            Self::Plan6M => "PLAN_6M",
            Self::Plan12M => "PLAN_12M",
        }
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE_30" => Ok(Self::Free30),
            "PLAN_6M" => Ok(Self::Plan6M),
            "PLAN_12M" => Ok(Self::Plan12M),
            other => Err(format!("unknown plan: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Expired,
    PendingPayment,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The single current entitlement record of a store.
///
/// `status` holds what was last written. Expiry is never stored; it is
/// derived on read by [`Subscription::effective_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub store_id: String,
    pub plan_id: PlanId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
}

impl Subscription {
    /// A fresh period for `plan_id` starting at `now`.
    pub fn starting(id: String, store_id: String, plan_id: PlanId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            store_id,
            plan_id,
            start_date: now,
            end_date: now + Duration::days(plan_id.plan().duration_days),
            status: SubscriptionStatus::Active,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        if self.is_expired_at(now) {
            SubscriptionStatus::Expired
        } else {
            self.status
        }
    }

    /// Whole days left, rounded up; zero once expired.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let left = self.end_date - now;
        if left <= Duration::zero() {
            return 0;
        }
        let whole = left.num_days();
        if left > Duration::days(whole) {
            whole + 1
        } else {
            whole
        }
    }

    /// Copy with `status` replaced by the effective status at `now`.
    pub fn as_of(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionCreate {
    pub store_id: String,
    pub plan_id: PlanId,
    pub now: DateTime<Utc>,
}

/// Administrative override of a subscription's dates or stored status.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SubscriptionStatus>,
}
