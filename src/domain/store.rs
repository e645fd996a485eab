use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RolePolicy, SubscriptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreType {
    Farmer,
    Wholesaler,
    Retailer,
    Transport,
    Admin,
}

impl StoreType {
    pub const fn policy(self) -> RolePolicy {
        RolePolicy::for_store_type(self)
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreStatus {
    Active,
    Suspended,
    Expired,
}

impl StoreStatus {
    /// The status a store should show for a given subscription status.
    ///
    /// Suspension is an administrative decision and survives any
    /// subscription change. A pending payment leaves the status as it was.
    pub const fn reflecting(self, subscription: SubscriptionStatus) -> Self {
        match (self, subscription) {
            (Self::Suspended, _) => Self::Suspended,
            (_, SubscriptionStatus::Active) => Self::Active,
            (_, SubscriptionStatus::Expired) => Self::Expired,
            (current, SubscriptionStatus::PendingPayment) => current,
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A seller, buyer or transporter identity owned by a user.
///
/// `status` is denormalised from the store's subscription; reads reconcile it
/// against the current time, see `StoreClient::get_store`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub owner_user_id: String,
    pub name: String,
    pub store_type: StoreType,
    pub status: StoreStatus,
    pub address: String,
    pub wilaya: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub const fn policy(&self) -> RolePolicy {
        self.store_type.policy()
    }
}

/// What a caller supplies to open a store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub store_type: StoreType,
    pub address: String,
    pub wilaya: String,
    pub phone: String,
}

impl NewStore {
    pub fn new(name: impl Into<String>, store_type: StoreType) -> Self {
        Self {
            name: name.into(),
            store_type,
            address: String::new(),
            wilaya: String::new(),
            phone: String::new(),
        }
    }

    pub fn located(mut self, address: impl Into<String>, wilaya: impl Into<String>) -> Self {
        self.address = address.into();
        self.wilaya = wilaya.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct StoreCreate {
    pub owner_user_id: String,
    pub store: NewStore,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct StorePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub wilaya: Option<String>,
    pub phone: Option<String>,
}
