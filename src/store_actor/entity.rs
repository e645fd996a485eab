use crate::actor_framework::Entity;
use crate::domain::{Store, StoreCreate, StorePatch, StoreStatus};
use crate::error::MarketError;

use super::actions::StoreAction;

impl Entity for Store {
    type Id = String;
    type CreatePayload = StoreCreate;
    type Patch = StorePatch;
    type Action = StoreAction;
    type ActionResult = Store;
    type Error = MarketError;

    const KIND: &'static str = "Store";

    fn id(&self) -> &String {
        &self.id
    }

    /// New stores start `Active`; their trial subscription is opened by the
    /// caller straight after.
    fn from_create(id: String, params: StoreCreate) -> Result<Self, MarketError> {
        let store = params.store;
        let name = store.name.trim().to_string();
        if name.is_empty() {
            return Err(MarketError::required("name"));
        }
        Ok(Self {
            id,
            owner_user_id: params.owner_user_id,
            name,
            store_type: store.store_type,
            status: StoreStatus::Active,
            address: store.address,
            wilaya: store.wilaya,
            phone: store.phone,
            created_at: params.created_at,
        })
    }

    fn on_update(&mut self, patch: StorePatch) -> Result<(), MarketError> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(MarketError::required("name"));
            }
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(wilaya) = patch.wilaya {
            self.wilaya = wilaya;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        Ok(())
    }

    /// # Errors
    /// `InvalidTransition` when suspending a suspended store or reinstating
    /// one that is not suspended.
    fn handle_action(&mut self, action: StoreAction) -> Result<Store, MarketError> {
        let next = match (&action, self.status) {
            (StoreAction::Suspend, StoreStatus::Suspended) => return Err(self.invalid(&action)),
            (StoreAction::Suspend, _) => StoreStatus::Suspended,
            (StoreAction::Reinstate { subscription }, StoreStatus::Suspended) => {
                StoreStatus::Active.reflecting(*subscription)
            }
            (StoreAction::Reinstate { .. }, _) => return Err(self.invalid(&action)),
            (StoreAction::ReflectSubscription(subscription), current) => current.reflecting(*subscription),
        };
        self.status = next;
        Ok(self.clone())
    }
}

impl Store {
    fn invalid(&self, action: &StoreAction) -> MarketError {
        MarketError::InvalidTransition {
            kind: Self::KIND,
            id: self.id.clone(),
            from: self.status.to_string(),
            action: action.verb(),
        }
    }
}
