use tracing::{info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::SharedClock;
use crate::domain::{User, UserCreate, UserPatch, UserRegistration};
use crate::error::{MarketError, MarketResult};

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
    clock: SharedClock,
}

impl UserClient {
    /// Registers a user. Emails are unique regardless of case.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register_user(&self, registration: UserRegistration) -> MarketResult<User> {
        let email = registration.email.trim().to_string();
        let payload = UserCreate {
            registration,
            registered_at: self.clock.utc(),
        };
        let wanted = email.clone();
        match self.inner.create_unique(payload, move |u: &User| u.has_email(&wanted)).await {
            Ok(user) => {
                info!(user_id = %user.id, "User registered");
                Ok(user)
            }
            Err(MarketError::Duplicate { .. }) => {
                warn!("Email already registered");
                Err(MarketError::Duplicate {
                    field: "email".to_string(),
                    value: email.to_lowercase(),
                })
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn find_user_by_email(&self, email: &str) -> MarketResult<Option<User>> {
        let wanted = email.to_string();
        let mut found = self.inner.list(move |u: &User| u.has_email(&wanted)).await?;
        Ok(found.pop())
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: &str, patch: UserPatch) -> MarketResult<User> {
        self.inner.update(id.to_string(), patch).await
    }
}

impl_basic_client!(UserClient, User, user);
