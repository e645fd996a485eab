use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserPatch};
use crate::error::MarketError;

impl Entity for User {
    type Id = String;
    type CreatePayload = UserCreate;
    type Patch = UserPatch;
    type Action = ();
    type ActionResult = ();
    type Error = MarketError;

    const KIND: &'static str = "User";

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new User from a registration.
    ///
    /// # Errors
    /// `Validation` when the name is blank or the email is not an address.
    fn from_create(id: String, params: UserCreate) -> Result<Self, MarketError> {
        let registration = params.registration;
        let full_name = registration.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(MarketError::required("full_name"));
        }
        let email = registration.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(MarketError::required("email"));
        }
        if !email.contains('@') {
            return Err(MarketError::Validation {
                field: "email",
                reason: format!("'{email}' is not an email address"),
            });
        }
        Ok(Self {
            id,
            full_name,
            email,
            phone: registration.phone,
            country: registration.country,
            registered_at: params.registered_at,
        })
    }

    fn on_update(&mut self, patch: UserPatch) -> Result<(), MarketError> {
        if let Some(full_name) = patch.full_name {
            let full_name = full_name.trim().to_string();
            if full_name.is_empty() {
                return Err(MarketError::required("full_name"));
            }
            self.full_name = full_name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(country) = patch.country {
            self.country = country;
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), MarketError> {
        Ok(())
    }
}
