//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_action`] to assert behavior.

use tokio::sync::mpsc;

use crate::actor_framework::{Entity, Filter, ResourceClient, ResourceRequest, Response};

pub type MockReceiver<T> = mpsc::Receiver<ResourceRequest<T>>;

/// Creates a mock client and a receiver for asserting requests.
///
/// The test plays the actor: it reads each request from the receiver,
/// checks it and answers on the enclosed responder. Nothing reaches a real
/// `ResourceActor`, so ordering and early exits of a client are observable.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, MockReceiver<T>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut MockReceiver<T>,
) -> Option<(T::CreatePayload, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a CreateUnique request
pub async fn expect_create_unique<T: Entity>(
    receiver: &mut MockReceiver<T>,
) -> Option<(T::CreatePayload, Filter<T>, Response<T, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::CreateUnique {
            payload,
            conflict,
            respond_to,
        }) => Some((payload, conflict, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(receiver: &mut MockReceiver<T>) -> Option<(T::Id, Response<Option<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(receiver: &mut MockReceiver<T>) -> Option<(Filter<T>, Response<Vec<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::List { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut MockReceiver<T>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Answers a List request the way the actor would: by applying the
/// request's own filter to `candidates`.
pub fn answer_list<T: Entity>(filter: Filter<T>, respond_to: Response<Vec<T>, T::Error>, candidates: Vec<T>) {
    let matching = candidates.into_iter().filter(|item| filter(item)).collect();
    let _ = respond_to.send(Ok(matching));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UserClient;
    use crate::domain::{User, UserRegistration};
    use crate::error::MarketError;
    use crate::test_support::fixed_clock;

    #[tokio::test]
    async fn test_mock_client() {
        let (inner, mut receiver) = create_mock_client::<User>(10);
        let client = UserClient::new(inner, fixed_clock());

        let register_task = tokio::spawn(async move {
            client
                .register_user(UserRegistration::new("Test", "Test@Example.com"))
                .await
        });

        let (payload, conflict, responder) = expect_create_unique(&mut receiver)
            .await
            .expect("Expected CreateUnique request");
        assert_eq!(payload.registration.full_name, "Test");

        let existing = User {
            id: "user_1".into(),
            full_name: "Someone".into(),
            email: "test@example.com".into(),
            phone: String::new(),
            country: String::new(),
            registered_at: payload.registered_at,
        };
        assert!(conflict(&existing), "email comparison must ignore case");
        responder
            .send(Err(MarketError::Duplicate {
                field: "User".into(),
                value: "user_1".into(),
            }))
            .unwrap();

        let result = register_task.await.unwrap();
        assert_eq!(
            result,
            Err(MarketError::Duplicate {
                field: "email".into(),
                value: "test@example.com".into(),
            })
        );
    }
}
