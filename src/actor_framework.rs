use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Trait that any domain entity must implement to be managed by ResourceActor
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Debug;
    type Patch: Send + Debug;

    type Action: Send + Debug;
    type ActionResult: Send + Debug;

    /// Error surfaced by hooks; repository failures convert into it.
    type Error: From<FrameworkError> + Send + Debug + 'static;

    /// Human-readable entity name used in error messages and spans.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and Payload
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a custom domain-specific action.
    ///
    /// Runs against a draft copy; the stored entity is only replaced when the
    /// handler returns `Ok`, so a failed action never leaves partial state.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// Failures raised by the actor machinery itself rather than by an entity hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameworkError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} conflicts with existing {existing}")]
    Conflict { kind: &'static str, existing: String },
    #[error("{kind} limit of {limit} reached")]
    LimitReached { kind: &'static str, limit: usize },
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, E>>;

/// Predicate evaluated inside the actor task.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send>;

pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T, T::Error>,
    },
    /// Create only if no stored entity matches `conflict`. Check and insert
    /// happen in the same turn of the actor loop.
    CreateUnique {
        payload: T::CreatePayload,
        conflict: Filter<T>,
        respond_to: Response<T, T::Error>,
    },
    /// Create only while fewer than `limit` stored entities match `scope`
    /// and none of those matches `conflict`. Checked in the same turn.
    CreateWithin {
        payload: T::CreatePayload,
        scope: Filter<T>,
        limit: usize,
        conflict: Filter<T>,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        filter: Filter<T>,
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    /// Full replacement, last write wins. Returns the previous value.
    Upsert {
        item: T,
        respond_to: Response<Option<T>, T::Error>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<T, T::Error>,
    },
    DeleteWhere {
        filter: Filter<T>,
        respond_to: Response<Vec<T>, T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    // Insertion sequence keeps list results stable.
    store: HashMap<T::Id, (u64, T)>,
    next_seq: u64,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_seq: 0,
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, ResourceClient::new(sender))
    }

    #[instrument(name = "resource_actor", skip(self), fields(kind = T::KIND))]
    pub async fn run(mut self) {
        info!("Actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let _ = respond_to.send(self.insert_new(payload));
                }
                ResourceRequest::CreateUnique {
                    payload,
                    conflict,
                    respond_to,
                } => {
                    let result = match self.find_conflict(&|_: &T| true, &conflict) {
                        Some(err) => Err(err.into()),
                        None => self.insert_new(payload),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::CreateWithin {
                    payload,
                    scope,
                    limit,
                    conflict,
                    respond_to,
                } => {
                    let in_scope = self.store.values().filter(|(_, item)| scope(item)).count();
                    let result = if in_scope >= limit {
                        debug!(in_scope, limit, "Create refused at limit");
                        Err(FrameworkError::LimitReached { kind: T::KIND, limit }.into())
                    } else {
                        match self.find_conflict(&scope, &conflict) {
                            Some(err) => Err(err.into()),
                            None => self.insert_new(payload),
                        }
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).map(|(_, item)| item.clone());
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let _ = respond_to.send(Ok(self.collect(&filter)));
                }
                ResourceRequest::Update {
                    id,
                    patch,
                    respond_to,
                } => {
                    let result = match self.store.get_mut(&id) {
                        Some((_, item)) => {
                            let mut draft = item.clone();
                            draft.on_update(patch).map(|()| {
                                *item = draft;
                                item.clone()
                            })
                        }
                        None => Err(Self::not_found(&id)),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Upsert { item, respond_to } => {
                    let id = item.id().clone();
                    let previous = match self.store.get_mut(&id) {
                        Some((_, slot)) => Some(std::mem::replace(slot, item)),
                        None => {
                            let seq = self.bump_seq();
                            self.store.insert(id, (seq, item));
                            None
                        }
                    };
                    let _ = respond_to.send(Ok(previous));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let result = match self.store.get(&id).map(|(_, item)| item.on_delete()) {
                        Some(Ok(())) => self
                            .store
                            .remove(&id)
                            .map(|(_, item)| item)
                            .ok_or_else(|| Self::not_found(&id)),
                        Some(Err(e)) => Err(e),
                        None => Err(Self::not_found(&id)),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::DeleteWhere { filter, respond_to } => {
                    let doomed = self.collect(&filter);
                    for item in &doomed {
                        self.store.remove(item.id());
                    }
                    debug!(removed = doomed.len(), "Bulk delete");
                    let _ = respond_to.send(Ok(doomed));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    let result = match self.store.get_mut(&id) {
                        Some((_, item)) => {
                            let mut draft = item.clone();
                            draft.handle_action(action).map(|outcome| {
                                *item = draft;
                                outcome
                            })
                        }
                        None => Err(Self::not_found(&id)),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Shutdown => {
                    info!("Actor shutting down");
                    break;
                }
            }
        }
        info!("Actor stopped");
    }

    fn insert_new(&mut self, payload: T::CreatePayload) -> Result<T, T::Error> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create(id.clone(), payload)?;
        item.on_create()?;
        let seq = self.bump_seq();
        self.store.insert(id, (seq, item.clone()));
        Ok(item)
    }

    fn find_conflict(
        &self,
        scope: &dyn Fn(&T) -> bool,
        conflict: &dyn Fn(&T) -> bool,
    ) -> Option<FrameworkError> {
        self.store
            .values()
            .find(|(_, item)| scope(item) && conflict(item))
            .map(|(_, item)| FrameworkError::Conflict {
                kind: T::KIND,
                existing: item.id().to_string(),
            })
    }

    fn collect(&self, filter: &Filter<T>) -> Vec<T> {
        let mut matched: Vec<&(u64, T)> = self
            .store
            .values()
            .filter(|(_, item)| filter(item))
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, item)| item.clone()).collect()
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn not_found(id: &T::Id) -> T::Error {
        FrameworkError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        }
        .into()
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

// Manual impl: a derive would demand `T: Clone` on the sender type too.
impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub(crate) fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T, T::Error> {
        self.call(|respond_to| ResourceRequest::Create { payload, respond_to })
            .await
    }

    pub async fn create_unique(
        &self,
        payload: T::CreatePayload,
        conflict: impl Fn(&T) -> bool + Send + 'static,
    ) -> Result<T, T::Error> {
        self.call(|respond_to| ResourceRequest::CreateUnique {
            payload,
            conflict: Box::new(conflict),
            respond_to,
        })
        .await
    }

    /// Create bounded by a per-scope count, e.g. stores per owner.
    pub async fn create_within(
        &self,
        payload: T::CreatePayload,
        scope: impl Fn(&T) -> bool + Send + 'static,
        limit: usize,
        conflict: impl Fn(&T) -> bool + Send + 'static,
    ) -> Result<T, T::Error> {
        self.call(|respond_to| ResourceRequest::CreateWithin {
            payload,
            scope: Box::new(scope),
            limit,
            conflict: Box::new(conflict),
            respond_to,
        })
        .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, T::Error> {
        self.call(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    /// Like [`get`](Self::get) but a missing entity is an error.
    pub async fn require(&self, id: T::Id) -> Result<T, T::Error> {
        let missing = FrameworkError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        };
        self.get(id).await?.ok_or_else(|| missing.into())
    }

    pub async fn list(&self, filter: impl Fn(&T) -> bool + Send + 'static) -> Result<Vec<T>, T::Error> {
        self.call(|respond_to| ResourceRequest::List {
            filter: Box::new(filter),
            respond_to,
        })
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<T>, T::Error> {
        self.list(|_| true).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        self.call(|respond_to| ResourceRequest::Update {
            id,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn upsert(&self, item: T) -> Result<Option<T>, T::Error> {
        self.call(|respond_to| ResourceRequest::Upsert { item, respond_to })
            .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<T, T::Error> {
        self.call(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn delete_where(
        &self,
        filter: impl Fn(&T) -> bool + Send + 'static,
    ) -> Result<Vec<T>, T::Error> {
        self.call(|respond_to| ResourceRequest::DeleteWhere {
            filter: Box::new(filter),
            respond_to,
        })
        .await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, T::Error> {
        self.call(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    /// Ask the actor to stop. A closed channel counts as already stopped.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(ResourceRequest::Shutdown).await;
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
