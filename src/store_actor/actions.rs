use crate::domain::SubscriptionStatus;

/// Status changes applied to a store in place.
#[derive(Debug, Clone)]
pub enum StoreAction {
    /// Admin moderation; blocks every gated operation.
    Suspend,
    /// Lifts a suspension. The store then follows its subscription again.
    Reinstate { subscription: SubscriptionStatus },
    /// Mirror a subscription change onto the store status.
    ReflectSubscription(SubscriptionStatus),
}

impl StoreAction {
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Reinstate { .. } => "reinstate",
            Self::ReflectSubscription(_) => "reflect subscription",
        }
    }
}
