use crate::domain::Assignment;

#[derive(Debug, Clone)]
pub enum ShippingAction {
    /// Claim a waiting request for a transporter at a price.
    Accept(Assignment),
    Reject,
    /// `by` must be the assigned transporter.
    StartTransit { by: String },
    /// `by` must be the assigned transporter.
    MarkDelivered { by: String },
}

impl ShippingAction {
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Accept(_) => "accept",
            Self::Reject => "reject",
            Self::StartTransit { .. } => "start transit",
            Self::MarkDelivered { .. } => "mark delivered",
        }
    }
}
