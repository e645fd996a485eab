use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of Algerian dinars held as integer centimes.
///
/// Prices are frozen into orders, so arithmetic never touches floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    pub const fn from_centimes(centimes: i64) -> Self {
        Self(centimes)
    }

    pub const fn from_dinars(dinars: i64) -> Self {
        Self(dinars * 100)
    }

    pub const fn centimes(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Unit price times a quantity in kilograms, `None` on overflow.
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02} DZD", abs / 100, abs % 100)
    }
}
