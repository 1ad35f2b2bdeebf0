//! Money and cart/order totals.

use serde::{Deserialize, Serialize};

/// Money amount held in minor units (paise) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Creates an amount from minor units (e.g., 1000 = INR 10.00).
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates an amount from whole rupees.
    pub fn from_rupees(rupees: i64) -> Self {
        Self {
            minor: rupees * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the whole-rupee portion.
    pub fn rupees(&self) -> i64 {
        self.minor / 100
    }

    /// Returns the paise portion (remainder after rupees).
    pub fn paise_part(&self) -> i64 {
        self.minor.abs() % 100
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            minor: self.minor * i64::from(quantity),
        }
    }

    /// Returns `percent`% of this amount rounded half-up to whole rupees.
    pub fn percentage_rounded_to_rupee(&self, percent: u32) -> Money {
        // minor * percent is in hundredths of a paisa.
        let scaled = self.minor * i64::from(percent);
        Money::from_rupees((scaled + 5_000).div_euclid(10_000))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.minor < 0 {
            write!(f, "-INR {}.{:02}", self.rupees().abs(), self.paise_part())
        } else {
            write!(f, "INR {}.{:02}", self.rupees(), self.paise_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor + rhs.minor,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            minor: self.minor - rhs.minor,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.minor += rhs.minor;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Aggregate price fields carried by a cart and copied onto an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of list prices.
    pub total_price: Money,
    /// Sum of discounted prices; what the purchaser pays before tax.
    pub total_discounted_price: Money,
    /// `total_price - total_discounted_price`.
    pub discount: Money,
    /// Number of distinct lines.
    pub total_item: u32,
}

impl Totals {
    /// All-zero totals, as left behind on a drained cart.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns true if every field is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_rupees() {
        let money = Money::from_rupees(50);
        assert_eq!(money.minor(), 5000);
        assert_eq!(money.rupees(), 50);
        assert_eq!(money.paise_part(), 0);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_minor(1234).to_string(), "INR 12.34");
        assert_eq!(Money::from_minor(100).to_string(), "INR 1.00");
        assert_eq!(Money::from_minor(5).to_string(), "INR 0.05");
        assert_eq!(Money::from_minor(-1234).to_string(), "-INR 12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!(a.multiply(3).minor(), 3000);
        assert_eq!([a, b, b].into_iter().sum::<Money>().minor(), 2000);
    }

    #[test]
    fn test_percentage_of_whole_rupees() {
        assert_eq!(
            Money::from_rupees(1100).percentage_rounded_to_rupee(18),
            Money::from_rupees(198)
        );
    }

    #[test]
    fn test_percentage_rounds_half_up_to_rupee() {
        // 18% of 1105 = 198.90
        assert_eq!(
            Money::from_rupees(1105).percentage_rounded_to_rupee(18),
            Money::from_rupees(199)
        );
        // 18% of 25 = 4.50
        assert_eq!(
            Money::from_rupees(25).percentage_rounded_to_rupee(18),
            Money::from_rupees(5)
        );
        // 18% of 1102 = 198.36
        assert_eq!(
            Money::from_rupees(1102).percentage_rounded_to_rupee(18),
            Money::from_rupees(198)
        );
        // 18% of 10.50 = 1.89
        assert_eq!(
            Money::from_minor(1050).percentage_rounded_to_rupee(18),
            Money::from_rupees(2)
        );
    }

    #[test]
    fn test_zero_totals() {
        assert!(Totals::zero().is_zero());
        let totals = Totals {
            total_item: 1,
            ..Totals::zero()
        };
        assert!(!totals.is_zero());
    }
}
