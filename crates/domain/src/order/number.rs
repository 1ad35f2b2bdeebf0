use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::OrderError;

const PREFIX: &str = "ORD";

/// Human-readable order number: `ORD<YYYYMMDD>-<NNNN>`.
///
/// The suffix is random in `1000..=9999`, so uniqueness is checked against
/// the store when an order is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a number for an order placed on `date`.
    pub fn generate<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        let suffix: u16 = rng.random_range(1000..=9999);
        Self(format!("{PREFIX}{}-{suffix}", date.format("%Y%m%d")))
    }

    /// Parses and validates a number received from outside.
    pub fn parse(s: &str) -> Result<Self, OrderError> {
        let invalid = || OrderError::InvalidOrderNumber(s.to_string());

        let rest = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        let (date, suffix) = rest.split_once('-').ok_or_else(invalid)?;

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if suffix.len() != 4 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let mut rng = rand::rng();
        for _ in 0..200 {
            let number = OrderNumber::generate(date, &mut rng);
            let s = number.as_str();
            assert!(s.starts_with("ORD20260309-"), "{s}");
            let suffix: u16 = s["ORD20260309-".len()..].parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
            assert_eq!(OrderNumber::parse(s).unwrap(), number);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "ORD",
            "ORD20260309",
            "ORD2026030-1234",
            "ORD20260309-123",
            "ORD20260309-12345",
            "XYZ20260309-1234",
            "ORD20261309-1234",
            "ORD20260309-12a4",
            "../../etc/passwd",
        ] {
            assert!(OrderNumber::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_serde_validates() {
        let ok: OrderNumber = serde_json::from_str("\"ORD20250101-4321\"").unwrap();
        assert_eq!(ok.as_str(), "ORD20250101-4321");
        assert!(serde_json::from_str::<OrderNumber>("\"nope\"").is_err());
    }
}
