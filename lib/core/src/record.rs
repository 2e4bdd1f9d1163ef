use serde::{Deserialize, Serialize};
use crate::attributes::PropertyAttributes;

/// A listed price with its currency and magnitude unit, e.g. `Rp 500 juta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub currency: String,
    pub unit: String,
}

impl Price {
    #[inline]
    #[must_use]
    pub fn new(value: f64, currency: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
            unit: unit.into(),
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {:.2} {}", self.currency, self.value, self.unit)
    }
}

/// A historical listing from the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(flatten)]
    pub attributes: PropertyAttributes,
    pub price: Price,
}

impl PropertyRecord {
    #[inline]
    #[must_use]
    pub fn new(attributes: PropertyAttributes, price: Price) -> Self {
        Self { attributes, price }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display() {
        assert_eq!(Price::new(500.0, "Rp", "juta").to_string(), "Rp. 500.00 juta");
        assert_eq!(Price::new(1.255, "Rp", "miliar").to_string(), "Rp. 1.25 miliar");
        assert_eq!(Price::new(2.5, "Rp", "miliar").to_string(), "Rp. 2.50 miliar");
    }
}
