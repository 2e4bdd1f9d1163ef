use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of numeric attributes that describe a property.
pub const DIMENSIONS: usize = 7;

/// Wire/column names of the attributes, in distance order.
pub const ATTRIBUTE_COLUMNS: [&str; DIMENSIONS] = [
    "jumlah_lantai",
    "kamar_tidur",
    "kamar_mandi",
    "luas_bangunan",
    "luas_tanah",
    "jumlah_carport",
    "jumlah_garage",
];

/// The seven numeric attributes of a property.
///
/// Used both for reference dataset rows and for client queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    #[serde(rename = "jumlah_lantai")]
    pub floors: f64,
    #[serde(rename = "kamar_tidur")]
    pub bedrooms: f64,
    #[serde(rename = "kamar_mandi")]
    pub bathrooms: f64,
    #[serde(rename = "luas_bangunan")]
    pub building_area: f64,
    #[serde(rename = "luas_tanah")]
    pub land_area: f64,
    #[serde(rename = "jumlah_carport")]
    pub carports: f64,
    #[serde(rename = "jumlah_garage")]
    pub garages: f64,
}

/// Attributes supplied by a client for one estimation.
pub type QueryAttributes = PropertyAttributes;

impl PropertyAttributes {
    #[inline]
    #[must_use]
    pub fn from_array(values: [f64; DIMENSIONS]) -> Self {
        let [floors, bedrooms, bathrooms, building_area, land_area, carports, garages] = values;
        Self {
            floors,
            bedrooms,
            bathrooms,
            building_area,
            land_area,
            carports,
            garages,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_array(&self) -> [f64; DIMENSIONS] {
        [
            self.floors,
            self.bedrooms,
            self.bathrooms,
            self.building_area,
            self.land_area,
            self.carports,
            self.garages,
        ]
    }

    /// Euclidean distance over all seven attributes.
    ///
    /// Attributes are neither weighted nor normalized, so area columns
    /// dominate room counts.
    #[inline]
    pub fn l2_distance(&self, other: &PropertyAttributes) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Validate a JSON object carrying the seven attributes under their wire names.
    ///
    /// Numbers and numeric strings are accepted. Missing, null, non-numeric
    /// and non-finite values are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidQuery("expected a JSON object".to_string()))?;

        let mut values = [0.0; DIMENSIONS];
        for (slot, name) in values.iter_mut().zip(ATTRIBUTE_COLUMNS) {
            *slot = match obj.get(name) {
                None | Some(Value::Null) => {
                    return Err(Error::InvalidQuery(format!("missing attribute '{}'", name)));
                }
                Some(v) => parse_attribute(name, v)?,
            };
        }

        Ok(Self::from_array(values))
    }

    /// Check that every attribute is a finite number.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in ATTRIBUTE_COLUMNS.iter().zip(self.to_array()) {
            if !v.is_finite() {
                return Err(Error::InvalidQuery(format!(
                    "attribute '{}' must be a finite number",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Parse one attribute value from JSON, named for error messages.
pub fn parse_attribute(name: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidQuery(format!(
            "attribute '{}' is not a valid number: {}",
            name, value
        ))),
    }
}
