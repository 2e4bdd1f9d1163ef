//! Order persistence.
//!
//! The order flow talks to storage only through [`OrderRepository`], which is
//! handed to it at construction time. [`InMemoryOrderRepository`] backs the
//! binary and the tests; a document-store implementation plugs in the same way.

use homeprice_core::{parse_attribute, Error, PropertyAttributes, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Status given to freshly created orders.
pub const STATUS_WAITING: &str = "WAITING";

/// A client's construction order together with its price estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "id_pemesan")]
    pub client_id: String,
    #[serde(rename = "id_vendor")]
    pub vendor_id: String,
    #[serde(flatten)]
    pub attributes: PropertyAttributes,
    #[serde(rename = "estimatedPrice")]
    pub estimated_price: String,
    pub status: String,
    pub created_at: String,
}

/// Partial update of an order. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub floors: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub building_area: Option<f64>,
    pub land_area: Option<f64>,
    pub carports: Option<f64>,
    pub garages: Option<f64>,
    pub status: Option<String>,
}

impl OrderPatch {
    /// Read a patch from a JSON body. Absent and null fields stay `None`;
    /// present attribute fields must be numeric.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidQuery("expected a JSON object".to_string()))?;

        let number = |name: &str| -> Result<Option<f64>> {
            match obj.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => parse_attribute(name, v).map(Some),
            }
        };

        let status = match obj.get("status") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(other) => {
                return Err(Error::InvalidQuery(format!("status must be a non-empty string, got {}", other)));
            }
        };

        Ok(Self {
            floors: number("jumlah_lantai")?,
            bedrooms: number("kamar_tidur")?,
            bathrooms: number("kamar_mandi")?,
            building_area: number("luas_bangunan")?,
            land_area: number("luas_tanah")?,
            carports: number("jumlah_carport")?,
            garages: number("jumlah_garage")?,
            status,
        })
    }

    pub fn touches_attributes(&self) -> bool {
        [
            self.floors,
            self.bedrooms,
            self.bathrooms,
            self.building_area,
            self.land_area,
            self.carports,
            self.garages,
        ]
        .iter()
        .any(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_attributes() && self.status.is_none()
    }

    /// Attributes after applying this patch on top of `base`.
    pub fn apply_attributes(&self, base: &PropertyAttributes) -> PropertyAttributes {
        PropertyAttributes {
            floors: self.floors.unwrap_or(base.floors),
            bedrooms: self.bedrooms.unwrap_or(base.bedrooms),
            bathrooms: self.bathrooms.unwrap_or(base.bathrooms),
            building_area: self.building_area.unwrap_or(base.building_area),
            land_area: self.land_area.unwrap_or(base.land_area),
            carports: self.carports.unwrap_or(base.carports),
            garages: self.garages.unwrap_or(base.garages),
        }
    }
}

/// Storage for orders
pub trait OrderRepository: Send + Sync {
    fn insert(&self, order: Order) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Order>>;

    /// Run `change` on the stored order while holding the write lock, so it
    /// sees every write that finished before it. When `change` returns
    /// `false` nothing is written and `Ok(None)` is returned.
    ///
    /// Fails with `OrderNotFound` if the order does not exist.
    fn modify(&self, id: &str, change: &mut dyn FnMut(&mut Order) -> bool) -> Result<Option<Order>>;

    fn delete(&self, id: &str) -> Result<bool>;

    fn list_by_client(&self, client_id: &str) -> Result<Vec<Order>>;

    fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Order>>;
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.orders.read().len()
    }

    fn list_where<F>(&self, predicate: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .filter(|o| predicate(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write();
        if orders.contains_key(&order.id) {
            return Err(Error::Repository(format!("order already exists: {}", order.id)));
        }
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().get(id).cloned())
    }

    fn modify(&self, id: &str, change: &mut dyn FnMut(&mut Order) -> bool) -> Result<Option<Order>> {
        let mut orders = self.orders.write();
        let slot = orders
            .get_mut(id)
            .ok_or_else(|| Error::OrderNotFound(id.to_string()))?;

        let mut next = slot.clone();
        if !change(&mut next) {
            return Ok(None);
        }
        *slot = next.clone();
        Ok(Some(next))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.orders.write().remove(id).is_some())
    }

    fn list_by_client(&self, client_id: &str) -> Result<Vec<Order>> {
        Ok(self.list_where(|o| o.client_id == client_id))
    }

    fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Order>> {
        Ok(self.list_where(|o| o.vendor_id == vendor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(id: &str, client: &str, vendor: &str, created_at: &str) -> Order {
        Order {
            id: id.to_string(),
            client_id: client.to_string(),
            vendor_id: vendor.to_string(),
            attributes: PropertyAttributes::from_array([1.0, 2.0, 1.0, 80.0, 100.0, 1.0, 0.0]),
            estimated_price: "Rp. 500.00 juta - Rp. 700.00 juta".to_string(),
            status: STATUS_WAITING.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_patch_from_json() {
        let patch = OrderPatch::from_json(&json!({"kamar_tidur": 3, "luas_tanah": "150", "status": "ACCEPTED"})).unwrap();
        assert_eq!(patch.bedrooms, Some(3.0));
        assert_eq!(patch.land_area, Some(150.0));
        assert_eq!(patch.status.as_deref(), Some("ACCEPTED"));
        assert!(patch.floors.is_none());
        assert!(patch.touches_attributes());
    }

    #[test]
    fn test_patch_zero_is_a_value() {
        let patch = OrderPatch::from_json(&json!({"jumlah_carport": 0})).unwrap();
        let base = PropertyAttributes::from_array([1.0, 2.0, 1.0, 80.0, 100.0, 2.0, 1.0]);
        let applied = patch.apply_attributes(&base);
        assert_eq!(applied.carports, 0.0);
        assert_eq!(applied.garages, 1.0);
    }

    #[test]
    fn test_patch_empty_and_invalid() {
        assert!(OrderPatch::from_json(&json!({})).unwrap().is_empty());
        assert!(OrderPatch::from_json(&json!({"jumlah_lantai": null})).unwrap().is_empty());
        assert!(OrderPatch::from_json(&json!({"jumlah_lantai": "two"})).is_err());
        assert!(OrderPatch::from_json(&json!({"status": 5})).is_err());

        let status_only = OrderPatch::from_json(&json!({"status": "DONE"})).unwrap();
        assert!(!status_only.is_empty());
        assert!(!status_only.touches_attributes());
    }

    #[test]
    fn test_in_memory_repository() {
        let repo = InMemoryOrderRepository::new();
        repo.insert(order("b", "client-1", "vendor-1", "2024-01-02T00:00:00Z")).unwrap();
        repo.insert(order("a", "client-1", "vendor-2", "2024-01-01T00:00:00Z")).unwrap();
        repo.insert(order("c", "client-2", "vendor-1", "2024-01-03T00:00:00Z")).unwrap();
        assert_eq!(repo.count(), 3);
        assert!(repo.insert(order("a", "x", "y", "z")).is_err());

        let by_client: Vec<String> = repo.list_by_client("client-1").unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(by_client, vec!["a", "b"]);
        let by_vendor: Vec<String> = repo.list_by_vendor("vendor-1").unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(by_vendor, vec!["b", "c"]);

        let updated = repo
            .modify("a", &mut |o: &mut Order| {
                o.status = "DONE".to_string();
                true
            })
            .unwrap();
        assert_eq!(updated.unwrap().status, "DONE");
        assert_eq!(repo.get("a").unwrap().unwrap().status, "DONE");
        assert!(matches!(
            repo.modify("zzz", &mut |_: &mut Order| true),
            Err(Error::OrderNotFound(_))
        ));

        assert!(repo.delete("a").unwrap());
        assert!(!repo.delete("a").unwrap());
        assert!(repo.get("a").unwrap().is_none());
    }

    #[test]
    fn test_modify_declined_leaves_order() {
        let repo = InMemoryOrderRepository::new();
        repo.insert(order("a", "c", "v", "t")).unwrap();

        let result = repo
            .modify("a", &mut |o: &mut Order| {
                o.status = "DONE".to_string();
                false
            })
            .unwrap();
        assert!(result.is_none());
        assert_eq!(repo.get("a").unwrap().unwrap().status, STATUS_WAITING);
    }

    #[test]
    fn test_order_wire_format() {
        let value = serde_json::to_value(order("a", "c", "v", "t")).unwrap();
        assert_eq!(value["id_pemesan"], json!("c"));
        assert_eq!(value["id_vendor"], json!("v"));
        assert_eq!(value["kamar_tidur"], json!(2.0));
        assert_eq!(value["estimatedPrice"], json!("Rp. 500.00 juta - Rp. 700.00 juta"));
        assert_eq!(value["status"], json!("WAITING"));
    }
}
