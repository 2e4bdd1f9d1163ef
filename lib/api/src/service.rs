use crate::repository::{Order, OrderPatch, OrderRepository, STATUS_WAITING};
use homeprice_core::{Error, Estimator, PriceRange, PropertyAttributes, QueryAttributes, Result};
use homeprice_storage::DatasetStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Estimates prices against whatever dataset the store currently serves.
pub struct PricingService {
    store: Arc<DatasetStore>,
    estimator: Estimator,
}

impl PricingService {
    pub fn new(store: Arc<DatasetStore>, estimator: Estimator) -> Self {
        Self { store, estimator }
    }

    #[inline]
    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    #[inline]
    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub async fn estimate(&self, query: &QueryAttributes, k: Option<usize>) -> Result<PriceRange> {
        let dataset = self.store.current().await?;
        self.estimator.estimate_with_k(query, dataset.records(), k)
    }

    /// Validate a request body (seven attributes, optional `k`) and estimate.
    pub async fn estimate_json(&self, body: &Value) -> Result<PriceRange> {
        let query = PropertyAttributes::from_json(body)?;
        let k = parse_k(body)?;
        self.estimate(&query, k).await
    }
}

fn parse_k(body: &Value) -> Result<Option<usize>> {
    match body.get("k") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .filter(|k| *k > 0)
            .map(|k| Some(k as usize))
            .ok_or_else(|| Error::InvalidQuery(format!("k must be a positive integer, got {}", v))),
    }
}

/// Update attempts before giving up on an order that keeps changing.
const UPDATE_ATTEMPTS: usize = 3;

/// The order flow: every create or attribute change records a fresh estimate.
pub struct OrderService {
    pricing: Arc<PricingService>,
    repository: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(pricing: Arc<PricingService>, repository: Arc<dyn OrderRepository>) -> Self {
        Self { pricing, repository }
    }

    pub async fn create(&self, body: &Value) -> Result<Order> {
        let client_id = required_string(body, "id_pemesan")?;
        let vendor_id = required_string(body, "id_vendor")?;
        let attributes = PropertyAttributes::from_json(body)?;

        let range = self.pricing.estimate(&attributes, None).await?;

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            client_id,
            vendor_id,
            attributes,
            estimated_price: range.display(),
            status: STATUS_WAITING.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.repository.insert(order.clone())?;
        info!("Created order {} with estimate {}", order.id, order.estimated_price);
        Ok(order)
    }

    /// Apply a partial update. The estimate is recomputed only when an
    /// attribute changes, and before anything is written.
    ///
    /// The patch is merged into the stored order under the repository lock,
    /// so concurrent status and attribute updates both survive. If another
    /// update changed the attributes while the estimate was computed, the
    /// estimate is redone against the new attributes.
    pub async fn update(&self, id: &str, body: &Value) -> Result<Order> {
        let patch = OrderPatch::from_json(body)?;
        if patch.is_empty() {
            return Err(Error::InvalidQuery("no fields to update".to_string()));
        }

        for _ in 0..UPDATE_ATTEMPTS {
            let current = self.get(id)?;

            let estimate = if patch.touches_attributes() {
                let attributes = patch.apply_attributes(&current.attributes);
                let range = self.pricing.estimate(&attributes, None).await?;
                Some((attributes, range.display()))
            } else {
                None
            };

            let applied = self.repository.modify(id, &mut |order: &mut Order| {
                if let Some((attributes, price)) = &estimate {
                    if order.attributes != current.attributes {
                        return false;
                    }
                    order.attributes = *attributes;
                    order.estimated_price = price.clone();
                }
                if let Some(status) = &patch.status {
                    order.status = status.clone();
                }
                true
            })?;

            if let Some(order) = applied {
                return Ok(order);
            }
            debug!("Order {} changed during update, estimating again", id);
        }

        Err(Error::Repository(format!(
            "order {} kept changing during update",
            id
        )))
    }

    pub fn get(&self, id: &str) -> Result<Order> {
        self.repository
            .get(id)?
            .ok_or_else(|| Error::OrderNotFound(id.to_string()))
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        if self.repository.delete(id)? {
            Ok(())
        } else {
            Err(Error::OrderNotFound(id.to_string()))
        }
    }

    pub fn list_by_client(&self, client_id: &str) -> Result<Vec<Order>> {
        self.repository.list_by_client(client_id)
    }

    pub fn list_by_vendor(&self, vendor_id: &str) -> Result<Vec<Order>> {
        self.repository.list_by_vendor(vendor_id)
    }
}

fn required_string(body: &Value, name: &str) -> Result<String> {
    match body.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(Error::InvalidQuery(format!("missing field '{}'", name))),
    }
}
