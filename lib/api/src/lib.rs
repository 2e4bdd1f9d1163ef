pub mod repository;
pub mod rest;
pub mod service;

pub use repository::{InMemoryOrderRepository, Order, OrderPatch, OrderRepository, STATUS_WAITING};
pub use rest::{configure, error_response, RestApi};
pub use service::{OrderService, PricingService};
