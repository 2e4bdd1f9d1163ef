use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use actix_cors::Cors;
use homeprice_core::{Error, ErrorKind};
use crate::service::{OrderService, PricingService};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

pub struct RestApi;

impl RestApi {
    pub async fn start(
        pricing: Arc<PricingService>,
        orders: Arc<OrderService>,
        port: u16,
    ) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(pricing.clone()))
                .app_data(web::Data::new(orders.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register all routes. Expects `Data<Arc<PricingService>>` and
/// `Data<Arc<OrderService>>` to be present on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/", web::get().to(index))
        .route("/estimate", web::post().to(estimate))
        .route("/dataset", web::get().to(dataset_info))
        .route("/dataset/reload", web::post().to(reload_dataset))
        .route("/orders/add", web::post().to(add_order))
        .route("/orders/update/{id}", web::put().to(update_order))
        .route("/orders/delete/{id}", web::delete().to(delete_order))
        .route("/orders/view/{id}", web::get().to(view_order))
        .route("/orders/view_by_client/{id}", web::get().to(view_by_client))
        .route("/orders/view_by_vendor/{id}", web::get().to(view_by_vendor));
}

/// Map a typed error to an HTTP response and log it.
pub fn error_response(err: &Error) -> HttpResponse {
    let body = json!({
        "status": "error",
        "kind": err.code(),
        "message": err.to_string(),
    });

    match err.kind() {
        ErrorKind::Client => {
            warn!("Rejected request: {}", err);
            HttpResponse::BadRequest().json(body)
        }
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::Server => {
            error!("Request failed: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/// Unreadable or non-JSON bodies get the same error envelope as invalid queries.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = error_response(&Error::InvalidQuery(err.to_string()));
    InternalError::from_response(err, response).into()
}

async fn index() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "homeprice",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn estimate(
    pricing: web::Data<Arc<PricingService>>,
    req: web::Json<Value>,
) -> ActixResult<HttpResponse> {
    match pricing.estimate_json(&req).await {
        Ok(range) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "estimatedPrice": range.display(),
            "range": range,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn dataset_info(pricing: web::Data<Arc<PricingService>>) -> ActixResult<HttpResponse> {
    // Per-request stores load the file here, as an estimate would.
    match pricing.store().current().await {
        Ok(dataset) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "result": dataset.info(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn reload_dataset(pricing: web::Data<Arc<PricingService>>) -> ActixResult<HttpResponse> {
    let store = pricing.store().clone();
    let result = web::block(move || store.reload()).await?;

    match result {
        Ok(dataset) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "result": dataset.info(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn add_order(
    orders: web::Data<Arc<OrderService>>,
    req: web::Json<Value>,
) -> ActixResult<HttpResponse> {
    match orders.create(&req).await {
        Ok(order) => Ok(HttpResponse::Created().json(json!({
            "status": "success",
            "id": order.id,
            "estimatedPrice": order.estimated_price,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_order(
    orders: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
    req: web::Json<Value>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();

    match orders.update(&id, &req).await {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "estimatedPrice": order.estimated_price,
            "result": order,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn delete_order(
    orders: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();

    match orders.delete(&id) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "result": true,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn view_order(
    orders: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();

    match orders.get(&id) {
        Ok(order) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "result": order,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn view_by_client(
    orders: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let client_id = path.into_inner();
    list_response(orders.list_by_client(&client_id), "client", &client_id)
}

async fn view_by_vendor(
    orders: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let vendor_id = path.into_inner();
    list_response(orders.list_by_vendor(&vendor_id), "vendor", &vendor_id)
}

fn list_response(
    result: homeprice_core::Result<Vec<crate::repository::Order>>,
    owner: &str,
    id: &str,
) -> ActixResult<HttpResponse> {
    match result {
        Ok(list) if list.is_empty() => Ok(HttpResponse::NotFound().json(json!({
            "status": "error",
            "kind": "order_not_found",
            "message": format!("no orders for {} {}", owner, id),
        }))),
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "result": list,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryOrderRepository;
    use actix_web::{
        http::{header, StatusCode},
        test,
    };
    use homeprice_core::{Estimator, Price, PropertyAttributes, PropertyRecord};
    use homeprice_storage::{expected_columns, Dataset, DatasetStore, LoadMode, StoreConfig};

    fn state() -> (Arc<PricingService>, Arc<OrderService>) {
        let a = PropertyAttributes::from_array([1.0, 2.0, 1.0, 80.0, 100.0, 1.0, 0.0]);
        let records = vec![
            PropertyRecord::new(a, Price::new(500.0, "Rp", "juta")),
            PropertyRecord::new(a, Price::new(600.0, "Rp", "juta")),
            PropertyRecord::new(a, Price::new(700.0, "Rp", "juta")),
        ];
        let store = Arc::new(DatasetStore::with_dataset(Dataset::new(records, "memory")));
        let pricing = Arc::new(PricingService::new(store, Estimator::default()));
        let orders = Arc::new(OrderService::new(pricing.clone(), Arc::new(InMemoryOrderRepository::new())));
        (pricing, orders)
    }

    fn query() -> Value {
        json!({
            "jumlah_lantai": 1,
            "kamar_tidur": 2,
            "kamar_mandi": 1,
            "luas_bangunan": 80,
            "luas_tanah": 100,
            "jumlah_carport": 1,
            "jumlah_garage": 0
        })
    }

    macro_rules! app {
        () => {{
            let (pricing, orders) = state();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(pricing))
                    .app_data(web::Data::new(orders))
                    .configure(configure),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_estimate_endpoint() {
        let app = app!();
        let req = test::TestRequest::post().uri("/estimate").set_json(query()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["estimatedPrice"], "Rp. 500.00 juta - Rp. 700.00 juta");
        assert_eq!(body["range"]["comparables"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_estimate_invalid_query_is_400() {
        let app = app!();
        let mut bad = query();
        bad.as_object_mut().unwrap().remove("kamar_mandi");
        let req = test::TestRequest::post().uri("/estimate").set_json(bad).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "invalid_query");
    }

    #[actix_web::test]
    async fn test_estimate_insufficient_data_is_500() {
        let app = app!();
        let mut request = query();
        request["k"] = json!(4);
        let req = test::TestRequest::post().uri("/estimate").set_json(request).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "insufficient_data");
    }

    #[actix_web::test]
    async fn test_malformed_body_gets_error_envelope() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/estimate")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "invalid_query");

        let req = test::TestRequest::post()
            .uri("/orders/add")
            .insert_header((header::CONTENT_TYPE, "text/plain"))
            .set_payload("{}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "invalid_query");

        let req = test::TestRequest::put()
            .uri("/orders/update/some-id")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("[1, 2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["kind"], "invalid_query");
    }

    #[actix_web::test]
    async fn test_dataset_info_per_request_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasetprice.csv");
        std::fs::write(
            &path,
            format!(
                "{}\n1,2,1,80,100,1,0,500,Rp,juta\n1,2,1,80,100,1,0,600,Rp,juta\n",
                expected_columns().join(",")
            ),
        )
        .unwrap();

        let store = Arc::new(
            DatasetStore::new(StoreConfig {
                dataset_path: path,
                load_mode: LoadMode::PerRequest,
                ..StoreConfig::default()
            })
            .unwrap(),
        );
        let pricing = Arc::new(PricingService::new(store, Estimator::default()));
        let orders = Arc::new(OrderService::new(pricing.clone(), Arc::new(InMemoryOrderRepository::new())));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pricing))
                .app_data(web::Data::new(orders))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/dataset").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["result"]["records"], 2);
    }

    #[actix_web::test]
    async fn test_dataset_info() {
        let app = app!();
        let req = test::TestRequest::get().uri("/dataset").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"]["records"], 3);
        assert_eq!(body["result"]["source"], "memory");
    }

    #[actix_web::test]
    async fn test_order_lifecycle() {
        let app = app!();

        let mut order = query();
        order["id_pemesan"] = json!("client-1");
        order["id_vendor"] = json!("vendor-1");
        let req = test::TestRequest::post().uri("/orders/add").set_json(order).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&format!("/orders/view/{}", id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"]["status"], "WAITING");
        assert_eq!(body["result"]["estimatedPrice"], "Rp. 500.00 juta - Rp. 700.00 juta");

        let req = test::TestRequest::put()
            .uri(&format!("/orders/update/{}", id))
            .set_json(json!({"status": "ACCEPTED"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"]["status"], "ACCEPTED");

        let req = test::TestRequest::put()
            .uri(&format!("/orders/update/{}", id))
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/orders/view_by_client/client-1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/orders/view_by_vendor/nobody").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri(&format!("/orders/delete/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&format!("/orders/view/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
