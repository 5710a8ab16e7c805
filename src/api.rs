use crate::auth::Credentials;
use crate::error::BridgeError;
use crate::market_data::{CandleQuery, MarketDataService};
use crate::metrics;
use crate::model::{FetchResponse, PendingResponse, SubmitResponse};
use crate::service::BridgeService;
use actix_web::error::{BlockingError, QueryPayloadError};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const EA_ID_HEADER: &str = "x-ea-id";
pub const EA_SIGNATURE_HEADER: &str = "x-ea-signature";

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    #[serde(rename = "eaId", alias = "ea_id")]
    pub ea_id: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct CandlesQuery {
    pub symbol: String,
    pub interval: Option<String>,
    pub size: Option<u32>,
}

fn operator_credentials(req: &HttpRequest) -> Option<Credentials> {
    let value = req.headers().get(header::AUTHORIZATION)?;
    match value.to_str() {
        Ok(text) => Credentials::from_authorization_header(text),
        // Supplied but not visible ASCII: present, so it must fail as invalid.
        Err(_) => Some(Credentials::Basic(String::new())),
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// The blocking pool refusing or losing the task means the store call never ran.
fn blocking_failed(e: BlockingError) -> BridgeError {
    metrics::QUEUE_FAILURES.inc();
    BridgeError::QueueUnavailable(e.to_string())
}

// A malformed poll query is an EA auth failure like any other, with no detail.
fn rejected_poll_query(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    metrics::AUTH_FAILURES.with_label_values(&["ea_signature"]).inc();
    debug!("EA poll query rejected: {}", err);
    BridgeError::Forbidden.into()
}

pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "EA Bridge Server Running"
    }))
}

pub async fn health_check(service: web::Data<BridgeService>) -> impl Responder {
    HttpResponse::Ok().json(service.health())
}

pub async fn submit_trade(
    req: HttpRequest,
    service: web::Data<BridgeService>,
    body: web::Json<Value>,
) -> Result<HttpResponse, BridgeError> {
    let credentials = operator_credentials(&req);
    let payload = match body.into_inner() {
        Value::Object(map) => map,
        _ => {
            return Err(BridgeError::BadRequest(
                "trade payload must be a JSON object".to_string(),
            ));
        }
    };

    let service = service.into_inner();
    let trade_id = web::block(move || service.submit(credentials.as_ref(), payload))
        .await
        .map_err(blocking_failed)??;

    Ok(HttpResponse::Ok().json(SubmitResponse { ok: true, trade_id }))
}

/// EA poll. Identity and signature come from the query string or, failing
/// that, from the `X-EA-ID` / `X-EA-SIGNATURE` headers.
pub async fn fetch_next(
    req: HttpRequest,
    service: web::Data<BridgeService>,
    query: web::Query<FetchQuery>,
) -> Result<HttpResponse, BridgeError> {
    let FetchQuery { ea_id, signature } = query.into_inner();
    let ea_id = ea_id.or_else(|| header_value(&req, EA_ID_HEADER));
    let signature = signature.or_else(|| header_value(&req, EA_SIGNATURE_HEADER));

    let service = service.into_inner();
    let command = web::block(move || service.fetch_next(ea_id.as_deref(), signature.as_deref()))
        .await
        .map_err(blocking_failed)??;

    Ok(HttpResponse::Ok().json(FetchResponse { command }))
}

pub async fn queue_status(
    req: HttpRequest,
    service: web::Data<BridgeService>,
) -> Result<HttpResponse, BridgeError> {
    let credentials = operator_credentials(&req);
    let service = service.into_inner();
    let pending = web::block(move || service.pending(credentials.as_ref()))
        .await
        .map_err(blocking_failed)??;

    Ok(HttpResponse::Ok().json(PendingResponse { pending }))
}

pub async fn quote(
    market: web::Data<dyn MarketDataService>,
    query: web::Query<QuoteQuery>,
) -> Result<HttpResponse, BridgeError> {
    let data = market.quote(&query.symbol).await.map_err(|e| {
        metrics::UPSTREAM_FAILURES.inc();
        BridgeError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(data))
}

pub async fn candles(
    market: web::Data<dyn MarketDataService>,
    query: web::Query<CandlesQuery>,
) -> Result<HttpResponse, BridgeError> {
    let CandlesQuery {
        symbol,
        interval,
        size,
    } = query.into_inner();
    let query = CandleQuery::new(symbol, interval, size);

    let data = market.candles(&query).await.map_err(|e| {
        metrics::UPSTREAM_FAILURES.inc();
        BridgeError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(data))
}

pub async fn metrics_endpoint() -> Result<HttpResponse, BridgeError> {
    let body = metrics::render().map_err(|e| BridgeError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// Define scope configuration
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| BridgeError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| BridgeError::BadRequest(err.to_string()).into()),
    )
    .service(web::resource("/").route(web::get().to(index)))
    .service(web::resource("/health").route(web::get().to(health_check)))
    .service(web::resource("/trade").route(web::post().to(submit_trade)))
    .service(
        web::resource("/ea/next")
            .app_data(web::QueryConfig::default().error_handler(rejected_poll_query))
            .route(web::get().to(fetch_next)),
    )
    .service(web::resource("/queue").route(web::get().to(queue_status)))
    .service(web::resource("/quote").route(web::get().to(quote)))
    .service(web::resource("/candles").route(web::get().to(candles)))
    .service(web::resource("/metrics").route(web::get().to(metrics_endpoint)));
}
