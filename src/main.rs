use actix_web::{App, HttpServer, web};
use ea_bridge::api;
use ea_bridge::auth::CredentialGate;
use ea_bridge::config::Settings;
use ea_bridge::context::SystemTimeProvider;
use ea_bridge::logging;
use ea_bridge::market_data::{MarketDataService, TwelveDataClient};
use ea_bridge::persistence;
use ea_bridge::security::SignatureVerifier;
use ea_bridge::service::BridgeService;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables
    dotenv::dotenv().ok();

    let settings = Settings::new()?;
    logging::init(&settings.logging);

    info!("╔═══════════════════════════════════════════════════════════════╗");
    info!("║                        EA BRIDGE                              ║");
    info!("║            Operator → Queue → Polling EA Command Relay        ║");
    info!("╚═══════════════════════════════════════════════════════════════╝");

    let queue = match persistence::open_queue(&settings.queue) {
        Ok(q) => q,
        Err(e) => {
            error!("❌ Failed to open trade queue store: {}", e);
            return Err(e.into());
        }
    };

    let service = Arc::new(BridgeService::new(
        CredentialGate::new(
            settings.operator.username.clone(),
            settings.operator.password.clone(),
        ),
        SignatureVerifier::new(settings.bridge.secret.clone()),
        queue,
        Arc::new(SystemTimeProvider),
    ));
    let market: Arc<dyn MarketDataService> = Arc::new(TwelveDataClient::new(&settings.market_data));

    info!(
        queue_enabled = service.queue_enabled(),
        market_data = market.name(),
        "✅ Core components initialized"
    );

    let bind_address = settings.server.bind_address();
    info!("🚀 Starting API Server on {}", bind_address);

    let service = web::Data::from(service);
    let market = web::Data::from(market);

    HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(service.clone())
            .app_data(market.clone())
            .configure(api::config)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("EA Bridge stopped");
    Ok(())
}
