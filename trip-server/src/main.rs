use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use trip_server::config::ServerConfig;
use trip_server::payment::{MockPaymentProcessor, PaymentProcessor, StripeClient};
use trip_server::store::{
    CachedRouteStore, InMemoryBookingStore, InMemoryReviewStore, InMemoryRouteStore, load_routes,
};
use trip_server::web::{AppState, Stores, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trip_server=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    // Load the route catalog (empty without a seed file)
    let routes = match &config.routes_file {
        Some(path) => load_routes(path).expect("Failed to load routes"),
        None => {
            tracing::warn!("TRIP_ROUTES_FILE not set; starting with an empty catalog");
            InMemoryRouteStore::new()
        }
    };
    let routes = CachedRouteStore::new(routes, &config.route_cache);

    // Stripe when a secret key is set, otherwise the mock processor
    let processor: Arc<dyn PaymentProcessor> = match config.stripe.clone() {
        Some(stripe) if stripe.is_configured() => {
            Arc::new(StripeClient::new(stripe).expect("Failed to create Stripe client"))
        }
        _ => {
            tracing::warn!("STRIPE_SECRET_KEY not set; using the mock payment processor");
            Arc::new(MockPaymentProcessor::new(&config.public_url))
        }
    };

    let stores = Stores {
        routes: Arc::new(routes),
        bookings: Arc::new(InMemoryBookingStore::new()),
        reviews: Arc::new(InMemoryReviewStore::new()),
    };
    let state = AppState::new(
        stores,
        processor,
        config.is_stripe_configured(),
        config.admins.clone(),
        config.checkout(),
    );

    let app = create_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, public_url = %config.public_url, "trip server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
