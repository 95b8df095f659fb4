//! Payment Reconciler server.
//!
//! Loads configuration, connects to PostgreSQL, wires adapters into the
//! application handlers, starts the maintenance loop and serves HTTP until
//! Ctrl+C or SIGTERM.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use payment_reconciler::adapters::http::{build_router, PaymentAppState};
use payment_reconciler::adapters::postgres::{
    PostgresBoostRepository, PostgresDeferredTaskRepository, PostgresInvoiceRepository,
    PostgresListingCreditRepository, PostgresPaymentIntentRepository, PostgresReferralRepository,
    PostgresSubscriptionRepository,
};
use payment_reconciler::adapters::{HostedGateway, HostedGatewayConfig, OfflineGateway, TracingEventPublisher};
use payment_reconciler::application::{
    ActivatorRegistry, CreatePaymentHandler, ExpireStalePaymentsHandler, GetPaymentStatusHandler,
    HandleGatewayCallbackHandler, InvoiceIssuer, MaintenanceWorker, Reconciler, ReconcilerSettings,
    ReferralRewarder, RetryDeferredTasksHandler, SweepUnactivatedHandler,
};
use payment_reconciler::config::AppConfig;
use payment_reconciler::domain::payment::Catalog;
use payment_reconciler::ports::{
    DeferredTaskRepository, EventPublisher, ListingCreditRepository, PaymentGateway,
    PaymentIntentRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    config.validate()?;
    info!(
        environment = ?config.server.environment,
        gateway_configured = config.gateway.is_configured(),
        offline_payments = config.features.allow_offline_payments,
        "Configuration loaded"
    );

    let pool = config.database.pool_options().connect(&config.database.url).await?;
    info!("PostgreSQL connected");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations complete");
    }

    // Stores
    let intents: Arc<dyn PaymentIntentRepository> =
        Arc::new(PostgresPaymentIntentRepository::new(pool.clone()));
    let listing_credits: Arc<dyn ListingCreditRepository> =
        Arc::new(PostgresListingCreditRepository::new(pool.clone()));
    let deferred: Arc<dyn DeferredTaskRepository> =
        Arc::new(PostgresDeferredTaskRepository::new(pool.clone()));
    let publisher: Arc<dyn EventPublisher> = Arc::new(TracingEventPublisher::new());

    // Gateway
    let gateway: Arc<dyn PaymentGateway> = match HostedGatewayConfig::from_config(&config.gateway) {
        Some(gateway_config) => Arc::new(HostedGateway::new(gateway_config)?),
        None => {
            warn!("No payment gateway configured; payments settle offline");
            Arc::new(OfflineGateway::new())
        }
    };

    // Reconciler
    let activators = Arc::new(ActivatorRegistry::standard(
        Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        Arc::new(PostgresBoostRepository::new(pool.clone())),
        listing_credits.clone(),
    ));
    let invoices = Arc::new(InvoiceIssuer::new(
        Arc::new(PostgresInvoiceRepository::new(pool.clone())),
        publisher.clone(),
    ));
    let referrals = Arc::new(ReferralRewarder::new(
        Arc::new(PostgresReferralRepository::new(pool.clone())),
        intents.clone(),
        config.referral.policy()?,
        publisher.clone(),
    ));
    let settings = ReconcilerSettings {
        activator_timeout: config.reconciler.activator_timeout(),
        side_effect_timeout: config.reconciler.side_effect_timeout(),
        retry_policy: config.reconciler.retry_policy(),
    };
    let reconciler = Arc::new(Reconciler::new(
        intents.clone(),
        activators,
        invoices,
        referrals,
        deferred.clone(),
        publisher.clone(),
        settings,
    ));

    // Maintenance loop
    let reconciler_config = &config.reconciler;
    let mut worker = MaintenanceWorker::new(
        RetryDeferredTasksHandler::new(
            deferred.clone(),
            intents.clone(),
            reconciler.clone(),
            reconciler_config.batch_size,
            reconciler_config.claim_lease(),
        ),
        SweepUnactivatedHandler::new(
            intents.clone(),
            reconciler.clone(),
            reconciler_config.sweep_grace(),
            reconciler_config.batch_size,
            reconciler_config.sweep_concurrency,
        ),
        reconciler_config.poll_interval(),
    );
    if let Some(max_age) = reconciler_config.stale_pending_expiry() {
        worker = worker.with_expiry(ExpireStalePaymentsHandler::new(
            intents.clone(),
            publisher.clone(),
            max_age,
            reconciler_config.batch_size,
        ));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    // HTTP
    let state = PaymentAppState {
        create_payment: Arc::new(CreatePaymentHandler::new(
            Arc::new(Catalog::standard()),
            intents.clone(),
            gateway.clone(),
            reconciler.clone(),
            config.gateway.return_urls(),
            config.features.allow_offline_payments,
        )),
        get_payment_status: Arc::new(GetPaymentStatusHandler::new(intents.clone())),
        handle_callback: Arc::new(HandleGatewayCallbackHandler::new(gateway.clone(), reconciler)),
        listing_credits,
        gateway,
    };
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping maintenance worker");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "Maintenance worker ended abnormally");
    }
    pool.close().await;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
