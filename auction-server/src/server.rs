use {
    crate::{
        api,
        api::ws,
        auction::service::{
            self,
            Collaborators,
            Service,
        },
        collaborator::{
            HttpEligibilityCheck,
            HttpNotifier,
            HttpSettlementGateway,
        },
        config::{
            Config,
            RunOptions,
        },
        kernel::db::DB,
        state::Store,
    },
    anyhow::anyhow,
    futures::future::join_all,
    sqlx::postgres::PgPoolOptions,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio::sync::broadcast,
    tokio_util::task::TaskTracker,
};

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        tokio::signal::ctrl_c().await.unwrap();
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let db: DB = PgPoolOptions::new()
        .connect(&run_options.server.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let (event_sender, event_receiver) = broadcast::channel(config.engine.event_channel_size);
    let task_tracker = TaskTracker::new();
    let client = reqwest::Client::new();
    let collaborators = Collaborators {
        eligibility: Arc::new(HttpEligibilityCheck {
            client:   client.clone(),
            base_url: config.collaborators.identity_url.clone(),
        }),
        notifier:    Arc::new(HttpNotifier {
            client:   client.clone(),
            base_url: config.collaborators.notification_url.clone(),
        }),
        settlement:  Arc::new(HttpSettlementGateway {
            client,
            base_url: config.collaborators.settlement_url.clone(),
        }),
    };

    let auction_service = Service::new(
        db,
        service::Config {
            bid_increment_floor:  config.engine.bid_increment_floor,
            collaborator_timeout: config.engine.collaborator_timeout,
        },
        collaborators,
        task_tracker.clone(),
        event_sender.clone(),
    );
    auction_service
        .recover_open_auctions()
        .await
        .map_err(|err| anyhow!("Failed to recover open auctions: {:?}", err))?;

    let store = Arc::new(Store {
        auction_service: auction_service.clone(),
        ws:              ws::WsState::new(
            config.engine.requester_ip_header_name.clone(),
            event_receiver,
        ),
    });

    let clock_loop = tokio::spawn({
        let service = auction_service.clone();
        async move { service.run_auction_clock_loop().await }
    });
    let server_loop = tokio::spawn(api::start_api(run_options, store.clone()));
    join_all(vec![clock_loop, server_loop]).await;

    task_tracker.close();
    task_tracker.wait().await;
    Ok(())
}

// A static exit flag to indicate to running threads that we're shutting down. This is used to
// gracefully shutdown the application.
//
// NOTE: A more idiomatic approach would be to use a tokio::sync::broadcast channel, and to send a
// shutdown signal to all running tasks. However, this is a bit more complicated to implement and
// we don't rely on global state for anything else.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
