use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::DatabaseSettings;
use crate::configuration::Settings;
use crate::mailchimp_client::MailChimpClient;
use crate::routes::create_member;
use crate::routes::delete_member;
use crate::routes::get_member;
use crate::routes::health_check;
use crate::routes::update_member;
use crate::store::MemberStore;
use crate::store::PgMemberStore;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Build the server on top of Postgres. The pool connects lazily, so
    /// requests that do not touch the db (e.g. `/health_check`) work without
    /// one.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let pool = get_connection_pool(&cfg.database);
        Self::build_with_store(cfg, Arc::new(PgMemberStore::new(pool))).await
    }

    /// Build the server on top of an arbitrary `MemberStore`
    pub async fn build_with_store(
        cfg: Settings,
        store: Arc<dyn MemberStore>,
    ) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        // with port 0, the OS assigns a random port; this is the only way to find out which
        let port = listener.local_addr()?.port();

        let mailchimp_client = cfg.mailchimp.client()?;

        let server = run(listener, store, mailchimp_client)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

pub fn get_connection_pool(db_cfg: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(db_cfg.connection())
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn MemberStore>,
    mailchimp_client: MailChimpClient,
) -> Result<Server, anyhow::Error> {
    // `Data` is externally an `Arc` (for sharing/cloning), so the store is
    // handed over as one directly
    let store = web::Data::from(store);
    let mailchimp_client = web::Data::new(mailchimp_client);

    // actix-web spins up a worker per core, each running its own copy of the
    // `App` built by this closure, hence everything captured must be cloneable
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                // a single `{id}` segment: a list id for POST, a member id otherwise
                web::scope("/mailchimp/members")
                    .route("/{id}", web::post().to(create_member))
                    .route("/{id}", web::get().to(get_member))
                    .route("/{id}", web::put().to(update_member))
                    .route("/{id}", web::delete().to(delete_member)),
            )
            .app_data(store.clone())
            .app_data(mailchimp_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
