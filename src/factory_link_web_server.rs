use crate::core::config::{FilesConfig, SessionAuthConfig};
use crate::core::AppConfig;
use crate::routes::factory_link_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web::Data, App, HttpServer};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct FactoryLinkWebServer {
    port: u16,
    server: Server,
}

impl FactoryLinkWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.factory_link_server_config.host,
            configuration.factory_link_server_config.port
        );

        let sqlite_pool = SqlitePoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_with(configuration.sqlite.connect())
            .await?;

        sqlx::migrate!().run(&sqlite_pool).await?;

        std::fs::create_dir_all(&configuration.files.root_dir)?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr().unwrap().port();

        let server = run(
            listener,
            sqlite_pool,
            configuration.session_auth_config,
            configuration.files,
        )
        .await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn run(
    listener: TcpListener,
    sqlite_pool: SqlitePool,
    session_auth_config: SessionAuthConfig,
    files_config: FilesConfig,
) -> Result<Server, anyhow::Error> {
    let sqlite_pool = Data::new(sqlite_pool);
    let session_auth_config = Data::new(session_auth_config);
    let files_config = Data::new(files_config);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .configure(factory_link_routes)
            .app_data(sqlite_pool.clone())
            .app_data(session_auth_config.clone())
            .app_data(files_config.clone())
            .wrap(TracingLogger::default())
            .wrap(cors)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
