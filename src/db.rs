use crate::config::AppConfig;
use crate::entities::{chemical, stock_history, usage_log};
use crate::errors::ServiceError;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Statement,
};
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `PersistenceError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(false);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection failed: {}", e);
        ServiceError::from(e)
    })?;

    info!("Database connection pool established successfully");
    Ok(db_pool)
}

/// Connects using the pool settings of the application config and creates
/// missing tables when `auto_create_schema` is set.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let pool = establish_connection_with_config(&DbConfig::from(cfg)).await?;
    if cfg.auto_create_schema {
        ensure_schema(&pool).await?;
    }
    Ok(pool)
}

/// Creates the inventory tables if they do not exist yet. Existing tables are left alone.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), ServiceError> {
    create_table_if_missing(pool, chemical::Entity).await?;
    create_table_if_missing(pool, usage_log::Entity).await?;
    create_table_if_missing(pool, stock_history::Entity).await?;
    info!("Database schema is in place");
    Ok(())
}

async fn create_table_if_missing<E>(pool: &DbPool, entity: E) -> Result<(), ServiceError>
where
    E: EntityTrait,
{
    let backend = pool.get_database_backend();
    let schema = Schema::new(backend);
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();

    pool.execute(backend.build(&table)).await?;
    debug!(table = entity.table_name(), "Ensured table exists");
    Ok(())
}

/// Checks that the database answers a trivial query
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let backend = pool.get_database_backend();
    pool.execute(Statement::from_string(backend, "SELECT 1".to_owned()))
        .await?;
    Ok(())
}
