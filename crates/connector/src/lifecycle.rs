//! Startup and shutdown of all connectors.

use std::sync::Arc;

use tracing::{info, warn};

use querygate_core::Config;

use crate::backend::Backends;
use crate::datadog::DatadogConnector;
use crate::mongo::MongoConnector;
use crate::mysql::MySqlConnector;

/// Connect every configured backend. A backend that fails is logged and left
/// disabled; this never fails as a whole and never retries.
pub async fn connect_all(config: &Config) -> Backends {
    let mut backends = Backends::none();

    match MySqlConnector::connect(&config.mysql).await {
        Ok(conn) => backends.mysql = Some(Arc::new(conn)),
        Err(e) => warn!("Failed to connect to MySQL: {}; MySQL tools disabled", e),
    }

    if config.mongo.enabled {
        match MongoConnector::connect(&config.mongo).await {
            Ok(conn) => backends.mongo = Some(Arc::new(conn)),
            Err(e) => warn!("Failed to connect to MongoDB: {}; MongoDB tools disabled", e),
        }
    } else {
        info!("MONGO_ENABLED is not set; MongoDB tools disabled");
    }

    if config.datadog.enabled {
        match DatadogConnector::connect(&config.datadog).await {
            Ok(conn) => backends.logs = Some(Arc::new(conn)),
            Err(e) => warn!("Failed to connect to Datadog Logs: {}; log tools disabled", e),
        }
    } else {
        info!("DATADOG_ENABLED is not set; log tools disabled");
    }

    let status = backends.status();
    info!(
        mysql = status.mysql,
        mongodb = status.mongodb,
        datadog = status.datadog,
        "Backends ready"
    );
    backends
}

/// Close all live backends. Always completes; failures are logged by each
/// connector's `close`.
pub async fn shutdown(backends: &Backends) {
    if let Some(mysql) = &backends.mysql {
        mysql.close().await;
    }
    if let Some(mongo) = &backends.mongo {
        mongo.close().await;
    }
    info!("Backends closed");
}
