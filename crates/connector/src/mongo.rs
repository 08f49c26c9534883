//! MongoDB connector.
//!
//! Filters and pipeline stages arrive as MongoDB Extended JSON; documents are
//! returned as relaxed Extended JSON.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Database};
use serde_json::{Map, Value};
use tracing::{debug, info};

use querygate_core::config::MongoConfig;

use crate::backend::DocumentBackend;
use crate::error::ConnectorError;

pub struct MongoConnector {
    client: Client,
    db: Database,
}

impl MongoConnector {
    /// Create the client and ping the configured database.
    pub async fn connect(config: &MongoConfig) -> Result<Self, ConnectorError> {
        let client = Client::with_uri_str(&config.url).await?;
        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 }).await?;

        info!(database = %config.database, "MongoDB connected");
        Ok(Self { client, db })
    }
}

#[async_trait]
impl DocumentBackend for MongoConnector {
    async fn find(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: i64,
    ) -> Result<Vec<Value>, ConnectorError> {
        let filter = to_document(filter)?;
        debug!(collection = %collection, limit, "MongoDB find");

        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(filter)
            .limit(limit)
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_json).collect())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<Vec<Value>, ConnectorError> {
        let stages = pipeline
            .into_iter()
            .map(|stage| match stage {
                Value::Object(map) => to_document(map),
                other => Err(ConnectorError::InvalidDocument(format!(
                    "pipeline stage must be an object, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(collection = %collection, stages = stages.len(), "MongoDB aggregate");

        let cursor = self
            .db
            .collection::<Document>(collection)
            .aggregate(stages)
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_json).collect())
    }

    async fn list_collections(&self) -> Result<Vec<String>, ConnectorError> {
        Ok(self.db.list_collection_names().await?)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB client closed");
    }
}

/// Parse an Extended JSON object into a BSON document.
pub(crate) fn to_document(map: Map<String, Value>) -> Result<Document, ConnectorError> {
    Document::try_from(map).map_err(|e| ConnectorError::InvalidDocument(e.to_string()))
}

fn to_json(doc: Document) -> Value {
    Bson::Document(doc).into_relaxed_extjson()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_filter_accepts_extended_json() {
        let filter = json!({
            "_id": {"$oid": "65a1b2c3d4e5f60718293a4b"},
            "age": {"$gt": 21}
        });
        let Value::Object(map) = filter else { unreachable!() };

        let doc = to_document(map).unwrap();
        assert_eq!(
            doc.get_object_id("_id").unwrap(),
            ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap()
        );
        assert_eq!(doc.get_document("age").unwrap().get_i32("$gt").unwrap(), 21);
    }

    #[test]
    fn test_documents_render_as_relaxed_extjson() {
        let oid = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let value = to_json(doc! { "_id": oid, "name": "ada", "n": 3 });
        assert_eq!(
            value,
            json!({"_id": {"$oid": "65a1b2c3d4e5f60718293a4b"}, "name": "ada", "n": 3})
        );
    }
}
