//! Astra DB table store over the JSON Data API
//!
//! Commands are posted to `{endpoint}/api/json/v1/{keyspace}[/{table}]` with the
//! application token in the `Token` header. The Data API reports command
//! failures in an `errors` array, usually with HTTP 200.

use async_trait::async_trait;
use chrono::SecondsFormat;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::AstraConfig;
use crate::error::{Error, Result};
use crate::types::NormalizedRecord;

use super::table_store::TableStore;

/// Post table in a hosted Astra database
pub struct AstraTableStore {
    client: Mutex<Option<Client>>,
    token: String,
    table: String,
    keyspace_url: String,
    table_url: String,
}

#[derive(Serialize)]
struct AstraRow<'a> {
    post_id: String,
    post_type: &'a str,
    timestamp: String,
    likes: i32,
    comments: i32,
    shares: i32,
    reach: i32,
    engagement_rate: f64,
}

impl<'a> From<&'a NormalizedRecord> for AstraRow<'a> {
    fn from(record: &'a NormalizedRecord) -> Self {
        Self {
            post_id: record.post_id.to_string(),
            post_type: record.post_type.as_str(),
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            likes: record.likes,
            comments: record.comments,
            shares: record.shares,
            reach: record.reach,
            engagement_rate: record.engagement_rate,
        }
    }
}

impl AstraTableStore {
    /// Open a Data API session for `keyspace.table`
    pub fn new(config: &AstraConfig, keyspace: &str, table: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        let keyspace_url = format!("{}/api/json/v1/{}", config.api_endpoint, keyspace);

        Ok(Self {
            client: Mutex::new(Some(client)),
            token: config.token.clone(),
            table: table.to_string(),
            table_url: format!("{}/{}", keyspace_url, table),
            keyspace_url,
        })
    }

    /// `createTable` command body for the post table
    fn create_table_command(table: &str) -> Value {
        json!({
            "createTable": {
                "name": table,
                "definition": {
                    "columns": {
                        "post_id": "uuid",
                        "post_type": "text",
                        "timestamp": "timestamp",
                        "likes": "int",
                        "shares": "int",
                        "comments": "int",
                        "reach": "int",
                        "engagement_rate": "float"
                    },
                    "primaryKey": "post_id"
                },
                "options": { "ifNotExists": true }
            }
        })
    }

    fn insert_command(record: &NormalizedRecord) -> Result<Value> {
        Ok(json!({
            "insertOne": { "document": serde_json::to_value(AstraRow::from(record))? }
        }))
    }

    async fn send(&self, url: &str, command: &Value) -> Result<Value> {
        let client = self
            .client
            .lock()
            .clone()
            .ok_or_else(|| Error::store("astra session is closed"))?;

        let response = client
            .post(url)
            .header("Token", &self.token)
            .header("Content-Type", "application/json")
            .json(command)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::store(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        let body: Value = response.json().await?;
        check_command_response(body)
    }
}

/// Turn a Data API response carrying an `errors` array into an error
pub fn check_command_response(body: Value) -> Result<Value> {
    let messages: Vec<String> = body
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    let message = e.get("message").and_then(Value::as_str).unwrap_or("unknown error");
                    match e.get("errorCode").and_then(Value::as_str) {
                        Some(code) => format!("{code}: {message}"),
                        None => message.to_string(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        Ok(body)
    } else {
        Err(Error::store(messages.join("; ")))
    }
}

#[async_trait]
impl TableStore for AstraTableStore {
    async fn ensure_schema(&self) -> Result<()> {
        let command = Self::create_table_command(&self.table);
        self.send(&self.keyspace_url, &command).await?;
        tracing::info!("Database setup completed");
        Ok(())
    }

    async fn insert(&self, record: &NormalizedRecord) -> Result<()> {
        let command = Self::insert_command(record)?;
        self.send(&self.table_url, &command).await?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.client.lock().take();
        Ok(())
    }

    fn name(&self) -> &str {
        "astra"
    }
}
