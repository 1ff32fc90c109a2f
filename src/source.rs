use crate::config::Config;
use crate::errors::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Read-only access to the hosted table of contact-form submissions.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Every row of `table`, unfiltered, in source order.
    async fn fetch_all(&self, table: &str) -> Result<Vec<Record>, SourceError>;
}

/// PostgREST client for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }
}

#[async_trait]
impl ContactSource for SupabaseClient {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Record>, SourceError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        into_records(response.json().await?)
    }
}

fn into_records(body: Value) -> Result<Vec<Record>, SourceError> {
    let Value::Array(items) = body else {
        return Err(SourceError::Malformed("expected a JSON array of rows".into()));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(SourceError::Malformed(format!("row is not an object: {other}"))),
        })
        .collect()
}
