use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DbError;

/// Thin PostgREST client for the clinic's Supabase tables.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.supabase_url, &config.supabase_anon_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DbError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| DbError::InvalidHeader(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.anon_key))
            .map_err(|e| DbError::InvalidHeader(e.to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                404 => DbError::NotFound(error_text),
                409 => DbError::Conflict(error_text),
                code => DbError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        let bytes = response.bytes().await?;
        let data = serde_json::from_slice::<T>(&bytes)?;
        Ok(data)
    }

    /// `GET /rest/v1/{table}?{query}`
    pub async fn select<T>(&self, table: &str, query: &str) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let path = if query.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, query)
        };
        self.request(Method::GET, &path, None).await
    }

    pub async fn select_one<T>(&self, table: &str, query: &str) -> Result<Option<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.select(table, query).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts one row and returns the stored representation.
    pub async fn insert<R, T>(&self, table: &str, row: &R) -> Result<T, DbError>
    where
        R: Serialize,
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let body = serde_json::to_value(row)?;

        let rows: Vec<T> = self
            .request_with_headers(Method::POST, &path, Some(body), Some(representation()))
            .await?;

        rows.into_iter().next().ok_or_else(|| DbError::Api {
            status: 201,
            message: format!("insert into {} returned no representation", table),
        })
    }

    /// Patches the rows matched by `filter`, returning the first updated row.
    pub async fn update<T>(&self, table: &str, filter: &str, patch: Value) -> Result<Option<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}?{}", table, filter);
        let rows: Vec<T> = self
            .request_with_headers(Method::PATCH, &path, Some(patch), Some(representation()))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Deletes the rows matched by `filter` and returns how many went away.
    pub async fn delete(&self, table: &str, filter: &str) -> Result<usize, DbError> {
        let path = format!("/rest/v1/{}?{}", table, filter);
        let rows: Vec<Value> = self
            .request_with_headers(Method::DELETE, &path, None, Some(representation()))
            .await?;
        Ok(rows.len())
    }
}

fn representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// `column=eq.value` with the value percent-encoded.
pub fn eq(column: &str, value: impl Display) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(&value.to_string()))
}

/// `column=op.value` for an arbitrary PostgREST operator.
pub fn filter(column: &str, op: &str, value: impl Display) -> String {
    format!("{}={}.{}", column, op, urlencoding::encode(&value.to_string()))
}

/// Timestamp literal used in range filters.
pub fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Row {
        id: i32,
        name: String,
    }

    #[tokio::test]
    async fn select_sends_api_key_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/things"))
            .and(query_param("name", "eq.a b"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "a b" }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = SupabaseClient::with_base_url(server.uri(), "anon");
        let rows: Vec<Row> = client.select("things", &eq("name", "a b")).await.unwrap();
        assert_eq!(rows, vec![Row { id: 1, name: "a b".into() }]);
    }

    #[tokio::test]
    async fn unique_violation_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/things"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let client = SupabaseClient::with_base_url(server.uri(), "anon");
        let result: Result<Row, DbError> = client.insert("things", &Row { id: 1, name: "x".into() }).await;
        assert_matches!(result, Err(DbError::Conflict(msg)) if msg.contains("23505"));
    }

    #[tokio::test]
    async fn delete_counts_returned_rows() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/things"))
            .and(query_param("id", "eq.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 7, "name": "gone" }])))
            .mount(&server)
            .await;

        let client = SupabaseClient::with_base_url(server.uri(), "anon");
        assert_eq!(client.delete("things", &eq("id", 7)).await.unwrap(), 1);
    }

    #[test]
    fn timestamp_literal_is_utc_zulu() {
        let instant = DateTime::parse_from_rfc3339("2026-03-01T08:15:00+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(instant), "2026-03-01T06:15:00.000000Z");
    }
}
