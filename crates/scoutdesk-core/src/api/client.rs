//! REST client for the hosted backend.
//!
//! Tables are exposed PostgREST-style under `/rest/v1`, sign-in under
//! `/auth/v1` and file storage under `/storage/v1`. Every request carries
//! the project API key; authenticated requests add the session token.

use std::fmt::Display;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::session::DEFAULT_EXPIRES_IN_SECS;
use crate::auth::{Permisos, SessionData, PROFILES_TABLE};
use crate::models::Record;
use crate::validation::validate_record;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const REST_PATH: &str = "rest/v1";
const AUTH_PATH: &str = "auth/v1";
const STORAGE_PATH: &str = "storage/v1";

/// Ask the backend to echo written rows back.
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the hosted backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the backend at `base_url`
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign in with email and password and return session data
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SessionData> {
        let url = format!("{}/{}/token?grant_type=password", self.base_url, AUTH_PATH);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .context("Failed to send authentication request")?;

        let response = Self::check_response(response).await?;
        let auth: AuthResponse = response.json().await.context("Failed to parse auth response")?;

        info!(user_id = %auth.user.id, "Signed in");
        Ok(SessionData {
            token: auth.access_token,
            user_id: auth.user.id,
            email: auth.user.email.unwrap_or_else(|| email.to_string()),
            created_at: Utc::now(),
            expires_in: auth.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&self.api_key)?);
        let bearer = self.token.as_deref().unwrap_or(&self.api_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send request: {}", what))?;
        Self::check_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.send(self.client.get(url).query(query), url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// The single row of a `return=representation` response.
    fn first_row<T>(rows: Vec<T>, table: &str) -> Result<T> {
        rows.into_iter().next().ok_or_else(|| {
            ApiError::InvalidResponse(format!("{} write returned no rows", table)).into()
        })
    }

    // ===== Generic table operations =====

    /// All rows of `T`'s table in its default order
    pub async fn list<T: Record>(&self) -> Result<Vec<T>> {
        let query = [
            ("select", "*".to_string()),
            ("order", format!("{}.asc", T::ORDER_BY)),
        ];
        let rows: Vec<T> = self
            .get(&self.table_url(T::TABLE), &query)
            .await
            .with_context(|| format!("Failed to load {}", T::TABLE))?;
        debug!(table = T::TABLE, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Rows of `T`'s table where `column` equals `value`
    pub async fn list_where<T: Record>(&self, column: &str, value: impl Display) -> Result<Vec<T>> {
        let query = [
            ("select", "*".to_string()),
            (column, format!("eq.{}", value)),
            ("order", format!("{}.asc", T::ORDER_BY)),
        ];
        self.get(&self.table_url(T::TABLE), &query)
            .await
            .with_context(|| format!("Failed to load {} by {}", T::TABLE, column))
    }

    /// Validate and insert a new row, returning it with its id
    pub async fn insert<T: Record>(&self, record: &T) -> Result<T> {
        validate_record(record)?;
        let request = self
            .client
            .post(self.table_url(T::TABLE))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(record);
        let rows: Vec<T> = self
            .send(request, T::TABLE)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse created {}", T::TABLE))?;
        let created = Self::first_row(rows, T::TABLE)?;
        info!(table = T::TABLE, id = ?created.id(), "Created row");
        Ok(created)
    }

    /// Validate and overwrite an existing row
    pub async fn update<T: Record>(&self, record: &T) -> Result<T> {
        let id = record
            .id()
            .ok_or_else(|| anyhow::anyhow!("Cannot update a {} row without an id", T::TABLE))?;
        validate_record(record)?;
        self.patch::<T, T>(id, record).await
    }

    /// Insert when the record is new, update otherwise
    pub async fn save<T: Record>(&self, record: &T) -> Result<T> {
        if record.id().is_some() {
            self.update(record).await
        } else {
            self.insert(record).await
        }
    }

    /// Partial update of one row; `body` may carry any subset of columns
    pub async fn patch<T: Record, B: Serialize + ?Sized>(&self, id: i64, body: &B) -> Result<T> {
        let request = self
            .client
            .patch(self.table_url(T::TABLE))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        let rows: Vec<T> = self
            .send(request, T::TABLE)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse updated {}", T::TABLE))?;
        debug!(table = T::TABLE, id, "Patched row");
        Self::first_row(rows, T::TABLE)
    }

    /// Update every row of `table` where `column` equals `value`.
    /// Returns the number of rows changed.
    pub async fn patch_where<B: Serialize + ?Sized>(
        &self,
        table: &str,
        column: &str,
        value: impl Display,
        body: &B,
    ) -> Result<usize> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[(column, format!("eq.{}", value))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        let rows: Vec<serde_json::Value> = self
            .send(request, table)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse bulk update of {}", table))?;
        debug!(table, column, count = rows.len(), "Bulk update");
        Ok(rows.len())
    }

    pub async fn delete<T: Record>(&self, id: i64) -> Result<()> {
        let request = self
            .client
            .delete(self.table_url(T::TABLE))
            .query(&[("id", format!("eq.{}", id))]);
        self.send(request, T::TABLE).await?;
        info!(table = T::TABLE, id, "Deleted row");
        Ok(())
    }

    /// Delete every row of `table` where `column` equals `value`.
    /// Returns the number of rows removed.
    pub async fn delete_where(
        &self,
        table: &str,
        column: &str,
        value: impl Display,
    ) -> Result<usize> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[(column, format!("eq.{}", value))])
            .header("Prefer", RETURN_REPRESENTATION);
        let rows: Vec<serde_json::Value> = self
            .send(request, table)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse bulk delete of {}", table))?;
        info!(table, column, count = rows.len(), "Bulk delete");
        Ok(rows.len())
    }

    // ===== Storage =====

    /// Upload `bytes` under `bucket/prefix/` and return the public URL
    pub async fn upload(
        &self,
        bucket: &str,
        prefix: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let object = object_name(prefix, file_name);
        let url = format!("{}/{}/object/{}/{}", self.base_url, STORAGE_PATH, bucket, object);
        let request = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, content_type(file_name))
            .body(bytes);
        self.send(request, &url).await.context("Failed to upload file")?;

        let public = format!(
            "{}/{}/object/public/{}/{}",
            self.base_url, STORAGE_PATH, bucket, object
        );
        info!(url = %public, "Uploaded file");
        Ok(public)
    }

    // ===== Profile =====

    /// Permission flags of `user_id`; read-only when no profile row exists
    pub async fn fetch_permisos(&self, user_id: &str) -> Result<Permisos> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
        ];
        let rows: Vec<Permisos> = self
            .get(&self.table_url(PROFILES_TABLE), &query)
            .await
            .context("Failed to load user profile")?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }
}

/// `{prefix}/{timestamp}_{random}.{ext}`
fn object_name(prefix: &str, file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let extension = file_extension(file_name);
    format!(
        "{}/{}_{}.{}",
        prefix.trim_matches('/'),
        Utc::now().timestamp_millis(),
        suffix.to_lowercase(),
        extension
    )
}

fn file_extension(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

fn content_type(file_name: &str) -> &'static str {
    match file_extension(file_name).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_shape() {
        let name = object_name("/compras/", "Boleta Mercado.JPG");
        let (prefix, rest) = name.split_once('/').expect("prefix separator");
        assert_eq!(prefix, "compras");
        assert!(rest.ends_with(".jpg"));
        let stem = rest.trim_end_matches(".jpg");
        let (timestamp, random) = stem.split_once('_').expect("underscore");
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(random.len(), 8);
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type("a.png"), "image/png");
        assert_eq!(content_type("firma.PDF"), "application/pdf");
        assert_eq!(content_type("sin_extension"), "application/octet-stream");
        assert_eq!(file_extension("sin_extension"), "bin");
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        let client = ApiClient::new("https://abc.supabase.co/", "key").expect("client");
        assert_eq!(client.base_url(), "https://abc.supabase.co");
        assert_eq!(client.table_url("scouts"), "https://abc.supabase.co/rest/v1/scouts");
    }
}
