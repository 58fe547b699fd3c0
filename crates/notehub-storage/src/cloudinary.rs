//! Cloudinary storage backend
//!
//! Files are uploaded with `resource_type=auto`, so Cloudinary decides whether a
//! note is an `image` (PDFs, pictures), `video` or `raw` asset. Keys are the
//! returned public ids, which do not record that type, so reads, deletes and
//! existence checks try each resource type in turn.
//!
//! The public id is the full suggested name, extension included, so names that
//! differ only by extension never share an id.

use crate::keys;
use crate::traits::{FileStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";
const RESOURCE_TYPES: [&str; 3] = ["image", "raw", "video"];

/// Cloudinary account credentials.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Cloudinary storage implementation
pub struct CloudinaryStorage {
    http_client: reqwest::Client,
    credentials: CloudinaryCredentials,
    folder: String,
    api_base: String,
    delivery_base: String,
}

impl Debug for CloudinaryStorage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryStorage")
            .field("cloud_name", &self.credentials.cloud_name)
            .field("folder", &self.folder)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStorage {
    /// Create a new CloudinaryStorage instance
    ///
    /// # Arguments
    /// * `credentials` - Cloud name, API key and API secret
    /// * `folder` - Folder that uploaded assets are placed in (may be empty)
    pub fn new(credentials: CloudinaryCredentials, folder: String) -> StorageResult<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            StorageError::ConfigError(format!("Failed to create HTTP client for Cloudinary: {}", e))
        })?;

        Ok(Self {
            http_client,
            credentials,
            folder,
            api_base: API_BASE.to_string(),
            delivery_base: DELIVERY_BASE.to_string(),
        })
    }

    /// Point the client at different API and delivery hosts.
    pub fn with_endpoints(mut self, api_base: &str, delivery_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.delivery_base = delivery_base.trim_end_matches('/').to_string();
        self
    }

    /// Signature over the request parameters: SHA-1 of `k1=v1&k2=v2...` (keys sorted)
    /// followed by the API secret.
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.credentials.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Add timestamp, signature and API key to `params`.
    fn signed(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = self.sign(&params);
        params.insert("signature", signature);
        params.insert("api_key", self.credentials.api_key.clone());
        params
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.api_base, self.credentials.cloud_name, path)
    }

    /// Delivery URL for `public_id`.
    ///
    /// Image and video URLs read a trailing extension as the output format, so an id
    /// that already ends in one gets it repeated: `notes.pdf` is fetched as
    /// `notes.pdf.pdf`. Raw URLs use the id as is.
    fn delivery_url(&self, resource_type: &str, public_id: &str) -> String {
        let mut url = format!(
            "{}/{}/{}/upload/{}",
            self.delivery_base,
            self.credentials.cloud_name,
            resource_type,
            encode_public_id(public_id)
        );
        if resource_type != "raw" {
            if let Some(ext) = keys::extension(public_id) {
                url.push('.');
                url.push_str(&urlencoding::encode(ext));
            }
        }
        url
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(parsed) => format!("status {}: {}", status, parsed.error.message),
            Err(_) => format!("status {}", status),
        }
    }

    /// Destroy `public_id` as `resource_type`. `Ok(None)` means not found as that type.
    async fn destroy(&self, resource_type: &str, public_id: &str) -> Result<Option<String>, String> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        let params = self.signed(params);

        let response = self
            .http_client
            .post(self.api_url(&format!("{}/destroy", resource_type)))
            .form(&params)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(Self::error_message(response).await);
        }

        let body: DestroyResponse = response.json().await.map_err(|e| e.to_string())?;
        if body.result == "not found" {
            Ok(None)
        } else {
            Ok(Some(body.result))
        }
    }
}

#[async_trait]
impl FileStore for CloudinaryStorage {
    async fn save(&self, content: Vec<u8>, suggested_name: &str) -> StorageResult<String> {
        keys::validate_name(suggested_name)?;
        let size = content.len();
        let start = std::time::Instant::now();

        let mut params = BTreeMap::new();
        params.insert("public_id", suggested_name.to_string());
        if !self.folder.is_empty() {
            params.insert("folder", self.folder.clone());
        }
        let params = self.signed(params);

        let mut form = Form::new();
        for (name, value) in params {
            form = form.text(name, value);
        }
        form = form.part(
            "file",
            Part::bytes(content).file_name(suggested_name.to_string()),
        );

        let response = self
            .http_client
            .post(self.api_url("auto/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, name = %suggested_name, "Cloudinary upload failed");
                StorageError::UploadFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            tracing::error!(error = %message, name = %suggested_name, "Cloudinary upload rejected");
            return Err(StorageError::UploadFailed(message));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid upload response: {}", e)))?;

        tracing::info!(
            key = %body.public_id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(body.public_id)
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();

        for resource_type in RESOURCE_TYPES {
            let response = self
                .http_client
                .get(self.delivery_url(resource_type, key))
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, key = %key, "Cloudinary download failed");
                    StorageError::DownloadFailed(e.to_string())
                })?;

            match response.status() {
                status if status.is_success() => {
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

                    tracing::info!(
                        key = %key,
                        resource_type = resource_type,
                        size_bytes = bytes.len(),
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Cloudinary download successful"
                    );
                    return Ok(bytes.to_vec());
                }
                StatusCode::NOT_FOUND => continue,
                _ => {
                    let message = Self::error_message(response).await;
                    tracing::error!(error = %message, key = %key, "Cloudinary download failed");
                    return Err(StorageError::DownloadFailed(message));
                }
            }
        }

        Err(StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> bool {
        for resource_type in RESOURCE_TYPES {
            match self.destroy(resource_type, key).await {
                Ok(None) => continue,
                Ok(Some(result)) if result == "ok" => {
                    tracing::info!(key = %key, resource_type = resource_type, "Cloudinary delete successful");
                    return true;
                }
                Ok(Some(result)) => {
                    tracing::warn!(key = %key, result = %result, "Cloudinary delete not confirmed");
                    return false;
                }
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Error deleting file from Cloudinary");
                    return false;
                }
            }
        }
        false
    }

    /// Any provider error, including transport failures, reads as "does not exist".
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        for resource_type in RESOURCE_TYPES {
            let url = self.api_url(&format!(
                "resources/{}/upload/{}",
                resource_type,
                encode_public_id(key)
            ));
            let result = self
                .http_client
                .get(url)
                .basic_auth(
                    &self.credentials.api_key,
                    Some(&self.credentials.api_secret),
                )
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(true),
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Cloudinary resource lookup failed");
                    continue;
                }
            }
        }
        Ok(false)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Cloudinary
    }
}

/// Percent-encode each path segment of a public id, keeping the `/` separators.
fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn credentials() -> CloudinaryCredentials {
        CloudinaryCredentials {
            cloud_name: "demo".to_string(),
            api_key: "123456".to_string(),
            api_secret: "shhh".to_string(),
        }
    }

    fn storage(server: &Server) -> CloudinaryStorage {
        CloudinaryStorage::new(credentials(), "pennwest_uploads".to_string())
            .unwrap()
            .with_endpoints(&server.url(), &server.url())
    }

    #[test]
    fn test_signature_is_sorted_and_salted() {
        let storage = CloudinaryStorage::new(credentials(), String::new()).unwrap();

        let mut a = BTreeMap::new();
        a.insert("timestamp", "1315060510".to_string());
        a.insert("public_id", "sample".to_string());

        let mut hasher = Sha1::new();
        hasher.update(b"public_id=sample&timestamp=1315060510shhh");
        assert_eq!(storage.sign(&a), hex::encode(hasher.finalize()));

        let other = CloudinaryStorage::new(
            CloudinaryCredentials {
                api_secret: "different".to_string(),
                ..credentials()
            },
            String::new(),
        )
        .unwrap();
        assert_ne!(storage.sign(&a), other.sign(&a));
    }

    #[test]
    fn test_public_id_encoding() {
        assert_eq!(encode_public_id("pennwest_uploads/abc"), "pennwest_uploads/abc");
        assert_eq!(encode_public_id("folder/my notes"), "folder/my%20notes");
    }

    #[tokio::test]
    async fn test_save_returns_public_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/demo/auto/upload")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="public_id"\r\n\r\n3f2a.pdf\r\n"#.to_string()),
                Matcher::Regex(r#"name="folder"\r\n\r\npennwest_uploads\r\n"#.to_string()),
                Matcher::Regex(r#"name="api_key"\r\n\r\n123456\r\n"#.to_string()),
                Matcher::Regex(r#"name="signature""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"public_id":"pennwest_uploads/3f2a.pdf","resource_type":"image"}"#)
            .create_async()
            .await;

        let key = storage(&server)
            .save(b"%PDF-1.4".to_vec(), "3f2a.pdf")
            .await
            .unwrap();

        assert_eq!(key, "pennwest_uploads/3f2a.pdf");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_names_differing_by_extension_get_distinct_ids() {
        let mut server = Server::new_async().await;
        let pdf = server
            .mock("POST", "/demo/auto/upload")
            .match_body(Matcher::Regex(
                r#"name="public_id"\r\n\r\nnotes.pdf\r\n"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"public_id":"pennwest_uploads/notes.pdf"}"#)
            .expect(1)
            .create_async()
            .await;
        let txt = server
            .mock("POST", "/demo/auto/upload")
            .match_body(Matcher::Regex(
                r#"name="public_id"\r\n\r\nnotes.txt\r\n"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"public_id":"pennwest_uploads/notes.txt"}"#)
            .expect(1)
            .create_async()
            .await;

        let storage = storage(&server);
        let first = storage.save(b"pdf".to_vec(), "notes.pdf").await.unwrap();
        let second = storage.save(b"txt".to_vec(), "notes.txt").await.unwrap();

        assert_ne!(first, second);
        pdf.assert_async().await;
        txt.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_repeats_extension_for_image_delivery() {
        let mut server = Server::new_async().await;
        let image = server
            .mock("GET", "/demo/image/upload/pennwest_uploads/notes.pdf.pdf")
            .with_status(200)
            .with_body(b"%PDF-1.4")
            .create_async()
            .await;

        let data = storage(&server)
            .get("pennwest_uploads/notes.pdf")
            .await
            .unwrap();
        assert_eq!(data, b"%PDF-1.4");
        image.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_raw_uses_id_verbatim() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("GET", "/demo/image/upload/pennwest_uploads/notes.docx.docx")
            .with_status(404)
            .create_async()
            .await;
        let raw = server
            .mock("GET", "/demo/raw/upload/pennwest_uploads/notes.docx")
            .with_status(200)
            .with_body(b"PK\x03\x04")
            .create_async()
            .await;

        let data = storage(&server)
            .get("pennwest_uploads/notes.docx")
            .await
            .unwrap();
        assert_eq!(data, b"PK\x03\x04");
        raw.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_surfaces_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/demo/auto/upload")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid Signature"}}"#)
            .create_async()
            .await;

        let result = storage(&server).save(b"x".to_vec(), "a.pdf").await;
        match result {
            Err(StorageError::UploadFailed(message)) => {
                assert!(message.contains("Invalid Signature"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_tries_each_resource_type() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("GET", "/demo/image/upload/pennwest_uploads/3f2a")
            .with_status(404)
            .create_async()
            .await;
        let _raw = server
            .mock("GET", "/demo/raw/upload/pennwest_uploads/3f2a")
            .with_status(200)
            .with_body(b"raw note bytes\x00\x01")
            .create_async()
            .await;

        let data = storage(&server).get("pennwest_uploads/3f2a").await.unwrap();
        assert_eq!(data, b"raw note bytes\x00\x01");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for resource_type in RESOURCE_TYPES {
            let mock = server
                .mock("GET", format!("/demo/{}/upload/gone", resource_type).as_str())
                .with_status(404)
                .create_async()
                .await;
            mocks.push(mock);
        }

        let result = storage(&server).get("gone").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_server_error_is_not_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/demo/image/upload/broken")
            .with_status(500)
            .create_async()
            .await;

        let result = storage(&server).get("broken").await;
        assert!(matches!(result, Err(StorageError::DownloadFailed(_))));
    }

    #[tokio::test]
    async fn test_delete_ok_result() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("POST", "/demo/image/destroy")
            .with_status(200)
            .with_body(r#"{"result":"not found"}"#)
            .create_async()
            .await;
        let raw = server
            .mock("POST", "/demo/raw/destroy")
            .match_body(Matcher::Regex("public_id=pennwest_uploads%2F3f2a".to_string()))
            .with_status(200)
            .with_body(r#"{"result":"ok"}"#)
            .create_async()
            .await;

        assert!(storage(&server).delete("pennwest_uploads/3f2a").await);
        raw.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for resource_type in RESOURCE_TYPES {
            let mock = server
                .mock("POST", format!("/demo/{}/destroy", resource_type).as_str())
                .with_status(200)
                .with_body(r#"{"result":"not found"}"#)
                .create_async()
                .await;
            mocks.push(mock);
        }

        assert!(!storage(&server).delete("gone").await);
    }

    #[tokio::test]
    async fn test_delete_provider_error_is_soft() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/demo/image/destroy")
            .with_status(500)
            .with_body(r#"{"error":{"message":"boom"}}"#)
            .create_async()
            .await;

        assert!(!storage(&server).delete("any").await);
    }

    #[tokio::test]
    async fn test_exists_uses_admin_lookup() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("GET", "/demo/resources/image/upload/pennwest_uploads/3f2a")
            .with_status(404)
            .create_async()
            .await;
        let raw = server
            .mock("GET", "/demo/resources/raw/upload/pennwest_uploads/3f2a")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_body(r#"{"public_id":"pennwest_uploads/3f2a"}"#)
            .create_async()
            .await;

        assert!(storage(&server).exists("pennwest_uploads/3f2a").await.unwrap());
        raw.assert_async().await;
    }

    #[tokio::test]
    async fn test_exists_treats_errors_as_absent() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/demo/resources/".to_string()))
            .with_status(500)
            .create_async()
            .await;

        assert!(!storage(&server).exists("whatever").await.unwrap());

        let unreachable = CloudinaryStorage::new(credentials(), String::new())
            .unwrap()
            .with_endpoints("http://127.0.0.1:1", "http://127.0.0.1:1");
        assert!(!unreachable.exists("whatever").await.unwrap());
    }

    #[tokio::test]
    async fn test_presigned_url_unsupported() {
        let server = Server::new_async().await;
        let result = storage(&server)
            .presigned_url("x", std::time::Duration::from_secs(60))
            .await;
        assert!(matches!(
            result,
            Err(StorageError::Unsupported(StorageBackend::Cloudinary))
        ));
    }
}
