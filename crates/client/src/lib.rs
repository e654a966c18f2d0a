//! [`VendorStore`] over the vendor REST API.

use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use vendor_config::ApiConfig;
use vendor_onboarding::{
    FilterOptions, StoreError, VendorDraft, VendorFilter, VendorListing, VendorRecord,
    VendorStore, to_csv,
};

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse {
    vendors: Vec<VendorRecord>,
    #[serde(default)]
    filter_options: Option<FilterOptions>,
}

#[derive(Debug, Deserialize)]
struct VendorEnvelope {
    vendor: VendorRecord,
}

#[derive(Debug, Deserialize)]
struct NextIdResponse {
    next_vendor_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

// ── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RestVendorStore {
    client: reqwest::Client,
    base_url: Url,
}

impl RestVendorStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            bail!("vendor API url must be hierarchical: {base_url}");
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/{segments...}`; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&VendorDraft>,
    ) -> Result<Response, StoreError> {
        let url = self.endpoint(segments);
        debug!(%method, %url, "vendor api request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport)?;
        check_status(response, segments.get(1).copied()).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&VendorDraft>,
    ) -> Result<T, StoreError> {
        let response = self.send(method, segments, body).await?;
        response.json::<T>().await.map_err(transport)
    }
}

#[async_trait]
impl VendorStore for RestVendorStore {
    async fn list(&self) -> Result<VendorListing, StoreError> {
        let listing: ListResponse = self.fetch(Method::GET, &["vendors"], None).await?;
        Ok(match listing.filter_options {
            Some(filter_options) => VendorListing {
                vendors: listing.vendors,
                filter_options,
            },
            None => VendorListing::from_vendors(listing.vendors),
        })
    }

    async fn get(&self, vendor_id: &str) -> Result<VendorRecord, StoreError> {
        let envelope: VendorEnvelope = self
            .fetch(Method::GET, &["vendors", vendor_id], None)
            .await?;
        Ok(envelope.vendor)
    }

    async fn create(&self, draft: &VendorDraft) -> Result<VendorRecord, StoreError> {
        let envelope: VendorEnvelope = self
            .fetch(Method::POST, &["vendors"], Some(draft))
            .await?;
        Ok(envelope.vendor)
    }

    async fn update(
        &self,
        vendor_id: &str,
        draft: &VendorDraft,
    ) -> Result<VendorRecord, StoreError> {
        let envelope: VendorEnvelope = self
            .fetch(Method::PUT, &["vendors", vendor_id], Some(draft))
            .await?;
        Ok(envelope.vendor)
    }

    async fn delete(&self, vendor_id: &str) -> Result<(), StoreError> {
        self.send(Method::DELETE, &["vendors", vendor_id], None)
            .await?;
        Ok(())
    }

    async fn next_identifier(&self) -> Result<String, StoreError> {
        let next: NextIdResponse = self
            .fetch(Method::GET, &["next-vendor-id"], None)
            .await?;
        Ok(next.next_vendor_id)
    }

    async fn export_csv(&self, filter: &VendorFilter) -> Result<Vec<u8>, StoreError> {
        let listing = self.list().await?;
        Ok(to_csv(filter.apply(&listing.vendors)).into_bytes())
    }
}

// ── Error mapping ────────────────────────────────────────────────────────────

fn transport(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        return StoreError::Transport("request timed out".to_string());
    }
    if err.is_decode() {
        return StoreError::Transport(format!("unexpected response from vendor service: {err}"));
    }
    StoreError::Transport(err.to_string())
}

async fn check_status(response: Response, vendor_id: Option<&str>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = detail_message(&body);
    debug!(%status, detail = detail.as_deref().unwrap_or(""), "vendor api error");

    if status == StatusCode::NOT_FOUND {
        if let Some(vendor_id) = vendor_id {
            return Err(StoreError::NotFound(vendor_id.to_string()));
        }
    }

    Err(StoreError::Rejected(detail.unwrap_or_else(|| {
        format!("vendor service answered {status}")
    })))
}

/// Pull a user-facing message out of a `{detail}` error body.  Handles both
/// plain strings and the list-of-issues shape request validation produces.
fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(message) if !message.trim().is_empty() => Some(message),
        serde_json::Value::Array(issues) => {
            let messages: Vec<String> = issues
                .iter()
                .filter_map(|issue| {
                    let msg = issue.get("msg")?.as_str()?;
                    let field = issue
                        .get("loc")
                        .and_then(|loc| loc.as_array())
                        .and_then(|loc| loc.last())
                        .and_then(|last| last.as_str());
                    Some(match field {
                        Some(field) => format!("{field}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use vendor_onboarding::{Field, VendorStatus};

    fn store_for(server: &Server) -> RestVendorStore {
        RestVendorStore::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    fn vendor_json(vendor_id: &str, email: &str, country: &str) -> serde_json::Value {
        json!({
            "_id": "665f1c2e9b1e8a0012345678",
            "id": "2f7c1f4e-6a55-4d0c-9c7e-0b7f1c0d2a11",
            "vendor_id": vendor_id,
            "company_name": "TechCorp Solutions",
            "contact_person": "John Smith",
            "email": email,
            "phone": "+1234567890",
            "street_address": "123 Business St",
            "city": "New York",
            "postal_code": "10001",
            "country": country,
            "bank_name": "Chase Bank",
            "account_number": "1234567890",
            "iban": "US123456789012345678",
            "bic": "CHASUS33",
            "documents": {},
            "status": "active",
            "created_at": "2024-05-01T09:30:00.123456"
        })
    }

    fn draft() -> VendorDraft {
        VendorDraft::default()
            .with_field(Field::CompanyName, "TechCorp Solutions")
            .with_field(Field::Email, "john@techcorp.com")
            .with_field(Field::Country, "United States")
    }

    #[test]
    fn endpoint_joins_under_api() {
        let store = RestVendorStore::new("http://localhost:8001", Duration::from_secs(1)).unwrap();
        assert_eq!(
            store.endpoint(&["vendors", "VENDOR001"]).as_str(),
            "http://localhost:8001/api/vendors/VENDOR001"
        );

        let prefixed =
            RestVendorStore::new("https://example.com/backend/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            prefixed.endpoint(&["next-vendor-id"]).as_str(),
            "https://example.com/backend/api/next-vendor-id"
        );
        assert_eq!(
            prefixed.endpoint(&["vendors", "a/b"]).as_str(),
            "https://example.com/backend/api/vendors/a%2Fb"
        );
    }

    #[test]
    fn rejects_non_hierarchical_urls() {
        assert!(RestVendorStore::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
        assert!(RestVendorStore::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn detail_message_handles_both_shapes() {
        assert_eq!(
            detail_message(r#"{"detail":"Vendor not found"}"#),
            Some("Vendor not found".to_string())
        );
        let issues = r#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#;
        assert_eq!(detail_message(issues), Some("email: field required".to_string()));
        assert_eq!(detail_message("<html>oops</html>"), None);
    }

    #[tokio::test]
    async fn list_derives_filter_options_when_missing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/vendors")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "vendors": [
                        vendor_json("VENDOR001", "a@x.com", "India"),
                        vendor_json("VENDOR002", "b@x.com", "Germany"),
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let listing = store_for(&server).list().await.unwrap();
        mock.assert_async().await;
        assert_eq!(listing.vendors.len(), 2);
        assert_eq!(
            listing.filter_options.countries.into_iter().collect::<Vec<_>>(),
            vec!["Germany", "India"]
        );
        assert!(listing.filter_options.statuses.contains(&VendorStatus::Active));
    }

    #[tokio::test]
    async fn create_posts_snake_case_draft() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/vendors")
            .match_body(Matcher::PartialJson(json!({
                "company_name": "TechCorp Solutions",
                "email": "john@techcorp.com",
                "country": "United States"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": "Vendor created successfully",
                    "vendor": vendor_json("VENDOR007", "john@techcorp.com", "United States")
                })
                .to_string(),
            )
            .create_async()
            .await;

        let record = store_for(&server).create(&draft()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(record.vendor_id, "VENDOR007");
    }

    #[tokio::test]
    async fn update_puts_to_vendor_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/vendors/VENDOR003")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "message": "Vendor updated successfully",
                    "vendor": vendor_json("VENDOR003", "john@techcorp.com", "United States")
                })
                .to_string(),
            )
            .create_async()
            .await;

        let record = store_for(&server).update("VENDOR003", &draft()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(record.vendor_id, "VENDOR003");
    }

    #[tokio::test]
    async fn missing_vendor_maps_to_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/vendors/VENDOR404")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Vendor not found"}"#)
            .create_async()
            .await;

        let err = store_for(&server).get("VENDOR404").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("VENDOR404".to_string()));
    }

    #[tokio::test]
    async fn server_error_detail_is_a_rejection() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/vendors")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Vendor with this email already exists"}"#)
            .create_async()
            .await;

        let err = store_for(&server).create(&draft()).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Rejected("Vendor with this email already exists".to_string())
        );
    }

    #[tokio::test]
    async fn error_without_detail_names_the_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/vendors/VENDOR001")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = store_for(&server).delete("VENDOR001").await.unwrap_err();
        match err {
            StoreError::Rejected(message) => assert!(message.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_a_transport_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/next-vendor-id")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{not json")
            .create_async()
            .await;

        let err = store_for(&server).next_identifier().await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let store =
            RestVendorStore::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2))
                .unwrap();

        let err = store.next_identifier().await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn next_identifier_reads_preview() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/next-vendor-id")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"next_vendor_id":"VENDOR012"}"#)
            .create_async()
            .await;

        assert_eq!(store_for(&server).next_identifier().await.unwrap(), "VENDOR012");
    }

    #[tokio::test]
    async fn export_filters_the_listing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/vendors")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "vendors": [
                        vendor_json("VENDOR001", "a@x.com", "India"),
                        vendor_json("VENDOR002", "b@x.com", "Germany"),
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let filter = VendorFilter {
            country: Some("india".to_string()),
            ..VendorFilter::default()
        };
        let csv = store_for(&server).export_csv(&filter).await.unwrap();
        let csv = String::from_utf8(csv).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("vendor_id,company_name"));
        assert!(rows[1].starts_with("VENDOR001,"));
    }
}
