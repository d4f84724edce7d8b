//! HTTP adapter for the storefront admin API.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, instrument};

use stockbridge_core::{LocationId, Quantity, StorefrontId};

use super::{CatalogError, StorefrontCatalog, http_client};
use crate::config::StorefrontEndpoint;
use crate::settings::SettingsStore;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const LIST_PAGE_SIZE: u32 = 250;
/// Upper bound on followed `Link: rel="next"` pages.
const MAX_LIST_PAGES: usize = 1_000;

pub struct HttpStorefrontCatalog {
    client: reqwest::Client,
    endpoint: StorefrontEndpoint,
    settings: Arc<dyn SettingsStore>,
}

impl core::fmt::Debug for HttpStorefrontCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpStorefrontCatalog")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpStorefrontCatalog {
    pub fn new(
        endpoint: StorefrontEndpoint,
        settings: Arc<dyn SettingsStore>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            settings,
        })
    }

    async fn token(&self) -> Result<String, CatalogError> {
        self.settings
            .load()
            .await
            .map_err(|e| CatalogError::Credentials(e.to_string()))?
            .storefront_credential
            .ok_or(CatalogError::MissingCredential("storefront access token"))
    }

    async fn get(&self, url: &str, token: &str) -> Result<reqwest::Response, CatalogError> {
        let resp = self
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, token)
            .send()
            .await?;
        ensure_success(resp).await
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(CatalogError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Numeric ids go out as JSON numbers, anything else as strings.
fn id_value(raw: &str) -> Value {
    raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(raw))
}

/// Target of the `rel="next"` entry of a `Link` header, if any.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim().eq_ignore_ascii_case(r#"rel="next""#));
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        is_next.then(|| url.to_string())
    })
}

#[async_trait::async_trait]
impl StorefrontCatalog for HttpStorefrontCatalog {
    #[instrument(skip(self, location), fields(location = %location))]
    async fn set_inventory_level(
        &self,
        location: &LocationId,
        quantity: Quantity,
    ) -> Result<(), CatalogError> {
        let token = self.token().await?;
        let url = format!("{}/inventory_levels/set.json", self.endpoint.base_url);
        let body = json!({
            "location_id": id_value(&self.endpoint.location_id),
            "inventory_item_id": id_value(location.as_str()),
            "available": quantity,
        });

        let resp = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, token)
            .json(&body)
            .send()
            .await?;
        ensure_success(resp).await?;
        debug!(quantity, "storefront inventory level set");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_product_ids(&self) -> Result<Vec<StorefrontId>, CatalogError> {
        let token = self.token().await?;
        let mut url = Some(format!(
            "{}/products.json?limit={LIST_PAGE_SIZE}&fields=id",
            self.endpoint.base_url
        ));
        let mut ids = Vec::new();
        let mut pages = 0usize;

        while let Some(current) = url.take() {
            pages += 1;
            if pages > MAX_LIST_PAGES {
                return Err(CatalogError::Malformed(format!(
                    "pagination did not end after {MAX_LIST_PAGES} pages"
                )));
            }

            let resp = self.get(&current, &token).await?;
            url = resp
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);

            let body: Value = resp.json().await?;
            let products = body
                .get("products")
                .and_then(Value::as_array)
                .ok_or_else(|| CatalogError::Malformed("missing products array".to_string()))?;
            ids.extend(products.iter().filter_map(|p| match p.get("id")? {
                Value::Number(n) => Some(StorefrontId::new(n.to_string())),
                Value::String(s) => Some(StorefrontId::new(s.clone())),
                _ => None,
            }));
        }

        debug!(count = ids.len(), pages, "listed storefront products");
        Ok(ids)
    }

    async fn check_status(&self) -> Result<(), CatalogError> {
        let token = self.token().await?;
        let url = format!("{}/products.json?limit=1", self.endpoint.base_url);
        self.get(&url, &token).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{InMemorySettingsStore, SyncSettings};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog(server: &MockServer, token: Option<&str>) -> HttpStorefrontCatalog {
        let mut settings = SyncSettings::default();
        settings.storefront_credential = token.map(str::to_string);
        HttpStorefrontCatalog::new(
            StorefrontEndpoint {
                base_url: server.uri(),
                location_id: "655441491".to_string(),
            },
            Arc::new(InMemorySettingsStore::new(settings)),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn push_sets_absolute_level() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inventory_levels/set.json"))
            .and(header(ACCESS_TOKEN_HEADER, "shp"))
            .and(body_json(json!({
                "location_id": 655441491,
                "inventory_item_id": 808950810,
                "available": 42
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "inventory_level": {} })))
            .expect(1)
            .mount(&server)
            .await;

        catalog(&server, Some("shp"))
            .set_inventory_level(&LocationId::new("808950810"), 42)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_push_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid location"))
            .mount(&server)
            .await;

        let err = catalog(&server, Some("shp"))
            .set_inventory_level(&LocationId::new("L1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 422, .. }));
    }

    #[tokio::test]
    async fn listing_follows_next_links() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/products.json?limit=250&page_info=p2>; rel=\"next\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .and(query_param("fields", "id"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", next.as_str())
                    .set_body_json(json!({ "products": [{ "id": 1 }, { "id": 2 }] })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products.json"))
            .and(query_param("page_info", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": [{ "id": 3 }] })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = catalog(&server, Some("shp")).list_product_ids().await.unwrap();
        let ids: Vec<_> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn missing_token_fails_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = catalog(&server, None).check_status().await.unwrap_err();
        assert_eq!(err, CatalogError::MissingCredential("storefront access token"));
    }

    #[test]
    fn link_header_parsing() {
        let header = r#"<https://s/p.json?page_info=a>; rel="previous", <https://s/p.json?page_info=b>; rel="next""#;
        assert_eq!(next_link(header).as_deref(), Some("https://s/p.json?page_info=b"));
        assert_eq!(next_link(r#"<https://s/p.json>; rel="previous""#), None);
    }
}
