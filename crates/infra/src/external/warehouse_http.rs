//! HTTP adapter for the warehouse (ERP) product API.
//!
//! Every call is a form-encoded POST carrying the app/business ids, the
//! access token and a JSON `data` payload. A `code` other than `1` in the
//! response body is a rejection even when the HTTP status is 2xx.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, instrument};

use stockbridge_core::{LocationStock, Quantity, WarehouseId, WarehouseProduct, WarehouseStock};

use super::{CatalogError, WarehouseCatalog, http_client};
use crate::config::WarehouseEndpoint;
use crate::settings::SettingsStore;

const API_VERSION: &str = "2.0";
const SEARCH_PAGE_SIZE: u32 = 50;

pub struct HttpWarehouseCatalog {
    client: reqwest::Client,
    endpoint: WarehouseEndpoint,
    settings: Arc<dyn SettingsStore>,
}

impl core::fmt::Debug for HttpWarehouseCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpWarehouseCatalog")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpWarehouseCatalog {
    /// The access token is read from `settings` on every call.
    pub fn new(
        endpoint: WarehouseEndpoint,
        settings: Arc<dyn SettingsStore>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            settings,
        })
    }

    async fn call(&self, data: Value) -> Result<Value, CatalogError> {
        let app_id = self
            .endpoint
            .app_id
            .as_deref()
            .ok_or(CatalogError::MissingCredential("WAREHOUSE_APP_ID"))?;
        let business_id = self
            .endpoint
            .business_id
            .as_deref()
            .ok_or(CatalogError::MissingCredential("WAREHOUSE_BUSINESS_ID"))?;
        let token = self
            .settings
            .load()
            .await
            .map_err(|e| CatalogError::Credentials(e.to_string()))?
            .warehouse_credential
            .ok_or(CatalogError::MissingCredential("warehouse access token"))?;

        let url = format!("{}/product/search", self.endpoint.base_url);
        let payload = data.to_string();
        let form = [
            ("version", API_VERSION),
            ("appId", app_id),
            ("businessId", business_id),
            ("accessToken", token.as_str()),
            ("data", payload.as_str()),
        ];

        let resp = self.client.post(&url).form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp.json().await?;
        if body.get("code").and_then(lenient_i64) != Some(1) {
            let messages = body
                .get("messages")
                .map(Value::to_string)
                .unwrap_or_else(|| "no messages".to_string());
            return Err(CatalogError::Rejected(messages));
        }
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait::async_trait]
impl WarehouseCatalog for HttpWarehouseCatalog {
    #[instrument(skip(self, id), fields(warehouse_id = %id))]
    async fn lookup_by_id(&self, id: &WarehouseId) -> Result<WarehouseStock, CatalogError> {
        let data = self.call(json!({ "id": id.as_str() })).await?;
        let stock = stock_from_lookup(&data, id)?;
        debug!(remain = ?stock.remain, locations = stock.locations.len(), "warehouse lookup");
        Ok(stock)
    }

    #[instrument(skip(self))]
    async fn search_by_name(&self, query: &str) -> Result<Vec<WarehouseProduct>, CatalogError> {
        let data = self
            .call(json!({ "name": query, "page": 1, "icpp": SEARCH_PAGE_SIZE }))
            .await?;
        products_from_search(&data)
    }

    async fn check_status(&self) -> Result<(), CatalogError> {
        self.call(json!({ "page": 1, "icpp": 1 })).await.map(|_| ())
    }
}

/// Accept JSON numbers and numeric strings; anything else is absent.
fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn lenient_quantity(inventory: &Value, key: &str) -> Option<Quantity> {
    inventory.get(key).and_then(lenient_i64)
}

fn stock_from_inventory(inventory: &Value) -> WarehouseStock {
    let locations = inventory
        .get("depots")
        .and_then(Value::as_object)
        .map(|depots| {
            depots
                .iter()
                .map(|(depot, figures)| {
                    let available = lenient_quantity(figures, "available");
                    (depot.clone(), LocationStock { available })
                })
                .collect()
        })
        .unwrap_or_default();

    WarehouseStock {
        remain: lenient_quantity(inventory, "remain"),
        quantity: lenient_quantity(inventory, "quantity"),
        locations,
    }
}

fn stock_from_lookup(data: &Value, id: &WarehouseId) -> Result<WarehouseStock, CatalogError> {
    if !data.is_object() {
        return Err(CatalogError::Malformed("missing data object".to_string()));
    }
    if let Some(product) = data.get("products").and_then(|p| p.get(id.as_str())) {
        let inventory = product.get("inventory").unwrap_or(product);
        return Ok(stock_from_inventory(inventory));
    }
    match data.get("inventory") {
        Some(inventory) if inventory.is_object() => Ok(stock_from_inventory(inventory)),
        _ => Err(CatalogError::NotFound),
    }
}

fn products_from_search(data: &Value) -> Result<Vec<WarehouseProduct>, CatalogError> {
    let Some(products) = data.get("products") else {
        return Ok(Vec::new());
    };

    let text = |v: &Value, key: &str| -> Option<String> {
        match v.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let entries: Vec<(Option<&String>, &Value)> = match products {
        Value::Object(map) => map.iter().map(|(k, v)| (Some(k), v)).collect(),
        Value::Array(list) => list.iter().map(|v| (None, v)).collect(),
        Value::Null => return Ok(Vec::new()),
        other => return Err(CatalogError::Malformed(format!("products is {other}"))),
    };

    Ok(entries
        .into_iter()
        .filter_map(|(key, product)| {
            let id = text(product, "idNhanh")
                .or_else(|| text(product, "id"))
                .or_else(|| key.cloned())?;
            Some(WarehouseProduct {
                id: WarehouseId::new(id),
                code: text(product, "code").unwrap_or_default(),
                name: text(product, "name").unwrap_or_default(),
            })
        })
        .collect())
}
