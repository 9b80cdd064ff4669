use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        Breadcrumbs, CatalogueCategory, CatalogueCategoryId, CatalogueItem, CatalogueItemId,
        Item, ItemId, Manufacturer, ManufacturerId, SparesDefinition, System, SystemId, Unit,
        UnitId, UsageStatus, UsageStatusId,
    },
    protocol::{
        CatalogueCategoryPatch, CatalogueCategoryPost, CatalogueItemPatch, CatalogueItemPost,
        ItemPatch, ItemPost, ManufacturerPatch, ManufacturerPost, SparesDefinitionPut,
        SystemPatch, SystemPost, ValuePost,
    },
};
use tracing::{debug, info, warn};
use url::{form_urlencoded, Url};

pub mod api;
pub mod batch;
pub mod cache;
pub mod error;
pub mod tree;

pub use api::{
    ApiResult, CatalogueCategoryApi, CatalogueItemApi, ItemApi, ItemFilter, ManufacturerApi,
    SettingsApi, SystemApi, UnitApi, UsageStatusApi,
};
pub use cache::QueryCache;
pub use error::{surface_for, ClientError, EntityKind, ErrorSurface};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CATALOGUE_CATEGORIES: &str = "/v1/catalogue-categories";
const CATALOGUE_ITEMS: &str = "/v1/catalogue-items";
const ITEMS: &str = "/v1/items";
const SYSTEMS: &str = "/v1/systems";
const MANUFACTURERS: &str = "/v1/manufacturers";
const UNITS: &str = "/v1/units";
const USAGE_STATUSES: &str = "/v1/usage-statuses";
const SETTINGS: &str = "/v1/settings";
const SPARES_DEFINITION: &str = "/v1/settings/spares_definition";

/// The API reads the literal `null` as "top level".
const ROOT_PARENT: &str = "null";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_ttl: cache::DEFAULT_CACHE_TTL,
        }
    }
}

pub struct InventoryClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
    cache: QueryCache,
}

impl InventoryClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_options(ClientOptions::new(base_url))
    }

    pub fn with_options(options: ClientOptions) -> ApiResult<Self> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidInput(format!(
                "api url must use http or https: {base_url}"
            )));
        }

        let http = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_token: options.api_token.filter(|t| !t.trim().is_empty()),
            cache: QueryCache::new(options.cache_ttl),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.authorize(request).send().await?;
        read_json(response).await
    }

    async fn query<T>(&self, path: &str, params: &[(&str, &str)]) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let key = cache_key(path, params);
        self.cache
            .get_or_fetch(&key, || {
                debug!(key = %key, "api: fetching");
                self.fetch(self.http.get(self.url(path)).query(params))
            })
            .await
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        invalidates: &[&str],
    ) -> ApiResult<T> {
        let result = self.fetch(request).await?;
        self.invalidate(invalidates).await;
        Ok(result)
    }

    async fn remove(&self, path: &str, invalidates: &[&str]) -> ApiResult<()> {
        let response = self
            .authorize(self.http.delete(self.url(path)))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            warn!(status = status.as_u16(), path, "api: delete rejected");
            return Err(ClientError::api(status.as_u16(), &body));
        }
        info!(path, "api: deleted");
        self.invalidate(invalidates).await;
        Ok(())
    }

    async fn invalidate(&self, prefixes: &[&str]) {
        for prefix in prefixes {
            self.cache.invalidate_prefix(prefix).await;
        }
    }
}

fn cache_key(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = response.text().await?;
    if !status.is_success() {
        warn!(status = status.as_u16(), path = %url, "api: request failed");
        return Err(ClientError::api(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl CatalogueCategoryApi for InventoryClient {
    async fn list_catalogue_categories(
        &self,
        parent_id: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueCategory>> {
        let parent = parent_id.map(|id| id.as_str()).unwrap_or(ROOT_PARENT);
        self.query(CATALOGUE_CATEGORIES, &[("parent_id", parent)])
            .await
    }

    async fn get_catalogue_category(
        &self,
        id: &CatalogueCategoryId,
    ) -> ApiResult<CatalogueCategory> {
        self.query(&format!("{CATALOGUE_CATEGORIES}/{id}"), &[]).await
    }

    async fn catalogue_category_breadcrumbs(
        &self,
        id: &CatalogueCategoryId,
    ) -> ApiResult<Breadcrumbs> {
        self.query(&format!("{CATALOGUE_CATEGORIES}/{id}/breadcrumbs"), &[])
            .await
    }

    async fn create_catalogue_category(
        &self,
        body: &CatalogueCategoryPost,
    ) -> ApiResult<CatalogueCategory> {
        let created: CatalogueCategory = self
            .mutate(
                self.http.post(self.url(CATALOGUE_CATEGORIES)).json(body),
                &[CATALOGUE_CATEGORIES],
            )
            .await?;
        info!(catalogue_category_id = %created.id, name = %created.name, "api: catalogue category created");
        Ok(created)
    }

    async fn update_catalogue_category(
        &self,
        id: &CatalogueCategoryId,
        body: &CatalogueCategoryPatch,
    ) -> ApiResult<CatalogueCategory> {
        let updated: CatalogueCategory = self
            .mutate(
                self.http
                    .patch(self.url(&format!("{CATALOGUE_CATEGORIES}/{id}")))
                    .json(body),
                &[CATALOGUE_CATEGORIES],
            )
            .await?;
        info!(catalogue_category_id = %updated.id, "api: catalogue category updated");
        Ok(updated)
    }

    async fn delete_catalogue_category(&self, id: &CatalogueCategoryId) -> ApiResult<()> {
        self.remove(
            &format!("{CATALOGUE_CATEGORIES}/{id}"),
            &[CATALOGUE_CATEGORIES],
        )
        .await
    }
}

#[async_trait]
impl CatalogueItemApi for InventoryClient {
    async fn list_catalogue_items(
        &self,
        catalogue_category_id: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueItem>> {
        match catalogue_category_id {
            Some(id) => {
                self.query(
                    CATALOGUE_ITEMS,
                    &[("catalogue_category_id", id.as_str())],
                )
                .await
            }
            None => self.query(CATALOGUE_ITEMS, &[]).await,
        }
    }

    async fn get_catalogue_item(&self, id: &CatalogueItemId) -> ApiResult<CatalogueItem> {
        self.query(&format!("{CATALOGUE_ITEMS}/{id}"), &[]).await
    }

    async fn create_catalogue_item(&self, body: &CatalogueItemPost) -> ApiResult<CatalogueItem> {
        let created: CatalogueItem = self
            .mutate(
                self.http.post(self.url(CATALOGUE_ITEMS)).json(body),
                &[CATALOGUE_ITEMS],
            )
            .await?;
        info!(catalogue_item_id = %created.id, name = %created.name, "api: catalogue item created");
        Ok(created)
    }

    async fn update_catalogue_item(
        &self,
        id: &CatalogueItemId,
        body: &CatalogueItemPatch,
    ) -> ApiResult<CatalogueItem> {
        self.mutate(
            self.http
                .patch(self.url(&format!("{CATALOGUE_ITEMS}/{id}")))
                .json(body),
            &[CATALOGUE_ITEMS],
        )
        .await
    }

    async fn delete_catalogue_item(&self, id: &CatalogueItemId) -> ApiResult<()> {
        self.remove(&format!("{CATALOGUE_ITEMS}/{id}"), &[CATALOGUE_ITEMS])
            .await
    }
}

#[async_trait]
impl SystemApi for InventoryClient {
    async fn list_systems(&self, parent_id: Option<&SystemId>) -> ApiResult<Vec<System>> {
        let parent = parent_id.map(|id| id.as_str()).unwrap_or(ROOT_PARENT);
        self.query(SYSTEMS, &[("parent_id", parent)]).await
    }

    async fn get_system(&self, id: &SystemId) -> ApiResult<System> {
        self.query(&format!("{SYSTEMS}/{id}"), &[]).await
    }

    async fn system_breadcrumbs(&self, id: &SystemId) -> ApiResult<Breadcrumbs> {
        self.query(&format!("{SYSTEMS}/{id}/breadcrumbs"), &[]).await
    }

    async fn create_system(&self, body: &SystemPost) -> ApiResult<System> {
        let created: System = self
            .mutate(self.http.post(self.url(SYSTEMS)).json(body), &[SYSTEMS])
            .await?;
        info!(system_id = %created.id, name = %created.name, "api: system created");
        Ok(created)
    }

    async fn update_system(&self, id: &SystemId, body: &SystemPatch) -> ApiResult<System> {
        self.mutate(
            self.http
                .patch(self.url(&format!("{SYSTEMS}/{id}")))
                .json(body),
            &[SYSTEMS],
        )
        .await
    }

    async fn delete_system(&self, id: &SystemId) -> ApiResult<()> {
        self.remove(&format!("{SYSTEMS}/{id}"), &[SYSTEMS]).await
    }
}

#[async_trait]
impl ItemApi for InventoryClient {
    async fn list_items(&self, filter: &ItemFilter) -> ApiResult<Vec<Item>> {
        let mut params = Vec::new();
        if let Some(system_id) = &filter.system_id {
            params.push(("system_id", system_id.as_str()));
        }
        if let Some(catalogue_item_id) = &filter.catalogue_item_id {
            params.push(("catalogue_item_id", catalogue_item_id.as_str()));
        }
        self.query(ITEMS, &params).await
    }

    async fn get_item(&self, id: &ItemId) -> ApiResult<Item> {
        self.query(&format!("{ITEMS}/{id}"), &[]).await
    }

    async fn create_item(&self, body: &ItemPost) -> ApiResult<Item> {
        let created: Item = self
            .mutate(self.http.post(self.url(ITEMS)).json(body), &[ITEMS])
            .await?;
        info!(item_id = %created.id, "api: item created");
        Ok(created)
    }

    async fn update_item(&self, id: &ItemId, body: &ItemPatch) -> ApiResult<Item> {
        self.mutate(
            self.http.patch(self.url(&format!("{ITEMS}/{id}"))).json(body),
            &[ITEMS],
        )
        .await
    }

    async fn delete_item(&self, id: &ItemId) -> ApiResult<()> {
        self.remove(&format!("{ITEMS}/{id}"), &[ITEMS]).await
    }
}

#[async_trait]
impl ManufacturerApi for InventoryClient {
    async fn list_manufacturers(&self) -> ApiResult<Vec<Manufacturer>> {
        self.query(MANUFACTURERS, &[]).await
    }

    async fn get_manufacturer(&self, id: &ManufacturerId) -> ApiResult<Manufacturer> {
        self.query(&format!("{MANUFACTURERS}/{id}"), &[]).await
    }

    async fn create_manufacturer(&self, body: &ManufacturerPost) -> ApiResult<Manufacturer> {
        let created: Manufacturer = self
            .mutate(
                self.http.post(self.url(MANUFACTURERS)).json(body),
                &[MANUFACTURERS],
            )
            .await?;
        info!(manufacturer_id = %created.id, name = %created.name, "api: manufacturer created");
        Ok(created)
    }

    async fn update_manufacturer(
        &self,
        id: &ManufacturerId,
        body: &ManufacturerPatch,
    ) -> ApiResult<Manufacturer> {
        self.mutate(
            self.http
                .patch(self.url(&format!("{MANUFACTURERS}/{id}")))
                .json(body),
            &[MANUFACTURERS],
        )
        .await
    }

    async fn delete_manufacturer(&self, id: &ManufacturerId) -> ApiResult<()> {
        self.remove(&format!("{MANUFACTURERS}/{id}"), &[MANUFACTURERS])
            .await
    }
}

#[async_trait]
impl UnitApi for InventoryClient {
    async fn list_units(&self) -> ApiResult<Vec<Unit>> {
        self.query(UNITS, &[]).await
    }

    async fn create_unit(&self, body: &ValuePost) -> ApiResult<Unit> {
        self.mutate(self.http.post(self.url(UNITS)).json(body), &[UNITS])
            .await
    }

    async fn delete_unit(&self, id: &UnitId) -> ApiResult<()> {
        self.remove(&format!("{UNITS}/{id}"), &[UNITS]).await
    }
}

#[async_trait]
impl UsageStatusApi for InventoryClient {
    async fn list_usage_statuses(&self) -> ApiResult<Vec<UsageStatus>> {
        self.query(USAGE_STATUSES, &[]).await
    }

    async fn create_usage_status(&self, body: &ValuePost) -> ApiResult<UsageStatus> {
        self.mutate(
            self.http.post(self.url(USAGE_STATUSES)).json(body),
            &[USAGE_STATUSES],
        )
        .await
    }

    async fn delete_usage_status(&self, id: &UsageStatusId) -> ApiResult<()> {
        self.remove(
            &format!("{USAGE_STATUSES}/{id}"),
            &[USAGE_STATUSES, SETTINGS],
        )
        .await
    }
}

#[async_trait]
impl SettingsApi for InventoryClient {
    async fn get_spares_definition(&self) -> ApiResult<SparesDefinition> {
        self.query(SPARES_DEFINITION, &[]).await
    }

    async fn update_spares_definition(
        &self,
        body: &SparesDefinitionPut,
    ) -> ApiResult<SparesDefinition> {
        let updated: SparesDefinition = self
            .mutate(
                self.http.put(self.url(SPARES_DEFINITION)).json(body),
                &[SETTINGS],
            )
            .await?;
        info!(
            usage_statuses = updated.usage_statuses.len(),
            "api: spares definition updated"
        );
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "tests/fake_inventory.rs"]
pub(crate) mod fake_inventory;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
