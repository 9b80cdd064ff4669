//! Resource traits implemented by [`crate::InventoryClient`]. Batch
//! operations depend on these rather than the concrete client.

use async_trait::async_trait;
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

use crate::error::ClientError;

pub type ApiResult<T> = Result<T, ClientError>;

#[async_trait]
pub trait CatalogueCategoryApi: Send + Sync {
    /// Children of `parent_id`, or the top level when `None`.
    async fn list_catalogue_categories(
        &self,
        parent_id: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueCategory>>;
    async fn get_catalogue_category(&self, id: &CatalogueCategoryId)
        -> ApiResult<CatalogueCategory>;
    async fn catalogue_category_breadcrumbs(
        &self,
        id: &CatalogueCategoryId,
    ) -> ApiResult<Breadcrumbs>;
    async fn create_catalogue_category(
        &self,
        body: &CatalogueCategoryPost,
    ) -> ApiResult<CatalogueCategory>;
    async fn update_catalogue_category(
        &self,
        id: &CatalogueCategoryId,
        body: &CatalogueCategoryPatch,
    ) -> ApiResult<CatalogueCategory>;
    async fn delete_catalogue_category(&self, id: &CatalogueCategoryId) -> ApiResult<()>;
}

#[async_trait]
pub trait CatalogueItemApi: Send + Sync {
    async fn list_catalogue_items(
        &self,
        catalogue_category_id: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueItem>>;
    async fn get_catalogue_item(&self, id: &CatalogueItemId) -> ApiResult<CatalogueItem>;
    async fn create_catalogue_item(&self, body: &CatalogueItemPost) -> ApiResult<CatalogueItem>;
    async fn update_catalogue_item(
        &self,
        id: &CatalogueItemId,
        body: &CatalogueItemPatch,
    ) -> ApiResult<CatalogueItem>;
    async fn delete_catalogue_item(&self, id: &CatalogueItemId) -> ApiResult<()>;
}

#[async_trait]
pub trait SystemApi: Send + Sync {
    async fn list_systems(&self, parent_id: Option<&SystemId>) -> ApiResult<Vec<System>>;
    async fn get_system(&self, id: &SystemId) -> ApiResult<System>;
    async fn system_breadcrumbs(&self, id: &SystemId) -> ApiResult<Breadcrumbs>;
    async fn create_system(&self, body: &SystemPost) -> ApiResult<System>;
    async fn update_system(&self, id: &SystemId, body: &SystemPatch) -> ApiResult<System>;
    async fn delete_system(&self, id: &SystemId) -> ApiResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub system_id: Option<SystemId>,
    pub catalogue_item_id: Option<CatalogueItemId>,
}

#[async_trait]
pub trait ItemApi: Send + Sync {
    async fn list_items(&self, filter: &ItemFilter) -> ApiResult<Vec<Item>>;
    async fn get_item(&self, id: &ItemId) -> ApiResult<Item>;
    async fn create_item(&self, body: &ItemPost) -> ApiResult<Item>;
    async fn update_item(&self, id: &ItemId, body: &ItemPatch) -> ApiResult<Item>;
    async fn delete_item(&self, id: &ItemId) -> ApiResult<()>;
}

#[async_trait]
pub trait ManufacturerApi: Send + Sync {
    async fn list_manufacturers(&self) -> ApiResult<Vec<Manufacturer>>;
    async fn get_manufacturer(&self, id: &ManufacturerId) -> ApiResult<Manufacturer>;
    async fn create_manufacturer(&self, body: &ManufacturerPost) -> ApiResult<Manufacturer>;
    async fn update_manufacturer(
        &self,
        id: &ManufacturerId,
        body: &ManufacturerPatch,
    ) -> ApiResult<Manufacturer>;
    async fn delete_manufacturer(&self, id: &ManufacturerId) -> ApiResult<()>;
}

#[async_trait]
pub trait UnitApi: Send + Sync {
    async fn list_units(&self) -> ApiResult<Vec<Unit>>;
    async fn create_unit(&self, body: &ValuePost) -> ApiResult<Unit>;
    async fn delete_unit(&self, id: &UnitId) -> ApiResult<()>;
}

#[async_trait]
pub trait UsageStatusApi: Send + Sync {
    async fn list_usage_statuses(&self) -> ApiResult<Vec<UsageStatus>>;
    async fn create_usage_status(&self, body: &ValuePost) -> ApiResult<UsageStatus>;
    async fn delete_usage_status(&self, id: &UsageStatusId) -> ApiResult<()>;
}

#[async_trait]
pub trait SettingsApi: Send + Sync {
    async fn get_spares_definition(&self) -> ApiResult<SparesDefinition>;
    async fn update_spares_definition(
        &self,
        body: &SparesDefinitionPut,
    ) -> ApiResult<SparesDefinition>;
}
