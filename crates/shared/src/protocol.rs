use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    Address, AllowedValues, CatalogueCategory, CatalogueCategoryId, CatalogueItem,
    CatalogueItemId, Item, ManufacturerId, PropertyId, PropertyType, PropertyValue, System,
    SystemId, SystemImportance, UnitId, UsageStatusId,
};

/// Keeps an explicit `null` distinct from an absent field in PATCH bodies.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Body of every non-2xx response. `detail` is a string for most errors and
/// a list of field errors for 422 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: serde_json::Value,
}

impl ErrorDetail {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(entries) => entries
                .iter()
                .map(|entry| {
                    entry
                        .get("msg")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| entry.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCategoryPropertyPost {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<UnitId>,
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<AllowedValues>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCategoryPost {
    pub name: String,
    pub is_leaf: bool,
    #[serde(default)]
    pub parent_id: Option<CatalogueCategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<CatalogueCategoryPropertyPost>>,
}

impl CatalogueCategoryPost {
    /// Payload that recreates `category` under another parent and name.
    pub fn copy_of(
        category: &CatalogueCategory,
        name: impl Into<String>,
        parent_id: Option<CatalogueCategoryId>,
    ) -> Self {
        let properties = category.is_leaf.then(|| {
            category
                .properties
                .iter()
                .map(|p| CatalogueCategoryPropertyPost {
                    name: p.name.clone(),
                    property_type: p.property_type,
                    unit_id: p.unit_id.clone(),
                    mandatory: p.mandatory,
                    allowed_values: p.allowed_values.clone(),
                })
                .collect()
        });
        Self {
            name: name.into(),
            is_leaf: category.is_leaf,
            parent_id,
            properties,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<CatalogueCategoryId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_leaf: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<CatalogueCategoryPropertyPost>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPost {
    pub id: PropertyId,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueItemPost {
    pub catalogue_category_id: CatalogueCategoryId,
    pub manufacturer_id: ManufacturerId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub cost_gbp: f64,
    #[serde(default)]
    pub cost_to_rework_gbp: Option<f64>,
    pub days_to_replace: f64,
    #[serde(default)]
    pub days_to_rework: Option<f64>,
    #[serde(default)]
    pub expected_lifetime_days: Option<f64>,
    #[serde(default)]
    pub drawing_number: Option<String>,
    #[serde(default)]
    pub drawing_link: Option<String>,
    #[serde(default)]
    pub item_model_number: Option<String>,
    #[serde(default)]
    pub is_obsolete: bool,
    #[serde(default)]
    pub obsolete_reason: Option<String>,
    #[serde(default)]
    pub obsolete_replacement_catalogue_item_id: Option<CatalogueItemId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyPost>,
}

impl CatalogueItemPost {
    pub fn copy_of(
        item: &CatalogueItem,
        name: impl Into<String>,
        catalogue_category_id: CatalogueCategoryId,
        properties: Vec<PropertyPost>,
    ) -> Self {
        Self {
            catalogue_category_id,
            manufacturer_id: item.manufacturer_id.clone(),
            name: name.into(),
            description: item.description.clone(),
            cost_gbp: item.cost_gbp,
            cost_to_rework_gbp: item.cost_to_rework_gbp,
            days_to_replace: item.days_to_replace,
            days_to_rework: item.days_to_rework,
            expected_lifetime_days: item.expected_lifetime_days,
            drawing_number: item.drawing_number.clone(),
            drawing_link: item.drawing_link.clone(),
            item_model_number: item.item_model_number.clone(),
            is_obsolete: item.is_obsolete,
            obsolete_reason: item.obsolete_reason.clone(),
            obsolete_replacement_catalogue_item_id: item
                .obsolete_replacement_catalogue_item_id
                .clone(),
            notes: item.notes.clone(),
            properties,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_category_id: Option<CatalogueCategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<ManufacturerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<PropertyPost>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_obsolete: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub obsolete_reason: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub obsolete_replacement_catalogue_item_id: Option<Option<CatalogueItemId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPost {
    pub catalogue_item_id: CatalogueItemId,
    pub system_id: SystemId,
    pub usage_status_id: UsageStatusId,
    #[serde(default)]
    pub purchase_order_number: Option<String>,
    #[serde(default)]
    pub is_defective: bool,
    #[serde(default)]
    pub warranty_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub asset_number: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub delivered_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyPost>,
}

impl From<&Item> for ItemPost {
    fn from(item: &Item) -> Self {
        Self {
            catalogue_item_id: item.catalogue_item_id.clone(),
            system_id: item.system_id.clone(),
            usage_status_id: item.usage_status_id.clone(),
            purchase_order_number: item.purchase_order_number.clone(),
            is_defective: item.is_defective,
            warranty_end_date: item.warranty_end_date,
            asset_number: item.asset_number.clone(),
            serial_number: item.serial_number.clone(),
            delivered_date: item.delivered_date,
            notes: item.notes.clone(),
            properties: item
                .properties
                .iter()
                .map(|p| PropertyPost {
                    id: p.id.clone(),
                    value: p.value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<SystemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_status_id: Option<UsageStatusId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_defective: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPost {
    #[serde(default)]
    pub parent_id: Option<SystemId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    pub importance: SystemImportance,
}

impl SystemPost {
    pub fn copy_of(system: &System, name: impl Into<String>, parent_id: Option<SystemId>) -> Self {
        Self {
            parent_id,
            name: name.into(),
            description: system.description.clone(),
            location: system.location.clone(),
            owner: system.owner.clone(),
            importance: system.importance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<SystemId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerPost {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub telephone: Option<Option<String>>,
}

/// Body shared by unit and usage-status creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuePost {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: UsageStatusId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparesDefinitionPut {
    pub usage_statuses: Vec<IdRef>,
}

impl SparesDefinitionPut {
    pub fn new(ids: impl IntoIterator<Item = UsageStatusId>) -> Self {
        Self {
            usage_statuses: ids.into_iter().map(|id| IdRef { id }).collect(),
        }
    }
}
