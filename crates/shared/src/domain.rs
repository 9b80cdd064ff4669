use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(CatalogueCategoryId);
id_newtype!(CatalogueItemId);
id_newtype!(ItemId);
id_newtype!(SystemId);
id_newtype!(ManufacturerId);
id_newtype!(UnitId);
id_newtype!(UsageStatusId);
id_newtype!(PropertyId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

/// A single property value as the API transmits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn property_type(&self) -> Option<PropertyType> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::Boolean(_) => Some(PropertyType::Boolean),
            PropertyValue::Number(_) => Some(PropertyType::Number),
            PropertyValue::String(_) => Some(PropertyType::String),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("None"),
            PropertyValue::Boolean(true) => f.write_str("Yes"),
            PropertyValue::Boolean(false) => f.write_str("No"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllowedValues {
    List { values: Vec<PropertyValue> },
}

impl AllowedValues {
    pub fn values(&self) -> &[PropertyValue] {
        match self {
            AllowedValues::List { values } => values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCategoryProperty {
    pub id: PropertyId,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<AllowedValues>,
}

impl CatalogueCategoryProperty {
    /// Two definitions describe the same field when everything but the id matches.
    pub fn is_equivalent_to(&self, other: &CatalogueCategoryProperty) -> bool {
        self.name == other.name
            && self.property_type == other.property_type
            && self.unit_id == other.unit_id
            && self.mandatory == other.mandatory
            && self.allowed_values == other.allowed_values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCategory {
    pub id: CatalogueCategoryId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub is_leaf: bool,
    #[serde(default)]
    pub parent_id: Option<CatalogueCategoryId>,
    #[serde(default)]
    pub properties: Vec<CatalogueCategoryProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub value: PropertyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueItem {
    pub id: CatalogueItemId,
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
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub catalogue_item_id: CatalogueItemId,
    pub system_id: SystemId,
    #[serde(default)]
    pub purchase_order_number: Option<String>,
    #[serde(default)]
    pub is_defective: bool,
    pub usage_status_id: UsageStatusId,
    #[serde(default)]
    pub usage_status: Option<String>,
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
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemImportance {
    Low,
    Medium,
    High,
}

impl fmt::Display for SystemImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemImportance::Low => f.write_str("low"),
            SystemImportance::Medium => f.write_str("medium"),
            SystemImportance::High => f.write_str("high"),
        }
    }
}

impl std::str::FromStr for SystemImportance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(SystemImportance::Low),
            "medium" => Ok(SystemImportance::Medium),
            "high" => Ok(SystemImportance::High),
            other => Err(format!("unknown importance '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub id: SystemId,
    #[serde(default)]
    pub parent_id: Option<SystemId>,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    pub importance: SystemImportance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_line: String,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    pub postcode: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub url: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub value: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub id: UsageStatusId,
    pub value: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparesDefinition {
    pub usage_statuses: Vec<UsageStatus>,
}

impl SparesDefinition {
    pub fn is_spare(&self, usage_status_id: &UsageStatusId) -> bool {
        self.usage_statuses.iter().any(|s| &s.id == usage_status_id)
    }
}

/// Trail from the root to a category or system. `full_trail` is false when
/// the server truncated the head of the trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumbs {
    pub trail: Vec<(String, String)>,
    pub full_trail: bool,
}

impl Breadcrumbs {
    pub fn contains_id(&self, id: &str) -> bool {
        self.trail.iter().any(|(crumb_id, _)| crumb_id == id)
    }
}
