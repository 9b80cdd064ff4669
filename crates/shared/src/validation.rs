//! Field validators and per-entity form validation.
//!
//! Each field validator maps raw user input to a normalized value or a
//! user-facing message. Form validators run every field, collect all the
//! messages into [`FormErrors`] and only produce a request body when the
//! whole form is valid.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;
use url::Url;

use crate::domain::{
    Address, CatalogueCategoryId, CatalogueCategoryProperty, CatalogueItemId, ManufacturerId,
    PropertyType, PropertyValue, SystemId, SystemImportance, UnitId, UsageStatusId,
};
use crate::properties::{FieldDescriptor, PropertyInput};
use crate::protocol::{
    CatalogueCategoryPost, CatalogueCategoryPropertyPost, CatalogueItemPost, ItemPost,
    ManufacturerPost, PropertyPost, SystemPost, ValuePost,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Day-first form used in messages and accepted alongside `DATE_FORMAT`.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn max_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FieldError(pub String);

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type FieldResult<T> = Result<T, FieldError>;

pub fn required_string(raw: &str, message: &str) -> FieldResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(message));
    }
    Ok(trimmed.to_string())
}

pub fn optional_string(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn optional_url(raw: &str) -> FieldResult<Option<String>> {
    let Some(trimmed) = optional_string(raw) else {
        return Ok(None);
    };
    match Url::parse(&trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Ok(Some(trimmed))
        }
        _ => Err(FieldError::new(
            "Please enter a valid URL. Only 'http' and 'https' links with typical top-level domain are accepted.",
        )),
    }
}

/// Parses an optional `dd/mm/yyyy` or `YYYY-MM-DD` date and checks it lies
/// in `[min, max]`.
pub fn date_in_range(raw: &str, min: NaiveDate, max: NaiveDate) -> FieldResult<Option<NaiveDate>> {
    let Some(trimmed) = optional_string(raw) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(&trimmed, DISPLAY_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(&trimmed, DATE_FORMAT))
        .map_err(|_| FieldError::new("Date format: dd/mm/yyyy"))?;
    if date < min || date > max {
        return Err(FieldError::new(format!(
            "Date must be between {} and {}.",
            min.format(DISPLAY_DATE_FORMAT),
            max.format(DISPLAY_DATE_FORMAT)
        )));
    }
    Ok(Some(date))
}

pub fn required_number(raw: &str, required_message: &str) -> FieldResult<f64> {
    let trimmed = required_string(raw, required_message)?;
    parse_number(&trimmed)
}

pub fn optional_number(raw: &str) -> FieldResult<Option<f64>> {
    optional_string(raw).map(|s| parse_number(&s)).transpose()
}

fn parse_number(raw: &str) -> FieldResult<f64> {
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(FieldError::new("Please enter a valid number.")),
    }
}

/// Whole, non-negative day counts.
pub fn optional_days(raw: &str) -> FieldResult<Option<f64>> {
    let Some(n) = optional_number(raw)? else {
        return Ok(None);
    };
    if n < 0.0 || n.fract() != 0.0 {
        return Err(FieldError::new("Please enter a whole number of days."));
    }
    Ok(Some(n))
}

/// Three-way choice for boolean fields; `Unset` is the blank selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    Unset,
    True,
    False,
}

impl TriState {
    pub fn parse(raw: &str) -> FieldResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(TriState::Unset),
            "true" | "yes" => Ok(TriState::True),
            "false" | "no" => Ok(TriState::False),
            _ => Err(FieldError::new("Please select either True or False.")),
        }
    }
}

pub fn required_choice(choice: TriState) -> FieldResult<bool> {
    match choice {
        TriState::True => Ok(true),
        TriState::False => Ok(false),
        TriState::Unset => Err(FieldError::new("Please select either True or False.")),
    }
}

pub fn optional_choice(choice: TriState) -> Option<bool> {
    match choice {
        TriState::True => Some(true),
        TriState::False => Some(false),
        TriState::Unset => None,
    }
}

/// Field-keyed messages for a form. Keys are API field names, with
/// `properties[<index>]` for per-property entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.0))]
pub struct FormErrors(pub BTreeMap<String, String>);

fn summarize(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn take<T>(&mut self, field: &str, result: FieldResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.insert(field, err.0);
                None
            }
        }
    }

    fn into_result<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, FormErrors> {
        if !self.is_empty() {
            return Err(self);
        }
        build().ok_or(self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManufacturerForm {
    pub name: String,
    pub url: String,
    pub address_line: String,
    pub town: String,
    pub county: String,
    pub postcode: String,
    pub country: String,
    pub telephone: String,
}

impl ManufacturerForm {
    pub fn validate(&self) -> Result<ManufacturerPost, FormErrors> {
        let mut errors = FormErrors::default();
        let name = errors.take("name", required_string(&self.name, "Please enter a name."));
        let url = errors.take("url", optional_url(&self.url));
        let address_line = errors.take(
            "address.address_line",
            required_string(&self.address_line, "Please enter an address."),
        );
        let postcode = errors.take(
            "address.postcode",
            required_string(&self.postcode, "Please enter a post code or zip code."),
        );
        let country = errors.take(
            "address.country",
            required_string(&self.country, "Please enter a country."),
        );

        errors.into_result(|| {
            Some(ManufacturerPost {
                name: name?,
                url: url?,
                address: Address {
                    address_line: address_line?,
                    town: optional_string(&self.town),
                    county: optional_string(&self.county),
                    postcode: postcode?,
                    country: country?,
                },
                telephone: optional_string(&self.telephone),
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDefinitionForm {
    pub name: String,
    pub property_type: PropertyType,
    pub unit_id: Option<UnitId>,
    pub mandatory: bool,
    /// Raw allowed-value entries; `None` means any value is accepted.
    pub allowed_values: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct CatalogueCategoryForm {
    pub name: String,
    pub parent_id: Option<CatalogueCategoryId>,
    pub is_leaf: bool,
    pub properties: Vec<PropertyDefinitionForm>,
}

impl CatalogueCategoryForm {
    pub fn validate(&self) -> Result<CatalogueCategoryPost, FormErrors> {
        let mut errors = FormErrors::default();
        let name = errors.take("name", required_string(&self.name, "Please enter a name."));

        let mut properties = Vec::with_capacity(self.properties.len());
        if self.is_leaf {
            let mut seen = std::collections::HashSet::new();
            for (index, form) in self.properties.iter().enumerate() {
                let key = format!("properties[{index}]");
                match validate_property_definition(form) {
                    Ok(post) => {
                        if !seen.insert(post.name.to_lowercase()) {
                            errors.insert(
                                format!("{key}.name"),
                                "Duplicate property name. Please change the name or remove the property.",
                            );
                        }
                        properties.push(post);
                    }
                    Err((field, message)) => errors.insert(format!("{key}.{field}"), message),
                }
            }
        } else if !self.properties.is_empty() {
            errors.insert(
                "properties",
                "Only leaf catalogue categories can define properties.",
            );
        }

        errors.into_result(|| {
            Some(CatalogueCategoryPost {
                name: name?,
                is_leaf: self.is_leaf,
                parent_id: self.parent_id.clone(),
                properties: self.is_leaf.then_some(properties),
            })
        })
    }
}

fn validate_property_definition(
    form: &PropertyDefinitionForm,
) -> Result<CatalogueCategoryPropertyPost, (&'static str, String)> {
    let name = required_string(&form.name, "Please enter a property name.")
        .map_err(|e| ("name", e.0))?;

    let allowed_values = match &form.allowed_values {
        None => None,
        Some(_) if form.property_type == PropertyType::Boolean => {
            return Err((
                "allowed_values",
                "Boolean properties cannot restrict allowed values.".to_string(),
            ));
        }
        Some(raw_values) => {
            if raw_values.is_empty() {
                return Err((
                    "allowed_values",
                    "Please create a valid list item or remove the allowed values list.".into(),
                ));
            }
            let mut values = Vec::with_capacity(raw_values.len());
            for raw in raw_values {
                let trimmed = required_string(raw, "Please enter a value.")
                    .map_err(|e| ("allowed_values", e.0))?;
                let value = match form.property_type {
                    PropertyType::Number => PropertyValue::Number(
                        parse_number(&trimmed).map_err(|e| ("allowed_values", e.0))?,
                    ),
                    _ => PropertyValue::String(trimmed),
                };
                if values.contains(&value) {
                    return Err(("allowed_values", "Duplicate value.".to_string()));
                }
                values.push(value);
            }
            Some(crate::domain::AllowedValues::List { values })
        }
    };

    Ok(CatalogueCategoryPropertyPost {
        name,
        property_type: form.property_type,
        unit_id: form.unit_id.clone(),
        mandatory: form.mandatory,
        allowed_values,
    })
}

#[derive(Debug, Clone, Default)]
pub struct CatalogueItemForm {
    pub manufacturer_id: Option<ManufacturerId>,
    pub name: String,
    pub description: String,
    pub cost_gbp: String,
    pub cost_to_rework_gbp: String,
    pub days_to_replace: String,
    pub days_to_rework: String,
    pub expected_lifetime_days: String,
    pub drawing_number: String,
    pub drawing_link: String,
    pub item_model_number: String,
    pub is_obsolete: bool,
    pub obsolete_reason: String,
    pub obsolete_replacement_catalogue_item_id: Option<CatalogueItemId>,
    pub notes: String,
    /// Raw property inputs, positionally matching the category definitions.
    pub properties: Vec<String>,
}

impl CatalogueItemForm {
    pub fn validate(
        &self,
        catalogue_category_id: &CatalogueCategoryId,
        definitions: &[CatalogueCategoryProperty],
    ) -> Result<CatalogueItemPost, FormErrors> {
        let mut errors = FormErrors::default();
        let manufacturer_id = match &self.manufacturer_id {
            Some(id) => Some(id.clone()),
            None => {
                errors.insert("manufacturer_id", "Please choose a manufacturer.");
                None
            }
        };
        let name = errors.take("name", required_string(&self.name, "Please enter a name."));
        let cost_gbp = errors.take(
            "cost_gbp",
            required_number(&self.cost_gbp, "Please enter a cost."),
        );
        let cost_to_rework_gbp =
            errors.take("cost_to_rework_gbp", optional_number(&self.cost_to_rework_gbp));
        let days_to_replace = errors
            .take(
                "days_to_replace",
                required_string(&self.days_to_replace, "Please enter how many days it would take to replace.")
                    .and_then(|raw| optional_days(&raw)),
            )
            .flatten();
        let days_to_rework = errors.take("days_to_rework", optional_days(&self.days_to_rework));
        let expected_lifetime_days = errors.take(
            "expected_lifetime_days",
            optional_days(&self.expected_lifetime_days),
        );
        let drawing_link = errors.take("drawing_link", optional_url(&self.drawing_link));
        let properties = match validate_property_inputs(definitions, &self.properties) {
            Ok(properties) => Some(properties),
            Err(property_errors) => {
                errors.0.extend(property_errors.0);
                None
            }
        };

        errors.into_result(|| {
            Some(CatalogueItemPost {
                catalogue_category_id: catalogue_category_id.clone(),
                manufacturer_id: manufacturer_id?,
                name: name?,
                description: optional_string(&self.description),
                cost_gbp: cost_gbp?,
                cost_to_rework_gbp: cost_to_rework_gbp?,
                days_to_replace: days_to_replace?,
                days_to_rework: days_to_rework?,
                expected_lifetime_days: expected_lifetime_days?,
                drawing_number: optional_string(&self.drawing_number),
                drawing_link: drawing_link?,
                item_model_number: optional_string(&self.item_model_number),
                is_obsolete: self.is_obsolete,
                obsolete_reason: self
                    .is_obsolete
                    .then(|| optional_string(&self.obsolete_reason))
                    .flatten(),
                obsolete_replacement_catalogue_item_id: self
                    .is_obsolete
                    .then(|| self.obsolete_replacement_catalogue_item_id.clone())
                    .flatten(),
                notes: optional_string(&self.notes),
                properties: properties?,
            })
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    pub usage_status_id: Option<UsageStatusId>,
    pub purchase_order_number: String,
    pub is_defective: String,
    pub warranty_end_date: String,
    pub asset_number: String,
    pub serial_number: String,
    pub delivered_date: String,
    pub notes: String,
    pub properties: Vec<String>,
}

impl ItemForm {
    /// `today` bounds the delivered date from above.
    pub fn validate(
        &self,
        catalogue_item_id: &CatalogueItemId,
        system_id: &SystemId,
        definitions: &[CatalogueCategoryProperty],
        today: NaiveDate,
    ) -> Result<ItemPost, FormErrors> {
        let mut errors = FormErrors::default();
        let usage_status_id = match &self.usage_status_id {
            Some(id) => Some(id.clone()),
            None => {
                errors.insert("usage_status_id", "Please select a usage status.");
                None
            }
        };
        let is_defective = errors.take(
            "is_defective",
            TriState::parse(&self.is_defective).and_then(required_choice),
        );
        let warranty_end_date = errors.take(
            "warranty_end_date",
            date_in_range(&self.warranty_end_date, min_date(), max_date()),
        );
        let delivered_date = errors.take(
            "delivered_date",
            date_in_range(&self.delivered_date, min_date(), today.min(max_date())),
        );
        let properties = match validate_property_inputs(definitions, &self.properties) {
            Ok(properties) => Some(properties),
            Err(property_errors) => {
                errors.0.extend(property_errors.0);
                None
            }
        };

        errors.into_result(|| {
            Some(ItemPost {
                catalogue_item_id: catalogue_item_id.clone(),
                system_id: system_id.clone(),
                usage_status_id: usage_status_id?,
                purchase_order_number: optional_string(&self.purchase_order_number),
                is_defective: is_defective?,
                warranty_end_date: warranty_end_date?,
                asset_number: optional_string(&self.asset_number),
                serial_number: optional_string(&self.serial_number),
                delivered_date: delivered_date?,
                notes: optional_string(&self.notes),
                properties: properties?,
            })
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemForm {
    pub parent_id: Option<SystemId>,
    pub name: String,
    pub description: String,
    pub location: String,
    pub owner: String,
    pub importance: String,
}

impl SystemForm {
    pub fn validate(&self) -> Result<SystemPost, FormErrors> {
        let mut errors = FormErrors::default();
        let name = errors.take("name", required_string(&self.name, "Please enter a name."));
        let importance = if self.importance.trim().is_empty() {
            Some(SystemImportance::Medium)
        } else {
            errors.take(
                "importance",
                self.importance
                    .parse::<SystemImportance>()
                    .map_err(|_| FieldError::new("Please select low, medium or high.")),
            )
        };

        errors.into_result(|| {
            Some(SystemPost {
                parent_id: self.parent_id.clone(),
                name: name?,
                description: optional_string(&self.description),
                location: optional_string(&self.location),
                owner: optional_string(&self.owner),
                importance: importance?,
            })
        })
    }
}

/// Unit and usage-status forms both carry a single value.
pub fn validate_value_form(raw: &str) -> Result<ValuePost, FormErrors> {
    let mut errors = FormErrors::default();
    let value = errors.take("value", required_string(raw, "Please enter a value."));
    errors.into_result(|| Some(ValuePost { value: value? }))
}

/// Validates raw inputs against a category's property definitions.
pub fn validate_property_inputs(
    definitions: &[CatalogueCategoryProperty],
    inputs: &[String],
) -> Result<Vec<PropertyPost>, FormErrors> {
    let mut errors = FormErrors::default();
    let mut properties = Vec::with_capacity(definitions.len());

    for (index, definition) in definitions.iter().enumerate() {
        let descriptor = FieldDescriptor::from(definition);
        let raw = inputs.get(index).map(String::as_str).unwrap_or_default();
        match descriptor.validate(&PropertyInput::from_raw(raw)) {
            Ok(value) => properties.push(PropertyPost {
                id: definition.id.clone(),
                value,
            }),
            Err(err) => errors.insert(format!("properties[{index}]"), err.0),
        }
    }

    if errors.is_empty() {
        Ok(properties)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
