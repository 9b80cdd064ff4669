//! In-memory stand-in for the inventory API used by batch and tree tests.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use shared::{
    domain::{
        Breadcrumbs, CatalogueCategory, CatalogueCategoryId, CatalogueCategoryProperty,
        CatalogueItem, CatalogueItemId, Item, ItemId, ManufacturerId, Property, PropertyId,
        PropertyType, PropertyValue, System, SystemId, SystemImportance, UsageStatusId,
    },
    protocol::{
        CatalogueCategoryPatch, CatalogueCategoryPost, CatalogueItemPatch, CatalogueItemPost,
        ItemPatch, ItemPost, PropertyPost, SystemPatch, SystemPost,
    },
};
use tokio::sync::Mutex;

use crate::{
    api::{ApiResult, CatalogueCategoryApi, CatalogueItemApi, ItemApi, ItemFilter, SystemApi},
    error::ClientError,
};

/// Url-safe code the server derives from a name.
fn code_of(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[derive(Default)]
pub struct Store {
    pub categories: BTreeMap<String, CatalogueCategory>,
    pub catalogue_items: BTreeMap<String, CatalogueItem>,
    pub systems: BTreeMap<String, System>,
    pub items: BTreeMap<String, Item>,
    /// Names the server rejects as duplicates without listing them.
    pub hidden_names: HashSet<String>,
    /// Names whose next write fails with a 500.
    pub fail_once: HashSet<String>,
    pub writes: Vec<String>,
    /// Names turned away with a 409, in request order.
    pub conflicts: Vec<String>,
    next_id: u32,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-new-{}", self.next_id)
    }

    fn check_name(&mut self, name: &str, mut siblings: impl Iterator<Item = String>) -> ApiResult<()> {
        if self.fail_once.remove(name) {
            return Err(ClientError::api(500, r#"{"detail":"Something went wrong"}"#));
        }
        if self.hidden_names.contains(name) || siblings.any(|s| s == name) {
            self.conflicts.push(name.to_string());
            return Err(ClientError::api(
                409,
                r#"{"detail":"An entity with the same name already exists within the parent"}"#,
            ));
        }
        Ok(())
    }

    fn category_siblings(
        &self,
        parent: Option<&CatalogueCategoryId>,
        except: Option<&str>,
    ) -> Vec<String> {
        self.categories
            .values()
            .filter(|c| c.parent_id.as_ref() == parent && Some(c.id.as_str()) != except)
            .map(|c| c.name.clone())
            .collect()
    }

    fn system_siblings(&self, parent: Option<&SystemId>, except: Option<&str>) -> Vec<String> {
        self.systems
            .values()
            .filter(|s| s.parent_id.as_ref() == parent && Some(s.id.as_str()) != except)
            .map(|s| s.name.clone())
            .collect()
    }

    fn catalogue_item_siblings(
        &self,
        category: &CatalogueCategoryId,
        except: Option<&str>,
    ) -> Vec<String> {
        self.catalogue_items
            .values()
            .filter(|i| &i.catalogue_category_id == category && Some(i.id.as_str()) != except)
            .map(|i| i.name.clone())
            .collect()
    }

    fn resolve_properties(
        &self,
        category: &CatalogueCategoryId,
        posted: &[PropertyPost],
    ) -> ApiResult<Vec<Property>> {
        let definitions = self
            .categories
            .get(category.as_str())
            .ok_or_else(|| not_found("catalogue category"))?;
        posted
            .iter()
            .map(|p| {
                let definition = definitions
                    .properties
                    .iter()
                    .find(|d| d.id == p.id)
                    .ok_or_else(|| {
                        ClientError::api(422, r#"{"detail":"Unknown property id"}"#)
                    })?;
                Ok(Property {
                    id: p.id.clone(),
                    name: definition.name.clone(),
                    value: p.value.clone(),
                    unit: definition.unit.clone(),
                })
            })
            .collect()
    }
}

#[derive(Default)]
pub struct FakeInventory {
    pub store: Mutex<Store>,
}

pub fn not_found(what: &str) -> ClientError {
    ClientError::api(404, &format!(r#"{{"detail":"A {what} with such ID was not found"}}"#))
}

pub fn definition(id: &str, name: &str, property_type: PropertyType) -> CatalogueCategoryProperty {
    CatalogueCategoryProperty {
        id: PropertyId::new(id),
        name: name.to_string(),
        property_type,
        unit_id: None,
        unit: None,
        mandatory: false,
        allowed_values: None,
    }
}

pub fn category(
    id: &str,
    name: &str,
    parent: Option<&str>,
    is_leaf: bool,
    properties: Vec<CatalogueCategoryProperty>,
) -> CatalogueCategory {
    CatalogueCategory {
        id: CatalogueCategoryId::new(id),
        name: name.to_string(),
        code: code_of(name),
        is_leaf,
        parent_id: parent.map(CatalogueCategoryId::new),
        properties,
        created_time: None,
        modified_time: None,
    }
}

pub fn catalogue_item(
    id: &str,
    name: &str,
    category: &CatalogueCategory,
    values: Vec<PropertyValue>,
) -> CatalogueItem {
    let properties = category
        .properties
        .iter()
        .zip(values)
        .map(|(d, value)| Property {
            id: d.id.clone(),
            name: d.name.clone(),
            value,
            unit: d.unit.clone(),
        })
        .collect();
    CatalogueItem {
        id: CatalogueItemId::new(id),
        catalogue_category_id: category.id.clone(),
        manufacturer_id: ManufacturerId::new("man-1"),
        name: name.to_string(),
        description: None,
        cost_gbp: 1200.0,
        cost_to_rework_gbp: None,
        days_to_replace: 14.0,
        days_to_rework: None,
        expected_lifetime_days: None,
        drawing_number: None,
        drawing_link: None,
        item_model_number: None,
        is_obsolete: false,
        obsolete_reason: None,
        obsolete_replacement_catalogue_item_id: None,
        notes: None,
        properties,
        created_time: None,
        modified_time: None,
    }
}

pub fn system(id: &str, name: &str, parent: Option<&str>) -> System {
    System {
        id: SystemId::new(id),
        parent_id: parent.map(SystemId::new),
        name: name.to_string(),
        code: code_of(name),
        description: None,
        location: None,
        owner: None,
        importance: SystemImportance::Medium,
        created_time: None,
        modified_time: None,
    }
}

pub fn item(id: &str, serial: &str, system_id: &str) -> Item {
    Item {
        id: ItemId::new(id),
        catalogue_item_id: CatalogueItemId::new("ci-turbo-1"),
        system_id: SystemId::new(system_id),
        purchase_order_number: None,
        is_defective: false,
        usage_status_id: UsageStatusId::new("us-new"),
        usage_status: Some("New".to_string()),
        warranty_end_date: None,
        asset_number: None,
        serial_number: Some(serial.to_string()),
        delivered_date: None,
        notes: None,
        properties: Vec::new(),
        created_time: None,
        modified_time: None,
    }
}

impl FakeInventory {
    /// Catalogue used across tests:
    ///
    /// ```text
    /// Vacuum (cat-vacuum)
    ///   Pumps (cat-pumps)
    ///     [leaf] Turbo (cat-turbo): Pressure, Model
    ///   [leaf] Valves (cat-valves): Pressure, Model
    /// Spares (cat-spares)
    ///   [leaf] Pumps (cat-spare-pumps)
    /// [leaf] Gauges (cat-gauges): Range
    /// ```
    ///
    /// plus systems `Beamline > Optics` and `Storage`, and two items.
    pub async fn seeded() -> Self {
        let fake = Self::default();
        {
            let mut store = fake.store.lock().await;
            let turbo = category(
                "cat-turbo",
                "Turbo",
                Some("cat-pumps"),
                true,
                vec![
                    definition("prop-turbo-pressure", "Pressure", PropertyType::Number),
                    definition("prop-turbo-model", "Model", PropertyType::String),
                ],
            );
            let valves = category(
                "cat-valves",
                "Valves",
                Some("cat-vacuum"),
                true,
                vec![
                    definition("prop-valves-pressure", "Pressure", PropertyType::Number),
                    definition("prop-valves-model", "Model", PropertyType::String),
                ],
            );
            let gauges = category(
                "cat-gauges",
                "Gauges",
                None,
                true,
                vec![definition("prop-gauges-range", "Range", PropertyType::Number)],
            );
            let turbo_item = catalogue_item(
                "ci-turbo-1",
                "TP-100",
                &turbo,
                vec![
                    PropertyValue::Number(1e-9),
                    PropertyValue::String("HiPace".to_string()),
                ],
            );

            for c in [
                category("cat-vacuum", "Vacuum", None, false, Vec::new()),
                category("cat-pumps", "Pumps", Some("cat-vacuum"), false, Vec::new()),
                category("cat-spares", "Spares", None, false, Vec::new()),
                category("cat-spare-pumps", "Pumps", Some("cat-spares"), true, Vec::new()),
                turbo,
                valves,
                gauges,
            ] {
                store.categories.insert(c.id.to_string(), c);
            }
            store
                .catalogue_items
                .insert(turbo_item.id.to_string(), turbo_item);

            for s in [
                system("sys-beamline", "Beamline", None),
                system("sys-optics", "Optics", Some("sys-beamline")),
                system("sys-storage", "Storage", None),
            ] {
                store.systems.insert(s.id.to_string(), s);
            }
            for i in [
                item("item-1", "SN-001", "sys-optics"),
                item("item-2", "SN-002", "sys-storage"),
            ] {
                store.items.insert(i.id.to_string(), i);
            }
        }
        fake
    }

    pub async fn category(&self, id: &str) -> CatalogueCategory {
        self.store.lock().await.categories[id].clone()
    }

    pub async fn writes(&self) -> Vec<String> {
        self.store.lock().await.writes.clone()
    }
}

/// (id, name, parent id) of one node.
type Crumb = (String, String, Option<String>);

fn breadcrumbs(mut current: Option<Crumb>, lookup: impl Fn(&str) -> Option<Crumb>) -> Breadcrumbs {
    let mut trail = Vec::new();
    while let Some((id, name, parent)) = current {
        trail.push((id, name));
        current = parent.as_deref().and_then(&lookup);
    }
    trail.reverse();
    Breadcrumbs {
        trail,
        full_trail: true,
    }
}

#[async_trait]
impl CatalogueCategoryApi for FakeInventory {
    async fn list_catalogue_categories(
        &self,
        parent_id: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueCategory>> {
        let store = self.store.lock().await;
        Ok(store
            .categories
            .values()
            .filter(|c| c.parent_id.as_ref() == parent_id)
            .cloned()
            .collect())
    }

    async fn get_catalogue_category(
        &self,
        id: &CatalogueCategoryId,
    ) -> ApiResult<CatalogueCategory> {
        let store = self.store.lock().await;
        store
            .categories
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("catalogue category"))
    }

    async fn catalogue_category_breadcrumbs(
        &self,
        id: &CatalogueCategoryId,
    ) -> ApiResult<Breadcrumbs> {
        let store = self.store.lock().await;
        let lookup = |id: &str| {
            store.categories.get(id).map(|c| {
                (
                    c.id.to_string(),
                    c.name.clone(),
                    c.parent_id.as_ref().map(|p| p.to_string()),
                )
            })
        };
        let start = lookup(id.as_str()).ok_or_else(|| not_found("catalogue category"))?;
        Ok(breadcrumbs(Some(start), lookup))
    }

    async fn create_catalogue_category(
        &self,
        body: &CatalogueCategoryPost,
    ) -> ApiResult<CatalogueCategory> {
        let mut store = self.store.lock().await;
        let siblings = store.category_siblings(body.parent_id.as_ref(), None);
        store.check_name(&body.name, siblings.into_iter())?;
        let id = store.next_id("cat");
        let properties = body
            .properties
            .clone()
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(n, p)| CatalogueCategoryProperty {
                id: PropertyId::new(format!("{id}-prop-{n}")),
                name: p.name,
                property_type: p.property_type,
                unit_id: p.unit_id,
                unit: None,
                mandatory: p.mandatory,
                allowed_values: p.allowed_values,
            })
            .collect();
        let created = CatalogueCategory {
            properties,
            ..category(
                &id,
                &body.name,
                body.parent_id.as_ref().map(|p| p.as_str()),
                body.is_leaf,
                Vec::new(),
            )
        };
        store.writes.push(format!("POST category {}", body.name));
        store.categories.insert(id, created.clone());
        Ok(created)
    }

    async fn update_catalogue_category(
        &self,
        id: &CatalogueCategoryId,
        body: &CatalogueCategoryPatch,
    ) -> ApiResult<CatalogueCategory> {
        let mut store = self.store.lock().await;
        let current = store
            .categories
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("catalogue category"))?;
        let parent = body.parent_id.clone().unwrap_or(current.parent_id.clone());
        let name = body.name.clone().unwrap_or(current.name.clone());
        let siblings = store.category_siblings(parent.as_ref(), Some(id.as_str()));
        store.check_name(&name, siblings.into_iter())?;

        let updated = CatalogueCategory {
            code: code_of(&name),
            name,
            parent_id: parent,
            ..current
        };
        store.writes.push(format!("PATCH category {id}"));
        store.categories.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete_catalogue_category(&self, id: &CatalogueCategoryId) -> ApiResult<()> {
        let mut store = self.store.lock().await;
        store
            .categories
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| not_found("catalogue category"))
    }
}

#[async_trait]
impl CatalogueItemApi for FakeInventory {
    async fn list_catalogue_items(
        &self,
        catalogue_category_id: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueItem>> {
        let store = self.store.lock().await;
        Ok(store
            .catalogue_items
            .values()
            .filter(|i| catalogue_category_id.map_or(true, |c| &i.catalogue_category_id == c))
            .cloned()
            .collect())
    }

    async fn get_catalogue_item(&self, id: &CatalogueItemId) -> ApiResult<CatalogueItem> {
        let store = self.store.lock().await;
        store
            .catalogue_items
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("catalogue item"))
    }

    async fn create_catalogue_item(&self, body: &CatalogueItemPost) -> ApiResult<CatalogueItem> {
        let mut store = self.store.lock().await;
        let siblings = store.catalogue_item_siblings(&body.catalogue_category_id, None);
        store.check_name(&body.name, siblings.into_iter())?;
        let properties = store.resolve_properties(&body.catalogue_category_id, &body.properties)?;
        let id = store.next_id("ci");
        let created = CatalogueItem {
            id: CatalogueItemId::new(&id),
            catalogue_category_id: body.catalogue_category_id.clone(),
            manufacturer_id: body.manufacturer_id.clone(),
            name: body.name.clone(),
            description: body.description.clone(),
            cost_gbp: body.cost_gbp,
            cost_to_rework_gbp: body.cost_to_rework_gbp,
            days_to_replace: body.days_to_replace,
            days_to_rework: body.days_to_rework,
            expected_lifetime_days: body.expected_lifetime_days,
            drawing_number: body.drawing_number.clone(),
            drawing_link: body.drawing_link.clone(),
            item_model_number: body.item_model_number.clone(),
            is_obsolete: body.is_obsolete,
            obsolete_reason: body.obsolete_reason.clone(),
            obsolete_replacement_catalogue_item_id: body
                .obsolete_replacement_catalogue_item_id
                .clone(),
            notes: body.notes.clone(),
            properties,
            created_time: None,
            modified_time: None,
        };
        store.writes.push(format!("POST catalogue item {}", body.name));
        store.catalogue_items.insert(id, created.clone());
        Ok(created)
    }

    async fn update_catalogue_item(
        &self,
        id: &CatalogueItemId,
        body: &CatalogueItemPatch,
    ) -> ApiResult<CatalogueItem> {
        let mut store = self.store.lock().await;
        let current = store
            .catalogue_items
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("catalogue item"))?;
        let category = body
            .catalogue_category_id
            .clone()
            .unwrap_or(current.catalogue_category_id.clone());
        let name = body.name.clone().unwrap_or(current.name.clone());
        let siblings = store.catalogue_item_siblings(&category, Some(id.as_str()));
        store.check_name(&name, siblings.into_iter())?;
        let properties = match &body.properties {
            Some(posted) => store.resolve_properties(&category, posted)?,
            None => current.properties.clone(),
        };

        let updated = CatalogueItem {
            name,
            catalogue_category_id: category,
            properties,
            ..current
        };
        store.writes.push(format!("PATCH catalogue item {id}"));
        store.catalogue_items.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete_catalogue_item(&self, id: &CatalogueItemId) -> ApiResult<()> {
        let mut store = self.store.lock().await;
        store
            .catalogue_items
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| not_found("catalogue item"))
    }
}

#[async_trait]
impl SystemApi for FakeInventory {
    async fn list_systems(&self, parent_id: Option<&SystemId>) -> ApiResult<Vec<System>> {
        let store = self.store.lock().await;
        Ok(store
            .systems
            .values()
            .filter(|s| s.parent_id.as_ref() == parent_id)
            .cloned()
            .collect())
    }

    async fn get_system(&self, id: &SystemId) -> ApiResult<System> {
        let store = self.store.lock().await;
        store
            .systems
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("system"))
    }

    async fn system_breadcrumbs(&self, id: &SystemId) -> ApiResult<Breadcrumbs> {
        let store = self.store.lock().await;
        let lookup = |id: &str| {
            store.systems.get(id).map(|s| {
                (
                    s.id.to_string(),
                    s.name.clone(),
                    s.parent_id.as_ref().map(|p| p.to_string()),
                )
            })
        };
        let start = lookup(id.as_str()).ok_or_else(|| not_found("system"))?;
        Ok(breadcrumbs(Some(start), lookup))
    }

    async fn create_system(&self, body: &SystemPost) -> ApiResult<System> {
        let mut store = self.store.lock().await;
        let siblings = store.system_siblings(body.parent_id.as_ref(), None);
        store.check_name(&body.name, siblings.into_iter())?;
        let id = store.next_id("sys");
        let created = System {
            description: body.description.clone(),
            location: body.location.clone(),
            owner: body.owner.clone(),
            importance: body.importance,
            ..system(&id, &body.name, body.parent_id.as_ref().map(|p| p.as_str()))
        };
        store.writes.push(format!("POST system {}", body.name));
        store.systems.insert(id, created.clone());
        Ok(created)
    }

    async fn update_system(&self, id: &SystemId, body: &SystemPatch) -> ApiResult<System> {
        let mut store = self.store.lock().await;
        let current = store
            .systems
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("system"))?;
        let parent = body.parent_id.clone().unwrap_or(current.parent_id.clone());
        let name = body.name.clone().unwrap_or(current.name.clone());
        let siblings = store.system_siblings(parent.as_ref(), Some(id.as_str()));
        store.check_name(&name, siblings.into_iter())?;

        let updated = System {
            code: code_of(&name),
            name,
            parent_id: parent,
            ..current
        };
        store.writes.push(format!("PATCH system {id}"));
        store.systems.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete_system(&self, id: &SystemId) -> ApiResult<()> {
        let mut store = self.store.lock().await;
        store
            .systems
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| not_found("system"))
    }
}

#[async_trait]
impl ItemApi for FakeInventory {
    async fn list_items(&self, filter: &ItemFilter) -> ApiResult<Vec<Item>> {
        let store = self.store.lock().await;
        Ok(store
            .items
            .values()
            .filter(|i| filter.system_id.as_ref().map_or(true, |s| &i.system_id == s))
            .filter(|i| {
                filter
                    .catalogue_item_id
                    .as_ref()
                    .map_or(true, |c| &i.catalogue_item_id == c)
            })
            .cloned()
            .collect())
    }

    async fn get_item(&self, id: &ItemId) -> ApiResult<Item> {
        let store = self.store.lock().await;
        store
            .items
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("item"))
    }

    async fn create_item(&self, body: &ItemPost) -> ApiResult<Item> {
        let mut store = self.store.lock().await;
        let id = store.next_id("item");
        let created = Item {
            catalogue_item_id: body.catalogue_item_id.clone(),
            usage_status_id: body.usage_status_id.clone(),
            serial_number: body.serial_number.clone(),
            ..item(&id, "", body.system_id.as_str())
        };
        store.items.insert(id, created.clone());
        Ok(created)
    }

    async fn update_item(&self, id: &ItemId, body: &ItemPatch) -> ApiResult<Item> {
        let mut store = self.store.lock().await;
        let current = store
            .items
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("item"))?;
        if let Some(system_id) = &body.system_id {
            if !store.systems.contains_key(system_id.as_str()) {
                return Err(ClientError::api(
                    422,
                    r#"{"detail":"The specified system does not exist"}"#,
                ));
            }
        }
        let updated = Item {
            system_id: body.system_id.clone().unwrap_or(current.system_id.clone()),
            ..current
        };
        store.writes.push(format!("PATCH item {id}"));
        store.items.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete_item(&self, id: &ItemId) -> ApiResult<()> {
        let mut store = self.store.lock().await;
        store
            .items
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| not_found("item"))
    }
}
