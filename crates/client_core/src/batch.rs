//! Copy, move and save-as for selections of catalogue categories, systems
//! and catalogue items.
//!
//! A batch is processed one node at a time. The destination's sibling names
//! are loaded once into a [`NameRegistry`] and every name handed out is
//! recorded there, so two nodes in the same batch never collide with each
//! other or with existing siblings. A failing node is recorded in the
//! [`BatchReport`] and the batch carries on; nothing is rolled back.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{
        Breadcrumbs, CatalogueCategory, CatalogueCategoryId, CatalogueItem, CatalogueItemId,
        ItemId, PropertyValue, System, SystemId,
    },
    naming::NameRegistry,
    protocol::{
        CatalogueCategoryPatch, CatalogueCategoryPost, CatalogueItemPatch, CatalogueItemPost,
        ItemPatch, PropertyPost, SystemPatch, SystemPost,
    },
    validation::required_string,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{ApiResult, CatalogueCategoryApi, CatalogueItemApi, ItemApi, SystemApi},
    error::{surface_for, ClientError, EntityKind},
};

/// Attempts per node when the server reports a name we believed was free.
const MAX_NAME_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    Copy,
    Move,
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOperation::Copy => f.write_str("copy"),
            BatchOperation::Move => f.write_str("move"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("cannot be placed inside itself")]
    IntoItself,
    #[error("cannot be placed inside one of its own descendants")]
    IntoDescendant,
    #[error("the destination is a leaf catalogue category and cannot contain categories")]
    LeafDestination,
    #[error("catalogue items can only be placed in a leaf catalogue category")]
    NonLeafDestination,
    #[error("the destination's properties do not match the item's catalogue category")]
    IncompatibleProperties,
    #[error("a sibling named '{0}' already exists")]
    NameTaken(String),
    #[error("{0}")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl NodeError {
    fn user_message(&self, kind: EntityKind) -> String {
        match self {
            NodeError::Rejected(rejection) => rejection.to_string(),
            NodeError::Client(err) => surface_for(kind, err).message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded {
        id: String,
        name: String,
        renamed: bool,
    },
    Skipped {
        reason: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeOutcome {
    pub source_id: String,
    pub source_name: Option<String>,
    pub status: OutcomeStatus,
}

impl NodeOutcome {
    fn failed(source_id: String, source_name: Option<String>, message: String) -> Self {
        Self {
            source_id,
            source_name,
            status: OutcomeStatus::Failed { message },
        }
    }

    fn skipped(source_id: String, source_name: Option<String>, reason: &str) -> Self {
        Self {
            source_id,
            source_name,
            status: OutcomeStatus::Skipped {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }

    pub fn is_renamed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { renamed: true, .. })
    }
}

impl fmt::Display for NodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.source_name.as_deref().unwrap_or(&self.source_id);
        match &self.status {
            OutcomeStatus::Succeeded { id, name, renamed } if *renamed => {
                write!(f, "ok      {label} -> {name} ({id}, renamed)")
            }
            OutcomeStatus::Succeeded { id, name, .. } => write!(f, "ok      {label} -> {name} ({id})"),
            OutcomeStatus::Skipped { reason } => write!(f, "skipped {label}: {reason}"),
            OutcomeStatus::Failed { message } => write!(f, "failed  {label}: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub operation: BatchOperation,
    pub kind: EntityKind,
    pub destination: Option<String>,
    pub outcomes: Vec<NodeOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn renamed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_renamed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary(&self) -> String {
        let verb = match self.operation {
            BatchOperation::Copy => "Copied",
            BatchOperation::Move => "Moved",
        };
        let mut summary = format!(
            "{verb} {} of {} {}(s)",
            self.succeeded(),
            self.outcomes.len(),
            self.kind
        );
        let mut details = Vec::new();
        if self.renamed() > 0 {
            details.push(format!("{} renamed", self.renamed()));
        }
        if self.skipped() > 0 {
            details.push(format!("{} skipped", self.skipped()));
        }
        if self.failed() > 0 {
            details.push(format!("{} failed", self.failed()));
        }
        if !details.is_empty() {
            summary.push_str(&format!(" ({})", details.join(", ")));
        }
        summary
    }
}

/// One kind of node that lives under a parent and can be copied or moved.
#[async_trait]
pub trait HierarchyOps: Send + Sync {
    type Id: Clone + PartialEq + fmt::Display + Send + Sync;
    type ParentId: Clone + PartialEq + fmt::Display + Send + Sync;
    type Node: Clone + Send + Sync;
    /// Whatever the checks and requests need to know about the destination.
    type Destination: Send + Sync;

    fn kind(&self) -> EntityKind;
    fn id_of(node: &Self::Node) -> &Self::Id;
    fn name_of(node: &Self::Node) -> &str;
    fn parent_of(node: &Self::Node) -> Option<&Self::ParentId>;

    async fn fetch(&self, id: &Self::Id) -> ApiResult<Self::Node>;
    async fn children(&self, parent: Option<&Self::ParentId>) -> ApiResult<Vec<Self::Node>>;
    async fn destination(&self, parent: Option<&Self::ParentId>) -> ApiResult<Self::Destination>;
    async fn admit(
        &self,
        node: &Self::Node,
        destination: &Self::Destination,
    ) -> Result<(), NodeError>;
    async fn copy_into(
        &self,
        node: &Self::Node,
        name: &str,
        destination: &Self::Destination,
    ) -> ApiResult<Self::Node>;
    async fn move_into(
        &self,
        node: &Self::Node,
        rename: Option<&str>,
        destination: &Self::Destination,
    ) -> ApiResult<Self::Node>;
}

pub async fn copy_nodes<O: HierarchyOps>(
    ops: &O,
    ids: &[O::Id],
    parent: Option<&O::ParentId>,
) -> ApiResult<BatchReport> {
    run_batch(ops, BatchOperation::Copy, ids, parent).await
}

pub async fn move_nodes<O: HierarchyOps>(
    ops: &O,
    ids: &[O::Id],
    parent: Option<&O::ParentId>,
) -> ApiResult<BatchReport> {
    run_batch(ops, BatchOperation::Move, ids, parent).await
}

async fn run_batch<O: HierarchyOps>(
    ops: &O,
    operation: BatchOperation,
    ids: &[O::Id],
    parent: Option<&O::ParentId>,
) -> ApiResult<BatchReport> {
    let kind = ops.kind();
    let destination = ops.destination(parent).await?;
    let siblings = ops.children(parent).await?;
    let mut registry = NameRegistry::new(siblings.iter().map(|n| O::name_of(n).to_string()));
    info!(
        kind = %kind,
        operation = %operation,
        nodes = ids.len(),
        destination = %display_parent(parent),
        siblings = registry.len(),
        "batch: started"
    );

    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let outcome = apply_one(ops, operation, id, parent, &destination, &mut registry).await;
        outcomes.push(outcome);
    }

    let report = BatchReport {
        operation,
        kind,
        destination: parent.map(|p| p.to_string()),
        outcomes,
    };
    info!(
        kind = %kind,
        operation = %operation,
        succeeded = report.succeeded(),
        renamed = report.renamed(),
        skipped = report.skipped(),
        failed = report.failed(),
        "batch: finished"
    );
    Ok(report)
}

async fn apply_one<O: HierarchyOps>(
    ops: &O,
    operation: BatchOperation,
    id: &O::Id,
    parent: Option<&O::ParentId>,
    destination: &O::Destination,
    registry: &mut NameRegistry,
) -> NodeOutcome {
    let kind = ops.kind();
    let source_id = id.to_string();

    let node = match ops.fetch(id).await {
        Ok(node) => node,
        Err(err) => {
            warn!(kind = %kind, id = %source_id, error = %err, "batch: node could not be loaded");
            let message = NodeError::from(err).user_message(kind);
            return NodeOutcome::failed(source_id, None, message);
        }
    };
    let name = O::name_of(&node).to_string();

    if operation == BatchOperation::Move && O::parent_of(&node) == parent {
        return NodeOutcome::skipped(source_id, Some(name), "already in the destination");
    }

    if let Err(err) = ops.admit(&node, destination).await {
        warn!(kind = %kind, id = %source_id, error = %err, "batch: node rejected");
        return NodeOutcome::failed(source_id, Some(name), err.user_message(kind));
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        let resolved = registry.claim(&name);
        let renamed = resolved != name;
        let result = match operation {
            BatchOperation::Copy => ops.copy_into(&node, &resolved, destination).await,
            BatchOperation::Move => {
                ops.move_into(&node, renamed.then_some(resolved.as_str()), destination)
                    .await
            }
        };

        match result {
            Ok(placed) => {
                info!(
                    kind = %kind,
                    operation = %operation,
                    id = %source_id,
                    new_id = %O::id_of(&placed),
                    name = %resolved,
                    renamed,
                    "batch: node placed"
                );
                return NodeOutcome {
                    source_id,
                    source_name: Some(name),
                    status: OutcomeStatus::Succeeded {
                        id: O::id_of(&placed).to_string(),
                        name: resolved,
                        renamed,
                    },
                };
            }
            Err(err) if is_duplicate_name(&err) && attempt < MAX_NAME_ATTEMPTS => {
                // The server holds a sibling we did not list; keep the name
                // reserved and try the next one.
                warn!(kind = %kind, id = %source_id, name = %resolved, "batch: name taken, retrying");
            }
            Err(err) => {
                // A name the server reported as taken stays claimed.
                if !is_duplicate_name(&err) {
                    registry.release(&resolved);
                }
                warn!(kind = %kind, id = %source_id, error = %err, "batch: request failed");
                return NodeOutcome::failed(
                    source_id,
                    Some(name),
                    NodeError::from(err).user_message(kind),
                );
            }
        }
    }
}

fn is_duplicate_name(err: &ClientError) -> bool {
    err.api_error().is_some_and(|e| e.is_duplicate_name())
}

fn display_parent<P: fmt::Display>(parent: Option<&P>) -> String {
    parent
        .map(|p| p.to_string())
        .unwrap_or_else(|| "<root>".to_string())
}

/// Name to prefill a "save as" form with: the node's own name, made unique
/// among its current siblings.
pub async fn suggest_save_as_name<O: HierarchyOps>(ops: &O, id: &O::Id) -> ApiResult<String> {
    let node = ops.fetch(id).await?;
    let siblings = ops.children(O::parent_of(&node)).await?;
    let registry = NameRegistry::new(siblings.iter().map(|n| O::name_of(n).to_string()));
    Ok(registry.peek(O::name_of(&node)))
}

/// Creates a copy of `id` next to the original under `name`.
pub async fn save_as<O: HierarchyOps>(
    ops: &O,
    id: &O::Id,
    name: &str,
) -> Result<O::Node, NodeError> {
    let name = required_string(name, "Please enter a name.")
        .map_err(|e| Rejection::InvalidName(e.0))?;
    let node = ops.fetch(id).await?;
    let parent = O::parent_of(&node).cloned();

    let siblings = ops.children(parent.as_ref()).await?;
    if siblings.iter().any(|s| O::name_of(s) == name) {
        return Err(Rejection::NameTaken(name).into());
    }

    let destination = ops.destination(parent.as_ref()).await?;
    ops.admit(&node, &destination).await?;
    let created = ops.copy_into(&node, &name, &destination).await?;
    info!(kind = %ops.kind(), id = %id, new_id = %O::id_of(&created), name = %name, "batch: saved as");
    Ok(created)
}

fn check_placement(
    node_id: &str,
    destination_id: Option<&str>,
    trail: Option<&Breadcrumbs>,
) -> Result<(), Rejection> {
    if destination_id == Some(node_id) {
        return Err(Rejection::IntoItself);
    }
    if trail.is_some_and(|t| t.contains_id(node_id)) {
        return Err(Rejection::IntoDescendant);
    }
    Ok(())
}

pub struct CategoryDestination {
    pub category: Option<CatalogueCategory>,
    pub trail: Option<Breadcrumbs>,
}

/// Catalogue categories under a parent category (or the top level).
pub struct CatalogueCategoryTree<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: ?Sized> CatalogueCategoryTree<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A> HierarchyOps for CatalogueCategoryTree<'_, A>
where
    A: CatalogueCategoryApi + ?Sized,
{
    type Id = CatalogueCategoryId;
    type ParentId = CatalogueCategoryId;
    type Node = CatalogueCategory;
    type Destination = CategoryDestination;

    fn kind(&self) -> EntityKind {
        EntityKind::CatalogueCategory
    }

    fn id_of(node: &CatalogueCategory) -> &CatalogueCategoryId {
        &node.id
    }

    fn name_of(node: &CatalogueCategory) -> &str {
        &node.name
    }

    fn parent_of(node: &CatalogueCategory) -> Option<&CatalogueCategoryId> {
        node.parent_id.as_ref()
    }

    async fn fetch(&self, id: &CatalogueCategoryId) -> ApiResult<CatalogueCategory> {
        self.api.get_catalogue_category(id).await
    }

    async fn children(
        &self,
        parent: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueCategory>> {
        self.api.list_catalogue_categories(parent).await
    }

    async fn destination(
        &self,
        parent: Option<&CatalogueCategoryId>,
    ) -> ApiResult<CategoryDestination> {
        let Some(parent) = parent else {
            return Ok(CategoryDestination {
                category: None,
                trail: None,
            });
        };
        let category = self.api.get_catalogue_category(parent).await?;
        let trail = self.api.catalogue_category_breadcrumbs(parent).await?;
        Ok(CategoryDestination {
            category: Some(category),
            trail: Some(trail),
        })
    }

    async fn admit(
        &self,
        node: &CatalogueCategory,
        destination: &CategoryDestination,
    ) -> Result<(), NodeError> {
        let Some(target) = &destination.category else {
            return Ok(());
        };
        check_placement(
            node.id.as_str(),
            Some(target.id.as_str()),
            destination.trail.as_ref(),
        )?;
        if target.is_leaf {
            return Err(Rejection::LeafDestination.into());
        }
        Ok(())
    }

    async fn copy_into(
        &self,
        node: &CatalogueCategory,
        name: &str,
        destination: &CategoryDestination,
    ) -> ApiResult<CatalogueCategory> {
        let parent_id = destination.category.as_ref().map(|c| c.id.clone());
        let body = CatalogueCategoryPost::copy_of(node, name, parent_id);
        self.api.create_catalogue_category(&body).await
    }

    async fn move_into(
        &self,
        node: &CatalogueCategory,
        rename: Option<&str>,
        destination: &CategoryDestination,
    ) -> ApiResult<CatalogueCategory> {
        let body = CatalogueCategoryPatch {
            name: rename.map(str::to_string),
            parent_id: Some(destination.category.as_ref().map(|c| c.id.clone())),
            ..Default::default()
        };
        self.api.update_catalogue_category(&node.id, &body).await
    }
}

pub struct SystemDestination {
    pub system: Option<System>,
    pub trail: Option<Breadcrumbs>,
}

/// Systems under a parent system (or the top level).
pub struct SystemTree<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: ?Sized> SystemTree<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A> HierarchyOps for SystemTree<'_, A>
where
    A: SystemApi + ?Sized,
{
    type Id = SystemId;
    type ParentId = SystemId;
    type Node = System;
    type Destination = SystemDestination;

    fn kind(&self) -> EntityKind {
        EntityKind::System
    }

    fn id_of(node: &System) -> &SystemId {
        &node.id
    }

    fn name_of(node: &System) -> &str {
        &node.name
    }

    fn parent_of(node: &System) -> Option<&SystemId> {
        node.parent_id.as_ref()
    }

    async fn fetch(&self, id: &SystemId) -> ApiResult<System> {
        self.api.get_system(id).await
    }

    async fn children(&self, parent: Option<&SystemId>) -> ApiResult<Vec<System>> {
        self.api.list_systems(parent).await
    }

    async fn destination(&self, parent: Option<&SystemId>) -> ApiResult<SystemDestination> {
        let Some(parent) = parent else {
            return Ok(SystemDestination {
                system: None,
                trail: None,
            });
        };
        let system = self.api.get_system(parent).await?;
        let trail = self.api.system_breadcrumbs(parent).await?;
        Ok(SystemDestination {
            system: Some(system),
            trail: Some(trail),
        })
    }

    async fn admit(&self, node: &System, destination: &SystemDestination) -> Result<(), NodeError> {
        let Some(target) = &destination.system else {
            return Ok(());
        };
        check_placement(
            node.id.as_str(),
            Some(target.id.as_str()),
            destination.trail.as_ref(),
        )?;
        Ok(())
    }

    async fn copy_into(
        &self,
        node: &System,
        name: &str,
        destination: &SystemDestination,
    ) -> ApiResult<System> {
        let parent_id = destination.system.as_ref().map(|s| s.id.clone());
        self.api
            .create_system(&SystemPost::copy_of(node, name, parent_id))
            .await
    }

    async fn move_into(
        &self,
        node: &System,
        rename: Option<&str>,
        destination: &SystemDestination,
    ) -> ApiResult<System> {
        let body = SystemPatch {
            name: rename.map(str::to_string),
            parent_id: Some(destination.system.as_ref().map(|s| s.id.clone())),
        };
        self.api.update_system(&node.id, &body).await
    }
}

/// Catalogue items placed in leaf catalogue categories.
pub struct CatalogueItemPlacement<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: ?Sized> CatalogueItemPlacement<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }
}

/// Re-keys `item`'s property values onto the destination's definitions,
/// matching by name.
fn remap_properties(item: &CatalogueItem, destination: &CatalogueCategory) -> Vec<PropertyPost> {
    destination
        .properties
        .iter()
        .map(|definition| PropertyPost {
            id: definition.id.clone(),
            value: item
                .properties
                .iter()
                .find(|p| p.name == definition.name)
                .map(|p| p.value.clone())
                .unwrap_or(PropertyValue::Null),
        })
        .collect()
}

fn leaf_destination(destination: &Option<CatalogueCategory>) -> ApiResult<&CatalogueCategory> {
    destination.as_ref().ok_or_else(|| {
        ClientError::InvalidInput("catalogue items need a destination category".to_string())
    })
}

#[async_trait]
impl<A> HierarchyOps for CatalogueItemPlacement<'_, A>
where
    A: CatalogueItemApi + CatalogueCategoryApi + ?Sized,
{
    type Id = CatalogueItemId;
    type ParentId = CatalogueCategoryId;
    type Node = CatalogueItem;
    type Destination = Option<CatalogueCategory>;

    fn kind(&self) -> EntityKind {
        EntityKind::CatalogueItem
    }

    fn id_of(node: &CatalogueItem) -> &CatalogueItemId {
        &node.id
    }

    fn name_of(node: &CatalogueItem) -> &str {
        &node.name
    }

    fn parent_of(node: &CatalogueItem) -> Option<&CatalogueCategoryId> {
        Some(&node.catalogue_category_id)
    }

    async fn fetch(&self, id: &CatalogueItemId) -> ApiResult<CatalogueItem> {
        self.api.get_catalogue_item(id).await
    }

    async fn children(
        &self,
        parent: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Vec<CatalogueItem>> {
        match parent {
            Some(parent) => self.api.list_catalogue_items(Some(parent)).await,
            None => Ok(Vec::new()),
        }
    }

    async fn destination(
        &self,
        parent: Option<&CatalogueCategoryId>,
    ) -> ApiResult<Option<CatalogueCategory>> {
        match parent {
            Some(parent) => Ok(Some(self.api.get_catalogue_category(parent).await?)),
            None => Ok(None),
        }
    }

    async fn admit(
        &self,
        node: &CatalogueItem,
        destination: &Option<CatalogueCategory>,
    ) -> Result<(), NodeError> {
        let Some(target) = destination else {
            return Err(Rejection::NonLeafDestination.into());
        };
        if !target.is_leaf {
            return Err(Rejection::NonLeafDestination.into());
        }
        if target.id == node.catalogue_category_id {
            return Ok(());
        }

        let source = self
            .api
            .get_catalogue_category(&node.catalogue_category_id)
            .await?;
        let compatible = source.properties.len() == target.properties.len()
            && source
                .properties
                .iter()
                .zip(&target.properties)
                .all(|(a, b)| a.is_equivalent_to(b));
        if !compatible {
            return Err(Rejection::IncompatibleProperties.into());
        }
        Ok(())
    }

    async fn copy_into(
        &self,
        node: &CatalogueItem,
        name: &str,
        destination: &Option<CatalogueCategory>,
    ) -> ApiResult<CatalogueItem> {
        let target = leaf_destination(destination)?;
        let body = CatalogueItemPost::copy_of(
            node,
            name,
            target.id.clone(),
            remap_properties(node, target),
        );
        self.api.create_catalogue_item(&body).await
    }

    async fn move_into(
        &self,
        node: &CatalogueItem,
        rename: Option<&str>,
        destination: &Option<CatalogueCategory>,
    ) -> ApiResult<CatalogueItem> {
        let target = leaf_destination(destination)?;
        let body = CatalogueItemPatch {
            name: rename.map(str::to_string),
            catalogue_category_id: Some(target.id.clone()),
            properties: Some(remap_properties(node, target)),
            ..Default::default()
        };
        self.api.update_catalogue_item(&node.id, &body).await
    }
}

/// Moves physical items into `system_id`. Items carry no sibling names, so
/// no renaming happens. Fails outright only when the system cannot be loaded.
pub async fn move_items_to_system<A>(
    api: &A,
    ids: &[ItemId],
    system_id: &SystemId,
) -> ApiResult<BatchReport>
where
    A: ItemApi + SystemApi + ?Sized,
{
    let system = api.get_system(system_id).await?;
    info!(system_id = %system.id, nodes = ids.len(), "batch: moving items");

    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let item = match api.get_item(id).await {
            Ok(item) => item,
            Err(err) => {
                let message = surface_for(EntityKind::Item, &err).message().to_string();
                outcomes.push(NodeOutcome::failed(id.to_string(), None, message));
                continue;
            }
        };
        let label = item.serial_number.clone();
        if item.system_id == system.id {
            outcomes.push(NodeOutcome::skipped(
                id.to_string(),
                label,
                "already in the destination",
            ));
            continue;
        }

        let body = ItemPatch {
            system_id: Some(system.id.clone()),
            ..Default::default()
        };
        match api.update_item(id, &body).await {
            Ok(moved) => outcomes.push(NodeOutcome {
                source_id: id.to_string(),
                source_name: label,
                status: OutcomeStatus::Succeeded {
                    id: moved.id.to_string(),
                    name: system.name.clone(),
                    renamed: false,
                },
            }),
            Err(err) => {
                warn!(item_id = %id, error = %err, "batch: item move failed");
                let message = surface_for(EntityKind::Item, &err).message().to_string();
                outcomes.push(NodeOutcome::failed(id.to_string(), label, message));
            }
        }
    }

    Ok(BatchReport {
        operation: BatchOperation::Move,
        kind: EntityKind::Item,
        destination: Some(system.id.to_string()),
        outcomes,
    })
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
