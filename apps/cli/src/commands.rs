use anyhow::{anyhow, bail, Context, Result};
use client_core::{
    batch::{
        copy_nodes, move_items_to_system, move_nodes, save_as, suggest_save_as_name,
        BatchOperation, BatchReport, CatalogueCategoryTree, CatalogueItemPlacement, HierarchyOps,
        NodeError, SystemTree,
    },
    tree::{load_catalogue_tree, render_tree},
    CatalogueCategoryApi, CatalogueItemApi, ClientError, EntityKind, InventoryClient, ItemApi,
    ItemFilter, ManufacturerApi, SettingsApi, SystemApi, UnitApi, UsageStatusApi,
};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{
        CatalogueCategoryId, CatalogueItemId, ItemId, ManufacturerId, SystemId, UnitId,
        UsageStatusId,
    },
    protocol::SparesDefinitionPut,
    table_state::{TableState, TableStateSync},
    validation::{validate_value_form, ManufacturerForm},
};
use tracing::info;
use url::Url;

use crate::{
    CatalogueItemCommand, CategoryCommand, Command, ItemCommand, ManufacturerArgs,
    ManufacturerCommand, SaveAsArgs, SparesCommand, SystemCommand, TableStateCommand,
    TransferArgs, ValueCommand,
};

pub(crate) async fn run(client: &InventoryClient, command: Command, json: bool) -> Result<()> {
    let out = Output { json };
    match command {
        Command::Categories(command) => categories(client, command, out).await,
        Command::CatalogueItems(command) => catalogue_items(client, command, out).await,
        Command::Systems(command) => systems(client, command, out).await,
        Command::Items(command) => items(client, command, out).await,
        Command::Manufacturers(command) => manufacturers(client, command, out).await,
        Command::Units(command) => units(client, command, out).await,
        Command::UsageStatuses(command) => usage_statuses(client, command, out).await,
        Command::Spares(command) => spares(client, command, out).await,
        Command::TableState(command) => table_state(command, out),
    }
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// JSON when requested, otherwise one line per entry of `lines`.
    fn emit<T: Serialize>(self, value: &T, lines: impl FnOnce() -> Vec<String>) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            for line in lines() {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// Prints the report and fails when any node failed.
    fn report(self, report: &BatchReport) -> Result<()> {
        self.emit(report, || {
            let mut lines: Vec<String> = report.outcomes.iter().map(|o| o.to_string()).collect();
            lines.push(report.summary());
            lines
        })?;
        if report.is_complete() {
            Ok(())
        } else {
            Err(anyhow!(report.summary()))
        }
    }
}

/// The message a user should see, with the underlying error attached.
fn explain(kind: EntityKind, err: ClientError) -> anyhow::Error {
    let message = client_core::surface_for(kind, &err).message().to_string();
    anyhow::Error::new(err).context(message)
}

fn explain_node(kind: EntityKind, err: NodeError) -> anyhow::Error {
    match err {
        NodeError::Client(err) => explain(kind, err),
        NodeError::Rejected(rejection) => anyhow::Error::new(rejection),
    }
}

async fn transfer<O: HierarchyOps>(
    ops: &O,
    operation: BatchOperation,
    ids: &[O::Id],
    to: Option<&O::ParentId>,
    out: Output,
) -> Result<()> {
    let report = match operation {
        BatchOperation::Copy => copy_nodes(ops, ids, to).await,
        BatchOperation::Move => move_nodes(ops, ids, to).await,
    }
    .map_err(|err| explain(ops.kind(), err))
    .context("could not load the destination")?;
    out.report(&report)
}

async fn save_copy<O>(ops: &O, id: O::Id, name: Option<String>, out: Output) -> Result<()>
where
    O: HierarchyOps,
    O::Node: Serialize,
{
    let kind = ops.kind();
    let name = match name {
        Some(name) => name,
        None => suggest_save_as_name(ops, &id)
            .await
            .map_err(|err| explain(kind, err))?,
    };
    let created = save_as(ops, &id, &name)
        .await
        .map_err(|err| explain_node(kind, err))?;
    out.emit(&created, || {
        vec![format!(
            "saved {kind} {id} as '{}' ({})",
            O::name_of(&created),
            O::id_of(&created)
        )]
    })
}

async fn categories(client: &InventoryClient, command: CategoryCommand, out: Output) -> Result<()> {
    let kind = EntityKind::CatalogueCategory;
    let tree = CatalogueCategoryTree::new(client);
    match command {
        CategoryCommand::List { parent } => {
            let parent = parent.map(CatalogueCategoryId::new);
            let categories = client
                .list_catalogue_categories(parent.as_ref())
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&categories, || {
                categories
                    .iter()
                    .map(|c| {
                        let leaf = if c.is_leaf { "leaf" } else { "-" };
                        format!("{}\t{}\t{leaf}", c.id, c.name)
                    })
                    .collect()
            })
        }
        CategoryCommand::Tree { root, depth } => {
            let root = root.map(CatalogueCategoryId::new);
            let nodes = load_catalogue_tree(client, root.as_ref(), depth)
                .await
                .map_err(|err| explain(kind, err))?;
            let lines = render_tree(&nodes);
            out.emit(&lines, || lines.clone())
        }
        CategoryCommand::Copy(TransferArgs { ids, to }) => {
            let ids: Vec<_> = ids.into_iter().map(CatalogueCategoryId::new).collect();
            let to = to.map(CatalogueCategoryId::new);
            transfer(&tree, BatchOperation::Copy, &ids, to.as_ref(), out).await
        }
        CategoryCommand::Move(TransferArgs { ids, to }) => {
            let ids: Vec<_> = ids.into_iter().map(CatalogueCategoryId::new).collect();
            let to = to.map(CatalogueCategoryId::new);
            transfer(&tree, BatchOperation::Move, &ids, to.as_ref(), out).await
        }
        CategoryCommand::SaveAs(SaveAsArgs { id, name }) => {
            save_copy(&tree, CatalogueCategoryId::new(id), name, out).await
        }
        CategoryCommand::Delete { id } => {
            client
                .delete_catalogue_category(&CatalogueCategoryId::new(&id))
                .await
                .map_err(|err| explain(kind, err))?;
            info!(catalogue_category_id = %id, "ims: catalogue category deleted");
            out.emit(&serde_json::json!({ "deleted": id }), || {
                vec![format!("deleted catalogue category {id}")]
            })
        }
    }
}

async fn catalogue_items(
    client: &InventoryClient,
    command: CatalogueItemCommand,
    out: Output,
) -> Result<()> {
    let kind = EntityKind::CatalogueItem;
    let placement = CatalogueItemPlacement::new(client);
    match command {
        CatalogueItemCommand::List { category } => {
            let category = category.map(CatalogueCategoryId::new);
            let items = client
                .list_catalogue_items(category.as_ref())
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&items, || {
                items
                    .iter()
                    .map(|i| {
                        let obsolete = if i.is_obsolete { "obsolete" } else { "-" };
                        format!(
                            "{}\t{}\t{}\t{obsolete}",
                            i.id, i.name, i.catalogue_category_id
                        )
                    })
                    .collect()
            })
        }
        CatalogueItemCommand::Copy(TransferArgs { ids, to }) => {
            let to = to
                .map(CatalogueCategoryId::new)
                .context("catalogue items need --to <leaf category id>")?;
            let ids: Vec<_> = ids.into_iter().map(CatalogueItemId::new).collect();
            transfer(&placement, BatchOperation::Copy, &ids, Some(&to), out).await
        }
        CatalogueItemCommand::Move(TransferArgs { ids, to }) => {
            let to = to
                .map(CatalogueCategoryId::new)
                .context("catalogue items need --to <leaf category id>")?;
            let ids: Vec<_> = ids.into_iter().map(CatalogueItemId::new).collect();
            transfer(&placement, BatchOperation::Move, &ids, Some(&to), out).await
        }
        CatalogueItemCommand::SaveAs(SaveAsArgs { id, name }) => {
            save_copy(&placement, CatalogueItemId::new(id), name, out).await
        }
    }
}

async fn systems(client: &InventoryClient, command: SystemCommand, out: Output) -> Result<()> {
    let kind = EntityKind::System;
    let tree = SystemTree::new(client);
    match command {
        SystemCommand::List { parent } => {
            let parent = parent.map(SystemId::new);
            let systems = client
                .list_systems(parent.as_ref())
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&systems, || {
                systems
                    .iter()
                    .map(|s| format!("{}\t{}\t{}", s.id, s.name, s.importance))
                    .collect()
            })
        }
        SystemCommand::Copy(TransferArgs { ids, to }) => {
            let ids: Vec<_> = ids.into_iter().map(SystemId::new).collect();
            let to = to.map(SystemId::new);
            transfer(&tree, BatchOperation::Copy, &ids, to.as_ref(), out).await
        }
        SystemCommand::Move(TransferArgs { ids, to }) => {
            let ids: Vec<_> = ids.into_iter().map(SystemId::new).collect();
            let to = to.map(SystemId::new);
            transfer(&tree, BatchOperation::Move, &ids, to.as_ref(), out).await
        }
        SystemCommand::SaveAs(SaveAsArgs { id, name }) => {
            save_copy(&tree, SystemId::new(id), name, out).await
        }
    }
}

async fn items(client: &InventoryClient, command: ItemCommand, out: Output) -> Result<()> {
    let kind = EntityKind::Item;
    match command {
        ItemCommand::List {
            system,
            catalogue_item,
        } => {
            let filter = ItemFilter {
                system_id: system.map(SystemId::new),
                catalogue_item_id: catalogue_item.map(CatalogueItemId::new),
            };
            let items = client
                .list_items(&filter)
                .await
                .map_err(|err| explain(kind, err))?;
            let spares = client
                .get_spares_definition()
                .await
                .map_err(|err| explain(EntityKind::SparesDefinition, err))?;
            out.emit(&items, || {
                items
                    .iter()
                    .map(|i| {
                        let spare = if spares.is_spare(&i.usage_status_id) {
                            "spare"
                        } else {
                            "-"
                        };
                        format!(
                            "{}\t{}\t{}\t{}\t{spare}",
                            i.id,
                            i.serial_number.as_deref().unwrap_or("-"),
                            i.system_id,
                            i.usage_status.as_deref().unwrap_or(i.usage_status_id.as_str()),
                        )
                    })
                    .collect()
            })
        }
        ItemCommand::Move { ids, to } => {
            let ids: Vec<_> = ids.into_iter().map(ItemId::new).collect();
            let report = move_items_to_system(client, &ids, &SystemId::new(to))
                .await
                .map_err(|err| explain(EntityKind::System, err))
                .context("could not load the destination system")?;
            out.report(&report)
        }
    }
}

async fn manufacturers(
    client: &InventoryClient,
    command: ManufacturerCommand,
    out: Output,
) -> Result<()> {
    let kind = EntityKind::Manufacturer;
    match command {
        ManufacturerCommand::List => {
            let manufacturers = client
                .list_manufacturers()
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&manufacturers, || {
                manufacturers
                    .iter()
                    .map(|m| {
                        format!(
                            "{}\t{}\t{}",
                            m.id,
                            m.name,
                            m.url.as_deref().unwrap_or("-")
                        )
                    })
                    .collect()
            })
        }
        ManufacturerCommand::Create(args) => {
            let body = manufacturer_form(args).validate()?;
            let created = client
                .create_manufacturer(&body)
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&created, || {
                vec![format!("created manufacturer {} ({})", created.name, created.id)]
            })
        }
        ManufacturerCommand::Delete { id } => {
            client
                .delete_manufacturer(&ManufacturerId::new(&id))
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&serde_json::json!({ "deleted": id }), || {
                vec![format!("deleted manufacturer {id}")]
            })
        }
    }
}

fn manufacturer_form(args: ManufacturerArgs) -> ManufacturerForm {
    ManufacturerForm {
        name: args.name,
        url: args.url,
        address_line: args.address_line,
        town: args.town,
        county: args.county,
        postcode: args.postcode,
        country: args.country,
        telephone: args.telephone,
    }
}

async fn units(client: &InventoryClient, command: ValueCommand, out: Output) -> Result<()> {
    let kind = EntityKind::Unit;
    match command {
        ValueCommand::List => {
            let units = client.list_units().await.map_err(|err| explain(kind, err))?;
            out.emit(&units, || {
                units.iter().map(|u| format!("{}\t{}", u.id, u.value)).collect()
            })
        }
        ValueCommand::Create { value } => {
            let body = validate_value_form(&value)?;
            let created = client
                .create_unit(&body)
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&created, || {
                vec![format!("created unit {} ({})", created.value, created.id)]
            })
        }
        ValueCommand::Delete { id } => {
            client
                .delete_unit(&UnitId::new(&id))
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&serde_json::json!({ "deleted": id }), || {
                vec![format!("deleted unit {id}")]
            })
        }
    }
}

async fn usage_statuses(
    client: &InventoryClient,
    command: ValueCommand,
    out: Output,
) -> Result<()> {
    let kind = EntityKind::UsageStatus;
    match command {
        ValueCommand::List => {
            let statuses = client
                .list_usage_statuses()
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&statuses, || {
                statuses
                    .iter()
                    .map(|s| format!("{}\t{}", s.id, s.value))
                    .collect()
            })
        }
        ValueCommand::Create { value } => {
            let body = validate_value_form(&value)?;
            let created = client
                .create_usage_status(&body)
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&created, || {
                vec![format!("created usage status {} ({})", created.value, created.id)]
            })
        }
        ValueCommand::Delete { id } => {
            client
                .delete_usage_status(&UsageStatusId::new(&id))
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&serde_json::json!({ "deleted": id }), || {
                vec![format!("deleted usage status {id}")]
            })
        }
    }
}

async fn spares(client: &InventoryClient, command: SparesCommand, out: Output) -> Result<()> {
    let kind = EntityKind::SparesDefinition;
    match command {
        SparesCommand::Show => {
            let definition = client
                .get_spares_definition()
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&definition, || {
                if definition.usage_statuses.is_empty() {
                    return vec!["no spares definition set".to_string()];
                }
                definition
                    .usage_statuses
                    .iter()
                    .map(|s| format!("{}\t{}", s.id, s.value))
                    .collect()
            })
        }
        SparesCommand::Set { usage_status_ids } => {
            let known = client
                .list_usage_statuses()
                .await
                .map_err(|err| explain(EntityKind::UsageStatus, err))?;
            let unknown: Vec<_> = usage_status_ids
                .iter()
                .filter(|id| !known.iter().any(|s| s.id.as_str() == id.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                bail!("unknown usage status id(s): {}", unknown.join(", "));
            }

            let body = SparesDefinitionPut::new(usage_status_ids.into_iter().map(UsageStatusId::new));
            let updated = client
                .update_spares_definition(&body)
                .await
                .map_err(|err| explain(kind, err))?;
            out.emit(&updated, || {
                let names: Vec<_> = updated
                    .usage_statuses
                    .iter()
                    .map(|s| s.value.as_str())
                    .collect();
                vec![format!("spares are now: {}", names.join(", "))]
            })
        }
    }
}

fn table_state(command: TableStateCommand, out: Output) -> Result<()> {
    match command {
        TableStateCommand::Encode {
            url,
            filters,
            sort,
            desc,
            search,
            page_index,
            page_size,
            param,
        } => {
            let url = Url::parse(&url).with_context(|| format!("invalid url: {url}"))?;
            let mut sync = TableStateSync::from_url(&url, param);
            let mut next = sync.state().clone();
            for raw in &filters {
                let (column, value) = parse_filter(raw)?;
                next.set_column_filter(&column, value);
            }
            if let Some(column) = sort {
                next.set_sort(&column, desc);
            }
            if search.is_some() {
                next.set_global_filter(search);
            }
            if let Some(page_index) = page_index {
                next.pagination.page_index = page_index;
            }
            if let Some(page_size) = page_size {
                if page_size == 0 {
                    bail!("--page-size must be greater than zero");
                }
                next.pagination.page_size = page_size;
            }

            let updated = sync.update(next, &url).unwrap_or(url);
            out.emit(&updated.as_str(), || vec![updated.to_string()])
        }
        TableStateCommand::Decode { url, param } => {
            let url = Url::parse(&url).with_context(|| format!("invalid url: {url}"))?;
            let state = TableState::from_url(&url, &param);
            out.emit(&state, || describe_state(&state))
        }
    }
}

/// Splits `column=value`, reading the value as JSON when it parses.
fn parse_filter(raw: &str) -> Result<(String, Value)> {
    let (column, value) = raw
        .split_once('=')
        .with_context(|| format!("filter must look like column=value: {raw}"))?;
    let column = column.trim();
    if column.is_empty() {
        bail!("filter is missing a column: {raw}");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((column.to_string(), value))
}

fn describe_state(state: &TableState) -> Vec<String> {
    if state.is_default() {
        return vec!["default table state".to_string()];
    }
    let mut lines = Vec::new();
    for filter in &state.column_filters {
        lines.push(format!("filter {} = {}", filter.id, filter.value));
    }
    for rule in &state.sorting {
        let direction = if rule.desc { "desc" } else { "asc" };
        lines.push(format!("sort {} {direction}", rule.id));
    }
    if let Some(search) = &state.global_filter {
        lines.push(format!("search {search}"));
    }
    lines.push(format!(
        "page {} (size {})",
        state.pagination.page_index, state.pagination.page_size
    ));
    lines
}
