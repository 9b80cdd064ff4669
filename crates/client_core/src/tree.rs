//! Nested view of the catalogue, loaded level by level.

use futures::future::{BoxFuture, FutureExt};
use shared::domain::{CatalogueCategory, CatalogueCategoryId, CatalogueItem};

use crate::api::{ApiResult, CatalogueCategoryApi, CatalogueItemApi};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTreeNode {
    pub category: CatalogueCategory,
    pub children: Vec<CategoryTreeNode>,
    /// Only populated for leaf categories.
    pub items: Vec<CatalogueItem>,
    /// False when `max_depth` stopped the walk before this node's contents.
    pub expanded: bool,
}

/// Loads the tree below `root` (the top level when `None`), descending at
/// most `max_depth` levels. Siblings are returned sorted by name.
pub async fn load_catalogue_tree<A>(
    api: &A,
    root: Option<&CatalogueCategoryId>,
    max_depth: usize,
) -> ApiResult<Vec<CategoryTreeNode>>
where
    A: CatalogueCategoryApi + CatalogueItemApi + ?Sized,
{
    load_level(api, root.cloned(), max_depth).await
}

fn load_level<'a, A>(
    api: &'a A,
    parent: Option<CatalogueCategoryId>,
    depth: usize,
) -> BoxFuture<'a, ApiResult<Vec<CategoryTreeNode>>>
where
    A: CatalogueCategoryApi + CatalogueItemApi + ?Sized,
{
    async move {
        let mut categories = api.list_catalogue_categories(parent.as_ref()).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        let mut nodes = Vec::with_capacity(categories.len());
        for category in categories {
            if depth == 0 {
                nodes.push(CategoryTreeNode {
                    category,
                    children: Vec::new(),
                    items: Vec::new(),
                    expanded: false,
                });
                continue;
            }

            let (children, items) = if category.is_leaf {
                let mut items = api.list_catalogue_items(Some(&category.id)).await?;
                items.sort_by(|a, b| a.name.cmp(&b.name));
                (Vec::new(), items)
            } else {
                (
                    load_level(api, Some(category.id.clone()), depth - 1).await?,
                    Vec::new(),
                )
            };
            nodes.push(CategoryTreeNode {
                category,
                children,
                items,
                expanded: true,
            });
        }
        Ok(nodes)
    }
    .boxed()
}

/// Renders the tree as indented lines, one per category or item.
pub fn render_tree(nodes: &[CategoryTreeNode]) -> Vec<String> {
    let mut lines = Vec::new();
    render_into(nodes, 0, &mut lines);
    lines
}

fn render_into(nodes: &[CategoryTreeNode], indent: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    for node in nodes {
        let marker = if node.category.is_leaf { "[leaf] " } else { "" };
        let ellipsis = if node.expanded { "" } else { " ..." };
        lines.push(format!(
            "{pad}{marker}{} ({}){ellipsis}",
            node.category.name, node.category.id
        ));
        render_into(&node.children, indent + 1, lines);
        for item in &node.items {
            lines.push(format!("{pad}  - {} ({})", item.name, item.id));
        }
    }
}
