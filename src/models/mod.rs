use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pricing::{self, InventoryFields, PriceEdit, PricingFields, QuantityEdit, Violation};

/// A category tree node as served by the backend category service.
///
/// `children` is explicitly optional: an absent or empty list both mean the
/// node is a leaf. `id` is opaque and unique within one fetched snapshot;
/// malformed input (duplicate ids, cycles spelled out as repeated ids) is
/// tolerated by the traversals in [`crate::catalog`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: None,
            metadata: None,
        }
    }

    pub fn children(&self) -> &[Category] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        !self.has_children()
    }
}

/// One table row of the flattened category tree.
///
/// Rows borrow from the forest they were produced from and are rebuilt on
/// every render; they are never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow<'a> {
    pub key: &'a str,
    pub id: &'a str,
    pub name: &'a str,
    /// Depth from the root, 0-based.
    pub level: usize,
    pub is_leaf: bool,
    pub parent_key: Option<&'a str>,
    pub has_children: bool,
    /// The original subtree backing this row.
    #[serde(skip)]
    pub children: &'a [Category],
    pub metadata: Option<&'a Map<String, Value>>,
}

impl<'a> CategoryRow<'a> {
    pub(crate) fn for_node(
        node: &'a Category,
        parent_key: Option<&'a str>,
        level: usize,
    ) -> Self {
        Self {
            key: &node.id,
            id: &node.id,
            name: &node.name,
            level,
            is_leaf: node.is_leaf(),
            parent_key,
            has_children: node.has_children(),
            children: node.children(),
            metadata: node.metadata.as_ref(),
        }
    }
}

/// A product as served by the backend product service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub pricing: PricingFields,
    #[serde(flatten)]
    pub inventory: InventoryFields,
}

fn default_is_active() -> bool {
    true
}

/// In-memory state for one product-edit session.
///
/// Created when the edit form opens (empty, or seeded from an existing
/// product), discarded by the caller when it closes. Attributes are kept as
/// raw JSON text and only parsed at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    /// `Some` when editing an existing product, `None` when creating.
    pub id: Option<String>,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub category_id: Option<String>,
    pub is_active: bool,
    pub attributes_json: String,
    pub pricing: PricingFields,
    pub inventory: InventoryFields,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductForm {
    pub fn new() -> Self {
        Self {
            id: None,
            name: String::new(),
            sku: String::new(),
            description: String::new(),
            category_id: None,
            is_active: true,
            attributes_json: "{}".to_string(),
            pricing: PricingFields::default(),
            inventory: InventoryFields::default(),
        }
    }

    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id.clone()),
            name: product.name.clone(),
            sku: product.sku.clone(),
            description: product.description.clone().unwrap_or_default(),
            category_id: product.category_id.clone(),
            is_active: product.is_active,
            attributes_json: serde_json::to_string_pretty(&product.attributes)
                .unwrap_or_else(|_| "{}".to_string()),
            pricing: product.pricing,
            inventory: product.inventory,
        }
    }

    /// Applies a price edit, writing the derived fields back into the form.
    /// Returned violations describe every clamp the derivation performed.
    pub fn apply_price_edit(&mut self, edit: PriceEdit) -> Vec<Violation> {
        let (next, violations) = pricing::apply_price_edit(self.pricing, edit);
        self.pricing = next;
        violations
    }

    /// Applies a quantity edit; the total quantity is rederived immediately.
    pub fn apply_quantity_edit(&mut self, edit: QuantityEdit) {
        self.inventory = pricing::apply_quantity_edit(self.inventory, edit);
    }
}
