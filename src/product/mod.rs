//! Product and menu registration.
//!
//! DESIGN
//! ======
//! A product is a selectable area of the console backed by one data store.
//! Products are declared with a small builder DSL (`Product::new(..)`,
//! `VirtualType::new(..)`) and collected in a `ProductRegistry` at startup.
//! `apply_products` copies the products whose feature flag is enabled into a
//! visitor's state; it is idempotent and runs on every navigation.

pub mod explorer;
pub mod legacy;
pub mod manager;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::state::ConsoleState;

// =============================================================================
// DATA STORE
// =============================================================================

/// Backing partition of console state that a product's fetches go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStore {
    Cluster,
    Management,
    Rancher,
}

impl DataStore {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Management => "management",
            Self::Rancher => "rancher",
        }
    }
}

// =============================================================================
// VIRTUAL TYPES
// =============================================================================

/// Condition on the current cluster for showing a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IfHave {
    Project,
    NoProject,
}

/// Named route a menu entry links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRef {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl RouteRef {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self { name: name.to_owned(), params: BTreeMap::new() }
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_owned(), value.to_owned());
        self
    }
}

/// A menu entry that is not backed by an API resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualType {
    pub name: String,
    pub label_key: String,
    pub group: Option<String>,
    pub namespaced: bool,
    pub weight: i32,
    pub icon: Option<String>,
    pub route: RouteRef,
    pub exact: bool,
    pub overview: bool,
    pub if_have: Option<IfHave>,
}

impl VirtualType {
    #[must_use]
    pub fn new(name: &str, label_key: &str, route: RouteRef) -> Self {
        Self {
            name: name.to_owned(),
            label_key: label_key.to_owned(),
            group: None,
            namespaced: false,
            weight: 0,
            icon: None,
            route,
            exact: false,
            overview: true,
            if_have: None,
        }
    }

    #[must_use]
    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(group.to_owned());
        self
    }

    #[must_use]
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    #[must_use]
    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_owned());
        self
    }

    #[must_use]
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    #[must_use]
    pub fn overview(mut self, overview: bool) -> Self {
        self.overview = overview;
        self
    }

    #[must_use]
    pub fn if_have(mut self, condition: IfHave) -> Self {
        self.if_have = Some(condition);
        self
    }

    fn is_visible(&self, has_project: bool) -> bool {
        match self.if_have {
            None => true,
            Some(IfHave::Project) => has_project,
            Some(IfHave::NoProject) => !has_project,
        }
    }
}

// =============================================================================
// PRODUCT
// =============================================================================

/// A menu entry, optionally nested under a named group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicType {
    pub name: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub weight: i32,
    pub if_feature: Option<String>,
    pub show_namespace_filter: bool,
    pub in_store: DataStore,
    pub virtual_types: Vec<VirtualType>,
    /// Menu entries in display order.
    pub basic_types: Vec<BasicType>,
}

impl Product {
    #[must_use]
    pub fn new(name: &str, in_store: DataStore) -> Self {
        Self {
            name: name.to_owned(),
            weight: 0,
            if_feature: None,
            show_namespace_filter: false,
            in_store,
            virtual_types: Vec::new(),
            basic_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn if_feature(mut self, feature: &str) -> Self {
        self.if_feature = Some(feature.to_owned());
        self
    }

    #[must_use]
    pub fn show_namespace_filter(mut self, show: bool) -> Self {
        self.show_namespace_filter = show;
        self
    }

    #[must_use]
    pub fn virtual_type(mut self, vt: VirtualType) -> Self {
        self.virtual_types.push(vt);
        self
    }

    /// Append top-level menu entries; names already listed are skipped.
    #[must_use]
    pub fn basic_types(self, names: &[&str]) -> Self {
        self.push_basic_types(names, None)
    }

    /// Append menu entries under `group`.
    #[must_use]
    pub fn grouped_basic_types(self, group: &str, names: &[&str]) -> Self {
        self.push_basic_types(names, Some(group))
    }

    fn push_basic_types(mut self, names: &[&str], group: Option<&str>) -> Self {
        for name in names {
            if !self.basic_types.iter().any(|bt| bt.name == *name) {
                self.basic_types.push(BasicType { name: (*name).to_owned(), group: group.map(str::to_owned) });
            }
        }
        self
    }

    /// Menu entry names under `group`; `None` selects the top level.
    #[must_use]
    pub fn basic_type_names(&self, group: Option<&str>) -> Vec<&str> {
        self.basic_types
            .iter()
            .filter(|bt| bt.group.as_deref() == group)
            .map(|bt| bt.name.as_str())
            .collect()
    }

    /// Virtual types shown for a cluster with or without projects, by
    /// descending weight.
    #[must_use]
    pub fn visible_types(&self, has_project: bool) -> Vec<&VirtualType> {
        let mut types: Vec<&VirtualType> = self
            .virtual_types
            .iter()
            .filter(|vt| vt.is_visible(has_project))
            .collect();
        types.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(&b.name)));
        types
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ProductRegistry {
    products: Vec<Product>,
}

impl ProductRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in product.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(explorer::init());
        registry.register(manager::init());
        registry.register(legacy::init());
        registry
    }

    /// Add a product, replacing any earlier definition with the same name.
    pub fn register(&mut self, product: Product) {
        self.products.retain(|p| p.name != product.name);
        self.products.push(product);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Install every product whose feature is enabled into `state`, heaviest
    /// first.
    pub fn apply_products(&self, state: &mut ConsoleState) {
        let mut applied: Vec<Product> = self
            .products
            .iter()
            .filter(|p| {
                p.if_feature
                    .as_deref()
                    .map_or(true, |f| state.feature_enabled(f))
            })
            .cloned()
            .collect();
        applied.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(&b.name)));
        state.products = applied;
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
