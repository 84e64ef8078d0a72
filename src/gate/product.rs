//! Product selection for the current navigation.
//!
//! DESIGN
//! ======
//! `ProductTracker` is built once at startup and handed to the gate, which
//! calls `track` on every navigation that gets past authentication. Route
//! names are mapped to products through an injected `RouteMetadata`.

use crate::product::{DataStore, explorer};
use crate::route::Route;
use crate::state::ConsoleState;

/// Maps a route name to the product that owns it.
pub trait RouteMetadata: Send + Sync {
    fn product_for(&self, route_name: &str) -> Option<String>;
}

/// Reads the product out of route names shaped `c-cluster-<product>-...`.
pub struct ClusterRoutePrefix;

impl RouteMetadata for ClusterRoutePrefix {
    fn product_for(&self, route_name: &str) -> Option<String> {
        let rest = route_name.strip_prefix("c-cluster-")?;
        let product = rest.split('-').next()?;
        (!product.is_empty()).then(|| product.to_owned())
    }
}

/// What `track` changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductChange {
    pub product_changed: bool,
    pub catalog_reset: bool,
}

pub struct ProductTracker {
    metadata: Box<dyn RouteMetadata>,
    fallback: String,
}

impl ProductTracker {
    #[must_use]
    pub fn new(metadata: Box<dyn RouteMetadata>) -> Self {
        Self { metadata, fallback: explorer::NAME.to_owned() }
    }

    /// Product for `route`: explicit `product` param, then route metadata,
    /// then the fallback product.
    #[must_use]
    pub fn resolve(&self, route: &Route) -> String {
        route
            .param("product")
            .map(str::to_owned)
            .or_else(|| self.metadata.product_for(&route.name))
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Select the route's product, resetting the catalog when the backing
    /// data store changes.
    pub fn track(&self, route: &Route, state: &mut ConsoleState) -> ProductChange {
        let product = self.resolve(route);
        let old_product = state.product_id.clone();
        let old_store = state.current_store();

        let product_changed = old_product.as_deref() != Some(product.as_str());
        if product_changed {
            state.set_product(&product);
        }

        let new_store = state.current_store();
        let catalog_reset = new_store != old_store;
        if catalog_reset {
            state.catalog.reset();
        }

        tracing::debug!(
            product = %product,
            old_store = old_store.map(DataStore::as_str),
            new_store = new_store.map(DataStore::as_str),
            catalog_reset,
            "product tracked"
        );
        ProductChange { product_changed, catalog_reset }
    }
}

#[cfg(test)]
#[path = "product_test.rs"]
mod tests;
