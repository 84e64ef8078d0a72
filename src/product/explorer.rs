//! Cluster explorer — the fallback product for routes that name none.

use super::{DataStore, Product, RouteRef, VirtualType};

pub const NAME: &str = "explorer";

#[must_use]
pub fn init() -> Product {
    Product::new(NAME, DataStore::Cluster)
        .weight(100)
        .show_namespace_filter(true)
        .virtual_type(
            VirtualType::new(
                "cluster-dashboard",
                "clusterIndexPage.header",
                RouteRef::named("c-cluster-explorer").param("product", NAME),
            )
            .namespaced(false)
            .weight(100)
            .icon("globe")
            .exact(true),
        )
        .basic_types(&["cluster-dashboard"])
}
