//! Cluster management — product backed by the management store.

use super::{DataStore, Product, RouteRef, VirtualType};

pub const NAME: &str = "manager";

#[must_use]
pub fn init() -> Product {
    Product::new(NAME, DataStore::Management)
        .weight(90)
        .virtual_type(
            VirtualType::new("cluster-list", "manager.clusters", RouteRef::named("c-cluster-manager-clusters"))
                .weight(100)
                .icon("cluster")
                .exact(true),
        )
        .basic_types(&["cluster-list"])
}
