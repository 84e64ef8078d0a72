//! Legacy product — pages carried over from the previous console.

use super::{DataStore, IfHave, Product, RouteRef, VirtualType};

pub const NAME: &str = "legacy";
/// Feature flag gating the product.
pub const FEATURE: &str = "legacy";

const PAGES_ROUTE: &str = "c-cluster-legacy-pages-page";
const PROJECT_PAGE_ROUTE: &str = "c-cluster-legacy-project-page";
/// Menu group holding the per-project pages.
pub const PROJECT_GROUP: &str = "Project";

fn page(name: &str, label_key: &str, page: &str) -> VirtualType {
    VirtualType::new(name, label_key, RouteRef::named(PAGES_ROUTE).param("page", page))
        .group("Root")
        .namespaced(true)
        .weight(111)
        .icon("folder")
        .exact(true)
}

/// Page of the current project; only listed when the cluster has projects.
fn project_page(name: &str, label_key: &str, page: &str, weight: i32) -> VirtualType {
    VirtualType::new(name, label_key, RouteRef::named(PROJECT_PAGE_ROUTE).param("page", page))
        .if_have(IfHave::Project)
        .namespaced(true)
        .weight(weight)
        .exact(true)
        .overview(false)
}

#[must_use]
pub fn init() -> Product {
    Product::new(NAME, DataStore::Cluster)
        .weight(80)
        .if_feature(FEATURE)
        .show_namespace_filter(true)
        .virtual_type(page("v1-alerts", "legacy.alerts", "alerts"))
        .virtual_type(page("v1-catalogs", "legacy.catalogs", "catalogs"))
        .virtual_type(page("v1-notifiers", "legacy.notifiers", "notifiers"))
        .virtual_type(
            VirtualType::new("v1-project", "legacy.project.label", RouteRef::named("c-cluster-project-apps"))
                .if_have(IfHave::Project)
                .namespaced(true)
                .weight(105)
                .icon("folder")
                .exact(true)
                .overview(false),
        )
        .virtual_type(
            VirtualType::new(
                "v1-project-overview",
                "legacy.project.label",
                RouteRef::named("c-cluster-legacy-project"),
            )
            .if_have(IfHave::NoProject)
            .namespaced(true)
            .weight(105)
            .icon("folder")
            .exact(true)
            .overview(false),
        )
        .basic_types(&["v1-alerts", "v1-catalogs", "v1-notifiers", "v1-project-overview"])
        .virtual_type(project_page("project-alerts", "legacy.alerts", "alerts", 105))
        .virtual_type(project_page("project-apps", "legacy.apps", "apps", 110))
        .virtual_type(project_page("project-catalogs", "legacy.catalogs", "catalogs", 105))
        .virtual_type(project_page("project-logging", "legacy.logging", "logging", 105))
        .virtual_type(project_page("project-monitoring", "legacy.monitoring", "monitoring", 105))
        .grouped_basic_types(
            PROJECT_GROUP,
            &["project-apps", "project-alerts", "project-catalogs", "project-logging", "project-monitoring"],
        )
}
