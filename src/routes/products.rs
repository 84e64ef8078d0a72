//! Product menu routes.

use axum::extract::State;
use axum::response::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::product::{BasicType, DataStore, Product, VirtualType};
use crate::routes::navigate::session_id;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub name: String,
    pub store: DataStore,
    pub weight: i32,
    pub show_namespace_filter: bool,
    pub virtual_types: Vec<VirtualType>,
    pub basic_types: Vec<BasicType>,
}

fn to_response(product: &Product, has_project: bool) -> ProductResponse {
    ProductResponse {
        name: product.name.clone(),
        store: product.in_store,
        weight: product.weight,
        show_namespace_filter: product.show_namespace_filter,
        virtual_types: product
            .visible_types(has_project)
            .into_iter()
            .cloned()
            .collect(),
        basic_types: product.basic_types.clone(),
    }
}

/// `GET /api/products` — products applied to the visitor, with the virtual
/// types visible for the current cluster.
pub async fn list_products(State(state): State<AppState>, jar: CookieJar) -> Json<Vec<ProductResponse>> {
    let Some(session) = state.existing_session(session_id(&jar)).await else {
        return Json(Vec::new());
    };

    let console = session.lock().await;
    let has_project = console.has_project();
    Json(
        console
            .products
            .iter()
            .map(|p| to_response(p, has_project))
            .collect(),
    )
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
