// src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod backend;
pub mod common;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

pub fn app(app_state: AppState) -> Router {
    let wizard_routes = Router::new()
        .route("/", post(handlers::sales::open_wizard))
        .route(
            "/{id}",
            get(handlers::sales::get_wizard).delete(handlers::sales::close_wizard),
        )
        .route("/{id}/back", post(handlers::sales::go_back))
        .route("/{id}/customer", post(handlers::sales::select_customer))
        .route(
            "/{id}/enrolment",
            post(handlers::sales::start_enrolment).get(handlers::sales::get_enrolment),
        )
        .route("/{id}/enrolment/qr", get(handlers::sales::enrolment_qr))
        .route("/{id}/device", post(handlers::sales::confirm_device))
        .route("/{id}/plan", post(handlers::sales::submit_plan))
        .route(
            "/{id}/contract",
            post(handlers::sales::generate_contract).get(handlers::sales::download_contract),
        )
        .route("/{id}/contract/signed", post(handlers::sales::attach_signed_contract))
        .route("/{id}/contract/confirm", post(handlers::sales::confirm_contract))
        .route("/{id}/finalize", post(handlers::sales::finalize_sale));

    let sales_routes = Router::new()
        .nest("/wizards", wizard_routes)
        .route("/plans/preview", post(handlers::sales::preview_plan));

    let device_routes = Router::new()
        .route(
            "/{id}/locate",
            post(handlers::devices::request_location).delete(handlers::devices::cancel_location),
        )
        .route("/{id}/location", get(handlers::devices::get_location))
        .route("/{id}/block", post(handlers::devices::block_device))
        .route("/{id}/unblock", post(handlers::devices::unblock_device));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/sales", sales_routes)
        .nest("/api/devices", device_routes)
        .with_state(app_state)
}
