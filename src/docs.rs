// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Wizard ---
        handlers::sales::open_wizard,
        handlers::sales::get_wizard,
        handlers::sales::close_wizard,
        handlers::sales::go_back,
        handlers::sales::select_customer,
        handlers::sales::start_enrolment,
        handlers::sales::get_enrolment,
        handlers::sales::enrolment_qr,
        handlers::sales::confirm_device,
        handlers::sales::preview_plan,
        handlers::sales::submit_plan,
        handlers::sales::generate_contract,
        handlers::sales::download_contract,
        handlers::sales::attach_signed_contract,
        handlers::sales::confirm_contract,
        handlers::sales::finalize_sale,

        // --- Devices ---
        handlers::devices::request_location,
        handlers::devices::cancel_location,
        handlers::devices::get_location,
        handlers::devices::block_device,
        handlers::devices::unblock_device,
    ),
    components(
        schemas(
            // --- Sale ---
            models::sale::CustomerRef,
            models::sale::Operator,
            models::sale::ResolvedDevice,
            models::sale::SignedContract,
            models::sale::SaleDraft,
            models::sale::SaleReceipt,

            // --- Plan ---
            models::currency::Currency,
            models::plan::PaymentMethod,
            models::plan::PaymentState,
            models::plan::PaymentPlan,
            models::plan::Installment,
            models::plan::InitialPayment,

            // --- Device / Enrolment ---
            models::device::DeviceState,
            models::device::DeviceDetails,
            models::device::DeviceLocation,
            models::device::DeviceCommand,
            models::enrolment::ProvisioningPayload,
            models::enrolment::EnrolmentState,

            // --- Wizard ---
            services::sale_wizard::WizardStage,
            services::sale_wizard::PlanSubmission,
            services::sale_service::WizardView,
            services::sale_service::BackOutcome,
            services::sale_service::ContractReference,
            services::sale_service::PlanPreview,
            services::sale_service::PreviewInstallment,
            services::device_action_service::LocateStatus,

            // --- Payloads ---
            handlers::sales::SelectCustomerPayload,
            handlers::sales::AttachSignedContractPayload,
            handlers::devices::DeviceCommandResponse,
        )
    ),
    tags(
        (name = "Sales", description = "Assistente de venda: cliente, aparelho, plano, contrato e finalização"),
        (name = "Devices", description = "Ações pós-venda sobre o aparelho (localizar, bloquear)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
