// src/handlers/sales.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{enrolment::EnrolmentState, sale::CustomerRef, sale::SaleReceipt},
    services::{
        sale_service::{BackOutcome, ContractReference, PlanPreview, WizardView},
        sale_wizard::PlanSubmission,
    },
};

// =============================================================================
//  ÁREA 1: CICLO DE VIDA DO ASSISTENTE
// =============================================================================

// POST /api/sales/wizards
#[utoipa::path(
    post,
    path = "/api/sales/wizards",
    tag = "Sales",
    responses(
        (status = 201, description = "Assistente aberto na etapa Cliente", body = WizardView),
        (status = 401, description = "Token inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn open_wizard(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state.sale_service.open(&user.operator).await;
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/sales/wizards/{id}
#[utoipa::path(
    get,
    path = "/api/sales/wizards/{id}",
    tag = "Sales",
    responses(
        (status = 200, description = "Estado atual do assistente", body = WizardView),
        (status = 404, description = "Assistente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn get_wizard(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .sale_service
        .view(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// DELETE /api/sales/wizards/{id}
#[utoipa::path(
    delete,
    path = "/api/sales/wizards/{id}",
    tag = "Sales",
    responses(
        (status = 204, description = "Assistente fechado (polling cancelado)"),
        (status = 404, description = "Assistente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn close_wizard(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .sale_service
        .close(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/sales/wizards/{id}/back
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/back",
    tag = "Sales",
    responses(
        (status = 200, description = "Etapa anterior, ou `exited` na etapa 1", body = BackOutcome)
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn go_back(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = app_state
        .sale_service
        .back(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// =============================================================================
//  ÁREA 2: CLIENTE E DISPOSITIVO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectCustomerPayload {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub customer_id: Uuid,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ana María Restrepo")]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 32, message = "invalid_document"))]
    #[schema(example = "1020304050")]
    pub document_number: Option<String>,
}

// POST /api/sales/wizards/{id}/customer
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/customer",
    tag = "Sales",
    request_body = SelectCustomerPayload,
    responses(
        (status = 200, description = "Cliente selecionado, etapa Dispositivo", body = WizardView),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Etapa inválida")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn select_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
    Json(payload): Json<SelectCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let customer = CustomerRef {
        id: payload.customer_id,
        full_name: payload.full_name,
        document_number: payload.document_number,
    };

    let view = app_state
        .sale_service
        .select_customer(wizard_id, &user.operator, customer)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// POST /api/sales/wizards/{id}/enrolment
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/enrolment",
    tag = "Sales",
    responses(
        (status = 202, description = "Enrolamento criado, aguardando o aparelho", body = EnrolmentState),
        (status = 409, description = "Etapa inválida"),
        (status = 502, description = "Backend indisponível")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn start_enrolment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let state = app_state
        .sale_service
        .start_enrolment(wizard_id, &user.operator, &user.token)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::ACCEPTED, Json(state)))
}

// GET /api/sales/wizards/{id}/enrolment
#[utoipa::path(
    get,
    path = "/api/sales/wizards/{id}/enrolment",
    tag = "Sales",
    responses(
        (status = 200, description = "Estado do enrolamento", body = EnrolmentState)
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn get_enrolment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let state = app_state
        .sale_service
        .enrolment_state(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(state)))
}

// GET /api/sales/wizards/{id}/enrolment/qr
#[utoipa::path(
    get,
    path = "/api/sales/wizards/{id}/enrolment/qr",
    tag = "Sales",
    responses(
        (status = 200, description = "QR de provisionamento", content_type = "image/png"),
        (status = 404, description = "Nenhum enrolamento aguardando o aparelho")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn enrolment_qr(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let png = app_state
        .sale_service
        .enrolment_qr(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

// POST /api/sales/wizards/{id}/device
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/device",
    tag = "Sales",
    responses(
        (status = 200, description = "Dispositivo confirmado, etapa Plano", body = WizardView),
        (status = 409, description = "Dispositivo ainda não resolvido")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn confirm_device(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .sale_service
        .confirm_device(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// =============================================================================
//  ÁREA 3: PLANO DE PAGAMENTO
// =============================================================================

// POST /api/sales/plans/preview
#[utoipa::path(
    post,
    path = "/api/sales/plans/preview",
    tag = "Sales",
    request_body = PlanSubmission,
    responses(
        (status = 200, description = "Saldo, parcela e cronograma", body = PlanPreview),
        (status = 422, description = "Parâmetros do plano inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<PlanSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let preview = app_state
        .sale_service
        .preview_plan(&payload)
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(preview)))
}

// POST /api/sales/wizards/{id}/plan
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/plan",
    tag = "Sales",
    request_body = PlanSubmission,
    responses(
        (status = 200, description = "Plano registrado, etapa Contrato", body = WizardView),
        (status = 422, description = "Erros por campo")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn submit_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
    Json(payload): Json<PlanSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .sale_service
        .submit_plan(wizard_id, &user.operator, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// =============================================================================
//  ÁREA 4: CONTRATO
// =============================================================================

// POST /api/sales/wizards/{id}/contract
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/contract",
    tag = "Sales",
    responses(
        (status = 201, description = "Contrato gerado", body = ContractReference),
        (status = 500, description = "Falha na geração (pode ser repetida)")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn generate_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = app_state
        .sale_service
        .generate_contract(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(reference)))
}

// GET /api/sales/wizards/{id}/contract
#[utoipa::path(
    get,
    path = "/api/sales/wizards/{id}/contract",
    tag = "Sales",
    responses(
        (status = 200, description = "PDF do contrato", content_type = "application/pdf"),
        (status = 404, description = "Contrato ainda não gerado")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn download_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf_bytes = app_state
        .sale_service
        .contract_pdf(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"contrato_{}.pdf\"", wizard_id),
        ),
    ];

    Ok((headers, pdf_bytes))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachSignedContractPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "contrato_assinado.pdf")]
    pub file_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "files/2024/01/contrato_assinado.pdf")]
    pub reference: String,
}

// POST /api/sales/wizards/{id}/contract/signed
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/contract/signed",
    tag = "Sales",
    request_body = AttachSignedContractPayload,
    responses(
        (status = 200, description = "Contrato assinado anexado", body = WizardView),
        (status = 400, description = "Dados inválidos")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn attach_signed_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
    Json(payload): Json<AttachSignedContractPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let view = app_state
        .sale_service
        .attach_signed_contract(wizard_id, &user.operator, payload.file_name, payload.reference)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// POST /api/sales/wizards/{id}/contract/confirm
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/contract/confirm",
    tag = "Sales",
    responses(
        (status = 200, description = "Etapa Resumo", body = WizardView),
        (status = 422, description = "Contrato assinado obrigatório")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn confirm_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .sale_service
        .confirm_contract(wizard_id, &user.operator)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

// =============================================================================
//  ÁREA 5: FINALIZAÇÃO
// =============================================================================

// POST /api/sales/wizards/{id}/finalize
#[utoipa::path(
    post,
    path = "/api/sales/wizards/{id}/finalize",
    tag = "Sales",
    responses(
        (status = 201, description = "Venda registrada; o assistente volta ao início", body = SaleReceipt),
        (status = 409, description = "Pré-condição do Resumo não atendida"),
        (status = 502, description = "Falha em um passo da persistência (com registros já criados)")
    ),
    params(("id" = Uuid, Path, description = "ID do assistente")),
    security(("api_jwt" = []))
)]
pub async fn finalize_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(wizard_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = app_state
        .sale_service
        .finalize(wizard_id, &user.operator, &user.token)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
