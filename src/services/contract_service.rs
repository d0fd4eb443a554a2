// src/services/contract_service.rs

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use genpdf::{elements, style, Alignment, Element};

use crate::{
    common::error::AppError,
    models::{plan::PaymentMethod, sale::SaleDraft},
    services::amortization::installment_schedule,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleLine {
    pub number: u32,
    pub due_date: String,
    pub amount: String,
}

/// Texto do contrato já formatado na moeda do plano. Montado sem I/O para
/// poder ser testado sem renderizar PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractContent {
    pub issued_on: String,
    pub customer_name: String,
    pub customer_document: Option<String>,
    pub operator_name: Option<String>,
    pub device_description: String,
    pub serial_number: String,
    pub imeis: Vec<String>,
    pub device_price: String,
    pub initial_payment: String,
    pub payment_method: &'static str,
    pub payment_date: String,
    pub balance_to_finance: String,
    pub quotas: u32,
    pub frecuencia_dias: u32,
    pub monto_cuota: String,
    pub schedule: Vec<ScheduleLine>,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Efectivo",
        PaymentMethod::BankTransfer => "Transferencia bancaria",
        PaymentMethod::Card => "Tarjeta",
        PaymentMethod::Other => "Otro",
    }
}

impl ContractContent {
    pub fn from_draft(draft: &SaleDraft, issued_on: NaiveDate) -> Result<Self, AppError> {
        let customer = draft.customer.as_ref().ok_or(AppError::CustomerRequired)?;
        let device = draft.device.as_ref().ok_or(AppError::DeviceNotResolved)?;
        let plan = draft
            .payment_plan
            .as_ref()
            .ok_or(AppError::StagePrecondition("plano não definido"))?;
        let payment = draft
            .initial_payment
            .as_ref()
            .ok_or(AppError::StagePrecondition("entrada não registrada"))?;

        let currency = plan.currency;
        let schedule = installment_schedule(
            Some(plan.monto_cuota),
            Some(plan.quotas),
            Some(plan.frecuencia_dias),
            plan.initial_date,
        )
        .into_iter()
        .map(|installment| ScheduleLine {
            number: installment.number,
            due_date: format_date(installment.due_date),
            amount: currency.format_amount(installment.amount),
        })
        .collect();

        let details = &device.details;
        Ok(Self {
            issued_on: format_date(issued_on),
            customer_name: customer
                .full_name
                .clone()
                .unwrap_or_else(|| customer.id.to_string()),
            customer_document: customer.document_number.clone(),
            operator_name: draft.authenticated_user.name.clone(),
            device_description: format!("{} {} ({})", details.brand, details.model, details.product_name),
            serial_number: details.serial_number.clone(),
            imeis: details.imeis.clone(),
            device_price: currency.format_amount(plan.value),
            initial_payment: currency.format_amount(payment.value),
            payment_method: method_label(payment.method),
            payment_date: format_date(payment.date),
            balance_to_finance: currency.format_amount(plan.balance_to_finance),
            quotas: plan.quotas,
            frecuencia_dias: plan.frecuencia_dias,
            monto_cuota: currency.format_amount(plan.monto_cuota),
            schedule,
        })
    }
}

/// Gerador de documentos do contrato (PDF em produção, fake nos testes).
pub trait ContractGenerator: Send + Sync {
    fn render(&self, content: &ContractContent) -> Result<Vec<u8>, AppError>;
}

#[derive(Debug, Clone)]
pub struct GeneratedContract {
    pub bytes: Vec<u8>,
    pub reference_url: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PdfContractGenerator {
    fonts_dir: PathBuf,
    font_family: String,
}

impl PdfContractGenerator {
    pub fn new(fonts_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            font_family: font_family.into(),
        }
    }
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::ContractGeneration(e.to_string())
}

impl ContractGenerator for PdfContractGenerator {
    fn render(&self, content: &ContractContent) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None)
            .map_err(|_| {
                AppError::FontNotFound(format!(
                    "Fonte {} não encontrada em {}",
                    self.font_family,
                    self.fonts_dir.display()
                ))
            })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title("Contrato de financiamiento");
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        let bold = style::Style::new().bold();

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new("CONTRATO DE FINANCIAMIENTO DE EQUIPO")
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(elements::Paragraph::new(format!("Fecha: {}", content.issued_on)));
        doc.push(elements::Break::new(1.5));

        // --- PARTES ---
        doc.push(elements::Paragraph::new("CLIENTE").styled(bold));
        doc.push(elements::Paragraph::new(format!("Nombre: {}", content.customer_name)));
        if let Some(document) = &content.customer_document {
            doc.push(elements::Paragraph::new(format!("Documento: {}", document)));
        }
        if let Some(operator) = &content.operator_name {
            doc.push(elements::Paragraph::new(format!("Vendedor: {}", operator)));
        }
        doc.push(elements::Break::new(1));

        // --- EQUIPO ---
        doc.push(elements::Paragraph::new("EQUIPO").styled(bold));
        doc.push(elements::Paragraph::new(content.device_description.clone()));
        doc.push(elements::Paragraph::new(format!("Serie: {}", content.serial_number)));
        if !content.imeis.is_empty() {
            doc.push(elements::Paragraph::new(format!("IMEI: {}", content.imeis.join(", "))));
        }
        doc.push(elements::Break::new(1));

        // --- CONDICIONES ---
        doc.push(elements::Paragraph::new("CONDICIONES").styled(bold));
        doc.push(elements::Paragraph::new(format!("Valor del equipo: {}", content.device_price)));
        doc.push(elements::Paragraph::new(format!(
            "Cuota inicial: {} ({}, {})",
            content.initial_payment, content.payment_method, content.payment_date
        )));
        doc.push(elements::Paragraph::new(format!("Saldo a financiar: {}", content.balance_to_finance)));
        if content.quotas > 0 {
            doc.push(elements::Paragraph::new(format!(
                "{} cuotas de {} cada {} días",
                content.quotas, content.monto_cuota, content.frecuencia_dias
            )));
        }
        doc.push(elements::Break::new(1));

        // --- CRONOGRAMA ---
        // Pesos das colunas: Nº (1), Vencimento (3), Valor (3)
        if !content.schedule.is_empty() {
            let mut table = elements::TableLayout::new(vec![1, 3, 3]);
            table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

            table
                .row()
                .element(elements::Paragraph::new("N°").styled(bold))
                .element(elements::Paragraph::new("Vencimiento").styled(bold))
                .element(elements::Paragraph::new("Valor").styled(bold))
                .push()
                .map_err(pdf_error)?;

            for line in &content.schedule {
                table
                    .row()
                    .element(elements::Paragraph::new(line.number.to_string()))
                    .element(elements::Paragraph::new(line.due_date.clone()))
                    .element(elements::Paragraph::new(line.amount.clone()))
                    .push()
                    .map_err(pdf_error)?;
            }

            doc.push(table);
        }

        // --- FIRMAS ---
        doc.push(elements::Break::new(3));
        let mut signatures = elements::TableLayout::new(vec![1, 1]);
        signatures
            .row()
            .element(elements::Paragraph::new("______________________").aligned(Alignment::Center))
            .element(elements::Paragraph::new("______________________").aligned(Alignment::Center))
            .push()
            .map_err(pdf_error)?;
        signatures
            .row()
            .element(elements::Paragraph::new("Cliente").aligned(Alignment::Center))
            .element(elements::Paragraph::new("Vendedor").aligned(Alignment::Center))
            .push()
            .map_err(pdf_error)?;
        doc.push(signatures);

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        Ok(buffer)
    }
}
