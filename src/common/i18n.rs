// src/common/i18n.rs

// Catálogo de mensagens: (chave, pt, es, en)
const CATALOG: &[(&str, &str, &str, &str)] = &[
    ("validation", "Um ou mais campos são inválidos.", "Uno o más campos no son válidos.", "One or more fields are invalid."),
    ("plan_invalid", "O plano de pagamento é inválido.", "El plan de pago no es válido.", "The payment plan is invalid."),
    ("invalid_token", "Token de autenticação inválido ou ausente.", "Token de autenticación inválido o ausente.", "Missing or invalid authentication token."),
    ("wizard_not_found", "Assistente de venda não encontrado.", "Asistente de venta no encontrado.", "Sale wizard not found."),
    ("invalid_stage", "Esta ação não é permitida na etapa atual.", "Esta acción no está permitida en la etapa actual.", "This action is not allowed at the current stage."),
    ("stage_precondition", "A etapa anterior não foi concluída.", "La etapa anterior no ha sido completada.", "The previous stage has not been completed."),
    ("customer_required", "Selecione um cliente.", "Seleccione un cliente.", "Select a customer."),
    ("device_not_resolved", "O dispositivo ainda não se conectou.", "El dispositivo aún no se ha conectado.", "The device has not connected yet."),
    ("no_provisioning_payload", "Nenhum código de enrolamento ativo.", "No hay un código de enrolamiento activo.", "No active enrolment code."),
    ("signed_contract_required", "Anexe o contrato assinado.", "Adjunte el contrato firmado.", "Attach the signed contract."),
    ("contract_not_generated", "O contrato ainda não foi gerado.", "El contrato aún no ha sido generado.", "The contract has not been generated yet."),
    ("contract_generation", "Não foi possível gerar o contrato.", "No fue posible generar el contrato.", "The contract could not be generated."),
    ("finalize_in_progress", "A venda já está sendo finalizada.", "La venta ya se está finalizando.", "The sale is already being finalized."),
    ("sale_finalize", "Não foi possível registrar a venda.", "No fue posible registrar la venta.", "The sale could not be saved."),
    ("backend_unavailable", "Falha de comunicação com o servidor.", "Falla de comunicación con el servidor.", "Could not reach the backend."),
    ("internal", "Ocorreu um erro inesperado.", "Ocurrió un error inesperado.", "An unexpected error occurred."),
    // --- Campos do plano ---
    ("device_price_required", "Informe o valor do dispositivo.", "Ingrese el valor del dispositivo.", "Enter the device price."),
    ("initial_payment_required", "Informe o valor da entrada.", "Ingrese el valor de la cuota inicial.", "Enter the initial payment."),
    ("negative_amount", "O valor não pode ser negativo.", "El valor no puede ser negativo.", "The amount cannot be negative."),
    ("initial_exceeds_price", "A entrada não pode superar o valor do dispositivo.", "La cuota inicial no puede superar el valor del dispositivo.", "The initial payment cannot exceed the device price."),
    ("settled_requires_zero", "Sem saldo a financiar, parcelas e frequência devem ser 0.", "Sin saldo a financiar, cuotas y frecuencia deben ser 0.", "With nothing to finance, installments and frequency must be 0."),
    ("quotas_required", "Informe o número de parcelas.", "Ingrese el número de cuotas.", "Enter the number of installments."),
    ("frequency_required", "Informe a frequência em dias.", "Ingrese la frecuencia en días.", "Enter the frequency in days."),
    ("initial_date_required", "Informe a data da primeira parcela.", "Ingrese la fecha de la primera cuota.", "Enter the first installment date."),
    ("too_many_quotas", "Número de parcelas acima do permitido.", "Número de cuotas por encima del permitido.", "Too many installments."),
    ("schedule_out_of_range", "O cronograma ultrapassa o prazo máximo.", "El cronograma supera el plazo máximo.", "The schedule exceeds the maximum term."),
    ("installment_too_small", "O valor da parcela fica zerado.", "El valor de la cuota queda en cero.", "The installment amount rounds to zero."),
    ("payment_method_required", "Informe o método de pagamento.", "Ingrese el método de pago.", "Enter the payment method."),
    ("payment_date_required", "Informe a data do pagamento.", "Ingrese la fecha del pago.", "Enter the payment date."),
];

/// Procura a mensagem no idioma pedido; sem tradução cai para inglês.
pub fn message(lang: &str, key: &str) -> &'static str {
    let Some(entry) = CATALOG.iter().find(|(k, ..)| *k == key) else {
        return "An unexpected error occurred.";
    };

    match lang {
        "pt" => entry.1,
        "es" => entry.2,
        _ => entry.3,
    }
}
