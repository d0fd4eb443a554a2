// src/models/currency.rs

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Catálogo fixo de moedas. Só afeta exibição e leitura dos campos digitados;
// os valores guardados são sempre decimais simples na moeda do plano.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cop,
    Usd,
    Eur,
    Mxn,
    Pen,
    Clp,
    Brl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub code: &'static str,
    pub locale: &'static str,
    pub symbol: &'static str,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub fraction_digits: u32,
}

const COP: CurrencyFormat = CurrencyFormat { code: "COP", locale: "es-CO", symbol: "$", thousands_separator: '.', decimal_separator: ',', fraction_digits: 0 };
const USD: CurrencyFormat = CurrencyFormat { code: "USD", locale: "en-US", symbol: "US$", thousands_separator: ',', decimal_separator: '.', fraction_digits: 2 };
const EUR: CurrencyFormat = CurrencyFormat { code: "EUR", locale: "es-ES", symbol: "€", thousands_separator: '.', decimal_separator: ',', fraction_digits: 2 };
const MXN: CurrencyFormat = CurrencyFormat { code: "MXN", locale: "es-MX", symbol: "MX$", thousands_separator: ',', decimal_separator: '.', fraction_digits: 2 };
const PEN: CurrencyFormat = CurrencyFormat { code: "PEN", locale: "es-PE", symbol: "S/", thousands_separator: ',', decimal_separator: '.', fraction_digits: 2 };
const CLP: CurrencyFormat = CurrencyFormat { code: "CLP", locale: "es-CL", symbol: "$", thousands_separator: '.', decimal_separator: ',', fraction_digits: 0 };
const BRL: CurrencyFormat = CurrencyFormat { code: "BRL", locale: "pt-BR", symbol: "R$", thousands_separator: '.', decimal_separator: ',', fraction_digits: 2 };

impl Currency {
    pub const ALL: [Currency; 7] = [
        Currency::Cop,
        Currency::Usd,
        Currency::Eur,
        Currency::Mxn,
        Currency::Pen,
        Currency::Clp,
        Currency::Brl,
    ];

    pub fn format_rules(self) -> &'static CurrencyFormat {
        match self {
            Currency::Cop => &COP,
            Currency::Usd => &USD,
            Currency::Eur => &EUR,
            Currency::Mxn => &MXN,
            Currency::Pen => &PEN,
            Currency::Clp => &CLP,
            Currency::Brl => &BRL,
        }
    }

    pub fn code(self) -> &'static str {
        self.format_rules().code
    }

    /// Lê um valor digitado no formato da moeda ("1.250.000", "US$ 1,250.50").
    /// Texto que não vira número vale zero; quem exige o campo valida depois.
    pub fn parse_amount(self, raw: &str) -> Decimal {
        self.try_parse_amount(raw).unwrap_or(Decimal::ZERO)
    }

    /// Como `parse_amount`, mas distingue "0" digitado de texto ilegível.
    pub fn try_parse_amount(self, raw: &str) -> Option<Decimal> {
        let rules = self.format_rules();

        let normalized: String = raw
            .chars()
            .filter(|c| {
                c.is_ascii_digit()
                    || *c == '-'
                    || *c == rules.decimal_separator
                    || *c == rules.thousands_separator
            })
            .filter(|c| *c != rules.thousands_separator)
            .map(|c| if c == rules.decimal_separator { '.' } else { c })
            .collect();

        Decimal::from_str(&normalized).ok()
    }

    pub fn format_amount(self, value: Decimal) -> String {
        let rules = self.format_rules();
        let rounded =
            value.round_dp_with_strategy(rules.fraction_digits, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

        let plain = format!("{:.*}", rules.fraction_digits as usize, rounded.abs());
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (plain.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(rules.thousands_separator);
            }
            grouped.push(digit);
        }

        match frac_part {
            Some(frac) => format!("{sign}{} {grouped}{}{frac}", rules.symbol, rules.decimal_separator),
            None => format!("{sign}{} {grouped}", rules.symbol),
        }
    }
}
