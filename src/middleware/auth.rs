// src/middleware/auth.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{auth::Claims, sale::Operator},
};

// Operador autenticado. O token bruto segue junto porque o backend
// remoto também exige o Bearer em todas as chamadas.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub operator: Operator,
    pub token: String,
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("token rejeitado: {}", e);
        AppError::InvalidToken
    })?;

    Ok(token_data.claims)
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::InvalidToken)?;

        let claims = decode_claims(bearer.token(), &state.jwt_secret)?;

        Ok(AuthenticatedUser {
            operator: Operator {
                user_id: claims.sub,
                vendor_id: claims.vendor_id,
                name: claims.name,
            },
            token: bearer.token().to_string(),
        })
    }
}
