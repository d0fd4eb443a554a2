// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Estrutura de dados ("claims") dentro do JWT emitido pelo backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // ID do usuário (operador)
    pub vendor_id: Uuid, // Vendedor/loja ao qual o operador pertence
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
    pub iat: usize,
}
