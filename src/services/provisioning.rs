// src/services/provisioning.rs

use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::QrCode;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{common::error::AppError, models::enrolment::ProvisioningPayload};

// Chaves do provisionamento por QR do agente de gestão (Android Enterprise)
pub const ADMIN_COMPONENT_KEY: &str = "android.app.extra.PROVISIONING_DEVICE_ADMIN_COMPONENT_NAME";
pub const PACKAGE_DOWNLOAD_KEY: &str = "android.app.extra.PROVISIONING_DEVICE_ADMIN_PACKAGE_DOWNLOAD_LOCATION";
pub const PACKAGE_CHECKSUM_KEY: &str = "android.app.extra.PROVISIONING_DEVICE_ADMIN_SIGNATURE_CHECKSUM";
pub const LEAVE_SYSTEM_APPS_KEY: &str = "android.app.extra.PROVISIONING_LEAVE_ALL_SYSTEM_APPS_ENABLED";
pub const SKIP_ENCRYPTION_KEY: &str = "android.app.extra.PROVISIONING_SKIP_ENCRYPTION";
pub const ADMIN_EXTRAS_KEY: &str = "android.app.extra.PROVISIONING_ADMIN_EXTRAS_BUNDLE";
pub const ENROLMENT_ID_EXTRA: &str = "enrolment_id";

/// Constantes fixas do provisionamento; só o `enrolment_id` varia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    pub admin_component: String,
    pub package_download_url: String,
    pub package_checksum: String,
}

impl ProvisioningConfig {
    pub fn build_payload(&self, enrolment_id: Uuid) -> ProvisioningPayload {
        let mut extras = Map::new();
        extras.insert(ENROLMENT_ID_EXTRA.to_string(), json!(enrolment_id.to_string()));

        ProvisioningPayload(json!({
            ADMIN_COMPONENT_KEY: self.admin_component,
            PACKAGE_DOWNLOAD_KEY: self.package_download_url,
            PACKAGE_CHECKSUM_KEY: self.package_checksum,
            LEAVE_SYSTEM_APPS_KEY: true,
            SKIP_ENCRYPTION_KEY: false,
            ADMIN_EXTRAS_KEY: Value::Object(extras),
        }))
    }
}

impl ProvisioningPayload {
    pub fn enrolment_id(&self) -> Option<Uuid> {
        self.0
            .get(ADMIN_EXTRAS_KEY)?
            .get(ENROLMENT_ID_EXTRA)?
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }

    /// Renderiza o payload como QR em PNG (lido pela câmera do aparelho).
    pub fn to_qr_png(&self) -> Result<Vec<u8>, AppError> {
        let text = serde_json::to_string(&self.0)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::new(e)))?;

        let code = QrCode::new(text.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        let image_buffer = code.render::<Luma<u8>>().min_dimensions(320, 320).build();
        let dynamic_image = DynamicImage::ImageLuma8(image_buffer);

        let mut png = Vec::new();
        dynamic_image
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(png)
    }
}
