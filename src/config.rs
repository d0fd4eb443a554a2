// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    backend::{BackendApi, HttpBackend},
    services::{
        contract_service::{ContractGenerator, PdfContractGenerator},
        polling::PollConfig,
        provisioning::ProvisioningConfig,
        DeviceActionService, EnrolmentProtocol, SalePersistenceSaga, SaleService,
    },
};

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub backend_timeout: Duration,
    pub enrolment_poll: PollConfig,
    pub locate_poll: PollConfig,
    pub contract_fonts_dir: String,
    pub contract_font_family: String,
    pub public_base_url: String,
    pub provisioning: ProvisioningConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_url = env::var("BACKEND_URL").context("BACKEND_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let defaults = PollConfig::enrolment();
        let enrolment_poll = PollConfig {
            interval: Duration::from_secs(env_u64(
                "ENROLMENT_POLL_INTERVAL_SECS",
                defaults.interval.as_secs(),
            )),
            max_attempts: env_u32("ENROLMENT_POLL_MAX_ATTEMPTS", defaults.max_attempts),
            ..defaults
        };
        let defaults = PollConfig::locate();
        let locate_poll = PollConfig {
            initial_delay: Duration::from_secs(env_u64(
                "LOCATE_GRACE_SECS",
                defaults.initial_delay.as_secs(),
            )),
            interval: Duration::from_secs(env_u64(
                "LOCATE_POLL_INTERVAL_SECS",
                defaults.interval.as_secs(),
            )),
            max_attempts: env_u32("LOCATE_POLL_MAX_ATTEMPTS", defaults.max_attempts),
        };

        Ok(Self {
            backend_url,
            jwt_secret,
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:3000"),
            backend_timeout: Duration::from_secs(env_u64("BACKEND_TIMEOUT_SECS", 15)),
            enrolment_poll,
            locate_poll,
            contract_fonts_dir: env_string("CONTRACT_FONTS_DIR", "./fonts"),
            contract_font_family: env_string("CONTRACT_FONT_FAMILY", "Roboto"),
            public_base_url: env_string("PUBLIC_BASE_URL", "http://localhost:3000"),
            provisioning: ProvisioningConfig {
                admin_component: env_string(
                    "PROVISIONING_ADMIN_COMPONENT",
                    "com.financing.agent/.AdminReceiver",
                ),
                package_download_url: env_string(
                    "PROVISIONING_PACKAGE_URL",
                    "https://downloads.example.com/agent/latest.apk",
                ),
                package_checksum: env_string("PROVISIONING_PACKAGE_CHECKSUM", ""),
            },
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: String,
    pub sale_service: SaleService,
    pub device_actions: DeviceActionService,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let backend = HttpBackend::new(&config.backend_url, config.backend_timeout)
            .context("Falha ao criar o cliente do backend")?;
        tracing::info!("✅ Cliente do backend configurado para {}", config.backend_url);

        let contracts = PdfContractGenerator::new(&config.contract_fonts_dir, &config.contract_font_family);

        Ok(Self::with_collaborators(config, Arc::new(backend), Arc::new(contracts)))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_collaborators(
        config: &AppConfig,
        backend: Arc<dyn BackendApi>,
        contracts: Arc<dyn ContractGenerator>,
    ) -> Self {
        let enrolment = EnrolmentProtocol::new(
            backend.clone(),
            config.enrolment_poll,
            config.provisioning.clone(),
        );
        let saga = SalePersistenceSaga::new(backend.clone());
        let sale_service = SaleService::new(enrolment, saga, contracts, &config.public_base_url);
        let device_actions = DeviceActionService::new(backend, config.locate_poll);

        Self {
            jwt_secret: config.jwt_secret.clone(),
            sale_service,
            device_actions,
        }
    }
}
