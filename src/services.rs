pub mod amortization;
pub mod polling;
pub mod provisioning;
pub mod enrolment_service;
pub use enrolment_service::EnrolmentProtocol;
pub mod device_action_service;
pub use device_action_service::DeviceActionService;
pub mod sale_wizard;
pub use sale_wizard::SaleWizard;
pub mod sale_saga;
pub use sale_saga::SalePersistenceSaga;
pub mod contract_service;
pub mod sale_service;
pub use sale_service::SaleService;
