pub mod auth;
pub mod currency;
pub mod device;
pub mod enrolment;
pub mod plan;
pub mod sale;
