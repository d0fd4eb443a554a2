pub mod devices;
pub mod sales;
