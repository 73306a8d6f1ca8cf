pub mod service_controller;
pub mod types;
