pub mod endpoints;
pub mod repository;

pub use endpoints::{endpoint_conf, endpoints};
