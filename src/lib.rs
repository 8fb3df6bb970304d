pub mod app;
pub mod controller;
pub mod modules;
pub mod repository;
pub mod router;
pub mod types;
pub mod utils;
