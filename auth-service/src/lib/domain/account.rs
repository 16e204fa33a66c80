pub mod errors;
pub mod management;
pub mod models;
pub mod ports;
pub mod seed;
pub mod service;
