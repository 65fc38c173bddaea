// Library exports for FiuggiGram
// This allows integration tests to use the crate's modules

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod posts;
pub mod routes;
pub mod state;
