pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod docs;
pub mod errors;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_utils;
