pub mod config;
pub mod db;
pub mod engine;
pub mod game;
pub mod gateway;
pub mod ledger;
pub mod server;
pub mod tokio_tools;

#[cfg(test)]
pub mod test_utils;
