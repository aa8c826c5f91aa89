pub mod config;
pub mod export;
pub mod fetch;
pub mod harness;
pub mod lookup;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod store;
