pub mod analyzers;
pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod model;
pub mod output;
pub mod pages;
pub mod temporal;
