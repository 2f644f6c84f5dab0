//! Integration tests for the node store, filters and station directory

mod cli_contracts;
mod concurrency;
mod filter_properties;
mod persistence;
mod scenarios;
mod scheduler;
mod support;
