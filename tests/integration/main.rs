//! Integration tests for the Pinch crawler

mod audit_tests;
mod common;
mod crawl_tests;
mod fetch_tests;
mod server_tests;
