//! Test Helper Utilities
//!
//! Shared utilities for testing gizz-quiz

#![allow(dead_code)]

pub mod fake_source;
pub mod fixtures;

pub use fake_source::FakeJsonSource;
pub use fixtures::{
    albums_url, catalog_doc, links_doc, links_url, metadata_doc, metadata_url, test_config,
    test_engine, uploads_doc, uploads_url, wire_catalog,
};
