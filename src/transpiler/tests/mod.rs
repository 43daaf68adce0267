//! Renderer test modules.
//!
//! - `nosql`: output shapes per dialect
//! - `capabilities`: support probes and unsupported-feature errors

mod nosql;
