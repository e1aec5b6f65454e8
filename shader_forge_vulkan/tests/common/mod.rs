//! Shared helpers for GPU integration tests

pub mod spirv_builder;
pub mod device;
