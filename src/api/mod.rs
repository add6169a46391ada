//! Admin backend access: two wire protocols behind one adapter, and a
//! cached client on top.

pub mod adapter;
pub mod api_types;
pub mod cache;
pub mod cached_client;
pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod types;
