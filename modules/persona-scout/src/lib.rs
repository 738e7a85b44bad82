pub mod batch;
pub mod commands;
pub mod composer;
pub mod decode;
pub mod extractors;
pub mod fetcher;
pub mod gateway;
pub mod reconciler;
pub mod stats;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
