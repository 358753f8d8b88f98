// Application layer - Use cases over the pipe backend
pub mod clock;
pub mod dashboard_service;
pub mod pipe_catalog;
pub mod pipe_repository;
pub mod qr_service;
pub mod query_cache;
pub mod streaming_service;
pub mod trend_service;

#[cfg(test)]
pub mod testing;
