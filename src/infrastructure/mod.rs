// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod geojson_mapper;
pub mod http_pipe_repository;
pub mod http_response;
