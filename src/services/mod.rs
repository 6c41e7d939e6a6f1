pub mod ingest_service;
pub mod media;
pub mod upload;
