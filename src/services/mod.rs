pub mod download_service;
pub mod organize_service;
pub mod stats_service;
