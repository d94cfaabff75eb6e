pub mod auth;
pub mod content;
pub mod document_store;
pub mod kinds;
pub mod model;
pub mod repository;
pub mod upload;
