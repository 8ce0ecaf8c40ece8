pub mod bootstrap;
pub mod config;
pub mod image_clients;
pub mod kv_store;
pub mod object_urls;
pub mod platform;
pub mod security;
pub mod storage;
