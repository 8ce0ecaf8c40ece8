pub mod credential;
pub mod error;
pub mod image_model;
pub mod sketch;
