pub mod engine;
pub mod fill_model;
