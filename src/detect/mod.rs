pub mod classify;
pub mod context;
pub mod discover;
pub mod field_model;
pub mod groups;
pub mod label;
pub mod merge;
pub mod passes;
