pub mod answer_model;
pub mod provider;
