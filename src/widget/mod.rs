pub mod expand;
pub mod options;
