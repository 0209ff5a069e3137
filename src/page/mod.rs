pub mod driver;
pub mod fake;
pub mod session;
pub mod wait;
