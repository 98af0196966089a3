pub mod delete;
pub mod handlers;
pub mod validation;
