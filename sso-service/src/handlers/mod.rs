pub mod admin;
pub mod participation;
