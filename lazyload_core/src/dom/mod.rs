pub mod api;
pub mod attribute;
pub mod node;
