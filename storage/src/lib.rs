pub mod arena;
pub mod store;
