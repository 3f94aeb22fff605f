pub mod receiver;
pub mod registry;
pub mod session;
