pub mod credits;
pub mod errors;
pub mod handler;
pub mod mapping;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
