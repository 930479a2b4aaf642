pub mod balance;
pub mod openrouter;
pub mod swap;
pub mod token;
pub mod transactions;
