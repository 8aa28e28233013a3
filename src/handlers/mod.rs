pub mod common;
pub mod health;
pub mod inventory;
pub mod locations;
pub mod products;
