pub mod auth;
pub mod cart;
pub mod categories;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod profile;
pub mod support;
pub mod users;
