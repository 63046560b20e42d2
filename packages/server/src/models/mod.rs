pub mod auth;
pub mod catalog;
pub mod review;
pub mod shared;
pub mod title;
pub mod user;
