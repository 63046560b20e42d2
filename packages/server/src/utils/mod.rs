pub mod catalog;
pub mod code;
pub mod hash;
pub mod jwt;
pub mod lookup;
pub mod rating;
