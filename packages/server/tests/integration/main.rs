
mod auth;
mod catalog;
mod comments;
mod seed;
mod users;
