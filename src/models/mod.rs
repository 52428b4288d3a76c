//! Data models for Bookstore

pub mod book;
pub mod user;

pub use book::{Book, BookFilter, BookQuery, BookSort, CreateBook, UpdateBook};
pub use user::{AuthUser, Role, TokenClaims};
