//! API integration tests, driving the full router in-process

mod books;
mod common;
