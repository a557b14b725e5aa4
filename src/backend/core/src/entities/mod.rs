//! Built-in entity types served by the development server.

pub mod author;
pub mod book;

pub use author::Author;
pub use book::Book;
