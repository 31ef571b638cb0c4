//! Built-in backend implementations
//!
//! Out-of-tree backends implement [`Backend`](super::traits::Backend) and
//! join through [`register`](super::registry::register).

pub mod file;
pub mod memory;
