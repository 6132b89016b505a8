//! Screen-side state: MVI primitives and the list view built on them.

pub mod list;
pub mod mvi;
