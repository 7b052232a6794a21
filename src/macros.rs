//! Declarative helpers for child entities.
//!
//! [`impl_editable_child!`](crate::impl_editable_child) derives the status
//! and lifecycle contract from an embedded [`ChildState`](crate::entity::ChildState).

#[path = "macros/editable_child.rs"]
mod editable_child;
