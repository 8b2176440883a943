//! # Fruit App Library
//!
//! A demonstration application connecting a list-editing frontend to a
//! managed cloud record store: the `Fruit` entity, a view model actor with
//! observable state, a push notification bridge, and the lifecycle
//! orchestration that wires them together. Exposed as a library for
//! integration testing and embedding.

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod notifications;
pub mod view_model;
