//! # System Lifecycle & Orchestration
//!
//! This module manages the runtime lifecycle of the fruit list system:
//! creating the store client, starting the view model actor and the
//! notification bridge, wiring them together, and coordinating a clean
//! shutdown.
//!
//! ## The Orchestration Pattern
//!
//! The individual pieces are simple; wiring them is where the coordination
//! lives. [`FruitSystem`] is the conductor:
//!
//! 1. **Client creation** - one [`StoreClient`](record_client::StoreClient)
//!    for the chosen database scope, shared by everything
//! 2. **Actor startup** - the view model actor runs its account handshake
//!    and event loop on its own task
//! 3. **Bridge startup** - the notification bridge registers the standing
//!    subscription and starts consuming push deliveries
//! 4. **Graceful shutdown** - the bridge is signalled first so it releases
//!    its view model handle, then the remaining handle is dropped, the
//!    actor's channel closes, and all tasks are awaited
//!
//! ## Shutdown
//!
//! When every [`ViewModelHandle`](crate::view_model::ViewModelHandle)
//! clone is gone, the actor's `recv()` returns `None` and its loop exits
//! after processing the messages already queued, so no request is lost.

pub mod fruit_system;

pub use fruit_system::*;
