//! Model-View-Intent primitives.
//!
//! Screens keep their state in one value and change it only by feeding
//! intents through a pure reducer. Side effects (network fetches) are
//! decided by the reducer but performed by the owner of the state.
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ View
//!    ↑                     │
//!    └── fetch result ─────┘
//! ```

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::UiState;
