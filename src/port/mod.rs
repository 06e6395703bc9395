//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │       Application        │
//!                 │  (engine + formation)    │
//!                 └──────────────────────────┘
//!                     │                  │
//!                     ▼                  ▼
//!             ┌──────────────┐   ┌──────────────┐
//!             │   Command    │   │    State     │
//!             │   Executor   │   │    Store     │
//!             └──────────────┘   └──────────────┘
//! ```

pub mod outbound;
