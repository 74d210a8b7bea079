//! User identity resolution.
//!
//! # Data Flow
//! ```text
//! action payload
//!     → resolver.rs (hub:{fid} cache check)
//!     → validator.rs (signature check via hub.rs)
//!     → hub.rs + custody.rs (concurrent context lookups)
//!     → store hub:{fid} + $identify event
//! ```
//!
//! # Design Decisions
//! - Resolution runs at most once per user; the cached context is the marker
//! - Each lookup degrades independently; one failed branch blanks one field

pub mod custody;
pub mod hub;
pub mod resolver;
pub mod types;
pub mod validator;

pub use custody::{ChainError, CustodyRegistry};
pub use hub::{HubClient, HubError, ReactionKind};
pub use resolver::{IdentityError, IdentityOutcome, IdentityResolver};
pub use types::{HubContext, UserProfile, ValidatedAction, Validation};
pub use validator::{HubValidator, MessageValidator};
