// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod identity;
pub mod live_view;
pub mod membership;
pub mod session;

pub use identity::{FirebaseIdentity, IdentityGateway, InMemoryIdentity};
pub use live_view::{LiveViewState, LiveViewSynchronizer, SubscriptionHandle};
pub use membership::MembershipResolver;
pub use session::{SessionController, SessionManager, SessionState, SignUpRequest};
