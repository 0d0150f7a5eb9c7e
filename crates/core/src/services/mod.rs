//! Business logic services.

#![allow(missing_docs)]

pub mod follow_edge;
pub mod permission;
pub mod profile;
pub mod user;

pub use follow_edge::{FollowEdgeService, FollowEdgeView};
pub use permission::{Access, Decision, Policy, authenticated_or_read_only, enforce, owner_or_read_only};
pub use profile::{ProfileService, ProfileView};
pub use user::{CreateUserInput, UserService};
