//! Repositories wrapping sea-orm queries.

pub mod follow_edge;
pub mod profile;
pub mod user;

pub use follow_edge::FollowEdgeRepository;
pub use profile::ProfileRepository;
pub use user::UserRepository;
