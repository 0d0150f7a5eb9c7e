//! Database entities.

pub mod follow_edge;
pub mod profile;
pub mod user;

pub use follow_edge::Entity as FollowEdge;
pub use profile::Entity as Profile;
pub use user::Entity as User;
