//! Profile service.

use std::collections::HashMap;

use followers_common::{AppError, AppResult};
use followers_db::{
    entities::{profile, user},
    repositories::{FollowEdgeRepository, ProfileRepository, UserRepository},
};

/// A profile annotated with follow information relative to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub profile: profile::Model,
    /// Username of the profile owner.
    pub owner: String,
    /// Whether the caller owns this profile.
    pub is_owner: bool,
    /// Edge id if the caller follows the owner.
    pub following_id: Option<i64>,
    pub followers_count: u64,
    pub following_count: u64,
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
    user_repo: UserRepository,
    follow_edge_repo: FollowEdgeRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(
        profile_repo: ProfileRepository,
        user_repo: UserRepository,
        follow_edge_repo: FollowEdgeRepository,
    ) -> Self {
        Self {
            profile_repo,
            user_repo,
            follow_edge_repo,
        }
    }

    /// List all profiles, newest first.
    pub async fn list(&self, caller: Option<&user::Model>) -> AppResult<Vec<ProfileView>> {
        let profiles = self.profile_repo.find_all().await?;

        let owner_ids: Vec<String> = profiles.iter().map(|p| p.owner_id.clone()).collect();
        let usernames: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut views = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let Some(owner) = usernames.get(&profile.owner_id).cloned() else {
                continue;
            };
            views.push(self.annotate(profile, owner, caller).await?);
        }

        Ok(views)
    }

    /// Get a single profile.
    pub async fn get(&self, id: i64, caller: Option<&user::Model>) -> AppResult<ProfileView> {
        let profile = self
            .profile_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile {id}")))?;

        let owner = self.user_repo.get_by_id(&profile.owner_id).await?;
        self.annotate(profile, owner.username, caller).await
    }

    async fn annotate(
        &self,
        profile: profile::Model,
        owner: String,
        caller: Option<&user::Model>,
    ) -> AppResult<ProfileView> {
        let followers_count = self
            .follow_edge_repo
            .count_by_followed(&profile.owner_id)
            .await?;
        let following_count = self.follow_edge_repo.count_by_owner(&profile.owner_id).await?;

        let is_owner = caller.is_some_and(|c| c.id == profile.owner_id);
        let following_id = match caller {
            Some(c) if !is_owner => self
                .follow_edge_repo
                .find_by_pair(&c.id, &profile.owner_id)
                .await?
                .map(|edge| edge.id),
            _ => None,
        };

        Ok(ProfileView {
            profile,
            owner,
            is_owner,
            following_id,
            followers_count,
            following_count,
        })
    }
}
