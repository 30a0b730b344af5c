//! Reaction repository: the like/dislike join tables
//!
//! All membership changes go through this repository, so the invariant
//! "a user is in at most one of the two sets per video" is enforced in a
//! single place. A toggle reads the current membership, computes the next
//! state with a pure transition, and applies the delta, all inside one
//! transaction. A failure rolls the whole call back; there is no retry.

use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::video::ReactionSummary;

/// One of the two reaction sets of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Liked,
    Disliked,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::Liked => Side::Disliked,
            Side::Disliked => Side::Liked,
        }
    }

    fn contains_sql(self) -> &'static str {
        match self {
            Side::Liked => {
                "SELECT EXISTS(SELECT 1 FROM user_liked_videos WHERE user_id = $1 AND video_id = $2)"
            }
            Side::Disliked => {
                "SELECT EXISTS(SELECT 1 FROM user_disliked_videos WHERE user_id = $1 AND video_id = $2)"
            }
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            Side::Liked => {
                "INSERT INTO user_liked_videos (user_id, video_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
            Side::Disliked => {
                "INSERT INTO user_disliked_videos (user_id, video_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
        }
    }

    fn delete_sql(self) -> &'static str {
        match self {
            Side::Liked => {
                "DELETE FROM user_liked_videos WHERE user_id = $1 AND video_id = $2"
            }
            Side::Disliked => {
                "DELETE FROM user_disliked_videos WHERE user_id = $1 AND video_id = $2"
            }
        }
    }

    fn count_sql(self) -> &'static str {
        match self {
            Side::Liked => "SELECT COUNT(*) FROM user_liked_videos WHERE video_id = $1",
            Side::Disliked => "SELECT COUNT(*) FROM user_disliked_videos WHERE video_id = $1",
        }
    }
}

/// A user's reaction state towards one video.
///
/// The type itself rules out "liked and disliked at once".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Neither,
    In(Side),
}

impl Membership {
    fn from_flags(in_liked: bool, in_disliked: bool) -> Self {
        // Both flags set would mean a corrupted row pair; treating it as
        // "liked" lets the next toggle repair the state.
        if in_liked {
            Membership::In(Side::Liked)
        } else if in_disliked {
            Membership::In(Side::Disliked)
        } else {
            Membership::Neither
        }
    }
}

/// Compute the next membership after toggling `side`.
///
/// Returns the new state and whether the toggled side is active afterwards
/// (the `liked`/`disliked` flag reported to the caller).
pub fn toggle_transition(current: Membership, side: Side) -> (Membership, bool) {
    match current {
        Membership::In(s) if s == side => (Membership::Neither, false),
        _ => (Membership::In(side), true),
    }
}

/// Reaction repository
#[derive(Clone)]
pub struct ReactionRepository {
    pool: PgPool,
}

impl ReactionRepository {
    /// Create a new reaction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn contains(
        conn: &mut PgConnection,
        side: Side,
        user_id: Uuid,
        video_id: Uuid,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(side.contains_sql())
            .bind(user_id)
            .bind(video_id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    async fn add(
        conn: &mut PgConnection,
        side: Side,
        user_id: Uuid,
        video_id: Uuid,
    ) -> Result<()> {
        sqlx::query(side.insert_sql())
            .bind(user_id)
            .bind(video_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn remove(
        conn: &mut PgConnection,
        side: Side,
        user_id: Uuid,
        video_id: Uuid,
    ) -> Result<()> {
        sqlx::query(side.delete_sql())
            .bind(user_id)
            .bind(video_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Toggle a user's membership on one side of a video's reactions.
    ///
    /// Returns whether the toggled side is active after the call.
    pub async fn toggle(&self, side: Side, video_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let in_liked = Self::contains(&mut *tx, Side::Liked, user_id, video_id).await?;
        let in_disliked = Self::contains(&mut *tx, Side::Disliked, user_id, video_id).await?;
        let current = Membership::from_flags(in_liked, in_disliked);

        let (next, active) = toggle_transition(current, side);

        if current != next {
            if let Membership::In(s) = current {
                Self::remove(&mut *tx, s, user_id, video_id).await?;
            }
            if let Membership::In(s) = next {
                // Clearing the opposite side even when the flags said it was
                // empty keeps the exclusivity invariant under racing writes.
                Self::remove(&mut *tx, s.other(), user_id, video_id).await?;
                Self::add(&mut *tx, s, user_id, video_id).await?;
            }
        }

        tx.commit().await?;
        Ok(active)
    }

    /// Reaction counts for a video, plus the caller's own membership when an
    /// identity is supplied.
    ///
    /// Not transactional with concurrent toggles; the caller sees the last
    /// committed state.
    pub async fn summary(
        &self,
        video_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<ReactionSummary> {
        let liked_users_count: i64 = sqlx::query_scalar(Side::Liked.count_sql())
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;
        let disliked_users_count: i64 = sqlx::query_scalar(Side::Disliked.count_sql())
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        let (user_has_liked, user_has_disliked) = match user_id {
            Some(user_id) => {
                let mut conn = self.pool.acquire().await?;
                let liked = Self::contains(&mut *conn, Side::Liked, user_id, video_id).await?;
                let disliked =
                    Self::contains(&mut *conn, Side::Disliked, user_id, video_id).await?;
                (liked, disliked)
            }
            None => (false, false),
        };

        Ok(ReactionSummary {
            liked_users_count,
            disliked_users_count,
            user_has_liked,
            user_has_disliked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_from_neutral_activates() {
        let (next, active) = toggle_transition(Membership::Neither, Side::Liked);
        assert_eq!(next, Membership::In(Side::Liked));
        assert!(active);
    }

    #[test]
    fn like_twice_returns_to_neutral() {
        let (after_first, _) = toggle_transition(Membership::Neither, Side::Liked);
        let (after_second, active) = toggle_transition(after_first, Side::Liked);
        assert_eq!(after_second, Membership::Neither);
        assert!(!active);
    }

    #[test]
    fn like_replaces_dislike() {
        let (next, active) = toggle_transition(Membership::In(Side::Disliked), Side::Liked);
        assert_eq!(next, Membership::In(Side::Liked));
        assert!(active);
    }

    #[test]
    fn dislike_mirrors_like() {
        let (next, active) = toggle_transition(Membership::In(Side::Liked), Side::Disliked);
        assert_eq!(next, Membership::In(Side::Disliked));
        assert!(active);

        let (next, active) = toggle_transition(next, Side::Disliked);
        assert_eq!(next, Membership::Neither);
        assert!(!active);
    }

    #[test]
    fn double_toggle_is_identity_for_any_start() {
        for start in [
            Membership::Neither,
            Membership::In(Side::Liked),
            Membership::In(Side::Disliked),
        ] {
            for side in [Side::Liked, Side::Disliked] {
                let (once, _) = toggle_transition(start, side);
                let (twice, _) = toggle_transition(once, side);
                if start == Membership::In(side.other()) {
                    // Switching sides and toggling again lands on neutral,
                    // not back on the opposite side.
                    assert_eq!(twice, Membership::Neither);
                } else {
                    assert_eq!(twice, start);
                }
            }
        }
    }

    #[test]
    fn corrupted_flags_prefer_liked() {
        assert_eq!(
            Membership::from_flags(true, true),
            Membership::In(Side::Liked)
        );
    }
}
