//! In-memory repositories and content store for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Barrier;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::follow_repository::FollowRepository;
use crate::data::media_repository::MediaRepository;
use crate::data::post_repository::PostRepository;
use crate::data::profile_repository::ProfileRepository;
use crate::data::stats_repository::StatsRepository;
use crate::data::user_repository::UserRepository;
use crate::data::vote_repository::VoteRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::FollowCounts;
use crate::domain::media::{MediaRef, MediaTarget};
use crate::domain::post::{Comment, Post, PostFilter, PostUpdate};
use crate::domain::profile::Profile;
use crate::domain::stats::{Activity, ActivityKind, SiteStats};
use crate::domain::user::{PublicUser, User};
use crate::domain::vote::{VoteChange, VoteCounts, VoteOutcome};
use crate::infrastructure::content_store::{ContentStore, StoreError};

fn io_error(what: &str) -> StoreError {
    StoreError::Io(std::io::Error::other(what.to_string()))
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn insert(&self, username: &str, first_name: &str, last_name: &str) -> User {
        let user = User::new(
            username.into(),
            format!("{username}@example.com"),
            first_name.into(),
            last_name.into(),
            "not-a-hash".into(),
        );
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn public(&self, id: Uuid) -> Option<PublicUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .map(PublicUser::from)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self.by_username(username))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<PublicUser>, DomainError> {
        let query = query.to_lowercase();
        let mut found: Vec<PublicUser> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| {
                [&u.username, &u.first_name, &u.last_name, &u.email]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&query))
            })
            .cloned()
            .map(PublicUser::from)
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn list(&self, limit: i64) -> Result<Vec<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().take(limit as usize).cloned().collect())
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<(), DomainError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound(id.to_string()))?;
        user.email = email.to_string();
        user.password_hash = password_hash.to_string();
        user.is_staff = is_staff;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn has(&self, user_id: Uuid) -> bool {
        self.profiles.lock().unwrap().contains_key(&user_id)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get_or_create(&self, user_id: Uuid) -> Result<Profile, DomainError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .entry(user_id)
            .or_insert_with(|| Profile::new(user_id))
            .clone())
    }

    async fn save(&self, profile: &Profile) -> Result<Profile, DomainError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn create_missing(&self) -> Result<Vec<String>, DomainError> {
        Ok(Vec::new())
    }
}

pub struct InMemoryFollowRepository {
    users: Arc<InMemoryUserRepository>,
    edges: Mutex<Vec<(Uuid, Uuid)>>,
}

impl InMemoryFollowRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            edges: Mutex::new(Vec::new()),
        }
    }

    fn page(&self, ids: Vec<Uuid>, limit: i64, offset: i64) -> Vec<PublicUser> {
        ids.into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|id| self.users.public(id))
            .collect()
    }
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DomainError> {
        let mut edges = self.edges.lock().unwrap();
        if edges.contains(&(follower_id, followee_id)) {
            return Ok(false);
        }
        edges.push((follower_id, followee_id));
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool, DomainError> {
        let mut edges = self.edges.lock().unwrap();
        let before = edges.len();
        edges.retain(|edge| *edge != (follower_id, followee_id));
        Ok(edges.len() != before)
    }

    async fn is_following(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<bool, DomainError> {
        Ok(self
            .edges
            .lock()
            .unwrap()
            .contains(&(follower_id, followee_id)))
    }

    async fn counts(&self, user_id: Uuid) -> Result<FollowCounts, DomainError> {
        let edges = self.edges.lock().unwrap();
        Ok(FollowCounts {
            followers: edges.iter().filter(|(_, to)| *to == user_id).count() as i64,
            following: edges.iter().filter(|(from, _)| *from == user_id).count() as i64,
        })
    }

    async fn followers(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PublicUser>, DomainError> {
        let ids = self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, to)| *to == user_id)
            .map(|(from, _)| *from)
            .collect();
        Ok(self.page(ids, limit, offset))
    }

    async fn following(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PublicUser>, DomainError> {
        let ids = self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|(from, _)| *from == user_id)
            .map(|(_, to)| *to)
            .collect();
        Ok(self.page(ids, limit, offset))
    }
}

/// Keeps insertion order; listings return the newest first.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<Post>>,
}

impl InMemoryPostRepository {
    fn matching(&self, filter: PostFilter) -> Vec<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|p| filter.author_id.is_none_or(|id| p.author_id == id))
            .filter(|p| filter.featured.is_none_or(|f| p.featured == f))
            .cloned()
            .collect()
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut Post)) -> Option<Post> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts.iter_mut().find(|p| p.id == id)?;
        f(post);
        Some(post.clone())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let Some(post) = posts
            .iter_mut()
            .find(|p| p.id == id && p.author_id == author_id)
        else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<Post, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let index = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(DomainError::PostNotFound(id))?;
        if posts[index].author_id != author_id {
            return Err(DomainError::Forbidden);
        }
        Ok(posts.remove(index))
    }

    async fn get_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, DomainError> {
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64, DomainError> {
        Ok(self.matching(filter).len() as i64)
    }

    async fn record_view(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        Ok(self.modify(id, |p| p.view_count += 1))
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> Result<Option<Post>, DomainError> {
        Ok(self.modify(id, |p| p.featured = featured))
    }
}

pub struct InMemoryCommentRepository {
    posts: Arc<InMemoryPostRepository>,
    comments: Mutex<Vec<Comment>>,
}

impl InMemoryCommentRepository {
    pub fn new(posts: Arc<InMemoryPostRepository>) -> Self {
        Self {
            posts,
            comments: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Comment, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            author_username: author_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, DomainError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.id != id);
        if comments.len() == before {
            return Err(DomainError::CommentNotFound(id));
        }
        Ok(())
    }
}

/// Vote rows keyed like the `votes_user_post_key` constraint. With
/// [`InMemoryVoteRepository::racing`] every cast reads its row, then waits
/// for the others before writing, reproducing two transactions that both
/// saw no row.
#[derive(Default)]
pub struct InMemoryVoteRepository {
    posts: Mutex<HashSet<Uuid>>,
    rows: Mutex<Vec<(Uuid, Uuid, bool)>>,
    race: Option<Barrier>,
    conflicts: AtomicU32,
}

impl InMemoryVoteRepository {
    pub fn racing(casts: usize) -> Self {
        Self {
            race: Some(Barrier::new(casts)),
            ..Default::default()
        }
    }

    pub fn add_post(&self, post_id: Uuid) {
        self.posts.lock().unwrap().insert(post_id);
    }

    pub fn rows_for(&self, user_id: Uuid, post_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, p, _)| *u == user_id && *p == post_id)
            .count()
    }

    /// The next `n` casts fail as if they lost a serialization race.
    pub fn fail_with_conflict(&self, n: u32) {
        self.conflicts.store(n, Ordering::SeqCst);
    }

    fn read(&self, user_id: Uuid, post_id: Uuid) -> Option<bool> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|(u, p, _)| *u == user_id && *p == post_id)
            .map(|(_, _, is_like)| *is_like)
    }

    fn count(rows: &[(Uuid, Uuid, bool)], post_id: Uuid) -> VoteCounts {
        let mut counts = VoteCounts::default();
        for (_, p, is_like) in rows {
            if *p == post_id {
                if *is_like {
                    counts.likes += 1;
                } else {
                    counts.dislikes += 1;
                }
            }
        }
        counts
    }
}

#[async_trait]
impl VoteRepository for InMemoryVoteRepository {
    async fn cast(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        requested: Option<bool>,
    ) -> Result<VoteOutcome, DomainError> {
        let pending = self.conflicts.load(Ordering::SeqCst);
        if pending > 0 {
            self.conflicts.store(pending - 1, Ordering::SeqCst);
            return Err(DomainError::Conflict("failed to apply vote".into()));
        }
        if !self.posts.lock().unwrap().contains(&post_id) {
            return Err(DomainError::PostNotFound(post_id));
        }

        let existing = self.read(user_id, post_id);
        if let Some(barrier) = &self.race {
            barrier.wait().await;
        }

        let change = VoteChange::resolve(existing, requested);
        let mut rows = self.rows.lock().unwrap();
        let position = rows
            .iter()
            .position(|(u, p, _)| *u == user_id && *p == post_id);
        match (change, position) {
            (VoteChange::Insert(is_like) | VoteChange::Update(is_like), Some(i)) => {
                rows[i].2 = is_like;
            }
            (VoteChange::Insert(is_like), None) => rows.push((user_id, post_id, is_like)),
            (VoteChange::Delete, Some(i)) => {
                rows.remove(i);
            }
            _ => {}
        }
        let counts = Self::count(&rows, post_id);

        Ok(VoteOutcome {
            change,
            counts,
            user_vote: change.outcome(existing),
        })
    }

    async fn counts(&self, post_id: Uuid) -> Result<VoteCounts, DomainError> {
        if !self.posts.lock().unwrap().contains(&post_id) {
            return Err(DomainError::PostNotFound(post_id));
        }
        Ok(Self::count(&self.rows.lock().unwrap(), post_id))
    }

    async fn counts_for(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, VoteCounts>, DomainError> {
        let rows = self.rows.lock().unwrap();
        Ok(post_ids
            .iter()
            .map(|id| (*id, Self::count(&rows, *id)))
            .collect())
    }

    async fn user_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<bool>, DomainError> {
        Ok(self.read(user_id, post_id))
    }
}

#[derive(Default)]
pub struct InMemoryMediaRepository {
    refs: Mutex<HashMap<MediaTarget, MediaRef>>,
    sets: AtomicUsize,
    fail_next: AtomicBool,
}

impl InMemoryMediaRepository {
    pub fn get(&self, target: MediaTarget) -> MediaRef {
        self.refs
            .lock()
            .unwrap()
            .get(&target)
            .cloned()
            .unwrap_or_else(|| target.slot.fallback())
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn fail_next_set(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepository {
    async fn current(&self, target: MediaTarget) -> Result<MediaRef, DomainError> {
        Ok(self.get(target))
    }

    async fn set(&self, target: MediaTarget, media: &MediaRef) -> Result<(), DomainError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Internal("failed to save media".into()));
        }
        self.refs.lock().unwrap().insert(target, media.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryContentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deletes: AtomicUsize,
    failing_deletes: AtomicBool,
    failing_reads: AtomicBool,
}

impl InMemoryContentStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.failing_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(io_error("store unavailable"));
        }
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(io_error("delete refused"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(io_error("store unavailable"));
        }
        Ok(self.contains(key))
    }

    fn url(&self, key: &str) -> String {
        format!("/media/{key}")
    }
}

#[derive(Default)]
pub struct InMemoryStatsRepository {
    stats: Mutex<SiteStats>,
    activity: Mutex<Vec<Activity>>,
}

impl InMemoryStatsRepository {
    pub fn set_stats(&self, stats: SiteStats) {
        *self.stats.lock().unwrap() = stats;
    }

    pub fn push(&self, kind: ActivityKind, message: String, at: DateTime<Utc>) {
        self.activity
            .lock()
            .unwrap()
            .push(Activity { kind, message, at });
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn site_stats(&self) -> Result<SiteStats, DomainError> {
        Ok(*self.stats.lock().unwrap())
    }

    async fn recent_activity(&self, per_kind: i64) -> Result<Vec<Activity>, DomainError> {
        let activity = self.activity.lock().unwrap();
        let mut out = Vec::new();
        for kind in [ActivityKind::Post, ActivityKind::Comment, ActivityKind::User] {
            let mut of_kind: Vec<Activity> =
                activity.iter().filter(|a| a.kind == kind).cloned().collect();
            of_kind.sort_by(|a, b| b.at.cmp(&a.at));
            of_kind.truncate(per_kind as usize);
            out.extend(of_kind);
        }
        Ok(out)
    }
}
