use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::store::{Store, StoreError};
use crate::models::{Application, NewProject, NewUser, Project, Role, User};

/// Cache key: one slot per entity id, plus one sentinel per full listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    User(i64),
    Project(i64),
    Application(i64),
    AllUsers,
    AllProjects,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::User(id) => write!(f, "user:{}", id),
            CacheKey::Project(id) => write!(f, "project:{}", id),
            CacheKey::Application(id) => write!(f, "application:{}", id),
            CacheKey::AllUsers => f.write_str("users:all"),
            CacheKey::AllProjects => f.write_str("projects:all"),
        }
    }
}

#[derive(Debug, Clone)]
enum CachedEntry {
    User(User),
    Project(Project),
    Application(Application),
    Users(Arc<Vec<User>>),
    Projects(Arc<Vec<Project>>),
}

/// Read-through, write-invalidate cache in front of the [`Store`].
///
/// Single-entity slots are updated on write. Listing snapshots are never
/// patched: any write to a kind drops its listing, and the next `list_*`
/// call reloads from the store.
///
/// Each entity kind has a generation counter, bumped before every write to
/// that kind. A read-through load records the generation before it hits the
/// store and only publishes if no write happened meanwhile, so a slow miss
/// cannot reinstall an entity (or listing) older than the last write.
pub struct EntityCache {
    store: Arc<dyn Store>,
    entries: moka::future::Cache<CacheKey, CachedEntry>,
    user_generation: AtomicU64,
    project_generation: AtomicU64,
    application_generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EntityCache {
    pub fn new(store: Arc<dyn Store>, max_entries: u64, ttl: Duration) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries)
            .time_to_live(ttl)
            .build();

        Self {
            store,
            entries,
            user_generation: AtomicU64::new(0),
            project_generation: AtomicU64::new(0),
            application_generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The backing store, for entity kinds this cache does not front
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    async fn lookup(&self, key: CacheKey) -> Option<CachedEntry> {
        match self.entries.get(&key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Entity cache hit: {}", key);
                Some(entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Entity cache miss: {}", key);
                None
            }
        }
    }

    /// Publish a freshly loaded entry unless a write to its kind happened
    /// since `generation` was read. The re-check after insert closes the
    /// window between the first check and the insert.
    async fn publish(&self, key: CacheKey, entry: CachedEntry, counter: &AtomicU64, generation: u64) {
        if counter.load(Ordering::Acquire) != generation {
            tracing::debug!("Skipping stale load for {}", key);
            return;
        }
        self.entries.insert(key, entry).await;
        if counter.load(Ordering::Acquire) != generation {
            self.entries.invalidate(&key).await;
        }
    }

    async fn invalidate_listing(&self, key: CacheKey) {
        self.entries.invalidate(&key).await;
        tracing::debug!("Invalidated listing snapshot {}", key);
    }

    // ---- users ----

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        if let Some(CachedEntry::User(user)) = self.lookup(CacheKey::User(id)).await {
            return Ok(Some(user));
        }
        let generation = self.user_generation.load(Ordering::Acquire);
        let user = self.store.get_user(id).await?;
        if let Some(ref found) = user {
            self.publish(
                CacheKey::User(id),
                CachedEntry::User(found.clone()),
                &self.user_generation,
                generation,
            )
            .await;
        }
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Arc<Vec<User>>, StoreError> {
        if let Some(CachedEntry::Users(users)) = self.lookup(CacheKey::AllUsers).await {
            return Ok(users);
        }
        let generation = self.user_generation.load(Ordering::Acquire);
        let users = Arc::new(self.store.list_users().await?);
        self.publish(
            CacheKey::AllUsers,
            CachedEntry::Users(Arc::clone(&users)),
            &self.user_generation,
            generation,
        )
        .await;
        Ok(users)
    }

    /// Record a user that was just written to the store
    pub async fn put_user(&self, user: User) {
        self.user_generation.fetch_add(1, Ordering::AcqRel);
        self.entries.insert(CacheKey::User(user.id), CachedEntry::User(user)).await;
        self.invalidate_listing(CacheKey::AllUsers).await;
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let created = self.store.add_user(user).await?;
        self.put_user(created.clone()).await;
        Ok(created)
    }

    pub async fn update_user(&self, user: &User) -> Result<Option<User>, StoreError> {
        let updated = self.store.update_user(user).await?;
        if let Some(ref saved) = updated {
            self.put_user(saved.clone()).await;
        }
        Ok(updated)
    }

    /// Change a role in the store, then patch the cached user in place (if
    /// present) and drop the user listing, which role filters run over.
    pub async fn update_user_role(&self, id: i64, role: Role) -> Result<bool, StoreError> {
        if !self.store.update_user_role(id, role).await? {
            return Ok(false);
        }
        self.user_generation.fetch_add(1, Ordering::AcqRel);
        if let Some(CachedEntry::User(mut user)) = self.entries.get(&CacheKey::User(id)).await {
            user.role = role;
            self.entries.insert(CacheKey::User(id), CachedEntry::User(user)).await;
        }
        self.invalidate_listing(CacheKey::AllUsers).await;
        Ok(true)
    }

    // ---- projects ----

    pub async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        if let Some(CachedEntry::Project(project)) = self.lookup(CacheKey::Project(id)).await {
            return Ok(Some(project));
        }
        let generation = self.project_generation.load(Ordering::Acquire);
        let project = self.store.get_project(id).await?;
        if let Some(ref found) = project {
            self.publish(
                CacheKey::Project(id),
                CachedEntry::Project(found.clone()),
                &self.project_generation,
                generation,
            )
            .await;
        }
        Ok(project)
    }

    pub async fn list_projects(&self) -> Result<Arc<Vec<Project>>, StoreError> {
        if let Some(CachedEntry::Projects(projects)) = self.lookup(CacheKey::AllProjects).await {
            return Ok(projects);
        }
        let generation = self.project_generation.load(Ordering::Acquire);
        let projects = Arc::new(self.store.list_projects().await?);
        self.publish(
            CacheKey::AllProjects,
            CachedEntry::Projects(Arc::clone(&projects)),
            &self.project_generation,
            generation,
        )
        .await;
        Ok(projects)
    }

    /// Record a project that was just written to the store
    pub async fn put_project(&self, project: Project) {
        self.project_generation.fetch_add(1, Ordering::AcqRel);
        self.entries
            .insert(CacheKey::Project(project.id), CachedEntry::Project(project))
            .await;
        self.invalidate_listing(CacheKey::AllProjects).await;
    }

    pub async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let created = self.store.add_project(project).await?;
        self.put_project(created.clone()).await;
        Ok(created)
    }

    pub async fn update_project(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let updated = self.store.update_project(project).await?;
        if let Some(ref saved) = updated {
            self.put_project(saved.clone()).await;
        }
        Ok(updated)
    }

    pub async fn set_project_archived(&self, id: i64, archived: bool) -> Result<bool, StoreError> {
        if !self.store.set_project_archived(id, archived).await? {
            return Ok(false);
        }
        self.project_generation.fetch_add(1, Ordering::AcqRel);
        if let Some(CachedEntry::Project(mut project)) = self.entries.get(&CacheKey::Project(id)).await {
            project.archived = archived;
            self.entries
                .insert(CacheKey::Project(id), CachedEntry::Project(project))
                .await;
        }
        self.invalidate_listing(CacheKey::AllProjects).await;
        Ok(true)
    }

    pub async fn remove_project(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self.store.delete_project(id).await?;
        self.project_generation.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate(&CacheKey::Project(id)).await;
        self.invalidate_listing(CacheKey::AllProjects).await;
        Ok(removed)
    }

    // ---- applications (by id only, no listing snapshot) ----

    pub async fn get_application(&self, id: i64) -> Result<Option<Application>, StoreError> {
        if let Some(CachedEntry::Application(app)) = self.lookup(CacheKey::Application(id)).await {
            return Ok(Some(app));
        }
        let generation = self.application_generation.load(Ordering::Acquire);
        let app = self.store.get_application(id).await?;
        if let Some(ref found) = app {
            self.publish(
                CacheKey::Application(id),
                CachedEntry::Application(found.clone()),
                &self.application_generation,
                generation,
            )
            .await;
        }
        Ok(app)
    }

    pub async fn put_application(&self, app: Application) {
        self.application_generation.fetch_add(1, Ordering::AcqRel);
        self.entries
            .insert(CacheKey::Application(app.id), CachedEntry::Application(app))
            .await;
    }

    pub async fn invalidate_application(&self, id: i64) {
        self.application_generation.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate(&CacheKey::Application(id)).await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            entries: self.entries.entry_count(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}
