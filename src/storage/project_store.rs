use tracing::{debug, info};

use super::kv::StorageError;
use super::records::Storage;
use crate::project::{now_millis, Project, BLANK_PROJECT_TITLE};
use crate::shortcuts::Shortcut;

/// The project collection and the only path that writes it.
///
/// Every mutation is two-phase: the new value is applied to the in-memory
/// collection, then `commit` writes the whole collection. A failed commit is
/// reported to the caller; the in-memory state keeps the change so the
/// session can continue and a later commit can retry the write.
pub struct ProjectStore {
    projects: Vec<Project>,
    storage: Storage,
    clock: fn() -> i64,
}

impl ProjectStore {
    pub fn open(storage: Storage) -> Self {
        let projects = storage.load_projects();
        Self {
            projects,
            storage,
            clock: now_millis,
        }
    }

    #[cfg(test)]
    pub fn with_clock(storage: Storage, clock: fn() -> i64) -> Self {
        let mut store = Self::open(storage);
        store.clock = clock;
        store
    }

    /// Newest-created first, the order the project list shows.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn commit(&self) -> Result<(), StorageError> {
        self.storage.save_projects(&self.projects)?;
        debug!("💾 Committed {} projects", self.projects.len());
        Ok(())
    }

    pub fn insert(&mut self, project: Project) -> Result<&Project, StorageError> {
        info!("Creating project '{}' ({})", project.title, project.id);
        self.projects.insert(0, project);
        self.commit()?;
        Ok(&self.projects[0])
    }

    pub fn create_blank(&mut self) -> Result<&Project, StorageError> {
        self.insert(Project::new(Some(BLANK_PROJECT_TITLE), None, None))
    }

    /// New project whose conversation opens with the template as the first
    /// user turn.
    pub fn create_from_shortcut(&mut self, shortcut: &Shortcut) -> Result<&Project, StorageError> {
        self.insert(Project::new(
            Some(shortcut.title),
            Some(shortcut.prompt_template),
            Some(shortcut.category),
        ))
    }

    /// Replace the stored record with `project`, stamp `updated_at` and
    /// commit. Returns `Ok(None)` when no project has that id.
    pub fn update(&mut self, mut project: Project) -> Result<Option<&Project>, StorageError> {
        let Some(index) = self.projects.iter().position(|p| p.id == project.id) else {
            return Ok(None);
        };

        project.updated_at = (self.clock)().max(project.created_at);
        self.projects[index] = project;
        self.commit()?;
        Ok(Some(&self.projects[index]))
    }

    /// Read-modify-write through `update`: `f` runs on a copy of the project.
    pub fn modify<R>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut Project) -> R,
    ) -> Result<Option<R>, StorageError> {
        let Some(mut project) = self.get(id).cloned() else {
            return Ok(None);
        };
        let result = f(&mut project);
        self.update(project)?;
        Ok(Some(result))
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return Ok(false);
        }
        info!("🗑️ Deleted project {}", id);
        self.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Role;
    use crate::shortcuts::find_shortcut;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    static FAKE_NOW: AtomicI64 = AtomicI64::new(0);

    fn fake_clock() -> i64 {
        FAKE_NOW.load(Ordering::SeqCst)
    }

    fn memory_store() -> (Arc<MemoryStore>, ProjectStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = ProjectStore::open(Storage::new(kv.clone()));
        (kv, store)
    }

    #[test]
    fn test_create_from_rubric_shortcut() {
        let (_, mut store) = memory_store();
        let shortcut = find_shortcut("rubric-design").unwrap();

        store.create_from_shortcut(shortcut).unwrap();

        assert_eq!(store.projects().len(), 1);
        let project = &store.projects()[0];
        assert_eq!(project.title, shortcut.title);
        assert!(project.description.contains(shortcut.title));
        assert_eq!(project.category.as_deref(), Some("教学评价"));
        assert_eq!(project.messages.len(), 1);
        assert_eq!(project.messages[0].role, Role::User);
        assert_eq!(project.messages[0].text, shortcut.prompt_template);
        assert_eq!(project.quick_actions.len(), 4);
    }

    #[test]
    fn test_new_projects_are_listed_first_and_persisted() {
        let (kv, mut store) = memory_store();
        let first = store.create_blank().unwrap().id.clone();
        let second = store.create_blank().unwrap().id.clone();

        assert_eq!(store.projects()[0].id, second);
        assert_eq!(store.projects()[1].id, first);

        let reopened = ProjectStore::open(Storage::new(kv));
        assert_eq!(reopened.projects().len(), 2);
        assert_eq!(reopened.projects()[0].id, second);
    }

    #[test]
    fn test_update_stamps_updated_at() {
        let kv = Arc::new(MemoryStore::new());
        FAKE_NOW.store(i64::MAX / 2, Ordering::SeqCst);
        let mut store = ProjectStore::with_clock(Storage::new(kv), fake_clock);
        let mut project = store.create_blank().unwrap().clone();

        project.title = "Renamed".to_string();
        let updated = store.update(project.clone()).unwrap().unwrap();
        assert_eq!(updated.updated_at, i64::MAX / 2);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(updated.title, "Renamed");

        // A clock behind creation time never moves updated_at before created_at.
        FAKE_NOW.store(0, Ordering::SeqCst);
        let updated = store.update(project).unwrap().unwrap();
        assert_eq!(updated.updated_at, updated.created_at);
    }

    #[test]
    fn test_update_unknown_project() {
        let (_, mut store) = memory_store();
        let orphan = Project::new(None, None, None);
        assert!(store.update(orphan).unwrap().is_none());
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_modify_goes_through_update() {
        let (kv, mut store) = memory_store();
        let id = store.create_blank().unwrap().id.clone();

        let saved = store.modify(&id, |p| p.save_work("Lesson A", "body").is_some()).unwrap();
        assert_eq!(saved, Some(true));

        let reopened = ProjectStore::open(Storage::new(kv));
        assert_eq!(reopened.get(&id).unwrap().works[0].title, "Lesson A");
        assert!(store.modify("missing", |_| ()).unwrap().is_none());
    }

    #[test]
    fn test_failed_commit_is_reported() {
        let (kv, mut store) = memory_store();
        let id = store.create_blank().unwrap().id.clone();
        kv.set_read_only(true);

        let result = store.modify(&id, |p| p.title = "x".to_string());
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(store.get(&id).unwrap().title, "x");

        kv.set_read_only(false);
        let reopened = ProjectStore::open(Storage::new(kv));
        assert_eq!(reopened.get(&id).unwrap().title, BLANK_PROJECT_TITLE);
    }

    #[test]
    fn test_delete() {
        let (kv, mut store) = memory_store();
        let id = store.create_blank().unwrap().id.clone();

        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(ProjectStore::open(Storage::new(kv)).projects().is_empty());
    }
}
