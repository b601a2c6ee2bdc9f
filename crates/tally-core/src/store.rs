use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::date::to_canonical;
use crate::task::Task;

pub trait Storage {
    fn load(&self) -> anyhow::Result<Vec<Task>>;
    fn save(&self, tasks: &[Task]) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let path = data_dir.join("tasks.json");
        if !path.exists() {
            fs::write(&path, "[]")?;
        }

        info!(file = %path.display(), "opened task storage");
        Ok(Self { path })
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> anyhow::Result<Vec<Task>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                Ok(tasks)
            }
            Err(err) => {
                warn!(
                    file = %self.path.display(),
                    error = %err,
                    "malformed task blob; starting with an empty collection"
                );
                Ok(vec![])
            }
        }
    }

    fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        debug!(file = %self.path.display(), count = tasks.len(), "saving tasks atomically");

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut temp, tasks)?;
        temp.flush()?;

        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;
        Ok(())
    }
}

pub struct TaskStore {
    storage: Box<dyn Storage>,
    tasks: Vec<Task>,
}

impl TaskStore {
    #[tracing::instrument(skip(storage))]
    pub fn open(storage: Box<dyn Storage>) -> anyhow::Result<Self> {
        let mut tasks = storage.load()?;

        if migrate_legacy_dates(&mut tasks) {
            info!(count = tasks.len(), "migrated legacy display dates to canonical form");
            storage.save(&tasks)?;
        }

        Ok(Self { storage, tasks })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[tracing::instrument(skip(self, task), fields(id = %task.id))]
    pub fn add(&mut self, task: Task) -> anyhow::Result<&Task> {
        self.tasks.push(task);
        self.storage.save(&self.tasks)?;
        self.tasks
            .last()
            .ok_or_else(|| anyhow!("task vanished after push"))
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, id: &str) -> anyhow::Result<bool> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))?;

        task.completed = !task.completed;
        let completed = task.completed;
        self.storage.save(&self.tasks)?;
        Ok(completed)
    }

    pub fn find_by_prefix(&self, prefix: &str) -> anyhow::Result<&Task> {
        if prefix.is_empty() {
            return Err(anyhow!("empty task id"));
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        let first = matches
            .next()
            .ok_or_else(|| anyhow!("no task with id starting with {prefix}"))?;
        if matches.next().is_some() {
            return Err(anyhow!("task id prefix is ambiguous: {prefix}"));
        }
        Ok(first)
    }
}

pub fn migrate_legacy_dates(tasks: &mut [Task]) -> bool {
    let mut changed = false;
    for task in tasks {
        let converted = to_canonical(&task.date);
        if converted != task.date {
            debug!(id = %task.id, from = %task.date, to = %converted, "migrating task date");
            task.date = converted;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Storage, TaskStore, migrate_legacy_dates};
    use crate::task::{Priority, Task};

    /// In-memory storage standing in for the key-value store.
    #[derive(Clone, Default)]
    struct MemoryStorage {
        blob: Rc<RefCell<Vec<Task>>>,
        saves: Rc<RefCell<usize>>,
    }

    impl Storage for MemoryStorage {
        fn load(&self) -> anyhow::Result<Vec<Task>> {
            Ok(self.blob.borrow().clone())
        }

        fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
            *self.blob.borrow_mut() = tasks.to_vec();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    fn task(title: &str, date: &str) -> Task {
        Task::new(title.to_string(), String::new(), date.to_string(), Priority::Low)
    }

    #[test]
    fn add_and_toggle_persist_through_the_seam() {
        let storage = MemoryStorage::default();
        let mut store = TaskStore::open(Box::new(storage.clone())).expect("open");

        let id = store.add(task("Buy milk", "2024-03-05")).expect("add").id.clone();
        assert!(store.toggle(&id).expect("toggle on"));
        assert!(!store.toggle(&id).expect("toggle off"));

        assert_eq!(storage.blob.borrow().len(), 1);
        assert_eq!(*storage.saves.borrow(), 3);
    }

    #[test]
    fn migration_rewrites_legacy_dates_once() {
        let storage = MemoryStorage::default();
        storage.blob.borrow_mut().extend([
            task("legacy", "05.03.2024"),
            task("canonical", "2024-03-01"),
            task("junk", "whenever"),
        ]);

        let store = TaskStore::open(Box::new(storage.clone())).expect("open");
        assert_eq!(store.tasks()[0].date, "2024-03-05");
        assert_eq!(store.tasks()[1].date, "2024-03-01");
        assert_eq!(store.tasks()[2].date, "whenever");
        // Migration wrote back exactly once.
        assert_eq!(*storage.saves.borrow(), 1);

        // Reopening finds nothing left to migrate.
        let store = TaskStore::open(Box::new(storage.clone())).expect("reopen");
        assert_eq!(*storage.saves.borrow(), 1);
        assert_eq!(store.tasks()[0].date, "2024-03-05");
    }

    #[test]
    fn migration_is_idempotent() {
        let mut tasks = vec![task("legacy", "05.03.2024"), task("junk", "soon")];
        assert!(migrate_legacy_dates(&mut tasks));
        let after_once = tasks.clone();
        assert!(!migrate_legacy_dates(&mut tasks));
        assert_eq!(tasks[0].date, after_once[0].date);
        assert_eq!(tasks[1].date, after_once[1].date);
    }

    #[test]
    fn prefix_lookup_requires_uniqueness() {
        let storage = MemoryStorage::default();
        let mut store = TaskStore::open(Box::new(storage)).expect("open");
        let id = store.add(task("only", "2024-03-05")).expect("add").id.clone();

        let prefix = &id[..8];
        assert_eq!(store.find_by_prefix(prefix).expect("unique prefix").id, id);
        assert!(store.find_by_prefix("").is_err());
        assert!(store.find_by_prefix("zzzz").is_err());
    }
}
