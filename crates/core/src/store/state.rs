//! In-memory view of tasks and trash entries

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::Task;
use crate::trash::TrashEntry;
use crate::{Error, Result};

/// Everything the store persists. Tasks and their trash entries live in one
/// state so a single transaction can change both.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    tasks: HashMap<Uuid, Task>,
    trash: HashMap<Uuid, TrashEntry>,
}

/// On-disk form of [`StoreState`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub trash: Vec<TrashEntry>,
}

impl From<StoreSnapshot> for StoreState {
    fn from(value: StoreSnapshot) -> Self {
        Self {
            tasks: value.tasks.into_iter().map(|t| (t.id, t)).collect(),
            trash: value.trash.into_iter().map(|e| (e.id, e)).collect(),
        }
    }
}

impl From<&StoreState> for StoreSnapshot {
    fn from(value: &StoreState) -> Self {
        let mut tasks: Vec<Task> = value.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let mut trash: Vec<TrashEntry> = value.trash.values().cloned().collect();
        trash.sort_by(|a, b| a.deleted_at.cmp(&b.deleted_at).then(a.id.cmp(&b.id)));
        Self { tasks, trash }
    }
}

impl StoreState {
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub(crate) fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn tasks_for_user(&self, user_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |t| t.user_id == user_id)
    }

    pub(crate) fn insert_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(Error::InvalidInput(format!(
                "Task with ID {} already exists",
                task.id
            )));
        }
        self.tasks.insert(task.id, task);
        Ok(())
    }

    pub(crate) fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        self.tasks.remove(&id)
    }

    pub fn trash_entry(&self, id: Uuid) -> Option<&TrashEntry> {
        self.trash.get(&id)
    }

    pub fn trash_entries(&self) -> impl Iterator<Item = &TrashEntry> {
        self.trash.values()
    }

    pub fn entries_for_task(&self, task_id: Uuid) -> impl Iterator<Item = &TrashEntry> {
        self.trash.values().filter(move |e| e.task_id == task_id)
    }

    pub fn active_entries_for_task(&self, task_id: Uuid) -> impl Iterator<Item = &TrashEntry> {
        self.entries_for_task(task_id).filter(|e| e.is_active())
    }

    /// Insert a new trash entry. A task may have only one active entry.
    pub(crate) fn insert_trash_entry(&mut self, entry: TrashEntry) -> Result<()> {
        if entry.is_active() && self.active_entries_for_task(entry.task_id).next().is_some() {
            return Err(Error::Storage(format!(
                "Task {} already has an active trash entry",
                entry.task_id
            )));
        }
        self.trash.insert(entry.id, entry);
        Ok(())
    }

    /// The newest entry of `task_id` that has not been restored.
    pub(crate) fn latest_active_entry_mut(&mut self, task_id: Uuid) -> Option<&mut TrashEntry> {
        self.trash
            .values_mut()
            .filter(|e| e.task_id == task_id && e.is_active())
            .max_by(|a, b| a.deleted_at.cmp(&b.deleted_at))
    }

    pub(crate) fn remove_trash_entry(&mut self, id: Uuid) -> Option<TrashEntry> {
        self.trash.remove(&id)
    }
}
