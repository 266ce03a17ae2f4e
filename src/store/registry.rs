//! The student registry: keyed storage with stable insertion order.
//!
//! Handlers share one registry through [`SharedStore`]. Each operation
//! holds the lock for its own duration only, so concurrent writers to the
//! same id resolve as last-writer-wins.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::store::student::{Student, StudentId};

/// In-memory student store.
#[derive(Debug, Default)]
pub struct StudentStore {
    /// All records indexed by ID.
    records: HashMap<StudentId, Student>,

    /// IDs in insertion order.
    order: Vec<StudentId>,
}

impl StudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Fails if the ID is already taken.
    pub fn create(&mut self, student: Student) -> ServiceResult<Student> {
        if self.records.contains_key(&student.id) {
            warn!(id = student.id, "Attempt to create student with duplicate ID");
            return Err(ServiceError::Conflict(student.id));
        }

        self.order.push(student.id);
        self.records.insert(student.id, student.clone());
        info!(id = student.id, name = %student.name, "Created student");
        Ok(student)
    }

    /// All records, oldest first.
    pub fn get_all(&self) -> Vec<Student> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: StudentId) -> ServiceResult<Student> {
        match self.records.get(&id) {
            Some(student) => Ok(student.clone()),
            None => {
                warn!(id, "Student not found");
                Err(ServiceError::NotFound(id))
            }
        }
    }

    /// Overwrite name, age and email of an existing record. The stored ID
    /// is kept regardless of `student.id`.
    pub fn update(&mut self, id: StudentId, student: Student) -> ServiceResult<Student> {
        let Some(existing) = self.records.get_mut(&id) else {
            warn!(id, "Attempt to update student that does not exist");
            return Err(ServiceError::NotFound(id));
        };

        existing.name = student.name;
        existing.age = student.age;
        existing.email = student.email;
        info!(id, name = %existing.name, "Updated student");
        Ok(existing.clone())
    }

    pub fn delete(&mut self, id: StudentId) -> ServiceResult<()> {
        if self.records.remove(&id).is_none() {
            warn!(id, "Attempt to delete student that does not exist");
            return Err(ServiceError::NotFound(id));
        }

        self.order.retain(|&existing| existing != id);
        info!(id, "Deleted student");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Thread-safe wrapper around the store.
pub type SharedStore = Arc<RwLock<StudentStore>>;

/// Create a new, empty thread-safe store.
pub fn new_shared_store() -> SharedStore {
    Arc::new(RwLock::new(StudentStore::new()))
}
