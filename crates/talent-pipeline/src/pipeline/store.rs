use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{Application, ApplicationId, Job, JobId};
use super::repository::{ApplicationRepository, JobRepository, RepositoryError};

/// Insertion-ordered collection keyed by id.
#[derive(Debug)]
struct OrderedTable<K, V> {
    index: HashMap<K, usize>,
    rows: Vec<V>,
}

impl<K, V> Default for OrderedTable<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq + Clone, V: Clone> OrderedTable<K, V> {
    fn insert(&mut self, key: K, row: V) -> Result<(), RepositoryError> {
        if self.index.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        self.index.insert(key, self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|position| &self.rows[*position])
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.index.get(key) {
            Some(position) => self.rows.get_mut(*position),
            None => None,
        }
    }

    fn rows(&self) -> Vec<V> {
        self.rows.clone()
    }
}

#[derive(Debug, Default)]
struct Tables {
    applications: OrderedTable<ApplicationId, Application>,
    jobs: OrderedTable<JobId, Job>,
}

/// In-memory entity store for applications and jobs.
///
/// Writes are serialized behind a single mutex and application updates are
/// checked against the stored version.
#[derive(Debug, Default)]
pub struct InMemoryPipelineStore {
    tables: Mutex<Tables>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with `applications` and `jobs`.
    pub fn seeded(
        applications: Vec<Application>,
        jobs: Vec<Job>,
    ) -> Result<Self, RepositoryError> {
        let store = Self::new();
        for job in jobs {
            store.insert_job(job)?;
        }
        for application in applications {
            store.insert(application)?;
        }
        Ok(store)
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryPipelineStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        tables
            .applications
            .insert(application.id.clone(), application.clone())?;
        Ok(application)
    }

    fn update(&self, mut application: Application) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let stored = tables
            .applications
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != application.version {
            return Err(RepositoryError::VersionMismatch {
                expected: application.version,
                found: stored.version,
            });
        }
        application.version += 1;
        *stored = application.clone();
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.tables()?.applications.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.tables()?.applications.rows())
    }
}

impl JobRepository for InMemoryPipelineStore {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        tables.jobs.insert(job.id.clone(), job.clone())?;
        Ok(job)
    }

    fn update_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        let stored = tables
            .jobs
            .get_mut(&job.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = job.clone();
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.get(id).cloned())
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.rows())
    }
}
