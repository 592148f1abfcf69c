//! Client view-state stores.
//!
//! A [`ViewStore`] caches the records of one API route group together with
//! `loading` and `error` flags for a presentation layer. Stores are plain
//! values: build one per page or component tree and pass it by reference.
//! Fetches replace the cached list wholesale; mutations reconcile the cache
//! with the record the server returned. A failed call only records its
//! error, the cached items stay as they were.

pub mod client;

pub use client::ApiClient;

use crate::{
    entities::{
        AcademicYearModel, BranchModel, CollegeModel, CourseModel, LogBookEntryModel,
        LogBookTemplateModel, ModuleModel, PhaseModel, StudentProfileModel, StudentSubjectModel,
        SubjectModel, TeacherProfileModel, TeacherSubjectModel, UserModel,
    },
    core::teacher_subject::SubjectAssignment,
    errors::{Error, Result},
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// A record type served by one API route group.
pub trait Resource: Clone + Send + Sync + DeserializeOwned + 'static {
    /// Collection path, e.g. `/api/colleges`
    const PATH: &'static str;

    /// Primary key of the record.
    fn id(&self) -> Uuid;
}

/// A resource whose `POST` answers with the one created record and whose
/// records accept `PATCH`.
pub trait Editable: Resource {}

macro_rules! resource {
    ($model:ty, $path:literal) => {
        impl Resource for $model {
            const PATH: &'static str = $path;

            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
    ($model:ty, $path:literal, editable) => {
        resource!($model, $path);
        impl Editable for $model {}
    };
}

resource!(CollegeModel, "/api/colleges", editable);
resource!(CourseModel, "/api/courses", editable);
resource!(BranchModel, "/api/branches", editable);
resource!(AcademicYearModel, "/api/academic-years", editable);
resource!(PhaseModel, "/api/phases", editable);
resource!(SubjectModel, "/api/subjects", editable);
resource!(ModuleModel, "/api/modules", editable);
resource!(UserModel, "/api/users", editable);
resource!(StudentProfileModel, "/api/students", editable);
resource!(TeacherProfileModel, "/api/teachers", editable);
resource!(StudentSubjectModel, "/api/student-subjects", editable);
resource!(LogBookTemplateModel, "/api/logbook-templates", editable);
resource!(LogBookEntryModel, "/api/logbook-entries", editable);
// Assigned as whole sets through `ViewStore::assign`
resource!(TeacherSubjectModel, "/api/teacher-subjects");

/// What a presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<T> {
    /// Cached records
    pub items: Vec<T>,
    /// Whether a fetch is in flight
    pub loading: bool,
    /// Message of the last failed call
    pub error: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T: Resource> StoreState<T> {
    fn append(&mut self, record: T) {
        self.items.push(record);
    }

    fn replace(&mut self, record: T) {
        let id = record.id();
        if let Some(slot) = self.items.iter_mut().find(|item| item.id() == id) {
            *slot = record;
        }
    }

    fn drop_id(&mut self, id: Uuid) {
        self.items.retain(|item| item.id() != id);
    }
}

/// Cached view of one resource collection.
#[derive(Debug)]
pub struct ViewStore<T> {
    client: ApiClient,
    state: Arc<RwLock<StoreState<T>>>,
}

impl<T> Clone for ViewStore<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Resource> ViewStore<T> {
    /// Creates an empty store backed by `client`.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> StoreState<T> {
        self.state.read().await.clone()
    }

    async fn fail<R>(&self, action: &str, err: Error) -> Result<R> {
        warn!(path = T::PATH, action, error = %err, "Store action failed");
        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(err.to_string());
        Err(err)
    }

    /// Loads the collection, filtered by `query`, replacing the cached items.
    pub async fn fetch<Q>(&self, query: &Q) -> Result<()>
    where
        Q: Serialize + ?Sized + Sync,
    {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }
        match self.client.list::<T, _>(T::PATH, query).await {
            Ok(items) => {
                let mut state = self.state.write().await;
                state.items = items;
                state.loading = false;
                Ok(())
            }
            Err(e) => self.fail("fetch", e).await,
        }
    }

    /// Deletes a record and drops it from the cache.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        match self.client.delete(T::PATH, id).await {
            Ok(()) => {
                self.state.write().await.drop_id(id);
                Ok(())
            }
            Err(e) => self.fail("remove", e).await,
        }
    }
}

impl<T: Editable> ViewStore<T> {
    /// Creates a record and appends the server's copy.
    pub async fn create<B>(&self, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
    {
        match self.client.create::<T, _>(T::PATH, body).await {
            Ok(record) => {
                self.state.write().await.append(record.clone());
                Ok(record)
            }
            Err(e) => self.fail("create", e).await,
        }
    }

    /// Updates a record and replaces the cached copy with the server's.
    pub async fn update<B>(&self, id: Uuid, changes: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
    {
        match self.client.update::<T, _>(T::PATH, id, changes).await {
            Ok(record) => {
                self.state.write().await.replace(record.clone());
                Ok(record)
            }
            Err(e) => self.fail("update", e).await,
        }
    }
}

impl ViewStore<TeacherSubjectModel> {
    /// Replaces the subjects of one (teacher, academic year, phase) tuple
    /// and swaps the cached rows of that tuple for the server's new set.
    pub async fn assign(&self, assignment: &SubjectAssignment) -> Result<Vec<TeacherSubjectModel>> {
        match self
            .client
            .create::<Vec<TeacherSubjectModel>, _>(TeacherSubjectModel::PATH, assignment)
            .await
        {
            Ok(rows) => {
                let mut state = self.state.write().await;
                state.items.retain(|row| {
                    !(row.teacher_id == assignment.teacher_id
                        && row.academic_year_id == assignment.academic_year_id
                        && row.phase_id == assignment.phase_id)
                });
                state.items.extend(rows.iter().cloned());
                Ok(rows)
            }
            Err(e) => self.fail("assign", e).await,
        }
    }
}
