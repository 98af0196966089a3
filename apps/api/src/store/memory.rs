use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::profile::{Profile, ProfileFields};
use crate::store::{ProfileStore, StoreError, StoreResult};

/// In-memory collection used by handler and router tests.
///
/// `deny_deletes`, `deny_unscoped_deletes` and `deny_renames` make the
/// matching operations fail the way a store credential without those
/// privileges would.
#[derive(Default)]
pub struct MemoryProfileStore {
    docs: Mutex<Vec<Profile>>,
    deny_deletes: bool,
    deny_unscoped_deletes: bool,
    deny_renames: bool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_docs(docs: Vec<Profile>) -> Self {
        Self {
            docs: Mutex::new(docs),
            ..Default::default()
        }
    }

    pub fn denying_deletes(mut self) -> Self {
        self.deny_deletes = true;
        self
    }

    /// Refuses only the collection-wide delete.
    pub fn denying_unscoped_deletes(mut self) -> Self {
        self.deny_unscoped_deletes = true;
        self
    }

    pub fn denying_renames(mut self) -> Self {
        self.deny_renames = true;
        self
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn snapshot(&self) -> Vec<Profile> {
        self.docs.lock().unwrap().clone()
    }

    fn denied(op: &str) -> StoreError {
        StoreError::PermissionDenied(format!("not authorized on portfolio to execute command {{ {op} }}"))
    }
}

pub fn new_doc(slug: &str, fields: ProfileFields) -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        fields,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Profile>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().find(|d| d.slug == slug).cloned())
    }

    async fn insert(&self, slug: &str, fields: &ProfileFields) -> StoreResult<Profile> {
        let mut docs = self.docs.lock().unwrap();
        if docs.iter().any(|d| d.slug == slug) {
            return Err(StoreError::Duplicate(format!("slug {slug}")));
        }
        let doc = new_doc(slug, fields.clone());
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn replace(&self, slug: &str, fields: &ProfileFields) -> StoreResult<Profile> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(doc) = docs.iter_mut().find(|d| d.slug == slug) {
            doc.fields = fields.clone();
            doc.updated_at = Utc::now();
            return Ok(doc.clone());
        }
        let doc = new_doc(slug, fields.clone());
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn merge(
        &self,
        slug: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Option<Profile>> {
        let mut docs = self.docs.lock().unwrap();
        let Some(doc) = docs.iter_mut().find(|d| d.slug == slug) else {
            return Ok(None);
        };
        let mut current = match serde_json::to_value(&doc.fields)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        doc.fields = serde_json::from_value(Value::Object(current))?;
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn delete_by_slug(&self, slug: &str) -> StoreResult<u64> {
        if self.deny_deletes {
            return Err(Self::denied("delete"));
        }
        let mut docs = self.docs.lock().unwrap();
        let before = docs.len();
        docs.retain(|d| d.slug != slug);
        Ok((before - docs.len()) as u64)
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        if self.deny_deletes || self.deny_unscoped_deletes {
            return Err(Self::denied("delete"));
        }
        let mut docs = self.docs.lock().unwrap();
        let removed = docs.len() as u64;
        docs.clear();
        Ok(removed)
    }

    async fn find_ids_by_slug(&self, slug: &str) -> StoreResult<Vec<Uuid>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().filter(|d| d.slug == slug).map(|d| d.id).collect())
    }

    async fn rename_slug(&self, id: Uuid, new_slug: &str) -> StoreResult<bool> {
        if self.deny_renames {
            return Err(Self::denied("update"));
        }
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|d| d.id == id && d.slug != new_slug) {
            Some(doc) => {
                doc.slug = new_slug.to_string();
                doc.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
