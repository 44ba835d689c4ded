use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{Entity, Filter, PageRequest, Store, StoreResult, StoreError};

/// In-process store with the same uniqueness and ordering rules as the
/// MySQL tables. Ids are assigned sequentially from 1.
pub struct MemoryStore<T> {
    inner: RwLock<Inner<T>>,
}

struct Inner<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryStore<T> {
    fn matching(&self, filter: &T::Filter) -> Vec<T> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<T> = inner
            .rows
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        rows.sort_by(T::listing_order);
        rows
    }
}

#[async_trait]
impl<T: Entity> Store<T> for MemoryStore<T> {
    async fn find_by_id(&self, id: u64) -> StoreResult<Option<T>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rows.get(&id).cloned())
    }

    async fn find_one(&self, filter: &T::Filter) -> StoreResult<Option<T>> {
        Ok(self.matching(filter).into_iter().next())
    }

    async fn find_all(&self, filter: &T::Filter, page: Option<PageRequest>) -> StoreResult<Vec<T>> {
        let rows = self.matching(filter);
        Ok(match page {
            Some(page) => rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.per_page() as usize)
                .collect(),
            None => rows,
        })
    }

    async fn count(&self, filter: &T::Filter) -> StoreResult<u64> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rows.values().filter(|row| filter.matches(row)).count() as u64)
    }

    async fn save(&self, mut entity: T) -> StoreResult<T> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let keys = entity.unique_keys();
        for other in inner.rows.values().filter(|o| o.id() != entity.id()) {
            let other_keys = other.unique_keys();
            if let Some((name, _)) = keys.iter().find(|k| other_keys.contains(k)) {
                return Err(StoreError::Duplicate((*name).to_string()));
            }
        }

        if entity.id() == 0 {
            let id = inner.next_id;
            inner.next_id += 1;
            entity.set_id(id);
        } else if !inner.rows.contains_key(&entity.id()) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        inner.rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        id: u64,
        name: String,
    }

    #[derive(Default)]
    struct TagFilter {
        prefix: Option<String>,
    }

    impl Filter<Tag> for TagFilter {
        fn matches(&self, item: &Tag) -> bool {
            self.prefix.as_deref().is_none_or(|p| item.name.starts_with(p))
        }
    }

    impl Entity for Tag {
        type Filter = TagFilter;
        const NAME: &'static str = "tag";

        fn id(&self) -> u64 {
            self.id
        }

        fn set_id(&mut self, id: u64) {
            self.id = id;
        }

        fn unique_keys(&self) -> Vec<(&'static str, String)> {
            vec![("name", self.name.to_lowercase())]
        }

        fn listing_order(a: &Self, b: &Self) -> Ordering {
            a.name.cmp(&b.name)
        }
    }

    fn tag(name: &str) -> Tag {
        Tag {
            id: 0,
            name: name.to_string(),
        }
    }

    #[actix_web::test]
    async fn assigns_ids_and_enforces_unique_keys() {
        let store = MemoryStore::<Tag>::new();
        let a = store.save(tag("alpha")).await.unwrap();
        let b = store.save(tag("beta")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let err = store.save(tag("ALPHA")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref k) if k == "name"));

        // re-saving the same row does not collide with itself
        let renamed = Tag {
            name: "alpha".into(),
            ..a.clone()
        };
        assert!(store.save(renamed).await.is_ok());
    }

    #[actix_web::test]
    async fn filters_orders_and_pages() {
        let store = MemoryStore::<Tag>::new();
        for name in ["bb", "ba", "ab", "bc"] {
            store.save(tag(name)).await.unwrap();
        }
        let filter = TagFilter {
            prefix: Some("b".into()),
        };
        assert_eq!(store.count(&filter).await.unwrap(), 3);

        let page = store
            .find_all(&filter, Some(PageRequest::new(2, 2)))
            .await
            .unwrap();
        assert_eq!(page, vec![tag_with(4, "bc")]);

        let first = store.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(first.name, "ba");

        assert!(store.delete(first.id).await.unwrap());
        assert!(!store.delete(first.id).await.unwrap());
    }

    fn tag_with(id: u64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
        }
    }
}
