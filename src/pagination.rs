use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, QuerySelect, Select};
use serde::Serialize;

use crate::error::AppResult;

pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: Option<u64>, offset: Option<u64>, default_limit: u64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> AppResult<Page<U>>
    where
        F: FnMut(T) -> AppResult<U>,
    {
        Ok(Page { count: self.count, results: self.results.into_iter().map(f).collect::<AppResult<_>>()? })
    }
}

/// Runs `select` for one page, with the total row count of the unpaged query.
pub async fn fetch<E, C>(db: &C, select: Select<E>, page: PageRequest) -> AppResult<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
    C: ConnectionTrait,
{
    let count = select.clone().count(db).await?;
    let results = select.offset(page.offset).limit(page.limit).all(db).await?;
    Ok(Page { count, results })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_bounded() {
        assert_eq!(PageRequest::new(None, None, 10), PageRequest { limit: 10, offset: 0 });
        assert_eq!(PageRequest::new(Some(0), Some(5), 10).limit, 1);
        assert_eq!(PageRequest::new(Some(1_000), None, 10).limit, MAX_PAGE_SIZE);
    }
}
