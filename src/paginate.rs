use std::future::Future;
use std::marker::PhantomData;

use crate::error::Result;
use crate::platform::types::{Cursor, Page};

/// Lazy sequence of pages produced by a cursor-taking fetch function.
///
/// Pages are only requested when the caller asks for them, so a listing can
/// be abandoned part way through without fetching the rest.
pub struct Paginator<T, F> {
    fetch: F,
    next: Option<Cursor>,
    exhausted: bool,
    _item: PhantomData<T>,
}

impl<T, F, Fut> Paginator<T, F>
where
    F: FnMut(Option<Cursor>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            next: None,
            exhausted: false,
            _item: PhantomData,
        }
    }

    /// Fetch the next page, or `None` once the listing has no continuation.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = (self.fetch)(self.next).await?;
        match page.next {
            Some(cursor) => self.next = Some(cursor),
            None => self.exhausted = true,
        }

        Ok(Some(page.items))
    }

    /// Concatenate pages until `stop` fires on a page or the listing ends.
    ///
    /// The page that triggers `stop` is kept; no page after it is fetched.
    pub async fn collect_until<P>(mut self, mut stop: P) -> Result<Vec<T>>
    where
        P: FnMut(&[T]) -> bool,
    {
        let mut items = Vec::new();

        while let Some(page) = self.next_page().await? {
            let done = stop(&page);
            items.extend(page);
            if done {
                break;
            }
        }

        Ok(items)
    }

    pub async fn collect_all(self) -> Result<Vec<T>> {
        self.collect_until(|_| false).await
    }
}
