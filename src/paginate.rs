//! Fixed-size paging over an ordered slice.
//!
//! There is always at least one page: an empty input, or a page size of zero,
//! produces a single empty page so callers always have something to render.

use crate::error::{Error, Result};

/// Iterator over the pages of a slice, see [`paginate`]
#[derive(Debug, Clone)]
pub struct Pages<'a, T> {
    inner: PagesInner<'a, T>,
}

#[derive(Debug, Clone)]
enum PagesInner<'a, T> {
    Single(Option<&'a [T]>),
    Chunks(std::slice::Chunks<'a, T>),
}

impl<'a, T> Iterator for Pages<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            PagesInner::Single(page) => page.take(),
            PagesInner::Chunks(chunks) => chunks.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            PagesInner::Single(page) => {
                let n = usize::from(page.is_some());
                (n, Some(n))
            }
            PagesInner::Chunks(chunks) => chunks.size_hint(),
        }
    }
}

impl<T> ExactSizeIterator for Pages<'_, T> {}

/// Split `items` into pages of at most `page_size` items, preserving order
pub fn paginate<T>(items: &[T], page_size: usize) -> Pages<'_, T> {
    let inner = if items.is_empty() || page_size == 0 {
        PagesInner::Single(Some(&items[..0]))
    } else {
        PagesInner::Chunks(items.chunks(page_size))
    };
    Pages { inner }
}

/// Number of pages [`paginate`] yields for `len` items
pub fn page_count(len: usize, page_size: usize) -> usize {
    if len == 0 || page_size == 0 {
        1
    } else {
        len.div_ceil(page_size)
    }
}

/// Fetch one page by 1-based number
pub fn page<T>(items: &[T], page_size: usize, number: usize) -> Result<&[T]> {
    let total = page_count(items.len(), page_size);
    if number == 0 || number > total {
        return Err(Error::Validation(format!(
            "page {number} is out of range (1-{total})"
        )));
    }
    paginate(items, page_size)
        .nth(number - 1)
        .ok_or_else(|| Error::Validation(format!("page {number} is out of range (1-{total})")))
}
