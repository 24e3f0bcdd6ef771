//! Lazy iteration across pages

use super::query_result::{ObjectEntry, QueryResult};
use crate::error::Result;
use tracing::trace;

/// Iterator over the objects of a result and every page chained after it
///
/// A page without cache is parsed record by record; the objects become the
/// page's cache once the iterator has moved past its last record. Stopping
/// early or hitting an error leaves the cache unset. After an error the
/// iterator is exhausted.
pub struct Iter<'a> {
    page: Option<&'a mut QueryResult>,
    position: usize,
    parsed: Vec<ObjectEntry>,
}

impl<'a> Iter<'a> {
    pub(super) fn new(page: &'a mut QueryResult) -> Self {
        Self {
            page: Some(page),
            position: 0,
            parsed: Vec::new(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<ObjectEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let page = self.page.as_mut()?;

            if let Some(objects) = &page.objects {
                if let Some((id, object)) = objects.get(self.position) {
                    self.position += 1;
                    return Some(Ok((id.clone(), object.clone())));
                }
            } else if let Some(raw) = page.records().get(self.position) {
                match page.parse_record(raw) {
                    Ok((id, object)) => {
                        self.position += 1;
                        let copy = object.clone();
                        self.parsed.push((id.clone(), object));
                        return Some(Ok((id, copy)));
                    }
                    Err(e) => {
                        self.page = None;
                        self.parsed.clear();
                        return Some(Err(e));
                    }
                }
            } else {
                trace!(
                    class_name = page.class_name(),
                    objects = self.parsed.len(),
                    "Caching parsed page"
                );
                page.objects = Some(std::mem::take(&mut self.parsed));
            }

            let page = self.page.take()?;
            match page.more() {
                Ok(next) => {
                    self.page = next;
                    self.position = 0;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
