//! Chunking of the row stream.

use crate::error::{Error, Result};

/// Rows per bulk job unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 2500;

/// Split `items` into consecutive chunks of at most `size` items.
///
/// Lazy: a chunk is only pulled from `items` when requested. The last chunk may
/// be shorter and an empty input yields no chunks.
pub fn chunks<I: IntoIterator>(items: I, size: usize) -> Result<Chunks<I::IntoIter>> {
    if size == 0 {
        return Err(Error::configuration("Chunk size must be greater than zero"));
    }
    Ok(Chunks {
        inner: items.into_iter(),
        size,
    })
}

/// Iterator returned by [`chunks`].
#[derive(Debug)]
pub struct Chunks<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<_> = self.inner.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}
