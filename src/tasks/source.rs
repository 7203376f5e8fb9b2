//! # One-shot source of task items.
//!
//! [`TaskSource`] is a lazy, possibly infinite, possibly fallible sequence consumed
//! exactly once by the executor's feed step. It can be built from plain iterators and
//! streams, or from their `Result`-yielding variants when producing an item can fail.
//!
//! Iterators are pulled on the executor's task: a source that blocks (e.g. synchronous
//! file reads) should be wrapped in a stream backed by `spawn_blocking` instead.

use futures::stream::{self, BoxStream, Stream, StreamExt};

/// Error yielded by a fallible source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lazy one-shot sequence of task items.
pub struct TaskSource<T> {
    inner: BoxStream<'static, Result<T, SourceError>>,
}

impl<T: Send + 'static> TaskSource<T> {
    /// A source with no items.
    pub fn empty() -> Self {
        Self {
            inner: stream::empty().boxed(),
        }
    }

    /// Items from an infallible iterator, in iteration order.
    pub fn iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: stream::iter(items).map(Ok).boxed(),
        }
    }

    /// Items from an iterator whose elements may fail; feeding stops at the first error.
    pub fn try_iter<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
        E: Into<SourceError>,
    {
        Self {
            inner: stream::iter(items).map(|r| r.map_err(Into::into)).boxed(),
        }
    }

    /// Items from an infallible stream.
    pub fn stream<S>(items: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            inner: items.map(Ok).boxed(),
        }
    }

    /// Items from a fallible stream; feeding stops at the first error.
    pub fn try_stream<S, E>(items: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        E: Into<SourceError>,
    {
        Self {
            inner: items.map(|r| r.map_err(Into::into)).boxed(),
        }
    }
}

impl<T> TaskSource<T> {
    pub(crate) fn into_stream(self) -> BoxStream<'static, Result<T, SourceError>> {
        self.inner
    }
}

impl<T: Send + 'static> Default for TaskSource<T> {
    fn default() -> Self {
        Self::empty()
    }
}
