//! # Channel element: item or termination marker.
//!
//! The marker is a variant of its own, so no payload value can ever be mistaken for it.

/// One element carried by a [`Channel`](crate::Channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// A payload for the consumer.
    Item(T),
    /// "No more items will arrive for you." Each consumer takes exactly one and stops.
    Terminate,
}

impl<T> Message<T> {
    /// Returns `true` for [`Message::Terminate`].
    #[inline]
    pub fn is_terminate(&self) -> bool {
        matches!(self, Message::Terminate)
    }

    /// Converts into the payload, `None` for the marker.
    #[inline]
    pub fn into_item(self) -> Option<T> {
        match self {
            Message::Item(item) => Some(item),
            Message::Terminate => None,
        }
    }
}

impl<T> From<T> for Message<T> {
    fn from(item: T) -> Self {
        Message::Item(item)
    }
}
