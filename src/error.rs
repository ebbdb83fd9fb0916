use thiserror::Error;

/// The error returned by [`AvlTree::try_insert`] when the key is already present.
///
/// The rejected item is handed back unchanged.
///
/// [`AvlTree::try_insert`]: crate::AvlTree::try_insert
#[derive(Debug, Error)]
#[error("key already present in tree")]
pub struct KeyExists<H> {
    item: H,
}

impl<H> KeyExists<H> {
    pub(crate) fn new(item: H) -> Self {
        KeyExists { item }
    }

    /// Returns a reference to the rejected item.
    pub fn item(&self) -> &H {
        &self.item
    }

    /// Consumes the error, returning the rejected item.
    pub fn into_item(self) -> H {
        self.item
    }
}
