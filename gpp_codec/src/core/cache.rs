use std::sync::OnceLock;

/// Lazily computed encoding, dropped whenever the owner is mutated.
///
/// `OnceLock` keeps the owning segments and sections `Send + Sync`, so encoding through a shared
/// reference from several threads is fine. Mutation requires `&mut`, which clears the cache.
#[derive(Clone, Debug, Default)]
pub(crate) struct EncodeCache<T>(OnceLock<T>);

impl<T> EncodeCache<T> {
    pub(crate) fn new() -> Self {
        Self(OnceLock::new())
    }

    pub(crate) fn get_or_encode<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.0.get_or_init(f)
    }

    pub(crate) fn invalidate(&mut self) {
        self.0.take();
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self) -> bool {
        self.0.get().is_some()
    }
}
