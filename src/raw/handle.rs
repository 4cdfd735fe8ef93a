use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Stable index of an arena slot.
///
/// Slot `i` is stored as `i + 1` so `Option<Handle>` is the same size as `Handle`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    /// The largest slot index a handle can name.
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    /// Returns the handle for slot `index`, or `None` if the index does not fit.
    #[inline]
    pub(crate) fn new(index: usize) -> Option<Self> {
        if index > Self::MAX {
            return None;
        }
        let raw = RawHandle::try_from(index + 1).ok()?;
        NonZero::new(raw).map(Self)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}
