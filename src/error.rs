//! Error type shared by the array, index and map layers.

use std::alloc::Layout;

/// Failures surfaced by the fallible (`try_*`) operations.
///
/// Key-not-found is never an error; lookups report it through `Option` or
/// the map's default value instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested element or byte count does not fit in `usize`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused a growth request.
    #[error("allocation of {} bytes failed", .layout.size())]
    AllocFailed { layout: Layout },

    /// `pop` on an empty array.
    #[error("pop from an empty array")]
    Empty,

    /// Index-based operation outside `0..len`.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },

    /// A load policy that could leave probe sequences without an empty slot.
    #[error("invalid load policy: {0}")]
    InvalidPolicy(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Error for a failed reservation of `count` elements of `T`.
    pub(crate) fn alloc_failed<T>(count: usize) -> Self {
        match Layout::array::<T>(count) {
            Ok(layout) => Error::AllocFailed { layout },
            Err(_) => Error::CapacityOverflow,
        }
    }
}

/// Unwrap the result of a fallible growth operation the way `Vec` would:
/// abort through the allocation-error handler when the allocator fails and
/// panic on anything else.
#[track_caller]
pub(crate) fn infallible<T>(res: Result<T>) -> T {
    match res {
        Ok(v) => v,
        Err(Error::AllocFailed { layout }) => std::alloc::handle_alloc_error(layout),
        Err(e) => panic!("{e}"),
    }
}
