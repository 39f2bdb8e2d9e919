//! Specialized collection types

use slotmap::{Key, KeyData};

use crate::handle::WindowHandle;

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generation-checked key for windows owned by an in-memory window system
    pub struct SurfaceKey;
}

/// Handle-based map keyed by generation-checked surface keys
pub type SurfaceMap<T> = SlotMap<SurfaceKey, T>;

impl SurfaceKey {
    /// Native-style handle for this key
    ///
    /// The slot index and generation are packed into one integer, so a handle
    /// for a removed slot never resolves to the slot's next occupant.
    pub fn to_handle(self) -> WindowHandle {
        WindowHandle::from_raw(self.data().as_ffi() as isize)
    }

    /// Recover the key a handle was minted from
    pub fn from_handle(handle: WindowHandle) -> Self {
        KeyData::from_ffi(handle.as_raw() as u64).into()
    }
}
