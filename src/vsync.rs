//! Lazily-cached vsync signal handle.

/// Kernel-level handle value. Ownership stays with the external handle table;
/// this crate only stores the integer.
pub type Handle = u32;

/// External capability/handle table seam. `None` means the table is
/// exhausted, which is host resource exhaustion rather than guest misuse.
pub trait HandleTable {
    /// Creates a handle referencing the process-wide vsync event.
    fn create_vsync_handle(&mut self) -> Option<Handle>;
}

/// Creates the vsync handle on first use and memoizes it for the lifetime of
/// the service instance. Every caller gets the same value back.
#[derive(Debug, Default)]
pub struct VsyncHandleCache {
    handle: Option<Handle>,
}

impl VsyncHandleCache {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Returns the cached handle, creating it exactly once.
    ///
    /// # Panics
    ///
    /// Panics when the handle table is exhausted; the service cannot continue
    /// without the vsync event, and this is not a reportable protocol error.
    pub fn get(&mut self, table: &mut dyn HandleTable) -> Handle {
        if let Some(handle) = self.handle {
            return handle;
        }

        let Some(handle) = table.create_vsync_handle() else {
            panic!("handle table exhausted while creating vsync event handle");
        };
        self.handle = Some(handle);
        handle
    }
}
