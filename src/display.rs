//! Display catalog and open-session tracking.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

/// Fixed wire record describing one virtual display. Byte-exact: 72 bytes,
/// name zero-padded, explicit padding after the limit flag.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DisplayInfo {
    /// ASCII display name, zero-padded to 40 bytes.
    pub name: [u8; 40],
    pub layer_limit_enabled: u8,
    pub padding: [u8; 7],
    pub layer_limit_max: u64,
    pub width: u64,
    pub height: u64,
}

impl DisplayInfo {
    fn new(name: &str, layer_limit_enabled: bool, layer_limit_max: u64, width: u64, height: u64) -> Self {
        let mut info = DisplayInfo::zeroed();
        info.name[..name.len()].copy_from_slice(name.as_bytes());
        info.layer_limit_enabled = layer_limit_enabled as u8;
        info.layer_limit_max = layer_limit_max;
        info.width = width;
        info.height = height;
        info
    }

    /// Name bytes with the trailing zero padding trimmed.
    pub fn trimmed_name(&self) -> &[u8] {
        let end = self.name.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.name[..end]
    }
}

/// Immutable, ordered list of the fixed display descriptors. Built once per
/// service instance and never mutated afterwards.
pub struct DisplayCatalog {
    displays: Vec<DisplayInfo>,
}

impl DisplayCatalog {
    pub fn new() -> Self {
        let displays = vec![
            DisplayInfo::new("Default", true, 1, 1920, 1080),
            DisplayInfo::new("External", true, 1, 1920, 1080),
            DisplayInfo::new("Edid", true, 1, 0, 0),
            DisplayInfo::new("Internal", true, 1, 1920, 1080),
            DisplayInfo::new("Null", false, 0, 1920, 1080),
        ];

        Self { displays }
    }

    /// Index of the display whose trimmed name matches exactly.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.displays
            .iter()
            .position(|display| display.trimmed_name() == name.as_bytes())
    }

    pub fn get(&self, index: usize) -> Option<&DisplayInfo> {
        self.displays.get(index)
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }
}

impl Default for DisplayCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Open display sessions, keyed by catalog index. The stored value is a
/// snapshot of the descriptor taken at open time.
pub struct SessionTable {
    open: HashMap<u64, DisplayInfo>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
        }
    }

    /// Registers a session; returns false if the display is already open.
    pub fn open(&mut self, display_id: u64, info: DisplayInfo) -> bool {
        if self.open.contains_key(&display_id) {
            return false;
        }
        self.open.insert(display_id, info);
        true
    }

    /// Removes a session; returns false if the display was not open.
    pub fn close(&mut self, display_id: u64) -> bool {
        self.open.remove(&display_id).is_some()
    }

    pub fn contains(&self, display_id: u64) -> bool {
        self.open.contains_key(&display_id)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
