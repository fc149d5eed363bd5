//! Service result codes.

const MODULE_ID: u32 = 114;
const ERROR_CODE_SHIFT: u32 = 9;

/// Outcome of a display service command, carrying the wire encoding
/// `(description << 9) | module` used when reporting back to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ResultCode {
    Success = 0,
    /// Malformed or out-of-range command arguments.
    InvalidArguments = (1 << ERROR_CODE_SHIFT) | MODULE_ID,
    /// Negative layer dimensions after 32-bit narrowing.
    InvalidLayerSize = (4 << ERROR_CODE_SHIFT) | MODULE_ID,
    /// Caller's privilege tier is above the allowed threshold.
    InvalidRange = (5 << ERROR_CODE_SHIFT) | MODULE_ID,
    /// In-range scaling mode that the service does not support.
    InvalidScalingMode = (6 << ERROR_CODE_SHIFT) | MODULE_ID,
    /// Unknown display name or id, or operation on a display that is not open.
    InvalidValue = (7 << ERROR_CODE_SHIFT) | MODULE_ID,
    /// Display already has an open session.
    AlreadyOpened = (9 << ERROR_CODE_SHIFT) | MODULE_ID,
}

impl ResultCode {
    pub fn to_raw(self) -> u32 {
        self as u32
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_encoding_carries_module_id() {
        assert_eq!(ResultCode::Success.to_raw(), 0);
        assert_eq!(ResultCode::InvalidArguments.to_raw(), (1 << 9) | 114);
        assert_eq!(ResultCode::AlreadyOpened.to_raw(), (9 << 9) | 114);
        assert!(ResultCode::Success.is_success());
        assert!(!ResultCode::InvalidValue.is_success());
    }
}
