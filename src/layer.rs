//! Layer lifecycle bridge to the compositor.

use crate::result::ResultCode;

/// Opaque capability referencing a buffer producer owned by the compositor.
/// This crate only embeds the token in parcels; it never frees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerToken(pub i64);

/// Compositor seam. The compositor owns layer buffers, producer tokens, and
/// pixel composition; this crate forwards lifecycle calls and mirrors the
/// active-render-layer marker.
pub trait Compositor {
    /// Opens the caller-specified layer and returns its producer token.
    fn open_layer(&mut self, pid: u64, layer_id: i64) -> ProducerToken;
    /// Allocates a fresh layer, returning its id and producer token.
    fn create_layer(&mut self, pid: u64) -> (i64, ProducerToken);
    /// Releases a layer. Best-effort; unknown ids are ignored.
    fn close_layer(&mut self, layer_id: i64);
    fn set_render_layer(&mut self, layer_id: i64);
}

/// Tracks which layer is the active render target. Last writer wins; only a
/// single display is addressable, so one marker suffices.
#[derive(Debug, Default)]
pub struct LayerCoordinator {
    active_layer: Option<i64>,
}

impl LayerCoordinator {
    pub fn new() -> Self {
        Self { active_layer: None }
    }

    pub fn open_layer(
        &mut self,
        compositor: &mut dyn Compositor,
        pid: u64,
        layer_id: i64,
    ) -> ProducerToken {
        let producer = compositor.open_layer(pid, layer_id);
        self.set_render_layer(compositor, layer_id);
        producer
    }

    pub fn create_stray_layer(&mut self, compositor: &mut dyn Compositor) -> (i64, ProducerToken) {
        let (layer_id, producer) = compositor.create_layer(0);
        self.set_render_layer(compositor, layer_id);
        (layer_id, producer)
    }

    pub fn close_layer(&mut self, compositor: &mut dyn Compositor, layer_id: i64) {
        compositor.close_layer(layer_id);
    }

    fn set_render_layer(&mut self, compositor: &mut dyn Compositor, layer_id: i64) {
        self.active_layer = Some(layer_id);
        compositor.set_render_layer(layer_id);
    }

    pub fn active_layer(&self) -> Option<i64> {
        self.active_layer
    }
}

/// Scaling modes as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SourceScalingMode {
    None = 0,
    Freeze = 1,
    ScaleAndCrop = 2,
    ScaleToWindow = 3,
    PreserveAspectRatio = 4,
}

/// Scaling modes as consumed by the compositor side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum DestinationScalingMode {
    None = 0,
    Freeze = 1,
    ScaleAndCrop = 2,
    ScaleToWindow = 3,
    PreserveAspectRatio = 4,
}

impl SourceScalingMode {
    fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(SourceScalingMode::None),
            1 => Some(SourceScalingMode::Freeze),
            2 => Some(SourceScalingMode::ScaleAndCrop),
            3 => Some(SourceScalingMode::ScaleToWindow),
            4 => Some(SourceScalingMode::PreserveAspectRatio),
            _ => None,
        }
    }
}

/// Maps a source scaling mode to its destination counterpart.
///
/// Validation is two-staged and order-sensitive: values outside the enum
/// range fail with `InvalidArguments`; in-range values other than
/// `ScaleToWindow` and `PreserveAspectRatio` fail with `InvalidScalingMode`.
pub fn convert_scaling_mode(raw: i32) -> Result<DestinationScalingMode, ResultCode> {
    let source = SourceScalingMode::from_raw(raw).ok_or(ResultCode::InvalidArguments)?;

    let converted = match source {
        SourceScalingMode::None => DestinationScalingMode::None,
        SourceScalingMode::Freeze => DestinationScalingMode::Freeze,
        SourceScalingMode::ScaleAndCrop => DestinationScalingMode::ScaleAndCrop,
        SourceScalingMode::ScaleToWindow => DestinationScalingMode::ScaleToWindow,
        SourceScalingMode::PreserveAspectRatio => DestinationScalingMode::PreserveAspectRatio,
    };

    if source != SourceScalingMode::ScaleToWindow
        && source != SourceScalingMode::PreserveAspectRatio
    {
        return Err(ResultCode::InvalidScalingMode);
    }

    Ok(converted)
}

const IMAGE_MAP_ALIGNMENT: u64 = 0x1000;
const IMAGE_MAP_SIZE_UNIT: u64 = 0x20000;

/// Size and alignment a caller must reserve for an indirect layer image of
/// the given dimensions, assuming a 32-bit-per-pixel linear layout.
///
/// Width and height arrive as u64 but are narrowed to signed 32-bit values
/// before range-checking; the wraparound that narrowing can produce is part
/// of the protocol and is kept, as is the unchecked 32-bit arithmetic below.
pub fn indirect_layer_memory_info(width: u64, height: u64) -> Result<(u64, u64), ResultCode> {
    let width = width as i32;
    let height = height as i32;

    if width < 0 || height < 0 {
        return Err(ResultCode::InvalidLayerSize);
    }

    let pitch = align_up(div_round_up(width.wrapping_mul(32), 8), 64);
    let memory_size = pitch.wrapping_mul(align_up(height, 64));
    let required = align_up(memory_size, IMAGE_MAP_ALIGNMENT as i32) as u64;
    let size = required
        .wrapping_add(IMAGE_MAP_SIZE_UNIT - 1)
        / IMAGE_MAP_SIZE_UNIT
        * IMAGE_MAP_SIZE_UNIT;

    Ok((size, IMAGE_MAP_ALIGNMENT))
}

fn align_up(value: i32, align: i32) -> i32 {
    value.wrapping_add(align - 1) & -align
}

fn div_round_up(value: i32, divisor: i32) -> i32 {
    value.wrapping_add(divisor - 1) / divisor
}
