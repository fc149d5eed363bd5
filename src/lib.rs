//! visrv - display and layer management service endpoint
//!
//! Implements the request/response command surface a guest uses to enumerate
//! displays, open display sessions, manage render layers, and obtain the
//! vsync event handle. The compositor and the kernel handle table stay
//! behind trait seams; the outer transport frames raw command invocations
//! and supplies the per-call [`Context`].
//!
//! Only a single display is concurrently addressable. That is a deliberate
//! compatibility choice, not a gap.

mod display;
mod layer;
mod parcel;
mod result;
mod service;
mod vsync;
mod wire;

pub use display::{DisplayCatalog, DisplayInfo, SessionTable};
pub use layer::{
    convert_scaling_mode, Compositor, DestinationScalingMode, LayerCoordinator, ProducerToken,
    SourceScalingMode,
};
pub use result::ResultCode;
pub use service::{ApplicationDisplayService, Context, Response, ServiceType, SubService};
pub use vsync::{Handle, HandleTable, VsyncHandleCache};
