//! Command dispatch for the application display service.

use std::mem;
use std::sync::{Mutex, MutexGuard};

use bytes::{Buf, BufMut};

use crate::display::{DisplayCatalog, DisplayInfo, SessionTable};
use crate::layer::{self, Compositor, LayerCoordinator};
use crate::parcel::Parcel;
use crate::result::ResultCode;
use crate::vsync::{Handle, HandleTable, VsyncHandleCache};
use crate::wire;

/// Command ids as framed by the transport.
mod commands {
    pub const GET_RELAY_SERVICE: u32 = 100;
    pub const GET_SYSTEM_DISPLAY_SERVICE: u32 = 101;
    pub const GET_MANAGER_DISPLAY_SERVICE: u32 = 102;
    pub const GET_INDIRECT_DISPLAY_TRANSACTION_SERVICE: u32 = 103;
    pub const LIST_DISPLAYS: u32 = 1000;
    pub const OPEN_DISPLAY: u32 = 1010;
    pub const OPEN_DEFAULT_DISPLAY: u32 = 1011;
    pub const CLOSE_DISPLAY: u32 = 1020;
    pub const SET_DISPLAY_ENABLED: u32 = 1101;
    pub const GET_DISPLAY_RESOLUTION: u32 = 1102;
    pub const OPEN_LAYER: u32 = 2020;
    pub const CLOSE_LAYER: u32 = 2021;
    pub const CREATE_STRAY_LAYER: u32 = 2030;
    pub const DESTROY_STRAY_LAYER: u32 = 2031;
    pub const SET_LAYER_SCALING_MODE: u32 = 2101;
    pub const CONVERT_SCALING_MODE: u32 = 2102;
    pub const GET_INDIRECT_LAYER_IMAGE_MAP: u32 = 2450;
    pub const GET_INDIRECT_LAYER_IMAGE_REQUIRED_MEMORY_INFO: u32 = 2460;
    pub const GET_DISPLAY_VSYNC_EVENT: u32 = 5202;
}

/// Privilege tier the service instance was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceType {
    Application,
    System,
    Manager,
}

/// Tiers above this threshold fail every command with `InvalidRange` before
/// any argument decoding. Deliberately looser than a strict per-subtype
/// check; guests depend on the relaxed form.
const MAX_ALLOWED_TIER: ServiceType = ServiceType::System;

/// Interface tag embedded alongside producer tokens in parcels.
const PRODUCER_INTERFACE_TAG: &str = "dispdrv\0";

/// Sub-service object created by a factory command. The transport registers
/// it as a new session object; it shares the compositor connection supplied
/// per call via [`Context`] and carries no other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubService {
    Relay,
    SystemDisplay,
    ManagerDisplay,
    IndirectDisplayTransaction,
}

/// Per-invocation environment supplied by the transport.
pub struct Context<'a> {
    /// Raw command argument bytes.
    pub request: &'a [u8],
    /// Caller-provided receive buffer; empty for commands without one.
    pub receive: &'a mut [u8],
    /// Caller process id.
    pub pid: u64,
    pub compositor: &'a mut dyn Compositor,
    pub handle_table: &'a mut dyn HandleTable,
}

/// Completed command: result code, reply data words, optionally a copied
/// handle and/or a sub-service object for the transport to register.
#[derive(Debug)]
pub struct Response {
    pub code: ResultCode,
    pub data: Vec<u8>,
    /// Handle returned with copy semantics; closing the caller's copy does
    /// not invalidate other holders.
    pub copy_handle: Option<Handle>,
    pub object: Option<SubService>,
}

impl Response {
    fn success() -> Self {
        Self {
            code: ResultCode::Success,
            data: Vec::new(),
            copy_handle: None,
            object: None,
        }
    }

    fn with_data(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::success()
        }
    }

    fn with_object(object: SubService) -> Self {
        Self {
            object: Some(object),
            ..Self::success()
        }
    }

    fn error(code: ResultCode) -> Self {
        Self {
            code,
            ..Self::success()
        }
    }
}

/// Mutable service state. One lock per instance guards the session table,
/// the active-render-layer marker, and the vsync handle cache; no other
/// ordering exists between concurrent guest contexts.
struct State {
    sessions: SessionTable,
    layers: LayerCoordinator,
    vsync: VsyncHandleCache,
}

/// Top-level display service endpoint.
pub struct ApplicationDisplayService {
    service_type: ServiceType,
    // immutable after construction, so it lives outside the lock
    catalog: DisplayCatalog,
    state: Mutex<State>,
}

impl ApplicationDisplayService {
    pub fn new(service_type: ServiceType) -> Self {
        Self {
            service_type,
            catalog: DisplayCatalog::new(),
            state: Mutex::new(State {
                sessions: SessionTable::new(),
                layers: LayerCoordinator::new(),
                vsync: VsyncHandleCache::new(),
            }),
        }
    }

    /// Dispatches one command. The privilege tier is checked before any
    /// decoding; ordinary failures come back as result codes.
    pub fn process_request(&self, command: u32, ctx: &mut Context<'_>) -> Response {
        if self.service_type > MAX_ALLOWED_TIER {
            return Response::error(ResultCode::InvalidRange);
        }

        let result = match command {
            commands::GET_RELAY_SERVICE => Ok(Response::with_object(SubService::Relay)),
            commands::GET_SYSTEM_DISPLAY_SERVICE => {
                Ok(Response::with_object(SubService::SystemDisplay))
            }
            commands::GET_MANAGER_DISPLAY_SERVICE => {
                Ok(Response::with_object(SubService::ManagerDisplay))
            }
            commands::GET_INDIRECT_DISPLAY_TRANSACTION_SERVICE => {
                Ok(Response::with_object(SubService::IndirectDisplayTransaction))
            }
            commands::LIST_DISPLAYS => self.list_displays(ctx),
            commands::OPEN_DISPLAY => self.open_display(ctx),
            commands::OPEN_DEFAULT_DISPLAY => self.open_display_impl("Default"),
            commands::CLOSE_DISPLAY => self.close_display(ctx),
            commands::SET_DISPLAY_ENABLED => self.set_display_enabled(),
            commands::GET_DISPLAY_RESOLUTION => self.get_display_resolution(),
            commands::OPEN_LAYER => self.open_layer(ctx),
            commands::CLOSE_LAYER | commands::DESTROY_STRAY_LAYER => self.close_layer(ctx),
            commands::CREATE_STRAY_LAYER => self.create_stray_layer(ctx),
            commands::SET_LAYER_SCALING_MODE => self.set_layer_scaling_mode(),
            commands::CONVERT_SCALING_MODE => self.convert_scaling_mode(ctx),
            commands::GET_INDIRECT_LAYER_IMAGE_MAP => self.get_indirect_layer_image_map(ctx),
            commands::GET_INDIRECT_LAYER_IMAGE_REQUIRED_MEMORY_INFO => {
                self.get_indirect_layer_image_required_memory_info(ctx)
            }
            commands::GET_DISPLAY_VSYNC_EVENT => self.get_display_vsync_event(ctx),
            _ => {
                log::warn!("unhandled command: {}", command);
                Err(ResultCode::InvalidArguments)
            }
        };

        result.unwrap_or_else(Response::error)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("service state lock poisoned")
    }

    // Display operations

    fn list_displays(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        // Only one display is concurrently addressable; the count stays 1
        // even though the catalog holds five descriptors.
        let display_count: u64 = 1;

        let record_size = mem::size_of::<DisplayInfo>();
        for index in 0..display_count as usize {
            let start = index * record_size;
            if start >= ctx.receive.len() {
                break;
            }
            let end = (start + record_size).min(ctx.receive.len());
            // zero the whole span first so unwritten fields cannot leak
            let span = &mut ctx.receive[start..end];
            span.fill(0);
            if let Some(info) = self.catalog.get(index) {
                wire::write_receive(span, bytemuck::bytes_of(info));
            }
        }

        let mut data = Vec::new();
        data.put_u64_le(display_count);
        Ok(Response::with_data(data))
    }

    fn open_display(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let mut name = String::new();

        // Scan up to 8 bytes or end of input. Bytes outside printable ASCII
        // are skipped, not treated as terminators.
        for _ in 0..8 {
            if !buf.has_remaining() {
                break;
            }
            let chr = buf.get_u8();
            if (0x20..0x7f).contains(&chr) {
                name.push(chr as char);
            }
        }

        self.open_display_impl(&name)
    }

    fn open_display_impl(&self, name: &str) -> Result<Response, ResultCode> {
        if name.is_empty() {
            return Err(ResultCode::InvalidValue);
        }

        let index = self.catalog.find(name).ok_or(ResultCode::InvalidValue)?;
        let info = *self.catalog.get(index).ok_or(ResultCode::InvalidValue)?;
        let display_id = index as u64;

        let mut state = self.lock();
        if !state.sessions.open(display_id, info) {
            return Err(ResultCode::AlreadyOpened);
        }

        log::debug!("OpenDisplay: {} -> {}", name, display_id);

        let mut data = Vec::new();
        data.put_u64_le(display_id);
        Ok(Response::with_data(data))
    }

    fn close_display(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let display_id = wire::read_u64(&mut buf)?;

        if !self.lock().sessions.close(display_id) {
            return Err(ResultCode::InvalidValue);
        }

        log::debug!("CloseDisplay: {}", display_id);
        Ok(Response::success())
    }

    fn set_display_enabled(&self) -> Result<Response, ResultCode> {
        // stubbed in the original service
        log::debug!("SetDisplayEnabled: stub");
        Ok(Response::success())
    }

    fn get_display_resolution(&self) -> Result<Response, ResultCode> {
        // The display id argument is ignored and the values are hardcoded in
        // the original service, inconsistent with the catalog's 1920x1080.
        let mut data = Vec::new();
        data.put_u64_le(1280); // width
        data.put_u64_le(720); // height
        Ok(Response::with_data(data))
    }

    // Layer operations

    fn open_layer(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        // single display: the 64-byte display name is decoded but not consulted
        let _display_name: [u8; 0x40] = wire::read_array(&mut buf)?;
        let layer_id = wire::read_i64(&mut buf)?;
        let _user_id = wire::read_i64(&mut buf)?;

        let producer = self
            .lock()
            .layers
            .open_layer(ctx.compositor, ctx.pid, layer_id);

        let mut parcel = Parcel::new(0x28, 0x4);
        parcel.write_object(producer, PRODUCER_INTERFACE_TAG);
        let parcel_data = parcel.finish();

        wire::write_receive(ctx.receive, &parcel_data);

        log::debug!("OpenLayer: {}", layer_id);

        let mut data = Vec::new();
        data.put_i64_le(parcel_data.len() as i64);
        Ok(Response::with_data(data))
    }

    fn close_layer(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let layer_id = wire::read_i64(&mut buf)?;

        self.lock().layers.close_layer(ctx.compositor, layer_id);

        log::debug!("CloseLayer: {}", layer_id);
        Ok(Response::success())
    }

    fn create_stray_layer(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let _layer_flags = wire::read_i64(&mut buf)?;
        let _display_id = wire::read_i64(&mut buf)?;

        let (layer_id, producer) = self.lock().layers.create_stray_layer(ctx.compositor);

        let mut parcel = Parcel::new(0x28, 0x4);
        parcel.write_object(producer, PRODUCER_INTERFACE_TAG);
        let parcel_data = parcel.finish();

        wire::write_receive(ctx.receive, &parcel_data);

        log::debug!("CreateStrayLayer: {}", layer_id);

        let mut data = Vec::new();
        data.put_i64_le(layer_id);
        data.put_i64_le(parcel_data.len() as i64);
        Ok(Response::with_data(data))
    }

    fn set_layer_scaling_mode(&self) -> Result<Response, ResultCode> {
        // The original service converts the source mode and discards the
        // converted value; nothing observable happens.
        log::debug!("SetLayerScalingMode: stub");
        Ok(Response::success())
    }

    fn convert_scaling_mode(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let raw = wire::read_i32(&mut buf)?;

        let converted = layer::convert_scaling_mode(raw)?;

        let mut data = Vec::new();
        data.put_u64_le(converted as u64);
        Ok(Response::with_data(data))
    }

    fn get_indirect_layer_image_map(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        // Pure stub: the receive buffer is zero-filled, no compositor call.
        ctx.receive.fill(0);
        log::debug!("GetIndirectLayerImageMap: stub");
        Ok(Response::success())
    }

    fn get_indirect_layer_image_required_memory_info(
        &self,
        ctx: &mut Context<'_>,
    ) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let width = wire::read_u64(&mut buf)?;
        let height = wire::read_u64(&mut buf)?;

        let (size, alignment) = layer::indirect_layer_memory_info(width, height)?;

        let mut data = Vec::new();
        data.put_u64_le(size);
        data.put_u64_le(alignment);
        Ok(Response::with_data(data))
    }

    // Vsync

    fn get_display_vsync_event(&self, ctx: &mut Context<'_>) -> Result<Response, ResultCode> {
        let mut buf = ctx.request;
        let display_id = wire::read_u64(&mut buf)?;

        let mut state = self.lock();
        if !state.sessions.contains(display_id) {
            return Err(ResultCode::InvalidValue);
        }

        let handle = state.vsync.get(ctx.handle_table);

        Ok(Response {
            copy_handle: Some(handle),
            ..Response::success()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ProducerToken;
    use test_log::test;

    #[derive(Default)]
    struct MockCompositor {
        next_layer: i64,
        opened: Vec<(u64, i64)>,
        closed: Vec<i64>,
        render_layer: Option<i64>,
    }

    impl Compositor for MockCompositor {
        fn open_layer(&mut self, pid: u64, layer_id: i64) -> ProducerToken {
            self.opened.push((pid, layer_id));
            ProducerToken(layer_id ^ 0x5a)
        }

        fn create_layer(&mut self, _pid: u64) -> (i64, ProducerToken) {
            self.next_layer += 1;
            (self.next_layer, ProducerToken(self.next_layer))
        }

        fn close_layer(&mut self, layer_id: i64) {
            self.closed.push(layer_id);
        }

        fn set_render_layer(&mut self, layer_id: i64) {
            self.render_layer = Some(layer_id);
        }
    }

    #[derive(Default)]
    struct MockHandleTable {
        calls: u32,
        exhausted: bool,
    }

    impl HandleTable for MockHandleTable {
        fn create_vsync_handle(&mut self) -> Option<Handle> {
            if self.exhausted {
                return None;
            }
            self.calls += 1;
            Some(0xab00 + self.calls)
        }
    }

    struct Harness {
        service: ApplicationDisplayService,
        compositor: MockCompositor,
        handles: MockHandleTable,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_type(ServiceType::Application)
        }

        fn with_type(service_type: ServiceType) -> Self {
            Self {
                service: ApplicationDisplayService::new(service_type),
                compositor: MockCompositor::default(),
                handles: MockHandleTable::default(),
            }
        }

        fn call(&mut self, command: u32, request: &[u8]) -> Response {
            self.call_buf(command, request, &mut [])
        }

        fn call_buf(&mut self, command: u32, request: &[u8], receive: &mut [u8]) -> Response {
            let mut ctx = Context {
                request,
                receive,
                pid: 42,
                compositor: &mut self.compositor,
                handle_table: &mut self.handles,
            };
            self.service.process_request(command, &mut ctx)
        }
    }

    fn reply_u64(response: &Response, index: usize) -> u64 {
        let offset = index * 8;
        u64::from_le_bytes(response.data[offset..offset + 8].try_into().unwrap())
    }

    fn reply_i64(response: &Response, index: usize) -> i64 {
        let offset = index * 8;
        i64::from_le_bytes(response.data[offset..offset + 8].try_into().unwrap())
    }

    #[test]
    fn manager_tier_fails_before_decoding() {
        let mut harness = Harness::with_type(ServiceType::Manager);
        let response = harness.call(commands::OPEN_DEFAULT_DISPLAY, &[]);
        assert_eq!(response.code, ResultCode::InvalidRange);
    }

    #[test]
    fn system_tier_is_still_allowed() {
        let mut harness = Harness::with_type(ServiceType::System);
        let response = harness.call(commands::GET_RELAY_SERVICE, &[]);
        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(response.object, Some(SubService::Relay));
    }

    #[test]
    fn factories_return_their_sub_service() {
        let mut harness = Harness::new();
        let cases = [
            (commands::GET_RELAY_SERVICE, SubService::Relay),
            (commands::GET_SYSTEM_DISPLAY_SERVICE, SubService::SystemDisplay),
            (commands::GET_MANAGER_DISPLAY_SERVICE, SubService::ManagerDisplay),
            (
                commands::GET_INDIRECT_DISPLAY_TRANSACTION_SERVICE,
                SubService::IndirectDisplayTransaction,
            ),
        ];
        for (command, expected) in cases {
            let response = harness.call(command, &[]);
            assert_eq!(response.code, ResultCode::Success);
            assert_eq!(response.object, Some(expected));
        }
    }

    #[test]
    fn list_displays_reports_one_record() {
        let mut harness = Harness::new();
        let mut receive = [0xffu8; 72 * 5];
        let response = harness.call_buf(commands::LIST_DISPLAYS, &[], &mut receive);

        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(reply_u64(&response, 0), 1);

        // first record is the Default display, fully written
        assert_eq!(&receive[..7], b"Default");
        assert!(receive[7..40].iter().all(|&b| b == 0));
        assert_eq!(
            u64::from_le_bytes(receive[56..64].try_into().unwrap()),
            1920
        );
        // the region beyond the reported count is untouched
        assert_eq!(receive[72], 0xff);
    }

    #[test]
    fn open_default_display_twice() {
        let mut harness = Harness::new();

        let first = harness.call(commands::OPEN_DEFAULT_DISPLAY, &[]);
        assert_eq!(first.code, ResultCode::Success);
        assert_eq!(reply_u64(&first, 0), 0);

        let second = harness.call(commands::OPEN_DEFAULT_DISPLAY, &[]);
        assert_eq!(second.code, ResultCode::AlreadyOpened);

        // the failed open left the session intact: close succeeds once
        let request = 0u64.to_le_bytes();
        let close = harness.call(commands::CLOSE_DISPLAY, &request);
        assert_eq!(close.code, ResultCode::Success);
        let close_again = harness.call(commands::CLOSE_DISPLAY, &request);
        assert_eq!(close_again.code, ResultCode::InvalidValue);
    }

    #[test]
    fn open_display_filters_unprintable_bytes() {
        let mut harness = Harness::new();
        // non-printable bytes are skipped without terminating the scan
        let response = harness.call(commands::OPEN_DISPLAY, b"De\x00fault");
        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(reply_u64(&response, 0), 0);
    }

    #[test]
    fn open_display_only_scans_eight_bytes() {
        let mut harness = Harness::new();
        // "External" is 8 bytes; trailing garbage must not be consumed
        let response = harness.call(commands::OPEN_DISPLAY, b"External-ignored");
        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(reply_u64(&response, 0), 1);
    }

    #[test]
    fn open_display_rejects_empty_and_unknown_names() {
        let mut harness = Harness::new();

        let empty = harness.call(commands::OPEN_DISPLAY, &[0u8; 8]);
        assert_eq!(empty.code, ResultCode::InvalidValue);

        let unknown = harness.call(commands::OPEN_DISPLAY, b"Nope");
        assert_eq!(unknown.code, ResultCode::InvalidValue);

        // neither attempt created a session
        let close = harness.call(commands::CLOSE_DISPLAY, &0u64.to_le_bytes());
        assert_eq!(close.code, ResultCode::InvalidValue);
    }

    #[test]
    fn set_display_enabled_is_a_no_op() {
        let mut harness = Harness::new();
        let response = harness.call(commands::SET_DISPLAY_ENABLED, &[0u8; 12]);
        assert_eq!(response.code, ResultCode::Success);
        assert!(response.data.is_empty());
    }

    #[test]
    fn display_resolution_is_hardcoded() {
        let mut harness = Harness::new();
        let response = harness.call(commands::GET_DISPLAY_RESOLUTION, &9999u64.to_le_bytes());
        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(reply_u64(&response, 0), 1280);
        assert_eq!(reply_u64(&response, 1), 720);
    }

    #[test]
    fn open_layer_writes_parcel_and_marks_render_layer() {
        let mut harness = Harness::new();

        let mut request = Vec::new();
        request.extend_from_slice(&[0u8; 0x40]); // display name
        request.extend_from_slice(&77i64.to_le_bytes()); // layer id
        request.extend_from_slice(&5i64.to_le_bytes()); // user id

        let mut receive = [0u8; 0x100];
        let response = harness.call_buf(commands::OPEN_LAYER, &request, &mut receive);

        assert_eq!(response.code, ResultCode::Success);
        let parcel_len = reply_i64(&response, 0) as usize;
        assert!(parcel_len > 16);

        assert_eq!(harness.compositor.opened, vec![(42, 77)]);
        assert_eq!(harness.compositor.render_layer, Some(77));

        // parcel header: payload starts at 0x10, one 4-byte object entry
        let payload_size = u32::from_le_bytes(receive[0..4].try_into().unwrap()) as usize;
        assert_eq!(parcel_len, 16 + payload_size + 4);
        assert_eq!(&receive[32..40], b"dispdrv\0");
    }

    #[test]
    fn create_stray_layer_returns_allocated_id() {
        let mut harness = Harness::new();

        let mut request = Vec::new();
        request.extend_from_slice(&0i64.to_le_bytes()); // flags
        request.extend_from_slice(&0i64.to_le_bytes()); // display id

        let mut receive = [0u8; 0x100];
        let response = harness.call_buf(commands::CREATE_STRAY_LAYER, &request, &mut receive);

        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(reply_i64(&response, 0), 1);
        assert!(reply_i64(&response, 1) > 0);
        assert_eq!(harness.compositor.render_layer, Some(1));
    }

    #[test]
    fn destroy_stray_layer_closes_via_compositor() {
        let mut harness = Harness::new();
        let response = harness.call(commands::DESTROY_STRAY_LAYER, &3i64.to_le_bytes());
        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(harness.compositor.closed, vec![3]);
    }

    #[test]
    fn convert_scaling_mode_round_trips_supported_modes() {
        let mut harness = Harness::new();

        let out_of_range = harness.call(commands::CONVERT_SCALING_MODE, &7i32.to_le_bytes());
        assert_eq!(out_of_range.code, ResultCode::InvalidArguments);

        let unsupported = harness.call(commands::CONVERT_SCALING_MODE, &0i32.to_le_bytes());
        assert_eq!(unsupported.code, ResultCode::InvalidScalingMode);

        let supported = harness.call(commands::CONVERT_SCALING_MODE, &3i32.to_le_bytes());
        assert_eq!(supported.code, ResultCode::Success);
        assert_eq!(reply_u64(&supported, 0), 3);
    }

    #[test]
    fn indirect_image_map_zero_fills_receive_buffer() {
        let mut harness = Harness::new();
        let mut receive = [0xaau8; 64];
        let response = harness.call_buf(commands::GET_INDIRECT_LAYER_IMAGE_MAP, &[], &mut receive);
        assert_eq!(response.code, ResultCode::Success);
        assert!(receive.iter().all(|&b| b == 0));
    }

    #[test]
    fn indirect_image_memory_info_matches_formula() {
        let mut harness = Harness::new();

        let mut request = Vec::new();
        request.extend_from_slice(&1920u64.to_le_bytes());
        request.extend_from_slice(&1080u64.to_le_bytes());

        let response = harness.call(
            commands::GET_INDIRECT_LAYER_IMAGE_REQUIRED_MEMORY_INFO,
            &request,
        );
        assert_eq!(response.code, ResultCode::Success);
        assert_eq!(reply_u64(&response, 0), 0x80_0000);
        assert_eq!(reply_u64(&response, 1), 0x1000);

        let mut negative = Vec::new();
        negative.extend_from_slice(&0xffff_ffffu64.to_le_bytes());
        negative.extend_from_slice(&1080u64.to_le_bytes());
        let rejected = harness.call(
            commands::GET_INDIRECT_LAYER_IMAGE_REQUIRED_MEMORY_INFO,
            &negative,
        );
        assert_eq!(rejected.code, ResultCode::InvalidLayerSize);
    }

    #[test]
    fn vsync_event_requires_open_display() {
        let mut harness = Harness::new();
        let response = harness.call(commands::GET_DISPLAY_VSYNC_EVENT, &0u64.to_le_bytes());
        assert_eq!(response.code, ResultCode::InvalidValue);
        assert_eq!(response.copy_handle, None);
    }

    #[test]
    fn vsync_handle_is_allocated_once() {
        let mut harness = Harness::new();
        harness.call(commands::OPEN_DEFAULT_DISPLAY, &[]);

        let first = harness.call(commands::GET_DISPLAY_VSYNC_EVENT, &0u64.to_le_bytes());
        let second = harness.call(commands::GET_DISPLAY_VSYNC_EVENT, &0u64.to_le_bytes());

        assert_eq!(first.code, ResultCode::Success);
        assert_eq!(first.copy_handle, second.copy_handle);
        assert!(first.copy_handle.is_some());
        assert_eq!(harness.handles.calls, 1);
    }

    #[test]
    #[should_panic(expected = "handle table exhausted")]
    fn vsync_handle_exhaustion_is_fatal() {
        let mut harness = Harness::new();
        harness.handles.exhausted = true;
        harness.call(commands::OPEN_DEFAULT_DISPLAY, &[]);
        harness.call(commands::GET_DISPLAY_VSYNC_EVENT, &0u64.to_le_bytes());
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut harness = Harness::new();
        let response = harness.call(4242, &[]);
        assert_eq!(response.code, ResultCode::InvalidArguments);
    }

    #[test]
    fn truncated_arguments_are_rejected() {
        let mut harness = Harness::new();
        let response = harness.call(commands::CLOSE_DISPLAY, &[0u8; 4]);
        assert_eq!(response.code, ResultCode::InvalidArguments);

        let response = harness.call(commands::OPEN_LAYER, &[0u8; 0x20]);
        assert_eq!(response.code, ResultCode::InvalidArguments);
    }
}
