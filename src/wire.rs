//! Little-endian decoding of command arguments.
//!
//! Argument bytes arrive as a raw slice framed by the transport. Readers
//! consume from the front of the slice; an underrun is reported as
//! `InvalidArguments` instead of panicking.

use bytes::Buf;

use crate::result::ResultCode;

pub fn read_i32(buf: &mut &[u8]) -> Result<i32, ResultCode> {
    if buf.remaining() < 4 {
        return Err(ResultCode::InvalidArguments);
    }
    Ok(buf.get_i32_le())
}

pub fn read_u64(buf: &mut &[u8]) -> Result<u64, ResultCode> {
    if buf.remaining() < 8 {
        return Err(ResultCode::InvalidArguments);
    }
    Ok(buf.get_u64_le())
}

pub fn read_i64(buf: &mut &[u8]) -> Result<i64, ResultCode> {
    if buf.remaining() < 8 {
        return Err(ResultCode::InvalidArguments);
    }
    Ok(buf.get_i64_le())
}

pub fn read_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], ResultCode> {
    if buf.remaining() < N {
        return Err(ResultCode::InvalidArguments);
    }
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Copies `src` into the front of a caller-provided receive buffer,
/// truncating to the buffer length. The transport sizes these buffers;
/// a short one must not bring the service down.
pub fn write_receive(dst: &mut [u8], src: &[u8]) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
}
