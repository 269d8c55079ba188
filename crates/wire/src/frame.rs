// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! Length-delimited framing: six lowercase hex digits of payload byte count,
//! then the payload text.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::sexp::{parse, SExp};
use crate::ProtocolError;

/// Upper bound on a single frame. Anything larger is a protocol violation,
/// not a legitimate message.
pub const MAX_FRAME_LEN: usize = 0x100000 * 10;

const HEADER_LEN: usize = 6;

/// Read one frame and parse its payload.
pub async fn read_frame<R>(reader: &mut R) -> Result<SExp, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    }

    let header = std::str::from_utf8(&header)
        .map_err(|_| ProtocolError::InvalidHeader("non-ascii length header".into()))?;
    let len = usize::from_str_radix(header, 16)
        .map_err(|_| ProtocolError::InvalidHeader(format!("bad length header {:?}", header)))?;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            ProtocolError::Io(e)
        }
    })?;
    let payload = String::from_utf8(payload)
        .map_err(|_| ProtocolError::Parse("payload is not utf-8".into()))?;
    parse(&payload)
}

/// Write one frame.
pub async fn write_frame<W>(writer: &mut W, message: &SExp) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = message.to_string();
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    let header = format!("{:06x}", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
