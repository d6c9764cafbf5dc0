//! Browser native-messaging framing: a 4-byte little-endian length,
//! then that many bytes of UTF-8 JSON.  Same in both directions.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{Result, VaultError};

/// Largest frame accepted from the browser.
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;

/// Largest frame the browser accepts from a native host.
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

/// Read one frame.
///
/// `Ok(None)` means the browser closed the channel cleanly.  A frame
/// that is oversized or cut short is a `Protocol` error.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(VaultError::Protocol("truncated frame header".into()));
        }
        filled += n;
    }

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_INBOUND_FRAME {
        return Err(VaultError::Protocol(format!(
            "frame of {len} bytes exceeds the {MAX_INBOUND_FRAME} byte limit"
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            VaultError::Protocol(format!("truncated frame: expected {len} bytes"))
        }
        _ => VaultError::Io(e),
    })?;
    Ok(Some(body))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_OUTBOUND_FRAME {
        return Err(VaultError::Protocol(format!(
            "message of {} bytes exceeds the {MAX_OUTBOUND_FRAME} byte limit",
            payload.len()
        )));
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
