//! Length-prefixed JSON framing
//!
//! Each frame is a 4-byte little-endian length followed by that many bytes
//! of JSON.

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("peer closed the connection")]
    Closed,

    #[error("frame of {0} bytes exceeds the limit of {max} bytes", max = MAX_FRAME_LEN)]
    TooLarge(usize),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::Closed)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::TooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(msg)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::TooLarge(body.len()));
    }
    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::Request;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_frame_carries_request() {
        let (mut client, mut server) = duplex(1024);
        write_frame(&mut client, &Request::Ping).await.unwrap();

        let body = read_frame(&mut server).await.unwrap();
        assert_eq!(body, br#"{"action":"ping"}"#);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = duplex(64);
        let len = (MAX_FRAME_LEN as u32 + 1).to_le_bytes();
        client.write_all(&len).await.unwrap();

        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::TooLarge(n) if n == MAX_FRAME_LEN + 1));
    }

    #[tokio::test]
    async fn test_eof_is_closed() {
        let (client, mut server) = duplex(64);
        drop(client);
        let err = read_frame(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Closed));
    }
}
