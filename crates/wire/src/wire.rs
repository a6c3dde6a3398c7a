use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Framing and decode failures for the newline-delimited JSON protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed before a complete message was read")]
    Incomplete,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read one newline-terminated JSON message and decode it as `T`.
///
/// Malformed JSON closes the connection rather than
/// producing an error response — callers are expected to drop the
/// connection on `Err`, not reply.
pub async fn read_message<T, R>(reader: &mut BufReader<R>) -> Result<T, ProtocolError>
where
    T: serde::de::DeserializeOwned,
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Err(ProtocolError::Incomplete);
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Encode `value` as JSON and write it followed by a newline.
pub async fn write_message<T, W>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    T: serde::Serialize,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(value)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
