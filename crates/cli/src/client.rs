//! Thin IPC client over the daemon's control socket: `notify`, `status`,
//! `stop`, each dialling the socket, writing one request, reading one
//! response, and closing.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::UnixStream;
use todoat_wire::{read_message, write_message, ProtocolError, Request, Response, StatusSnapshot};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon is not running")]
    DaemonNotRunning,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("daemon returned an error: {0}")]
    Remote(String),
    #[error("unexpected response to this request")]
    UnexpectedResponse,
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::DaemonNotRunning)
    }
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    async fn round_trip(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|_| ClientError::DaemonNotRunning)?;
        let (read_half, mut write_half) = stream.into_split();
        write_message(&mut write_half, request).await?;
        let mut reader = BufReader::new(read_half);
        let response: Response = read_message(&mut reader).await?;
        Ok(response)
    }

    pub async fn notify(&self) -> Result<(), ClientError> {
        match self.round_trip(&Request::Notify).await? {
            Response::Notify { ok: true, .. } => Ok(()),
            Response::Notify { ok: false, error } => Err(ClientError::Remote(error.unwrap_or_default())),
            Response::Error { error, .. } => Err(ClientError::Remote(error)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<StatusSnapshot, ClientError> {
        match self.round_trip(&Request::Status).await? {
            Response::Status(snapshot) => Ok(snapshot),
            Response::Error { error, .. } => Err(ClientError::Remote(error)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn stop(&self) -> Result<(), ClientError> {
        match self.round_trip(&Request::Stop).await? {
            Response::Stop { ok: true } => Ok(()),
            Response::Stop { ok: false } => Err(ClientError::Remote("stop was rejected".into())),
            Response::Error { error, .. } => Err(ClientError::Remote(error)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}
