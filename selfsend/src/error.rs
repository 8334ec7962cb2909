// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use alloy::transports::{RpcError, TransportErrorKind};
use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Rejected before any transfer task is scheduled.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Local encoding or signing failure.
    #[error("Could not build transaction: {0}")]
    Build(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The request may succeed if repeated (connection drops, empty responses).
    Transient,
    /// The node understood and rejected the request.
    Permanent,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErrorKind::Transient => write!(f, "transient"),
            NetworkErrorKind::Permanent => write!(f, "permanent"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} network error: {message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl NetworkError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: NetworkErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: NetworkErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == NetworkErrorKind::Transient
    }
}

impl From<RpcError<TransportErrorKind>> for NetworkError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match &err {
            RpcError::Transport(_) | RpcError::NullResp => Self::transient(err.to_string()),
            _ => Self::permanent(err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for NetworkError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(rpc_err) => rpc_err.into(),
            other => Self::permanent(other.to_string()),
        }
    }
}
