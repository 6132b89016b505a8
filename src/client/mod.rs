//! Remote data client: HTTP transport and its error taxonomy.

mod error;
mod remote;

pub use error::{ApiError, ErrorKind, ListError};
pub use remote::{decode, record_path, HttpRemote, RemoteClient, WriteMethod};
