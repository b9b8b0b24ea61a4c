//! Error to reply-code mapping
//!
//! Converts domain errors to the FTP reply code sent on the control channel.

use crate::error::types::{StorageError, TransferError};

/// Reply code for a storage failure surfaced by a command handler.
///
/// All filesystem faults map to 550 per the error taxonomy; partial
/// state is never rolled back here.
pub fn reply_code_for(err: &StorageError) -> u16 {
    match err {
        StorageError::NotFound(_)
        | StorageError::NotADirectory(_)
        | StorageError::NotAFile(_)
        | StorageError::AlreadyExists(_)
        | StorageError::PermissionDenied(_)
        | StorageError::PathEscapesRoot(_)
        | StorageError::Io(_) => 550,
    }
}

/// Reply code for a data-channel failure.
///
/// Establishment faults are 425, mid-transfer socket aborts are 426,
/// local source/sink faults mid-transfer are 451.
pub fn transfer_reply_code(err: &TransferError) -> u16 {
    match err {
        TransferError::NotNegotiated
        | TransferError::BindFailed(_)
        | TransferError::AcceptTimeout
        | TransferError::ConnectTimeout(_)
        | TransferError::ConnectFailed(_, _)
        | TransferError::ForeignPeer { .. }
        | TransferError::InvalidPortArgument(_) => 425,
        TransferError::Aborted(_) => 426,
        TransferError::LocalIo(_) => 451,
    }
}
