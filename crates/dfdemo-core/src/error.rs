use thiserror::Error;

/// Recoverable parse failures, mirroring the reference decoder's exception taxonomy.
///
/// Every variant here is recorded into [`crate::client::ClientConnection::errors`] as a
/// diagnostic string rather than propagated — see spec §7. Only truly unrecoverable
/// conditions (a corrupt message length, a missing file) bubble up as `anyhow::Error`
/// from the call sites in [`crate::stream`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unable to parse delta-entity state")]
    UnableToParseDeltaEntityState,
    #[error("Bad command in parseGameState")]
    BadCommandInParseGameState,
    #[error("Delta frame too old.")]
    DeltaFrameTooOld,
    #[error("Delta parseEntitiesNum too old")]
    DeltaParseEntitiesNumTooOld,
    #[error("CL_ParsePacketEntities: end of message")]
    ParsePacketEntitiesEndOfMessage,
    #[error("Baseline number out of range")]
    BaselineOutOfRange,
    #[error("CL_ParseSnapshot: Invalid size for areamask")]
    ParseSnapshotInvalidSize,
    #[error("Delta from invalid frame (not supposed to happen!)")]
    DeltaFromInvalidFrame,
    #[error("invalid entityState field count")]
    InvalidFieldCount,
}

/// A message length outside `[0, Q3_MESSAGE_MAX_SIZE]`, or a short/missing read of the
/// demo file itself. Unlike [`ParseError`] this one aborts the parse.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("demo file is corrupted, wrong message length")]
    MessageTooLarge,
    #[error("can't open demofile: {0}")]
    CantOpenFile(#[from] std::io::Error),
}
