use thiserror::Error;

/// Failures the LPN core can report to its host.
///
/// None of these are panics: every fallible path in the state machine either
/// returns one of these variants or resolves itself by dropping the
/// friendship (see `clear_friendship`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LpnError {
  /// A received control message was too short or carried a prohibited field
  /// value (e.g. a zero ReceiveWindow in a Friend Offer).
  #[error("malformed control message: {0}")]
  BadData(&'static str),

  /// The transport collaborator could not queue the outbound message.
  #[error("transport has no buffer available to send the request")]
  NoBuffer,

  /// The credential provider could not allocate friendship credentials.
  #[error("no memory available for friendship credentials")]
  NoMemory,

  /// The transport reported a failure on an in-flight send.
  #[error("sending control message failed")]
  SendFailed,
}

pub type Result<T> = std::result::Result<T, LpnError>;
