use crate::error::LpnError;

/// Friend Poll payload: a single byte whose low bit carries the Friend
/// Sequence Number.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendPoll {
  pub fsn: bool,
}

impl FriendPoll {
  pub const WIRE_LEN: usize = 1;

  pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
    [self.fsn as u8 & 0x01]
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.is_empty() {
      return Err(LpnError::BadData("Friend Poll too short"));
    }
    Ok(FriendPoll {
      fsn: bytes[0] & 0x01 != 0,
    })
  }
}
