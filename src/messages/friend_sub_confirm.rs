use crate::error::LpnError;

/// Friend Subscription List Confirm payload: just the echoed transaction
/// byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendSubConfirm {
  pub xact: u8,
}

impl FriendSubConfirm {
  pub const WIRE_LEN: usize = 1;

  pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
    [self.xact]
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.is_empty() {
      return Err(LpnError::BadData("Friend Subscription Confirm too short"));
    }
    Ok(FriendSubConfirm { xact: bytes[0] })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_through_wire_bytes() {
    let cfm = FriendSubConfirm { xact: 9 };
    assert_eq!(cfm.encode(), [9]);
    assert_eq!(FriendSubConfirm::decode(&[9]).unwrap(), cfm);
  }
}
