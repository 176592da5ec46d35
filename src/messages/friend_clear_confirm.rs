use byteorder::{BigEndian, ByteOrder};

use crate::{address::Address, error::LpnError};

/// Friend Clear Confirm payload (`lpn_addr(2) · lpn_counter(2)`); same wire
/// shape as Friend Clear but carries the Friend's echo of our parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendClearConfirm {
  pub lpn_addr: Address,
  pub lpn_counter: u16,
}

impl FriendClearConfirm {
  pub const WIRE_LEN: usize = 4;

  pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
    let mut buf = [0u8; Self::WIRE_LEN];
    BigEndian::write_u16(&mut buf[0..2], self.lpn_addr.0);
    BigEndian::write_u16(&mut buf[2..4], self.lpn_counter);
    buf
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.len() < Self::WIRE_LEN {
      return Err(LpnError::BadData("Friend Clear Confirm too short"));
    }
    Ok(FriendClearConfirm {
      lpn_addr: Address(BigEndian::read_u16(&bytes[0..2])),
      lpn_counter: BigEndian::read_u16(&bytes[2..4]),
    })
  }
}
