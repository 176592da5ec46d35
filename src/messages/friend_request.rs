use byteorder::{BigEndian, ByteOrder};

use crate::{address::Address, error::LpnError};

/// Friend Request payload (`criteria · recv_delay · poll_to(3) · prev_addr(2)
/// · num_elem · lpn_counter(2)`), all multi-byte fields big-endian.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendRequest {
  pub criteria: u8,
  pub recv_delay: u8,
  /// Poll Timeout in 100ms units, 24 bits wide on the wire.
  pub poll_timeout: u32,
  pub prev_addr: Address,
  pub num_elements: u8,
  pub lpn_counter: u16,
}

impl FriendRequest {
  pub const WIRE_LEN: usize = 10;

  pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
    let mut buf = [0u8; Self::WIRE_LEN];
    buf[0] = self.criteria;
    buf[1] = self.recv_delay;
    BigEndian::write_u24(&mut buf[2..5], self.poll_timeout);
    BigEndian::write_u16(&mut buf[5..7], self.prev_addr.0);
    buf[7] = self.num_elements;
    BigEndian::write_u16(&mut buf[8..10], self.lpn_counter);
    buf
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.len() < Self::WIRE_LEN {
      return Err(LpnError::BadData("Friend Request too short"));
    }
    Ok(FriendRequest {
      criteria: bytes[0],
      recv_delay: bytes[1],
      poll_timeout: BigEndian::read_u24(&bytes[2..5]),
      prev_addr: Address(BigEndian::read_u16(&bytes[5..7])),
      num_elements: bytes[7],
      lpn_counter: BigEndian::read_u16(&bytes[8..10]),
    })
  }
}
