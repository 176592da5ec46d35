use byteorder::{BigEndian, ByteOrder};

use crate::{address::Address, error::LpnError};

/// Maximum number of group addresses that fit an unsegmented Friend
/// Subscription List Add/Remove PDU alongside the transaction byte.
pub const MAX_SUB_ADDRESSES: usize = 9;

/// Friend Subscription List Add/Remove payload (`xact · addr_list(n*2)`).
/// Both opcodes share this wire shape; the opcode alone tells Add from
/// Remove apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FriendSubList {
  pub xact: u8,
  pub addresses: Vec<Address>,
}

impl FriendSubList {
  pub fn encode(&self) -> Vec<u8> {
    let n = self.addresses.len().min(MAX_SUB_ADDRESSES);
    let mut buf = vec![0u8; 1 + n * 2];
    buf[0] = self.xact;
    for (i, addr) in self.addresses.iter().take(n).enumerate() {
      BigEndian::write_u16(&mut buf[1 + i * 2..3 + i * 2], addr.0);
    }
    buf
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.is_empty() {
      return Err(LpnError::BadData("Friend Subscription List too short"));
    }
    let rest = &bytes[1..];
    if !rest.len().is_multiple_of(2) {
      return Err(LpnError::BadData("Friend Subscription List has an odd address list"));
    }
    let addresses = rest
      .chunks_exact(2)
      .map(|c| Address(BigEndian::read_u16(c)))
      .collect();
    Ok(FriendSubList {
      xact: bytes[0],
      addresses,
    })
  }
}
