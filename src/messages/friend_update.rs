use byteorder::{BigEndian, ByteOrder};
use enumflags2::{bitflags, BitFlags};

use crate::error::LpnError;

/// Flags carried in byte 0 of a Friend Update: key-refresh-in-progress and
/// IV-update-in-progress.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateFlags {
  KeyRefresh = 0b01,
  IvUpdate = 0b10,
}

/// Friend Update payload (`flags · iv_index(4) · md`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendUpdate {
  pub flags: BitFlags<UpdateFlags>,
  pub iv_index: u32,
  /// "More data": another message is queued for this LPN.
  pub md: bool,
}

impl FriendUpdate {
  pub const WIRE_LEN: usize = 6;

  pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
    let mut buf = [0u8; Self::WIRE_LEN];
    buf[0] = self.flags.bits();
    BigEndian::write_u32(&mut buf[1..5], self.iv_index);
    buf[5] = self.md as u8;
    buf
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.len() < Self::WIRE_LEN {
      return Err(LpnError::BadData("Friend Update too short"));
    }
    Ok(FriendUpdate {
      flags: BitFlags::from_bits_truncate(bytes[0]),
      iv_index: BigEndian::read_u32(&bytes[1..5]),
      md: bytes[5] != 0,
    })
  }

  pub fn key_refresh(&self) -> bool {
    self.flags.contains(UpdateFlags::KeyRefresh)
  }

  pub fn iv_update(&self) -> bool {
    self.flags.contains(UpdateFlags::IvUpdate)
  }
}
