use byteorder::{BigEndian, ByteOrder};

use crate::error::LpnError;

/// Friend Offer payload (`recv_win · queue_size · sub_list_size · rssi
/// (signed) · frnd_counter(2)`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendOffer {
  pub recv_win: u8,
  pub queue_size: u8,
  pub sub_list_size: u8,
  pub rssi: i8,
  pub frnd_counter: u16,
}

impl FriendOffer {
  pub const WIRE_LEN: usize = 6;

  pub fn encode(&self) -> [u8; Self::WIRE_LEN] {
    let mut buf = [0u8; Self::WIRE_LEN];
    buf[0] = self.recv_win;
    buf[1] = self.queue_size;
    buf[2] = self.sub_list_size;
    buf[3] = self.rssi as u8;
    BigEndian::write_u16(&mut buf[4..6], self.frnd_counter);
    buf
  }

  pub fn decode(bytes: &[u8]) -> Result<Self, LpnError> {
    if bytes.len() < Self::WIRE_LEN {
      return Err(LpnError::BadData("Friend Offer too short"));
    }
    Ok(FriendOffer {
      recv_win: bytes[0],
      queue_size: bytes[1],
      sub_list_size: bytes[2],
      rssi: bytes[3] as i8,
      frnd_counter: BigEndian::read_u16(&bytes[4..6]),
    })
  }
}
