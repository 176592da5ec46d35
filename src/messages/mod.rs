//! Wire formats for the Friendship control messages. Every multi-byte
//! field is big-endian, matching the
//! Bluetooth Mesh lower transport layer.

pub mod friend_clear;
pub mod friend_clear_confirm;
pub mod friend_offer;
pub mod friend_poll;
pub mod friend_request;
pub mod friend_sub;
pub mod friend_sub_confirm;
pub mod friend_update;
pub mod opcode;

pub use friend_clear::FriendClear;
pub use friend_clear_confirm::FriendClearConfirm;
pub use friend_offer::FriendOffer;
pub use friend_poll::FriendPoll;
pub use friend_request::FriendRequest;
pub use friend_sub::FriendSubList;
pub use friend_sub_confirm::FriendSubConfirm;
pub use friend_update::{FriendUpdate, UpdateFlags};
pub use opcode::Opcode;
