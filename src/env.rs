//! Collaborator traits the LPN core depends on. A host mesh runtime
//! implements all of these against its real radio/crypto stack; a test
//! harness implements them against an in-memory fake. Nothing in `node.rs`
//! talks to a socket, a radio, or a crypto primitive directly.

use std::time::Duration;

use crate::{address::Address, error::LpnError, messages::Opcode};

/// Opaque handle to friendship credentials allocated by the credential
/// provider. The LPN core never inspects the key material itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FriendCredentialHandle(pub u32);

/// Context accompanying an outbound control message: which subnet to use
/// and which unicast address to send it to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
  pub net_idx: u16,
  pub dst: Address,
  /// Whether this message must be secured with Friend Credentials (true for
  /// Poll and Subscription List messages once a friendship exists).
  pub friend_cred: bool,
}

/// Sends a lower transport control message. Completion is reported
/// asynchronously: the runtime calls back into
/// [`crate::node::LowPowerNode::on_send_complete`] once the advertising
/// bearer finishes, rather than nesting a callback inside `send` itself —
/// this keeps "one active request" a property of the state machine alone.
pub trait ControlMessageSender {
  fn send(&mut self, ctx: TxContext, opcode: Opcode, payload: &[u8]) -> Result<(), LpnError>;
}

/// Derives and manages Friend Credentials for a friendship.
pub trait CredentialProvider {
  fn cred_add(
    &mut self,
    net_idx: u16,
    net_key_idx: u8,
    friend_addr: Address,
    lpn_counter: u16,
    friend_counter: u16,
  ) -> Option<FriendCredentialHandle>;

  fn cred_set(&mut self, cred: FriendCredentialHandle, key_idx: u8) -> Result<(), LpnError>;

  fn cred_clear(&mut self, cred: FriendCredentialHandle);

  fn cred_del(&mut self, net_idx: u16, friend_addr: Address);
}

/// Enables or disables the radio receiver outside the precise windows the
/// LPN core opens around expected Friend responses.
pub trait ScanController {
  fn scan_enable(&mut self);
  fn scan_disable(&mut self);
}

/// Single delayed-work slot. Arming a new deadline implicitly cancels the
/// previous one: exactly one timer deadline is ever armed.
pub trait TimerDriver {
  fn arm(&mut self, delay: Duration);
  fn cancel(&mut self);
}

/// Static facts about the node hosting the LPN, and about the primary
/// subnet it uses for its friendship.
pub trait NodeInfo {
  fn primary_addr(&self) -> Address;
  fn num_elements(&self) -> u8;
  fn is_provisioned(&self) -> bool;
  fn subnet_net_idx(&self) -> u16;
  /// Key Refresh phase of the primary subnet (0 = normal, 2 = transitioning).
  fn kr_phase(&self) -> u8;
}

/// IV Index and Key Refresh bookkeeping driven by a Friend Update.
pub trait KeyRefreshIvUpdate {
  fn kr_update(&mut self, net_idx: u16, kr_flag: bool, new_key: bool) -> bool;
  fn iv_update(&mut self, iv_index: u32, iv_update_flag: bool);
  fn beacon_ivu_initiator(&mut self, enable: bool);

  /// Whether this node is currently the network's IV Update Procedure
  /// initiator (only an initiator ever steps itself down from that role).
  fn is_ivu_initiator(&self) -> bool;

  /// The locally tracked IV Update in-progress flag, independent of what a
  /// given Friend Update reports.
  fn iv_update_in_progress(&self) -> bool;
}

/// Lets the core clamp the Poll interval while a segmented transmission is
/// still being acknowledged, so acks keep flowing at high frequency.
pub trait TxProgressProbe {
  fn tx_in_progress(&self) -> bool;
}

/// Bundles every collaborator the core needs so [`crate::node::LowPowerNode`]
/// carries a single generic parameter instead of five.
pub trait LpnEnvironment:
  ControlMessageSender + CredentialProvider + ScanController + TimerDriver + NodeInfo + KeyRefreshIvUpdate + TxProgressProbe
{
}

impl<T> LpnEnvironment for T where
  T: ControlMessageSender + CredentialProvider + ScanController + TimerDriver + NodeInfo + KeyRefreshIvUpdate + TxProgressProbe
{
}
