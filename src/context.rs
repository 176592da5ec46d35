use bit_vec::BitVec;

use crate::{address::Address, env::FriendCredentialHandle};

/// The nine LPN states. `Disabled` is the only resting state; every
/// other state has an armed timer or an outstanding request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LpnState {
  Disabled,
  Timer,
  Enabled,
  ReqWait,
  WaitOffer,
  Established,
  RecvDelay,
  WaitUpdate,
  Clear,
}

impl LpnState {
  pub fn name(self) -> &'static str {
    match self {
      LpnState::Disabled => "disabled",
      LpnState::Timer => "timer",
      LpnState::Enabled => "enabled",
      LpnState::ReqWait => "req wait",
      LpnState::WaitOffer => "wait offer",
      LpnState::Established => "established",
      LpnState::RecvDelay => "recv delay",
      LpnState::WaitUpdate => "wait update",
      LpnState::Clear => "clear",
    }
  }
}

/// The request opcode a friendship round is currently waiting a response
/// for, or `None` when the LPN core has nothing outstanding
/// (`sent_req == 0` in the reference implementation).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SentRequest {
  None,
  FriendRequest,
  FriendPoll,
  FriendClear,
  FriendSubAdd,
  FriendSubRem,
}

impl SentRequest {
  pub fn is_none(self) -> bool {
    matches!(self, SentRequest::None)
  }
}

/// Three fixed-size bitmaps over the `groups` slot array: which slots the
/// Friend has confirmed, which are awaiting confirmation in the in-flight
/// Sub request, and which are scheduled for removal. Sized once at
/// construction and never reallocated afterwards.
#[derive(Clone, Debug)]
pub struct GroupBitmaps {
  pub added: BitVec,
  pub pending: BitVec,
  pub to_remove: BitVec,
}

impl GroupBitmaps {
  fn new(lpn_groups: usize) -> Self {
    GroupBitmaps {
      added: BitVec::from_elem(lpn_groups, false),
      pending: BitVec::from_elem(lpn_groups, false),
      to_remove: BitVec::from_elem(lpn_groups, false),
    }
  }

  /// Clears every slot `pending` a Sub request covered (`group_zero`),
  /// used when that request failed to send or covered no work.
  pub fn zero_pending(&mut self) {
    self.pending.clear();
  }
}

/// The single long-lived LPN entity. One per node; created once at
/// startup and never replaced — `clear_friendship` zeroes its friendship
/// fields in place rather than recreating it.
#[derive(Clone, Debug)]
pub struct LpnContext {
  pub state: LpnState,
  pub frnd: Address,
  pub old_friend: Address,
  pub counter: u16,
  pub fsn: bool,
  pub recv_win: u16,
  pub queue_size: u8,
  pub adv_duration: u16,
  pub poll_timeout_ms: u32,
  pub req_attempts: u8,
  pub sent_req: SentRequest,
  pub pending_poll: bool,
  pub xact_next: u8,
  pub xact_pending: u8,
  pub groups: Vec<Address>,
  pub bitmaps: GroupBitmaps,
  pub groups_changed: bool,
  pub established: bool,
  pub disable: bool,
  pub clear_success: bool,
  pub credentials: Option<FriendCredentialHandle>,
}

impl LpnContext {
  pub fn new(lpn_groups: usize) -> Self {
    LpnContext {
      state: LpnState::Disabled,
      frnd: Address::UNASSIGNED,
      old_friend: Address::UNASSIGNED,
      counter: 0,
      fsn: false,
      recv_win: 0,
      queue_size: 0,
      adv_duration: 0,
      poll_timeout_ms: 0,
      req_attempts: 0,
      sent_req: SentRequest::None,
      pending_poll: false,
      xact_next: 0,
      xact_pending: 0,
      groups: vec![Address::UNASSIGNED; lpn_groups],
      bitmaps: GroupBitmaps::new(lpn_groups),
      groups_changed: false,
      established: false,
      disable: false,
      clear_success: false,
      credentials: None,
    }
  }

  /// Zeroes every friendship-scoped field in place, preserving `old_friend`
  /// bookkeeping and forcing resubscription on the next friendship
  /// (`groups_changed = true`). Mirrors `clear_friendship`'s field resets;
  /// the state transition itself is the caller's responsibility.
  pub fn reset_friendship_fields(&mut self) {
    self.old_friend = if self.clear_success { Address::UNASSIGNED } else { self.frnd };
    self.frnd = Address::UNASSIGNED;
    self.fsn = false;
    self.req_attempts = 0;
    self.recv_win = 0;
    self.queue_size = 0;
    self.disable = false;
    self.sent_req = SentRequest::None;
    self.established = false;
    self.clear_success = false;
    self.groups_changed = true;
    self.credentials = None;
  }

  pub fn added_count(&self) -> usize {
    self.bitmaps.added.iter().filter(|b| *b).count()
  }
}
