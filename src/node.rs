//! The LPN friendship state machine. [`LowPowerNode`] owns one
//! [`LpnContext`] and drives it from host API calls, inbound control
//! messages, and timer fires — all dispatched through the single
//! [`LpnEnvironment`] the runtime wires it up with.

use std::time::Duration;

use log::{debug, trace, warn};

use crate::{
  address::Address,
  config::LpnConfig,
  context::{LpnContext, LpnState, SentRequest},
  env::{LpnEnvironment, TxContext},
  error::{LpnError, Result},
  messages::{
    FriendClear, FriendClearConfirm, FriendOffer, FriendPoll, FriendRequest, FriendSubConfirm, FriendSubList,
    FriendUpdate, Opcode,
  },
};

/// The LPN friendship state machine. Generic over the environment so a host
/// wires in its real radio/crypto stack while tests wire in a fake.
pub struct LowPowerNode<E: LpnEnvironment> {
  pub ctx: LpnContext,
  config: LpnConfig,
  env: E,
}

impl<E: LpnEnvironment> LowPowerNode<E> {
  pub fn new(config: LpnConfig, env: E) -> Self {
    let ctx = LpnContext::new(config.lpn_groups);
    LowPowerNode { ctx, config, env }
  }

  pub fn state(&self) -> LpnState {
    self.ctx.state
  }

  pub fn is_established(&self) -> bool {
    self.ctx.established
  }

  pub fn env(&self) -> &E {
    &self.env
  }

  fn set_state(&mut self, state: LpnState) {
    debug!("lpn: {} -> {}", self.ctx.state.name(), state.name());
    self.ctx.state = state;
  }

  fn net_idx(&self) -> u16 {
    self.env.subnet_net_idx()
  }

  // ---------------------------------------------------------------
  // process lifetime entry point.
  // ---------------------------------------------------------------

  /// Starts the LPN per its configured initial state: straight into
  /// `Enabled` with a Friend Request if the state was left `Enabled`
  /// across a restart, or into auto-mode `Timer` if configured.
  pub fn init(&mut self) {
    if self.ctx.state == LpnState::Enabled {
      if self.config.establishment_optimization {
        self.env.scan_disable();
      }
      self.send_friend_request();
    } else if self.config.auto_mode {
      debug!("lpn: waiting {}ms for messages before enabling", self.config.auto_timeout_ms);
      self.set_state(LpnState::Timer);
      self.env.arm(Duration::from_millis(self.config.auto_timeout_ms as u64));
    }
  }

  // ---------------------------------------------------------------
  // Public API: enable / disable / set.
  // ---------------------------------------------------------------

  pub fn enable(&mut self) {
    self.set(true);
  }

  pub fn disable(&mut self) {
    self.set(false);
  }

  pub fn set(&mut self, enable: bool) {
    if enable {
      if self.ctx.state != LpnState::Disabled {
        return;
      }
    } else if self.ctx.state == LpnState::Disabled {
      return;
    }

    if !self.env.is_provisioned() {
      self.set_state(if enable { LpnState::Enabled } else { LpnState::Disabled });
      return;
    }

    if enable {
      self.set_state(LpnState::Enabled);
      if self.config.establishment_optimization {
        self.env.scan_disable();
      }
      self.send_friend_request();
    } else if self.config.auto_mode && self.ctx.state == LpnState::Timer {
      self.env.cancel();
      self.set_state(LpnState::Disabled);
    } else {
      self.start_disable();
    }
  }

  fn start_disable(&mut self) {
    if self.ctx.state == LpnState::Disabled {
      return;
    }
    self.clear_friendship(true);
  }

  // ---------------------------------------------------------------
  // Friend Request round.
  // ---------------------------------------------------------------

  fn send_friend_request(&mut self) {
    let req = FriendRequest {
      criteria: self.config.criteria(),
      recv_delay: self.config.recv_delay_ms as u8,
      poll_timeout: self.config.poll_timeout_100ms as u32,
      prev_addr: self.ctx.old_friend,
      num_elements: self.env.num_elements(),
      lpn_counter: self.ctx.counter,
    };
    let tx = TxContext {
      net_idx: self.net_idx(),
      dst: Address::FRIENDS,
      friend_cred: false,
    };
    if let Err(e) = self.env.send(tx, Opcode::FriendRequest, &req.encode()) {
      warn!("lpn: could not queue Friend Request: {e}");
    }
  }

  fn on_friend_request_sent(&mut self, adv_duration_ms: u16, result: Result<()>) {
    if let Err(e) = result {
      warn!("lpn: sending Friend Request failed: {e}");
      self.set_state(LpnState::Enabled);
      self.clear_friendship(self.ctx.disable);
      return;
    }

    self.ctx.adv_duration = adv_duration_ms;

    if self.config.establishment_optimization {
      self.env.arm(Duration::from_millis(self.config.req_wait_ms as u64));
      self.set_state(LpnState::ReqWait);
    } else {
      let timeout = self.config.req_wait_ms as u32 + self.config.req_scan_ms + adv_duration_ms as u32;
      self.env.arm(Duration::from_millis(timeout as u64));
      self.set_state(LpnState::WaitOffer);
    }
  }

  // ---------------------------------------------------------------
  // Friend Offer handling.
  // ---------------------------------------------------------------

  pub fn on_friend_offer(&mut self, sender: Address, payload: &[u8]) -> Result<()> {
    let offer = FriendOffer::decode(payload)?;

    if self.ctx.state != LpnState::WaitOffer {
      warn!("lpn: ignoring unexpected Friend Offer");
      return Ok(());
    }
    if offer.recv_win == 0 {
      warn!("lpn: prohibited ReceiveWindow value in Friend Offer");
      return Err(LpnError::BadData("ReceiveWindow must not be zero"));
    }

    trace!(
      "lpn: offer recv_win={} queue_size={} rssi={} counter={}",
      offer.recv_win, offer.queue_size, offer.rssi, offer.frnd_counter
    );

    self.ctx.frnd = sender;

    let Some(cred) = self
      .env
      .cred_add(self.net_idx(), 0, self.ctx.frnd, self.ctx.counter, offer.frnd_counter)
    else {
      self.ctx.frnd = Address::UNASSIGNED;
      return Err(LpnError::NoMemory);
    };

    if self.env.kr_phase() != 0 {
      if let Err(e) = self.env.cred_set(cred, 1) {
        self.env.cred_clear(cred);
        self.ctx.frnd = Address::UNASSIGNED;
        return Err(e);
      }
    }

    // TODO: Add offer acceptance criteria check. The first well-formed
    // Offer is always accepted.

    self.env.cancel();

    self.ctx.recv_win = offer.recv_win as u16;
    self.ctx.queue_size = offer.queue_size;
    self.ctx.credentials = Some(cred);

    if let Err(e) = self.send_friend_poll() {
      self.env.cred_clear(cred);
      self.ctx.frnd = Address::UNASSIGNED;
      self.ctx.recv_win = 0;
      self.ctx.queue_size = 0;
      self.ctx.credentials = None;
      return Err(e);
    }

    self.ctx.counter = self.ctx.counter.wrapping_add(1);
    Ok(())
  }

  // ---------------------------------------------------------------
  // Friend Poll and the shared request-sent path.
  // ---------------------------------------------------------------

  fn send_friend_poll(&mut self) -> Result<()> {
    if !self.ctx.sent_req.is_none() {
      if self.ctx.sent_req != SentRequest::FriendPoll {
        self.ctx.pending_poll = true;
      }
      return Ok(());
    }

    let poll = FriendPoll { fsn: self.ctx.fsn };
    let tx = TxContext {
      net_idx: self.net_idx(),
      dst: self.ctx.frnd,
      friend_cred: true,
    };
    self.env.send(tx, Opcode::FriendPoll, &poll.encode())?;
    self.ctx.pending_poll = false;
    self.ctx.sent_req = SentRequest::FriendPoll;
    Ok(())
  }

  /// Explicit `poll()` from the host API: ask the Friend for queued
  /// messages right now instead of waiting for the next scheduled Poll.
  pub fn poll(&mut self) {
    if let Err(e) = self.send_friend_poll() {
      warn!("lpn: could not queue Friend Poll: {e}");
    }
  }

  /// Shared completion handler for Poll and Subscription List sends
  /// (`req_sent` in the reference implementation).
  fn on_request_sent(&mut self, adv_duration_ms: u16, result: Result<()>) {
    if let Err(e) = result {
      warn!("lpn: sending request failed: {e}");
      self.ctx.sent_req = SentRequest::None;
      self.ctx.bitmaps.zero_pending();
      return;
    }

    self.ctx.req_attempts += 1;
    self.ctx.adv_duration = adv_duration_ms;

    if self.ctx.established || self.config.establishment_optimization {
      self.set_state(LpnState::RecvDelay);
      let delay = self.config.recv_delay_ms.saturating_sub(self.config.scan_latency());
      self.env.arm(Duration::from_millis(delay as u64));
    } else {
      let delay = self.config.recv_delay_ms as u32 + adv_duration_ms as u32 + self.ctx.recv_win as u32;
      self.env.arm(Duration::from_millis(delay as u64));
    }
  }

  // ---------------------------------------------------------------
  // friend_response_received / msg_received.
  // ---------------------------------------------------------------

  fn friend_response_received(&mut self) {
    if self.ctx.sent_req == SentRequest::FriendPoll {
      self.ctx.fsn = !self.ctx.fsn;
    }
    self.env.cancel();
    self.env.scan_disable();
    self.set_state(LpnState::Established);
    self.ctx.req_attempts = 0;
    self.ctx.sent_req = SentRequest::None;
  }

  /// Hook called for every decrypted mesh message, not just Friendship
  /// control traffic, so the auto-mode timer can be restarted.
  pub fn on_msg_received(&mut self) {
    if self.ctx.state == LpnState::Timer {
      trace!("lpn: restarting auto-mode establishment timer");
      self.env.arm(Duration::from_millis(self.config.auto_timeout_ms as u64));
    }
  }

  // ---------------------------------------------------------------
  // Subscription reconciler.
  // ---------------------------------------------------------------

  pub fn group_add(&mut self, group: Address) {
    debug!("lpn: group_add {group}");
    self.group_add_slot(group);
    if !self.ctx.established || !self.ctx.sent_req.is_none() {
      return;
    }
    self.sub_update(SentRequest::FriendSubAdd);
  }

  pub fn group_del(&mut self, groups: &[Address]) {
    for &g in groups {
      if !g.is_unassigned() {
        debug!("lpn: group_del {g}");
        self.group_del_slot(g);
      }
    }
    if !self.ctx.established || !self.ctx.sent_req.is_none() {
      return;
    }
    self.sub_update(SentRequest::FriendSubRem);
  }

  fn group_add_slot(&mut self, group: Address) {
    let mut free_slot = None;
    for i in 0..self.ctx.groups.len() {
      if self.ctx.groups[i] == group {
        self.ctx.bitmaps.to_remove.set(i, false);
        return;
      }
      if free_slot.is_none() && self.ctx.groups[i].is_unassigned() {
        free_slot = Some(i);
      }
    }
    match free_slot {
      Some(i) => {
        self.ctx.groups[i] = group;
        self.ctx.groups_changed = true;
      }
      None => warn!("lpn: Friend Subscription List exceeded"),
    }
  }

  fn group_del_slot(&mut self, group: Address) {
    for i in 0..self.ctx.groups.len() {
      if self.ctx.groups[i] == group {
        let busy = self.ctx.bitmaps.added.get(i).unwrap_or(false) || self.ctx.bitmaps.pending.get(i).unwrap_or(false);
        if busy {
          self.ctx.bitmaps.to_remove.set(i, true);
          self.ctx.groups_changed = true;
        } else {
          self.ctx.groups[i] = Address::UNASSIGNED;
        }
      }
    }
  }

  /// Issues at most one in-flight Sub Add or Sub Rem, gated by `sent_req`.
  /// Returns `true` if a request was sent.
  fn sub_update(&mut self, op: SentRequest) -> bool {
    if !self.ctx.sent_req.is_none() {
      return false;
    }

    let added_count = self.ctx.added_count();
    let capacity = (self.ctx.queue_size as usize).saturating_sub(added_count);
    let mut addresses = Vec::new();

    for i in 0..self.ctx.groups.len() {
      if self.ctx.groups[i].is_unassigned() {
        continue;
      }
      let wants_slot = match op {
        SentRequest::FriendSubAdd => !self.ctx.bitmaps.added.get(i).unwrap_or(false),
        SentRequest::FriendSubRem => self.ctx.bitmaps.to_remove.get(i).unwrap_or(false),
        _ => unreachable!("sub_update only called with Add/Rem"),
      };
      if !wants_slot {
        continue;
      }
      if addresses.len() >= capacity || addresses.len() >= crate::messages::friend_sub::MAX_SUB_ADDRESSES {
        warn!("lpn: Friend Queue Size exceeded");
        break;
      }
      addresses.push(self.ctx.groups[i]);
      self.ctx.bitmaps.pending.set(i, true);
    }

    if addresses.is_empty() {
      self.ctx.bitmaps.zero_pending();
      return false;
    }

    let xact = self.ctx.xact_next;
    self.ctx.xact_next = self.ctx.xact_next.wrapping_add(1);
    let list = FriendSubList { xact, addresses };

    let opcode = match op {
      SentRequest::FriendSubAdd => Opcode::FriendSubAdd,
      SentRequest::FriendSubRem => Opcode::FriendSubRem,
      _ => unreachable!(),
    };
    let tx = TxContext {
      net_idx: self.net_idx(),
      dst: self.ctx.frnd,
      friend_cred: true,
    };

    if self.env.send(tx, opcode, &list.encode()).is_err() {
      self.ctx.bitmaps.zero_pending();
      return false;
    }

    self.ctx.xact_pending = xact;
    self.ctx.sent_req = op;
    true
  }

  pub fn on_friend_sub_confirm(&mut self, payload: &[u8]) -> Result<()> {
    let cfm = FriendSubConfirm::decode(payload)?;

    if self.ctx.sent_req.is_none() {
      warn!("lpn: no pending subscription list message");
      return Ok(());
    }
    if cfm.xact != self.ctx.xact_pending {
      warn!("lpn: transaction mismatch ({} != {})", cfm.xact, self.ctx.xact_pending);
      return Ok(());
    }

    match self.ctx.sent_req {
      SentRequest::FriendSubAdd => {
        let pending = self.ctx.bitmaps.pending.clone();
        let _ = self.ctx.bitmaps.added.or(&pending);
        self.ctx.bitmaps.pending.clear();
      }
      SentRequest::FriendSubRem => {
        let mut not_pending = self.ctx.bitmaps.pending.clone();
        not_pending.negate();
        let _ = self.ctx.bitmaps.added.and(&not_pending);
        for i in 0..self.ctx.groups.len() {
          let was_cleared =
            self.ctx.bitmaps.pending.get(i).unwrap_or(false) && self.ctx.bitmaps.to_remove.get(i).unwrap_or(false);
          if was_cleared {
            self.ctx.groups[i] = Address::UNASSIGNED;
          }
        }
        let _ = self.ctx.bitmaps.to_remove.and(&not_pending);
        self.ctx.bitmaps.pending.clear();
      }
      _ => {
        warn!("lpn: unexpected Friend Subscription Confirm");
        return Ok(());
      }
    }

    self.friend_response_received();
    self.reconcile_groups_and_reschedule();
    Ok(())
  }

  /// Shared tail of Sub Confirm and Friend Update handling: retry
  /// subscription reconciliation if dirty, flush a deferred Poll, and
  /// otherwise arm the next scheduled Poll.
  fn reconcile_groups_and_reschedule(&mut self) {
    if self.ctx.groups_changed {
      self.sub_update(SentRequest::FriendSubAdd);
      self.sub_update(SentRequest::FriendSubRem);
      if self.ctx.sent_req.is_none() {
        self.ctx.groups_changed = false;
      }
    }

    if self.ctx.pending_poll {
      let _ = self.send_friend_poll();
    }

    if self.ctx.sent_req.is_none() {
      let delay = self.poll_timeout();
      self.env.arm(Duration::from_millis(delay as u64));
    }
  }

  /// `poll_timeout()`: doubles the interval on each successful round,
  /// capped at `POLL_TIMEOUT_MAX`; clamped to 1s while a segmented
  /// transmission is still being acknowledged.
  fn poll_timeout(&mut self) -> u32 {
    let max = self.config.poll_timeout_max_ms(self.ctx.adv_duration, self.ctx.recv_win);
    if self.env.tx_in_progress() {
      return max.min(1_000);
    }
    if self.ctx.poll_timeout_ms < max {
      self.ctx.poll_timeout_ms = (self.ctx.poll_timeout_ms * 2).min(max);
    }
    trace!("lpn: poll timeout is {}ms", self.ctx.poll_timeout_ms);
    self.ctx.poll_timeout_ms
  }

  // ---------------------------------------------------------------
  // Friend Update.
  // ---------------------------------------------------------------

  /// `friend_cred_used` is whether this message was decrypted with Friend
  /// Credentials (only meaningful before `established`, since afterwards
  /// the transport layer itself enforces this). `new_key` is whether the
  /// subnet's new (post key-refresh) network key decrypted the message.
  pub fn on_friend_update(&mut self, payload: &[u8], friend_cred_used: bool, new_key: bool) -> Result<()> {
    let update = FriendUpdate::decode(payload)?;

    if self.ctx.sent_req != SentRequest::FriendPoll {
      warn!("lpn: unexpected Friend Update");
      return Ok(());
    }

    if self.env.kr_phase() == 2 && !new_key {
      warn!("lpn: ignoring Phase 2 KR Update secured using old key");
      return Ok(());
    }

    // Only step down as IV Update initiator once the Friend's flag has
    // caught up to our own locally tracked IV Update state.
    if update.iv_update() && self.env.is_ivu_initiator() && self.env.iv_update_in_progress() == update.iv_update() {
      self.env.beacon_ivu_initiator(false);
    }

    let just_established = !self.ctx.established;

    if just_established {
      if !friend_cred_used {
        warn!("lpn: Friend Update with wrong credentials");
        return Err(LpnError::BadData("Friend Update decrypted without Friend Credentials"));
      }
      self.ctx.established = true;
      debug!("lpn: friendship established with {}", self.ctx.frnd);
      self.ctx.poll_timeout_ms = self
        .config
        .poll_timeout_max_ms(self.ctx.adv_duration, self.ctx.recv_win)
        .min(1_000);
    }

    self.friend_response_received();

    if self.env.kr_update(self.net_idx(), update.key_refresh(), new_key) {
      trace!("lpn: key refresh state advanced, beacon should refresh");
    }
    self.env.iv_update(update.iv_index, update.iv_update());

    if self.ctx.groups_changed {
      self.sub_update(SentRequest::FriendSubAdd);
      self.sub_update(SentRequest::FriendSubRem);
      if self.ctx.sent_req.is_none() {
        self.ctx.groups_changed = false;
      }
    }

    if update.md {
      trace!("lpn: requesting more messages from Friend");
      let _ = self.send_friend_poll();
    }

    if self.ctx.sent_req.is_none() {
      // The round that establishes the friendship initializes poll_timeout
      // to its floor above; only later rounds double it.
      let delay = if just_established { self.ctx.poll_timeout_ms } else { self.poll_timeout() };
      self.env.arm(Duration::from_millis(delay as u64));
    }

    Ok(())
  }

  // ---------------------------------------------------------------
  // Clear handshake.
  // ---------------------------------------------------------------

  fn send_friend_clear(&mut self) {
    let req = FriendClear {
      lpn_addr: self.env.primary_addr(),
      lpn_counter: self.ctx.counter,
    };
    let tx = TxContext {
      net_idx: self.net_idx(),
      dst: self.ctx.frnd,
      friend_cred: false,
    };
    if let Err(e) = self.env.send(tx, Opcode::FriendClear, &req.encode()) {
      warn!("lpn: could not queue Friend Clear: {e}");
    }
  }

  fn on_friend_clear_sent(&mut self, adv_duration_ms: u16, result: Result<()>) {
    // Leaving LPN behavior behind (at least temporarily): re-enable
    // scanning permanently until a new friendship is established.
    self.env.scan_enable();
    self.ctx.req_attempts += 1;

    if let Err(e) = result {
      warn!("lpn: sending Friend Clear failed: {e}");
      self.set_state(LpnState::Enabled);
      self.clear_friendship(self.ctx.disable);
      return;
    }

    self.set_state(LpnState::Clear);
    let timeout = self.config.req_wait_ms as u32 + self.config.req_scan_ms + adv_duration_ms as u32;
    self.env.arm(Duration::from_millis(timeout as u64));
  }

  fn clear_friendship(&mut self, disable: bool) {
    if self.ctx.established && !self.ctx.clear_success && self.ctx.req_attempts < self.config.clear_attempts {
      self.send_friend_clear();
      self.ctx.disable = disable;
      return;
    }

    self.env.cancel();
    self.env.cred_del(self.net_idx(), self.ctx.frnd);

    self.ctx.reset_friendship_fields();

    if disable {
      self.set_state(LpnState::Disabled);
      return;
    }

    self.set_state(LpnState::Enabled);
    self.env.arm(Duration::from_millis(self.config.req_retry_timeout_ms as u64));
  }

  pub fn on_friend_clear_confirm(&mut self, payload: &[u8]) -> Result<()> {
    let cfm = FriendClearConfirm::decode(payload)?;

    if self.ctx.state != LpnState::Clear {
      warn!("lpn: ignoring unexpected Friend Clear Confirm");
      return Ok(());
    }

    if cfm.lpn_addr != self.env.primary_addr() || cfm.lpn_counter != self.ctx.counter {
      warn!("lpn: invalid parameters in Friend Clear Confirm");
      return Ok(());
    }

    self.ctx.clear_success = true;
    let disable = self.ctx.disable;
    self.clear_friendship(disable);
    Ok(())
  }

  // ---------------------------------------------------------------
  // timer dispatch (`lpn_timeout`).
  // ---------------------------------------------------------------

  pub fn on_timer_fired(&mut self) {
    trace!("lpn: timer fired in state {}", self.ctx.state.name());
    match self.ctx.state {
      LpnState::Disabled => {}
      LpnState::Clear => {
        let disable = self.ctx.disable;
        self.clear_friendship(disable);
      }
      LpnState::Timer => {
        self.set_state(LpnState::Enabled);
        if self.config.establishment_optimization {
          self.env.scan_disable();
        }
        self.send_friend_request();
      }
      LpnState::Enabled => {
        self.send_friend_request();
      }
      LpnState::ReqWait => {
        self.env.scan_enable();
        let delay = self.ctx.adv_duration as u32 + self.config.req_scan_ms;
        self.env.arm(Duration::from_millis(delay as u64));
        self.set_state(LpnState::WaitOffer);
      }
      LpnState::WaitOffer => {
        warn!("lpn: no acceptable Friend Offers received");
        if self.config.establishment_optimization {
          self.env.scan_disable();
        }
        self.ctx.counter = self.ctx.counter.wrapping_add(1);
        self.set_state(LpnState::Enabled);
        self.env.arm(Duration::from_millis(self.config.req_retry_timeout_ms as u64));
      }
      LpnState::Established => self.on_established_timeout(),
      LpnState::RecvDelay => {
        let delay = self.ctx.adv_duration as u32 + self.config.scan_latency() as u32 + self.ctx.recv_win as u32;
        self.env.arm(Duration::from_millis(delay as u64));
        self.env.scan_enable();
        self.set_state(LpnState::WaitUpdate);
      }
      LpnState::WaitUpdate => self.on_wait_update_timeout(),
    }
  }

  fn on_established_timeout(&mut self) {
    let attempts = self.config.req_attempts(self.ctx.adv_duration, self.ctx.recv_win);
    if self.ctx.req_attempts < attempts {
      let req = self.ctx.sent_req;
      self.ctx.sent_req = SentRequest::None;
      match req {
        SentRequest::None | SentRequest::FriendPoll => {
          let _ = self.send_friend_poll();
        }
        other => {
          self.sub_update(other);
        }
      }
      return;
    }

    warn!("lpn: no response from Friend after {} retries", self.ctx.req_attempts);
    self.ctx.req_attempts = 0;
    self.clear_friendship(false);
  }

  /// `update_timeout`: the WaitUpdate window closed without a Friend
  /// Update or Sub Confirm arriving.
  fn on_wait_update_timeout(&mut self) {
    self.ctx.sent_req = SentRequest::None;

    if self.ctx.established {
      warn!("lpn: no response from Friend during ReceiveWindow");
      self.env.scan_disable();
      self.set_state(LpnState::Established);
      self.env.arm(Duration::from_millis(self.config.poll_retry_timeout_ms as u64));
    } else {
      if self.config.establishment_optimization {
        self.env.scan_disable();
      }
      if self.ctx.req_attempts < 6 {
        warn!("lpn: retrying first Friend Poll");
        if self.send_friend_poll().is_ok() {
          return;
        }
      }
      warn!("lpn: timed out waiting for first Friend Update");
      self.clear_friendship(false);
    }
  }

  // ---------------------------------------------------------------
  // Send completion dispatch (delivered back as an
  // event, not a nested callback).
  // ---------------------------------------------------------------

  pub fn on_send_complete(&mut self, opcode: Opcode, adv_duration_ms: u16, result: Result<()>) {
    match opcode {
      Opcode::FriendRequest => self.on_friend_request_sent(adv_duration_ms, result),
      Opcode::FriendClear => self.on_friend_clear_sent(adv_duration_ms, result),
      Opcode::FriendPoll | Opcode::FriendSubAdd | Opcode::FriendSubRem => {
        self.on_request_sent(adv_duration_ms, result)
      }
      Opcode::FriendOffer | Opcode::FriendUpdate | Opcode::FriendClearConfirm | Opcode::FriendSubConfirm => {
        debug_assert!(false, "LPN core never sends inbound-only opcode {opcode:?}");
      }
    }
  }
}
