//! End-to-end scenarios driving [`LowPowerNode`] against a fake
//! environment that records every collaborator call, so assertions can
//! inspect the full interaction trace rather than only the final state.

use std::time::Duration;

use bt_mesh_lpn::{
  Address, ControlMessageSender, CredentialProvider, LpnConfig, LpnState, NodeInfo, ScanController, SentRequest,
  TimerDriver, TxContext,
};
use bt_mesh_lpn::env::{FriendCredentialHandle, KeyRefreshIvUpdate, TxProgressProbe};
use bt_mesh_lpn::error::LpnError;
use bt_mesh_lpn::messages::{FriendOffer, FriendUpdate, Opcode};
use bt_mesh_lpn::node::LowPowerNode;

#[derive(Debug, Clone, PartialEq)]
enum Event {
  Sent(TxContext, Opcode, Vec<u8>),
  ScanEnable,
  ScanDisable,
  Armed(Duration),
  Cancelled,
}

struct FakeEnv {
  events: Vec<Event>,
  primary_addr: Address,
  net_idx: u16,
  kr_phase: u8,
  provisioned: bool,
  next_cred: u32,
  tx_in_progress: bool,
  send_should_fail: bool,
  ivu_initiator: bool,
  iv_update_in_progress: bool,
}

impl FakeEnv {
  fn new() -> Self {
    FakeEnv {
      events: Vec::new(),
      primary_addr: Address(0x0001),
      net_idx: 0,
      kr_phase: 0,
      provisioned: true,
      next_cred: 1,
      tx_in_progress: false,
      send_should_fail: false,
      ivu_initiator: false,
      iv_update_in_progress: false,
    }
  }

  fn sent_opcodes(&self) -> Vec<Opcode> {
    self
      .events
      .iter()
      .filter_map(|e| match e {
        Event::Sent(_, op, _) => Some(*op),
        _ => None,
      })
      .collect()
  }

  fn last_armed(&self) -> Option<Duration> {
    self.events.iter().rev().find_map(|e| match e {
      Event::Armed(d) => Some(*d),
      _ => None,
    })
  }
}

impl ControlMessageSender for FakeEnv {
  fn send(&mut self, ctx: TxContext, opcode: Opcode, payload: &[u8]) -> Result<(), LpnError> {
    if self.send_should_fail {
      return Err(LpnError::NoBuffer);
    }
    self.events.push(Event::Sent(ctx, opcode, payload.to_vec()));
    Ok(())
  }
}

impl CredentialProvider for FakeEnv {
  fn cred_add(
    &mut self,
    _net_idx: u16,
    _net_key_idx: u8,
    _friend_addr: Address,
    _lpn_counter: u16,
    _friend_counter: u16,
  ) -> Option<FriendCredentialHandle> {
    let handle = FriendCredentialHandle(self.next_cred);
    self.next_cred += 1;
    Some(handle)
  }

  fn cred_set(&mut self, _cred: FriendCredentialHandle, _key_idx: u8) -> Result<(), LpnError> {
    Ok(())
  }

  fn cred_clear(&mut self, _cred: FriendCredentialHandle) {}

  fn cred_del(&mut self, _net_idx: u16, _friend_addr: Address) {}
}

impl ScanController for FakeEnv {
  fn scan_enable(&mut self) {
    self.events.push(Event::ScanEnable);
  }

  fn scan_disable(&mut self) {
    self.events.push(Event::ScanDisable);
  }
}

impl TimerDriver for FakeEnv {
  fn arm(&mut self, delay: Duration) {
    self.events.push(Event::Armed(delay));
  }

  fn cancel(&mut self) {
    self.events.push(Event::Cancelled);
  }
}

impl NodeInfo for FakeEnv {
  fn primary_addr(&self) -> Address {
    self.primary_addr
  }

  fn num_elements(&self) -> u8 {
    1
  }

  fn is_provisioned(&self) -> bool {
    self.provisioned
  }

  fn subnet_net_idx(&self) -> u16 {
    self.net_idx
  }

  fn kr_phase(&self) -> u8 {
    self.kr_phase
  }
}

impl KeyRefreshIvUpdate for FakeEnv {
  fn kr_update(&mut self, _net_idx: u16, _kr_flag: bool, _new_key: bool) -> bool {
    false
  }

  fn iv_update(&mut self, _iv_index: u32, _iv_update_flag: bool) {}

  fn beacon_ivu_initiator(&mut self, _enable: bool) {}

  fn is_ivu_initiator(&self) -> bool {
    self.ivu_initiator
  }

  fn iv_update_in_progress(&self) -> bool {
    self.iv_update_in_progress
  }
}

impl TxProgressProbe for FakeEnv {
  fn tx_in_progress(&self) -> bool {
    self.tx_in_progress
  }
}

const ADV_DURATION_MS: u16 = 10;
const RECV_WIN_MS: u8 = 50;

fn offer_bytes(frnd_counter: u16) -> [u8; FriendOffer::WIRE_LEN] {
  FriendOffer {
    recv_win: RECV_WIN_MS,
    queue_size: 4,
    sub_list_size: 0,
    rssi: 0,
    frnd_counter,
  }
  .encode()
}

fn update_bytes(md: bool) -> [u8; FriendUpdate::WIRE_LEN] {
  FriendUpdate {
    flags: Default::default(),
    iv_index: 0,
    md,
  }
  .encode()
}

#[test]
fn happy_establishment() {
  let config = LpnConfig::builder().establishment_optimization(true).build();
  let mut lpn = LowPowerNode::new(config, FakeEnv::new());

  lpn.enable();
  assert_eq!(lpn.state(), LpnState::Enabled);
  assert_eq!(lpn.env().sent_opcodes(), vec![Opcode::FriendRequest]);

  lpn.on_send_complete(Opcode::FriendRequest, ADV_DURATION_MS, Ok(()));
  assert_eq!(lpn.state(), LpnState::ReqWait);

  lpn.on_timer_fired();
  assert_eq!(lpn.state(), LpnState::WaitOffer);

  lpn.on_friend_offer(Address(0x0002), &offer_bytes(0x0100)).unwrap();
  assert_eq!(lpn.ctx.counter, 1);
  assert_eq!(lpn.ctx.frnd, Address(0x0002));
  assert_eq!(lpn.env().sent_opcodes(), vec![Opcode::FriendRequest, Opcode::FriendPoll]);

  lpn.on_send_complete(Opcode::FriendPoll, ADV_DURATION_MS, Ok(()));
  assert_eq!(lpn.state(), LpnState::RecvDelay);

  lpn.on_timer_fired();
  assert_eq!(lpn.state(), LpnState::WaitUpdate);

  lpn.on_friend_update(&update_bytes(false), true, false).unwrap();
  assert!(lpn.is_established());
  assert_eq!(lpn.state(), LpnState::Established);
  // The round that establishes the friendship initializes poll_timeout to
  // min(POLL_TIMEOUT_MAX, 1s) and arms off that value directly; doubling
  // only starts from the next scheduled Poll onward.
  assert_eq!(lpn.ctx.poll_timeout_ms, 1_000);
  assert_eq!(lpn.env().last_armed(), Some(Duration::from_millis(1_000)));
  assert!(lpn.ctx.sent_req.is_none());
}

#[test]
fn offer_timeout_retries_the_request() {
  let config = LpnConfig::default();
  let mut lpn = LowPowerNode::new(config.clone(), FakeEnv::new());

  lpn.enable();
  lpn.on_send_complete(Opcode::FriendRequest, ADV_DURATION_MS, Ok(()));
  assert_eq!(lpn.state(), LpnState::WaitOffer);
  let counter_before = lpn.ctx.counter;

  lpn.on_timer_fired();

  assert_eq!(lpn.state(), LpnState::Enabled);
  assert_eq!(lpn.ctx.counter, counter_before.wrapping_add(1));
  assert_eq!(lpn.env().last_armed(), Some(Duration::from_millis(config.req_retry_timeout_ms as u64)));

  lpn.on_timer_fired();
  assert_eq!(lpn.env().sent_opcodes(), vec![Opcode::FriendRequest, Opcode::FriendRequest]);
}

fn established_node() -> LowPowerNode<FakeEnv> {
  let config = LpnConfig::builder().establishment_optimization(true).build();
  let mut lpn = LowPowerNode::new(config, FakeEnv::new());
  lpn.enable();
  lpn.on_send_complete(Opcode::FriendRequest, ADV_DURATION_MS, Ok(()));
  lpn.on_timer_fired();
  lpn.on_friend_offer(Address(0x0002), &offer_bytes(0x0100)).unwrap();
  lpn.on_send_complete(Opcode::FriendPoll, ADV_DURATION_MS, Ok(()));
  lpn.on_timer_fired();
  lpn.on_friend_update(&update_bytes(false), true, false).unwrap();
  assert_eq!(lpn.state(), LpnState::Established);
  lpn
}

#[test]
fn subscription_add_then_remove() {
  let mut lpn = established_node();

  // Each group_add sends as soon as nothing else is in flight, so two
  // back-to-back calls produce two Sub Adds, not one batched request.
  lpn.group_add(Address(0xC000));
  assert_eq!(lpn.env().sent_opcodes().last(), Some(&Opcode::FriendSubAdd));
  assert_eq!(lpn.ctx.sent_req, SentRequest::FriendSubAdd);
  let xact0 = lpn.ctx.xact_pending;

  lpn.group_add(Address(0xC001));
  assert!(lpn.ctx.groups_changed);

  let cfm0 = bt_mesh_lpn::messages::FriendSubConfirm { xact: xact0 };
  lpn.on_friend_sub_confirm(&cfm0.encode()).unwrap();
  assert_eq!(lpn.ctx.added_count(), 1);
  // The deferred second address is picked up as soon as the first
  // Sub Add's Confirm frees up the single in-flight request slot.
  assert_eq!(lpn.env().sent_opcodes().last(), Some(&Opcode::FriendSubAdd));
  let xact1 = lpn.ctx.xact_pending;
  assert_ne!(xact1, xact0);

  let cfm1 = bt_mesh_lpn::messages::FriendSubConfirm { xact: xact1 };
  lpn.on_friend_sub_confirm(&cfm1.encode()).unwrap();
  assert_eq!(lpn.ctx.added_count(), 2);
  assert!(!lpn.ctx.groups_changed);

  lpn.group_del(&[Address(0xC000)]);
  assert_eq!(lpn.env().sent_opcodes().last(), Some(&Opcode::FriendSubRem));
  let xact2 = lpn.ctx.xact_pending;

  let cfm2 = bt_mesh_lpn::messages::FriendSubConfirm { xact: xact2 };
  lpn.on_friend_sub_confirm(&cfm2.encode()).unwrap();
  assert_eq!(lpn.ctx.added_count(), 1);
  assert!(!lpn.ctx.groups.contains(&Address(0xC000)));
  assert!(lpn.ctx.groups.contains(&Address(0xC001)));
}

#[test]
fn poll_retry_on_missed_window_then_clears() {
  let mut lpn = established_node();

  lpn.poll();
  assert_eq!(lpn.env().sent_opcodes().last(), Some(&Opcode::FriendPoll));

  // Drive successive missed receive windows. Each round: the Poll send
  // completes (req_attempts++), the RecvDelay/WaitUpdate window elapses
  // with no Update, and the LPN falls back to Established to retry.
  for _ in 0..4 {
    lpn.on_send_complete(Opcode::FriendPoll, ADV_DURATION_MS, Ok(()));
    assert_eq!(lpn.state(), LpnState::RecvDelay);
    lpn.on_timer_fired();
    assert_eq!(lpn.state(), LpnState::WaitUpdate);
    lpn.on_timer_fired();
    assert_eq!(lpn.state(), LpnState::Established);
    lpn.on_timer_fired();
  }

  // REQ_ATTEMPTS(10ms, 50ms) == 4: the fifth round gives up on Polling
  // and starts a graceful Clear handshake instead of silently dropping.
  // Giving up resets the retry counter for the Clear handshake's own budget.
  assert_eq!(lpn.ctx.req_attempts, 0);
  assert_eq!(lpn.env().sent_opcodes().last(), Some(&Opcode::FriendClear));
  assert_eq!(lpn.state(), LpnState::Established);
  assert!(lpn.is_established());

  // The Friend never answers the Clear either: two Clear attempts
  // (CLEAR_ATTEMPTS = 2), then the LPN finalizes on its own.
  lpn.on_send_complete(Opcode::FriendClear, ADV_DURATION_MS, Ok(()));
  assert_eq!(lpn.state(), LpnState::Clear);
  lpn.on_timer_fired();
  lpn.on_send_complete(Opcode::FriendClear, ADV_DURATION_MS, Ok(()));
  assert_eq!(lpn.state(), LpnState::Clear);
  lpn.on_timer_fired();

  assert_eq!(lpn.state(), LpnState::Enabled);
  assert!(!lpn.is_established());
}

#[test]
fn clean_disable_mid_friendship() {
  let mut lpn = established_node();

  lpn.disable();
  assert_eq!(lpn.env().sent_opcodes().last(), Some(&Opcode::FriendClear));
  assert_eq!(lpn.state(), LpnState::Established);

  lpn.on_send_complete(Opcode::FriendClear, ADV_DURATION_MS, Ok(()));
  assert_eq!(lpn.state(), LpnState::Clear);

  let cfm = bt_mesh_lpn::messages::FriendClearConfirm {
    lpn_addr: Address(0x0001),
    lpn_counter: lpn.ctx.counter,
  };
  lpn.on_friend_clear_confirm(&cfm.encode()).unwrap();

  assert_eq!(lpn.state(), LpnState::Disabled);
  assert_eq!(lpn.ctx.frnd, Address::UNASSIGNED);
  assert_eq!(lpn.ctx.old_friend, Address::UNASSIGNED);
  assert!(!lpn.is_established());
}

#[test]
fn key_refresh_phase_2_ignores_update_secured_with_old_key() {
  let mut env = FakeEnv::new();
  env.kr_phase = 2;
  let config = LpnConfig::builder().establishment_optimization(true).build();
  let mut lpn = LowPowerNode::new(config, env);

  lpn.enable();
  lpn.on_send_complete(Opcode::FriendRequest, ADV_DURATION_MS, Ok(()));
  lpn.on_timer_fired();
  lpn.on_friend_offer(Address(0x0002), &offer_bytes(0x0100)).unwrap();
  lpn.on_send_complete(Opcode::FriendPoll, ADV_DURATION_MS, Ok(()));
  lpn.on_timer_fired();
  assert_eq!(lpn.state(), LpnState::WaitUpdate);

  // new_key = false while kr_phase == 2: the Update must be ignored outright,
  // even though it would otherwise complete establishment.
  lpn.on_friend_update(&update_bytes(false), true, false).unwrap();

  assert!(!lpn.is_established());
  assert_eq!(lpn.state(), LpnState::WaitUpdate);
  assert_eq!(lpn.ctx.sent_req, SentRequest::FriendPoll, "ignored Update must leave the outstanding Poll untouched");
}
