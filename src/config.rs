//! Tunable constants for the LPN core, collected into one struct instead of
//! compile-time constants so a host can size a node's friendship criteria
//! and retry budget without recompiling the crate.

/// Minimum Friend Queue size the LPN is willing to accept, expressed as the
/// base-2 logarithm of the queue length (wire encoding, 3 bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MinQueueSizeLog {
  Prohibited = 0b000,
  N2 = 0b001,
  N4 = 0b010,
  N8 = 0b011,
  N16 = 0b100,
  N32 = 0b101,
  N64 = 0b110,
  N128 = 0b111,
}

/// RSSI factor applied by the Friend when ranking competing Friend Requests
/// (wire encoding, 2 bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RssiFactor {
  Factor1 = 0b00,
  Factor15 = 0b01,
  Factor2 = 0b10,
  Factor25 = 0b11,
}

/// Receive window factor applied by the Friend (wire encoding, 2 bits).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ReceiveWindowFactor {
  Factor1 = 0b00,
  Factor15 = 0b01,
  Factor2 = 0b10,
  Factor25 = 0b11,
}

/// Packs MinQueueSize / RSSIFactor / ReceiveWinFactor into the single
/// Criteria byte carried by a Friend Request.
pub fn pack_criteria(queue: MinQueueSizeLog, rssi: RssiFactor, recv_win: ReceiveWindowFactor) -> u8 {
  (queue as u8) | ((rssi as u8) << 3) | ((recv_win as u8) << 5)
}

/// All tunables governing the LPN state machine's timing, with defaults matching the
/// reference values used throughout the end-to-end scenarios.
#[derive(Clone, Debug, PartialEq)]
pub struct LpnConfig {
  /// `LPN_RECV_DELAY`: ms between sending a request and opening the scan
  /// window, 10-255ms.
  pub recv_delay_ms: u16,
  /// Configured `SCAN_LATENCY` before clamping to `recv_delay_ms`.
  pub scan_latency_ms: u16,
  /// `FRIEND_REQ_RETRY_TIMEOUT`: delay before retrying a Friend Request
  /// after a failed establishment round.
  pub req_retry_timeout_ms: u32,
  /// `FRIEND_REQ_WAIT` (100ms by default, kept configurable for
  /// tests).
  pub req_wait_ms: u16,
  /// `FRIEND_REQ_SCAN` (1s by default).
  pub req_scan_ms: u32,
  /// `POLL_RETRY_TIMEOUT` (100ms by default).
  pub poll_retry_timeout_ms: u16,
  /// `CLEAR_ATTEMPTS` (2 by default).
  pub clear_attempts: u8,
  /// `LPN_GROUPS`: number of group-address slots reserved at construction.
  pub lpn_groups: usize,
  /// `LPN_POLL_TIMEOUT` in 100ms units, used to derive `POLL_TIMEOUT_MAX`.
  pub poll_timeout_100ms: u16,
  /// Friendship criteria advertised in the Friend Request.
  pub min_queue_size: MinQueueSizeLog,
  pub rssi_factor: RssiFactor,
  pub recv_win_factor: ReceiveWindowFactor,
  /// `CONFIG_BT_MESH_LPN_ESTABLISHMENT`: insert a `ReqWait` pause before
  /// opening the scanner so the radio doesn't need to be on continuously
  /// while waiting for an Offer.
  pub establishment_optimization: bool,
  /// `CONFIG_BT_MESH_LPN_AUTO`: start in the `Timer` auto-mode state
  /// instead of going straight to `Enabled` on `enable()`.
  pub auto_mode: bool,
  /// `LPN_AUTO_TIMEOUT`: auto-mode quiet period before LPN kicks in.
  pub auto_timeout_ms: u32,
}

impl Default for LpnConfig {
  fn default() -> Self {
    LpnConfig {
      recv_delay_ms: 100,
      scan_latency_ms: 50,
      req_retry_timeout_ms: 10_000,
      req_wait_ms: 100,
      req_scan_ms: 1_000,
      poll_retry_timeout_ms: 100,
      clear_attempts: 2,
      lpn_groups: 3,
      poll_timeout_100ms: 300, // 30s
      min_queue_size: MinQueueSizeLog::N16,
      rssi_factor: RssiFactor::Factor1,
      recv_win_factor: ReceiveWindowFactor::Factor1,
      establishment_optimization: false,
      auto_mode: false,
      auto_timeout_ms: 15_000,
    }
  }
}

impl LpnConfig {
  pub fn builder() -> LpnConfigBuilder {
    LpnConfigBuilder(LpnConfig::default())
  }

  /// `SCAN_LATENCY = min(configured, LPN_RECV_DELAY)`.
  pub fn scan_latency(&self) -> u16 {
    self.scan_latency_ms.min(self.recv_delay_ms)
  }

  pub fn criteria(&self) -> u8 {
    pack_criteria(self.min_queue_size, self.rssi_factor, self.recv_win_factor)
  }

  /// `REQ_RETRY_DURATION(lpn) = 4 * (LPN_RECV_DELAY + adv_duration + recv_win + POLL_RETRY_TIMEOUT)`.
  pub fn req_retry_duration_ms(&self, adv_duration_ms: u16, recv_win_ms: u16) -> u32 {
    4 * (self.recv_delay_ms as u32
      + adv_duration_ms as u32
      + recv_win_ms as u32
      + self.poll_retry_timeout_ms as u32)
  }

  /// `POLL_TIMEOUT_MAX(lpn) = LPN_POLL_TIMEOUT * 100 - REQ_RETRY_DURATION(lpn)`.
  pub fn poll_timeout_max_ms(&self, adv_duration_ms: u16, recv_win_ms: u16) -> u32 {
    (self.poll_timeout_100ms as u32 * 100)
      .saturating_sub(self.req_retry_duration_ms(adv_duration_ms, recv_win_ms))
  }

  /// `REQ_ATTEMPTS(lpn) = POLL_TIMEOUT_MAX(lpn) < 3s ? 2 : 4`.
  pub fn req_attempts(&self, adv_duration_ms: u16, recv_win_ms: u16) -> u8 {
    if self.poll_timeout_max_ms(adv_duration_ms, recv_win_ms) < 3_000 {
      2
    } else {
      4
    }
  }
}

/// Small builder so a host only restates the fields it wants to override.
pub struct LpnConfigBuilder(LpnConfig);

macro_rules! builder_setter {
  ($name:ident, $ty:ty) => {
    pub fn $name(mut self, value: $ty) -> Self {
      self.0.$name = value;
      self
    }
  };
}

impl LpnConfigBuilder {
  builder_setter!(recv_delay_ms, u16);
  builder_setter!(scan_latency_ms, u16);
  builder_setter!(req_retry_timeout_ms, u32);
  builder_setter!(req_wait_ms, u16);
  builder_setter!(req_scan_ms, u32);
  builder_setter!(poll_retry_timeout_ms, u16);
  builder_setter!(clear_attempts, u8);
  builder_setter!(lpn_groups, usize);
  builder_setter!(poll_timeout_100ms, u16);
  builder_setter!(min_queue_size, MinQueueSizeLog);
  builder_setter!(rssi_factor, RssiFactor);
  builder_setter!(recv_win_factor, ReceiveWindowFactor);
  builder_setter!(establishment_optimization, bool);
  builder_setter!(auto_mode, bool);
  builder_setter!(auto_timeout_ms, u32);

  pub fn build(self) -> LpnConfig {
    self.0
  }
}
