//! Well-known value types that have a fixed BSATN shape.
//!
//! The 256-bit integers are stored as 32 little-endian bytes: four 64-bit
//! words, least significant word first, each word little-endian. That is the
//! same convention the 128-bit types use, extended to four words.

use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::sum_type;

fn write_hex_be(f: &mut fmt::Formatter<'_>, le_bytes: &[u8]) -> fmt::Result {
    le_bytes.iter().rev().try_for_each(|b| write!(f, "{:02x}", b))
}

fn words_from_le(bytes: &[u8; 32]) -> [u64; 4] {
    let mut words = [0u64; 4];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *word = u64::from_le_bytes(buf);
    }
    words
}

fn le_from_words(words: [u64; 4]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (chunk, word) in bytes.chunks_exact_mut(8).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Unsigned 256-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct U256([u8; 32]);

impl U256 {
    pub const ZERO: U256 = U256([0; 32]);
    pub const MAX: U256 = U256([0xFF; 32]);

    pub const fn from_le_bytes(bytes: [u8; 32]) -> Self {
        U256(bytes)
    }

    pub const fn to_le_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Builds a value from four 64-bit words, least significant first.
    pub fn from_words(words: [u64; 4]) -> Self {
        U256(le_from_words(words))
    }

    /// Splits into four 64-bit words, least significant first.
    pub fn to_words(&self) -> [u64; 4] {
        words_from_le(&self.0)
    }

    /// The value as a `u128`, if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        let [w0, w1, w2, w3] = self.to_words();
        (w2 == 0 && w3 == 0).then(|| (u128::from(w1) << 64) | u128::from(w0))
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&v.to_le_bytes());
        U256(bytes)
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        U256::from(u128::from(v))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        write_hex_be(f, &self.0)
    }
}

/// Signed 256-bit integer in two's complement; the sign lives in the most
/// significant word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct I256([u8; 32]);

impl I256 {
    pub const ZERO: I256 = I256([0; 32]);
    pub const MINUS_ONE: I256 = I256([0xFF; 32]);

    pub const fn from_le_bytes(bytes: [u8; 32]) -> Self {
        I256(bytes)
    }

    pub const fn to_le_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn from_words(words: [u64; 4]) -> Self {
        I256(le_from_words(words))
    }

    pub fn to_words(&self) -> [u64; 4] {
        words_from_le(&self.0)
    }

    pub fn is_negative(&self) -> bool {
        self.0[31] & 0x80 != 0
    }

    /// The value as an `i128`, if it fits.
    pub fn to_i128(&self) -> Option<i128> {
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[..16]);
        let v = i128::from_le_bytes(low);
        let fill = if v < 0 { 0xFF } else { 0x00 };
        self.0[16..].iter().all(|b| *b == fill).then_some(v)
    }
}

impl From<i128> for I256 {
    fn from(v: i128) -> Self {
        let fill = if v < 0 { 0xFF } else { 0x00 };
        let mut bytes = [fill; 32];
        bytes[..16].copy_from_slice(&v.to_le_bytes());
        I256(bytes)
    }
}

impl From<i64> for I256 {
    fn from(v: i64) -> Self {
        I256::from(i128::from(v))
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_negative(), other.is_negative()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // Same sign: two's complement orders like the unsigned bytes.
            _ => self.0.iter().rev().cmp(other.0.iter().rev()),
        }
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A 256-bit client identity. On the wire it is a plain `u256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
pub struct Identity(U256);

impl Identity {
    pub const ZERO: Identity = Identity(U256::ZERO);

    pub const fn from_u256(v: U256) -> Self {
        Identity(v)
    }

    pub const fn to_u256(&self) -> U256 {
        self.0
    }

    /// Builds an identity from its big-endian byte form, the order used
    /// when identities are displayed.
    pub fn from_be_byte_array(mut bytes: [u8; 32]) -> Self {
        bytes.reverse();
        Identity(U256::from_le_bytes(bytes))
    }

    pub fn to_be_byte_array(&self) -> [u8; 32] {
        let mut bytes = self.0.to_le_bytes();
        bytes.reverse();
        bytes
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex_be(f, &self.0.to_le_bytes())
    }
}

/// Identifies one client connection. On the wire it is a plain `u128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
pub struct ConnectionId(u128);

impl ConnectionId {
    pub const ZERO: ConnectionId = ConnectionId(0);

    pub const fn from_u128(v: u128) -> Self {
        ConnectionId(v)
    }

    pub const fn to_u128(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A point in time, in microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
pub struct Timestamp {
    micros_since_unix_epoch: i64,
}

impl Timestamp {
    pub const UNIX_EPOCH: Timestamp = Timestamp {
        micros_since_unix_epoch: 0,
    };

    pub const fn from_micros_since_unix_epoch(micros: i64) -> Self {
        Timestamp {
            micros_since_unix_epoch: micros,
        }
    }

    pub const fn to_micros_since_unix_epoch(&self) -> i64 {
        self.micros_since_unix_epoch
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Saturates at the `i64` range.
    pub fn from_system_time(time: SystemTime) -> Self {
        let micros = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_micros()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_micros())
                .map(|m| -m)
                .unwrap_or(i64::MIN),
        };
        Self::from_micros_since_unix_epoch(micros)
    }

    pub fn to_system_time(&self) -> SystemTime {
        let offset = Duration::from_micros(self.micros_since_unix_epoch.unsigned_abs());
        if self.micros_since_unix_epoch >= 0 {
            UNIX_EPOCH + offset
        } else {
            UNIX_EPOCH - offset
        }
    }

    /// Signed distance from `earlier` to `self`.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<TimeDuration> {
        self.micros_since_unix_epoch
            .checked_sub(earlier.micros_since_unix_epoch)
            .map(TimeDuration::from_micros)
    }

    pub fn checked_add(&self, d: TimeDuration) -> Option<Timestamp> {
        self.micros_since_unix_epoch
            .checked_add(d.to_micros())
            .map(Timestamp::from_micros_since_unix_epoch)
    }
}

/// A signed span of time with microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
pub struct TimeDuration {
    micros: i64,
}

impl TimeDuration {
    pub const ZERO: TimeDuration = TimeDuration { micros: 0 };

    pub const fn from_micros(micros: i64) -> Self {
        TimeDuration { micros }
    }

    pub const fn to_micros(&self) -> i64 {
        self.micros
    }

    /// Absolute value as a std [`Duration`].
    pub fn to_duration_abs(&self) -> Duration {
        Duration::from_micros(self.micros.unsigned_abs())
    }

    /// `None` for negative spans.
    pub fn to_duration(&self) -> Option<Duration> {
        (self.micros >= 0).then(|| self.to_duration_abs())
    }
}

impl From<Duration> for TimeDuration {
    /// Saturates at `i64::MAX` microseconds.
    fn from(d: Duration) -> Self {
        TimeDuration::from_micros(i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
    }
}

sum_type! {
    /// When a scheduled reducer runs: repeatedly at an interval, or once at
    /// a point in time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ScheduleAt {
        Interval(TimeDuration),
        Time(Timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SumType, from_slice, to_vec};

    #[test]
    fn test_u256_words_low_first() {
        let v = U256::from_words([1, 2, 3, 4]);
        let bytes = to_vec(&v).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[..8], 1u64.to_le_bytes());
        assert_eq!(bytes[24..], 4u64.to_le_bytes());
        assert_eq!(v.to_words(), [1, 2, 3, 4]);
        assert_eq!(from_slice::<U256>(&bytes).unwrap(), v);
    }

    #[test]
    fn test_u256_from_u128_matches_u128_layout() {
        let v = 0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10u128;
        let wide = to_vec(&U256::from(v)).unwrap();
        assert_eq!(wide[..16], to_vec(&v).unwrap()[..]);
        assert!(wide[16..].iter().all(|b| *b == 0));
        assert_eq!(U256::from(v).to_u128(), Some(v));
        assert_eq!(U256::MAX.to_u128(), None);
    }

    #[test]
    fn test_u256_ordering() {
        assert!(
            U256::from_words([0, 0, 0, 1]) > U256::from_words([u64::MAX, u64::MAX, u64::MAX, 0])
        );
        assert!(U256::ZERO < U256::from(1u64));
    }

    #[test]
    fn test_i256_sign_extension() {
        let v = I256::from(-2i128);
        assert!(v.is_negative());
        assert_eq!(v.to_words(), [u64::MAX - 1, u64::MAX, u64::MAX, u64::MAX]);
        assert_eq!(v.to_i128(), Some(-2));
        assert_eq!(I256::from(5i64).to_i128(), Some(5));
        assert_eq!(I256::MINUS_ONE, I256::from(-1i64));
        assert!(I256::from(-1i64) < I256::ZERO);
        assert!(I256::from(-1i64) > I256::from(-2i64));
    }

    #[test]
    fn test_identity_display_is_big_endian_hex() {
        let mut be = [0u8; 32];
        be[0] = 0xAB;
        be[31] = 0x01;
        let id = Identity::from_be_byte_array(be);
        let hex = id.to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab"));
        assert!(hex.ends_with("01"));
        assert_eq!(id.to_be_byte_array(), be);
        // Little-endian on the wire.
        assert_eq!(to_vec(&id).unwrap()[0], 0x01);
    }

    #[test]
    fn test_connection_id_is_u128() {
        let id = ConnectionId::from_u128(0xFF);
        assert_eq!(to_vec(&id).unwrap(), to_vec(&0xFFu128).unwrap());
        assert_eq!(id.to_string(), format!("{:032x}", 0xFF));
        assert!(ConnectionId::ZERO.is_zero());
    }

    #[test]
    fn test_timestamp_is_i64_micros() {
        let ts = Timestamp::from_micros_since_unix_epoch(-1);
        assert_eq!(to_vec(&ts).unwrap(), [0xFF; 8]);
        assert_eq!(ts.to_system_time(), UNIX_EPOCH - Duration::from_micros(1));
        assert_eq!(Timestamp::from_system_time(ts.to_system_time()), ts);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let a = Timestamp::from_micros_since_unix_epoch(1_000);
        let b = a.checked_add(TimeDuration::from_micros(500)).unwrap();
        assert_eq!(b.duration_since(a), Some(TimeDuration::from_micros(500)));
        assert_eq!(a.duration_since(b), Some(TimeDuration::from_micros(-500)));
        assert!(
            Timestamp::from_micros_since_unix_epoch(i64::MAX)
                .checked_add(TimeDuration::from_micros(1))
                .is_none()
        );
    }

    #[test]
    fn test_time_duration_conversions() {
        let d = TimeDuration::from(Duration::from_millis(3));
        assert_eq!(d.to_micros(), 3_000);
        assert_eq!(d.to_duration(), Some(Duration::from_millis(3)));
        assert_eq!(TimeDuration::from_micros(-7).to_duration(), None);
        assert_eq!(
            TimeDuration::from_micros(-7).to_duration_abs(),
            Duration::from_micros(7)
        );
    }

    #[test]
    fn test_schedule_at_wire_shape() {
        let at = ScheduleAt::Time(Timestamp::from_micros_since_unix_epoch(1));
        assert_eq!(at.tag(), 1);
        assert_eq!(to_vec(&at).unwrap(), [1, 1, 0, 0, 0, 0, 0, 0, 0]);

        let every = ScheduleAt::Interval(TimeDuration::from_micros(2));
        let bytes = to_vec(&every).unwrap();
        assert_eq!(bytes[0], 0);
        assert_eq!(from_slice::<ScheduleAt>(&bytes).unwrap(), every);
        assert!(from_slice::<ScheduleAt>(&[2, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }
}
