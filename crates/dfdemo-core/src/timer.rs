//! Decodes the obfuscated Defrag timer value packed into `ps.stats[7..9]`.
//!
//! Defrag hides the running timer from casual memory scanning behind a reversible
//! byte-shuffle and a checksum. Every step below is fixed 32-bit unsigned arithmetic —
//! widening any intermediate to `i64`/`u64` changes the result, so this stays on `u32`
//! throughout rather than reusing the `i64` convention the rest of the crate uses for
//! wire-read values.

use crate::player::PlayerState;

pub struct TimeResult {
    pub time: u32,
    pub has_error: bool,
}

/// `df_ver`/`checksum` come from [`crate::client::ClientState::dfvers`] and
/// [`crate::client::map_checksum`]; both must be known before a timer value means
/// anything, which is why callers gate on them first (see
/// [`crate::snapshot::Engine::update_client_events`]).
pub fn get_time(ps: &PlayerState, server_time: u32, df_ver: u32, checksum: u32, is_online: bool, is_cheats_on: bool) -> TimeResult {
    let mut value = ((ps.stats[7] as u32) << 16) | (ps.stats[8] as u32 & 0xFFFF);
    if value == 0 {
        return TimeResult { time: 0, has_error: false };
    }
    if (is_online && df_ver != 190) || (df_ver >= 19112 && is_cheats_on) {
        return TimeResult { time: value, has_error: false };
    }

    value ^= (ps.origin[0].abs() as i64 as u32) & 0xFFFF;
    value ^= (ps.velocity[0].abs() as i64 as u32) << 16;
    value ^= if ps.stats[0] > 0 { ps.stats[0] as u32 & 0xFF } else { 150 };
    value ^= ((ps.movement_dir as u32) & 0xF) << 28;

    let mut shift = 24i32;
    while shift > 0 {
        let temp = ((value >> shift) ^ (value >> (shift - 8))) & 0xFF;
        value = (value & !(0xFFu32 << shift)) | (temp << shift);
        shift -= 8;
    }

    let mut local = (server_time << 2) as u32;
    local = local.wrapping_add((df_ver.wrapping_add(checksum)) << 8);
    local ^= server_time << 24;
    value ^= local;

    local = (value >> 28) & 0xF;
    local |= (!local & 0xF) << 4;
    local |= local << 8;
    local |= local << 16;
    value ^= local;

    local = (value >> 22) & 0x3F;
    value &= 0x3F_FFFF;
    let mut local_sum = 0u32;
    for idx in 0..3 {
        local_sum += (value >> (6 * idx)) & 0x3F;
    }
    local_sum += (value >> 18) & 0xF;
    let has_error = local != (local_sum & 0x3F);

    TimeResult { time: value, has_error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stats_give_zero_time_with_no_error() {
        let ps = PlayerState::default();
        let result = get_time(&ps, 1000, 190, 42, false, false);
        assert_eq!(result.time, 0);
        assert!(!result.has_error);
    }

    #[test]
    fn online_mismatched_version_skips_descrambling() {
        let mut ps = PlayerState::default();
        ps.stats[7] = 1;
        ps.stats[8] = 2;
        let result = get_time(&ps, 1000, 191, 42, true, false);
        assert_eq!(result.time, (1u32 << 16) | 2);
        assert!(!result.has_error);
    }
}
