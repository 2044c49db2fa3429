//! The frozen field-order tables the delta codec walks by numeric index.
//!
//! These tables are position-sensitive: the wire only ever sends a field's *index*
//! into [`ENTITY_STATE_FIELDS`] / [`PLAYER_STATE_FIELDS`], never its name, so the order
//! below must match the recording engine's bit-for-bit. Expressed as arrays of function
//! pointers rather than a big match so the count (51 / 48) and the per-field reader call
//! live in one place each.

use crate::player::{EntityState, PlayerState, TrType};
use crate::protocol::{MAX_PERSISTANT, MAX_POWERUPS, MAX_STATS, MAX_WEAPONS};
use crate::reader::MessageReader;

pub const ENTITY_STATE_FIELD_COUNT: usize = 51;
pub const PLAYER_STATE_FIELD_COUNT: usize = 48;

type EntityFieldFn = fn(&mut EntityState, &mut MessageReader, bool);
type PlayerFieldFn = fn(&mut PlayerState, &mut MessageReader, bool);

fn ent_0(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_time = if reset { 0 } else { r.read_long() };
}
fn ent_1(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_base[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_2(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_base[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_3(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_delta[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_4(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_delta[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_5(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_base[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_6(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_base[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_7(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_delta[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_8(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_base[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_9(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.events = if reset { 0 } else { r.read_num_bits(10) };
}
fn ent_10(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.angles2[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_11(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.e_type = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_12(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.torso_anim = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_13(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.event_parm = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_14(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.legs_anim = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_15(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.ground_entity_num = if reset { 0 } else { r.read_num_bits(10) };
}
fn ent_16(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_type = if reset {
        TrType::Stationary
    } else {
        TrType::from_byte(r.read_byte())
    };
}
fn ent_17(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.e_flags = if reset { 0 } else { r.read_num_bits(19) };
}
fn ent_18(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.other_entity_num = if reset { 0 } else { r.read_num_bits(10) };
}
fn ent_19(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.weapon = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_20(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.client_num = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_21(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.angles[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_22(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.pos.tr_duration = if reset { 0 } else { r.read_long() };
}
fn ent_23(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_type = if reset {
        TrType::Stationary
    } else {
        TrType::from_byte(r.read_byte())
    };
}
fn ent_24(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.origin[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_25(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.origin[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_26(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.origin[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_27(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.solid = if reset { 0 } else { r.read_num_bits(24) };
}
fn ent_28(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.powerups = if reset { 0 } else { r.read_num_bits(16) };
}
fn ent_29(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.modelindex = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_30(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.other_entity_num2 = if reset { 0 } else { r.read_num_bits(10) };
}
fn ent_31(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.loop_sound = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_32(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.generic1 = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_33(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.origin2[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_34(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.origin2[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_35(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.origin2[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_36(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.modelindex2 = if reset { 0 } else { r.read_num_bits(8) };
}
fn ent_37(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.angles[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_38(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.time = if reset { 0 } else { r.read_long() };
}
fn ent_39(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_time = if reset { 0 } else { r.read_long() };
}
fn ent_40(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_duration = if reset { 0 } else { r.read_long() };
}
fn ent_41(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_base[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_42(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_delta[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_43(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_delta[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_44(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.apos.tr_delta[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_45(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.time2 = if reset { 0 } else { r.read_long() };
}
fn ent_46(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.angles[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_47(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.angles2[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_48(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.angles2[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ent_49(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.constant_light = if reset { 0 } else { r.read_long() };
}
fn ent_50(s: &mut EntityState, r: &mut MessageReader, reset: bool) {
    s.frame = if reset { 0 } else { r.read_num_bits(16) };
}

const ENTITY_STATE_FIELDS: [EntityFieldFn; ENTITY_STATE_FIELD_COUNT] = [
    ent_0, ent_1, ent_2, ent_3, ent_4, ent_5, ent_6, ent_7, ent_8, ent_9, ent_10, ent_11, ent_12,
    ent_13, ent_14, ent_15, ent_16, ent_17, ent_18, ent_19, ent_20, ent_21, ent_22, ent_23, ent_24,
    ent_25, ent_26, ent_27, ent_28, ent_29, ent_30, ent_31, ent_32, ent_33, ent_34, ent_35, ent_36,
    ent_37, ent_38, ent_39, ent_40, ent_41, ent_42, ent_43, ent_44, ent_45, ent_46, ent_47, ent_48,
    ent_49, ent_50,
];

/// Applies field `number` of a delta-entity update. `reset` zeroes the field instead of
/// reading it (the "this field reverted to its baseline" wire shorthand).
pub fn update_entity_state(state: &mut EntityState, number: usize, reader: &mut MessageReader, reset: bool) {
    if let Some(f) = ENTITY_STATE_FIELDS.get(number) {
        f(state, reader, reset);
    }
}

fn ps_0(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.command_time = if reset { 0 } else { r.read_long() };
}
fn ps_1(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.origin[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_2(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.origin[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_3(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.bob_cycle = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_4(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.velocity[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_5(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.velocity[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_6(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.viewangles[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_7(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.viewangles[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_8(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.weapon_time = if reset { 0 } else { r.read_num_bits(-16) };
}
fn ps_9(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.origin[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_10(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.velocity[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_11(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.legs_timer = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_12(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.pm_time = if reset { 0 } else { r.read_num_bits(-16) };
}
fn ps_13(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.event_sequence = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_14(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.torso_anim = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_15(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.movement_dir = if reset { 0 } else { r.read_num_bits(4) };
}
fn ps_16(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.events[0] = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_17(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.legs_anim = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_18(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.events[1] = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_19(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.pm_flags = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_20(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.ground_entity_num = if reset { 0 } else { r.read_num_bits(10) };
}
fn ps_21(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.weaponstate = if reset { 0 } else { r.read_num_bits(4) };
}
fn ps_22(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.e_flags = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_23(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.external_event = if reset { 0 } else { r.read_num_bits(10) };
}
fn ps_24(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.gravity = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_25(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.speed = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_26(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.delta_angles[1] = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_27(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.external_event_parm = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_28(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.viewheight = if reset { 0 } else { r.read_num_bits(-8) };
}
fn ps_29(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.damage_event = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_30(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.damage_yaw = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_31(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.damage_pitch = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_32(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.damage_count = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_33(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.generic1 = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_34(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.pm_type = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_35(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.delta_angles[0] = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_36(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.delta_angles[2] = if reset { 0 } else { r.read_num_bits(16) };
}
fn ps_37(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.torso_timer = if reset { 0 } else { r.read_num_bits(12) };
}
fn ps_38(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.event_parms[0] = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_39(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.event_parms[1] = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_40(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.client_num = if reset { 0 } else { r.read_num_bits(8) };
}
fn ps_41(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.weapon = if reset { 0 } else { r.read_num_bits(5) };
}
fn ps_42(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.viewangles[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_43(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.grapple_point[0] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_44(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.grapple_point[1] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_45(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.grapple_point[2] = if reset { 0.0 } else { r.read_float_integral() };
}
fn ps_46(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.jumppad_ent = if reset { 0 } else { r.read_num_bits(10) };
}
fn ps_47(s: &mut PlayerState, r: &mut MessageReader, reset: bool) {
    s.loop_sound = if reset { 0 } else { r.read_num_bits(16) };
}

const PLAYER_STATE_FIELDS: [PlayerFieldFn; PLAYER_STATE_FIELD_COUNT] = [
    ps_0, ps_1, ps_2, ps_3, ps_4, ps_5, ps_6, ps_7, ps_8, ps_9, ps_10, ps_11, ps_12, ps_13, ps_14,
    ps_15, ps_16, ps_17, ps_18, ps_19, ps_20, ps_21, ps_22, ps_23, ps_24, ps_25, ps_26, ps_27,
    ps_28, ps_29, ps_30, ps_31, ps_32, ps_33, ps_34, ps_35, ps_36, ps_37, ps_38, ps_39, ps_40,
    ps_41, ps_42, ps_43, ps_44, ps_45, ps_46, ps_47,
];

/// `PlayerState` updates are never `reset` — the wire only ever writes real values here.
pub fn update_player_state(state: &mut PlayerState, number: usize, reader: &mut MessageReader) {
    if let Some(f) = PLAYER_STATE_FIELDS.get(number) {
        f(state, reader, false);
    }
}

/// Reads a delta entity update: removal sentinel, unchanged-entity shorthand, or a
/// field-count-prefixed walk over [`update_entity_state`].
pub fn read_delta_entity(
    reader: &mut MessageReader,
    state: &mut EntityState,
    number: i64,
) -> Result<bool, crate::error::ParseError> {
    use crate::protocol::MAX_GENTITIES;

    if reader.read_num_bits(1) == 1 {
        state.number = (MAX_GENTITIES - 1) as i64;
        return Ok(true);
    }
    if reader.read_num_bits(1) == 0 {
        state.number = number;
        return Ok(true);
    }
    let count = reader.read_byte();
    if count < 0 || count as usize > ENTITY_STATE_FIELD_COUNT {
        return Err(crate::error::ParseError::InvalidFieldCount);
    }
    state.number = number;
    for index in 0..count as usize {
        if reader.read_num_bits(1) == 0 {
            continue;
        }
        let reset = reader.read_num_bits(1) == 0;
        update_entity_state(state, index, reader, reset);
    }
    Ok(true)
}

/// Reads a delta player-state update: the field walk, then the four bitmask-gated
/// stat/persistant/ammo/powerup arrays.
pub fn read_delta_player_state(
    reader: &mut MessageReader,
    state: &mut PlayerState,
) -> Result<bool, crate::error::ParseError> {
    let count = reader.read_byte();
    if count < 0 || count as usize > PLAYER_STATE_FIELD_COUNT {
        return Err(crate::error::ParseError::InvalidFieldCount);
    }
    for index in 0..count as usize {
        if reader.read_num_bits(1) == 0 {
            continue;
        }
        update_player_state(state, index, reader);
    }
    if reader.read_num_bits(1) != 0 {
        if reader.read_num_bits(1) != 0 {
            reader.read_ps_array(&mut state.stats, MAX_STATS);
        }
        if reader.read_num_bits(1) != 0 {
            reader.read_ps_array(&mut state.persistant, MAX_PERSISTANT);
        }
        if reader.read_num_bits(1) != 0 {
            reader.read_ps_array(&mut state.ammo, MAX_WEAPONS);
        }
        if reader.read_num_bits(1) != 0 {
            reader.read_ps_long_array(&mut state.powerups, MAX_POWERUPS);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_table_lengths_match_the_wire_contract() {
        assert_eq!(ENTITY_STATE_FIELDS.len(), 51);
        assert_eq!(PLAYER_STATE_FIELDS.len(), 48);
    }

    #[test]
    fn reset_zeroes_a_long_field_without_touching_the_reader() {
        let mut state = EntityState::default();
        state.pos.tr_time = 42;
        // A reader built from an empty buffer would return -1/EOD on any real read, so
        // a reset field must never call into it.
        let mut reader = MessageReader::new(&[]);
        update_entity_state(&mut state, 0, &mut reader, true);
        assert_eq!(state.pos.tr_time, 0);
    }
}
