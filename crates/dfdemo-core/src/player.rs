use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum TrType {
    Stationary = 0,
    Interpolate = 1,
    Linear = 2,
    LinearStop = 3,
    Sine = 4,
    Gravity = 5,
}

impl Default for TrType {
    fn default() -> Self {
        TrType::Stationary
    }
}

impl TrType {
    pub fn from_byte(byte: i64) -> Self {
        TrType::from_i64(byte).unwrap_or(TrType::Stationary)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub tr_type: TrType,
    pub tr_time: i64,
    pub tr_duration: i64,
    pub tr_base: [f64; 3],
    pub tr_delta: [f64; 3],
}

/// Delta-decoded entity state. Field order and reader kind for each numbered slot
/// live in [`crate::mapper::update_entity_state`] — this struct only holds storage.
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub number: i64,
    pub e_type: i64,
    pub e_flags: i64,
    pub pos: Trajectory,
    pub apos: Trajectory,
    pub time: i64,
    pub time2: i64,
    pub origin: [f64; 3],
    pub origin2: [f64; 3],
    pub angles: [f64; 3],
    pub angles2: [f64; 3],
    pub other_entity_num: i64,
    pub other_entity_num2: i64,
    pub ground_entity_num: i64,
    pub constant_light: i64,
    pub loop_sound: i64,
    pub modelindex: i64,
    pub modelindex2: i64,
    pub client_num: i64,
    pub frame: i64,
    pub solid: i64,
    pub events: i64,
    pub event_parm: i64,
    pub powerups: i64,
    pub weapon: i64,
    pub legs_anim: i64,
    pub torso_anim: i64,
    pub generic1: i64,
}

/// Delta-decoded player state. Field order and reader kind live in
/// [`crate::mapper::update_player_state`].
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub command_time: i64,
    pub pm_type: i64,
    pub bob_cycle: i64,
    pub pm_flags: i64,
    pub pm_time: i64,
    pub origin: [f64; 3],
    pub velocity: [f64; 3],
    pub weapon_time: i64,
    pub gravity: i64,
    pub speed: i64,
    pub delta_angles: [i64; 3],
    pub ground_entity_num: i64,
    pub legs_timer: i64,
    pub legs_anim: i64,
    pub torso_timer: i64,
    pub torso_anim: i64,
    pub movement_dir: i64,
    pub grapple_point: [f64; 3],
    pub e_flags: i64,
    pub event_sequence: i64,
    pub events: [i64; 2],
    pub event_parms: [i64; 2],
    pub external_event: i64,
    pub external_event_parm: i64,
    pub external_event_time: i64,
    pub client_num: i64,
    pub weapon: i64,
    pub weaponstate: i64,
    pub viewangles: [f64; 3],
    pub viewheight: i64,
    pub damage_event: i64,
    pub damage_yaw: i64,
    pub damage_pitch: i64,
    pub damage_count: i64,
    pub stats: [i64; 16],
    pub persistant: [i64; 16],
    pub powerups: [i64; 16],
    pub ammo: [i64; 16],
    pub generic1: i64,
    pub loop_sound: i64,
    pub jumppad_ent: i64,
    pub ping: i64,
    pub pmove_framecount: i64,
    pub jumppad_frame: i64,
    pub entity_event_sequence: i64,
}

/// `ps.stats[12]` index — running/finished/checkpoint flags live here.
pub const STAT_USER: usize = 12;
pub const STAT_HEALTH: usize = 0;
pub const STAT_TIMER_UPPER: usize = 7;
pub const STAT_TIMER_LOWER: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_byte_maps_known_trajectory_kinds() {
        assert_eq!(TrType::from_byte(0), TrType::Stationary);
        assert_eq!(TrType::from_byte(5), TrType::Gravity);
    }

    #[test]
    fn from_byte_falls_back_to_stationary_for_unknown_values() {
        assert_eq!(TrType::from_byte(99), TrType::Stationary);
    }
}
