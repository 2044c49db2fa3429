//! The snapshot engine: walks server messages into parsed game state and reconstructs
//! the timeline of [`ClientEvent`]s a run is later built from.

use tracing::debug;

use crate::client::{map_checksum, CLSnapshot, ClientConnection, ClientState};
use crate::error::ParseError;
use crate::events::{ClientEvent, PlayerMode};
use crate::mapper::{read_delta_entity, read_delta_player_state};
use crate::player::EntityState;
use crate::protocol::{
    svc, GENTITYNUM_BITS, MAX_CONFIGSTRINGS, MAX_GENTITIES, MAX_MAP_AREA_BYTES,
    MAX_PARSE_ENTITIES, PACKET_BACKUP, PACKET_MASK, Q3_DEMO_CFG_FIELD_CLIENT,
    Q3_DEMO_CFG_FIELD_GAME,
};
use crate::reader::MessageReader;
use crate::stream::DemoMessage;
use crate::timer;
use crate::util::split_config;

/// Owns [`ClientConnection`] and [`ClientState`] and mutates them one demo message at a
/// time. Mirrors the reference decoder's per-demo parser object — one `Engine` per file.
#[derive(Default)]
pub struct Engine {
    pub clc: ClientConnection,
    pub client: ClientState,
    server_time: i64,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one demo message. Returns `false` only if the caller should stop
    /// reading further messages (never happens on a well-formed demo, but an unknown
    /// top-level command ends this message's processing rather than panicking).
    pub fn parse(&mut self, message: &DemoMessage) -> bool {
        self.server_time = 0;
        self.clc.server_message_sequence = message.sequence as i64;
        let mut reader = MessageReader::new(&message.data);
        reader.read_long();
        while !reader.is_eod() {
            let command = reader.read_byte();
            if command == svc::BAD as i64 || command == svc::NOP as i64 || command == svc::EOF as i64 {
                return true;
            }
            if command == svc::SERVERCOMMAND as i64 {
                self.parse_server_command(&mut reader);
            } else if command == svc::GAMESTATE as i64 {
                self.parse_game_state(&mut reader);
            } else if command == svc::SNAPSHOT as i64 {
                self.parse_snapshot(&mut reader);
            } else {
                return true;
            }
        }
        true
    }

    fn parse_server_command(&mut self, reader: &mut MessageReader) {
        let key = reader.read_long();
        let value = reader.read_string();
        self.clc.console.insert(key, (self.server_time, value));
    }

    fn parse_game_state(&mut self, reader: &mut MessageReader) {
        reader.read_long();
        loop {
            let command = reader.read_byte();
            if command == svc::EOF as i64 {
                break;
            }
            if command == svc::CONFIGSTRING as i64 {
                let key = reader.read_short();
                if key < 0 || key > MAX_CONFIGSTRINGS as i64 {
                    return;
                }
                let value = reader.read_big_string();
                self.clc.configs.insert(key, value);
            } else if command == svc::BASELINE as i64 {
                let newnum = reader.read_num_bits(GENTITYNUM_BITS);
                if newnum < 0 || newnum >= MAX_GENTITIES as i64 {
                    self.log_error(ParseError::BaselineOutOfRange);
                    return;
                }
                let mut entity = self.clc.entity_baselines.entry(newnum).or_default().clone();
                match read_delta_entity(reader, &mut entity, newnum) {
                    Ok(true) => {
                        self.clc.entity_baselines.insert(newnum, entity);
                    }
                    _ => {
                        self.log_error(ParseError::UnableToParseDeltaEntityState);
                        return;
                    }
                }
            } else {
                self.log_error(ParseError::BadCommandInParseGameState);
                return;
            }
        }
        self.clc.client_num = reader.read_long();
        self.clc.checksum_feed = reader.read_long();
    }

    fn parse_snapshot(&mut self, reader: &mut MessageReader) {
        if self.client.client_config.is_none() {
            self.client.client_config = Some(Default::default());
            if let Some(game_cfg) = self.clc.configs.get(&(Q3_DEMO_CFG_FIELD_GAME as i64)) {
                let game_config = split_config(game_cfg);
                self.client.is_cheats_on = game_config
                    .get("sv_cheats")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(0)
                    > 0;
            }
            if let Some(client_cfg) = self.clc.configs.get(&(Q3_DEMO_CFG_FIELD_CLIENT as i64)) {
                let client_config = split_config(client_cfg);
                self.client.dfvers = client_config
                    .get("defrag_vers")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(0);
                self.client.mapname = client_config.get("mapname").cloned().unwrap_or_default();
                self.client.map_name_checksum = map_checksum(&self.client.mapname);
                self.client.is_online = client_config
                    .get("defrag_gametype")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(0)
                    > 4;
                self.client.client_config = Some(client_config);
            }
        }

        let mut new_snap = CLSnapshot::default();
        new_snap.server_command_num = self.clc.server_command_sequence;
        new_snap.server_time = reader.read_long();
        new_snap.message_num = self.clc.server_message_sequence;
        self.server_time = new_snap.server_time;
        let delta_num_byte = reader.read_byte();
        new_snap.delta_num = if delta_num_byte == 0 {
            -1
        } else {
            new_snap.message_num - delta_num_byte
        };
        new_snap.snap_flags = reader.read_byte();

        let mut old_snapshot: Option<CLSnapshot> = None;
        if new_snap.delta_num <= 0 {
            new_snap.valid = true;
            self.clc.demowaiting = false;
        } else {
            let key = new_snap.delta_num & PACKET_MASK as i64;
            let candidate = self.client.snapshots.entry(key).or_default().clone();
            if !candidate.valid {
                self.log_error(ParseError::DeltaFromInvalidFrame);
            } else if candidate.message_num != new_snap.delta_num {
                self.log_error(ParseError::DeltaFrameTooOld);
            } else if (self.client.parse_entities_num - candidate.parse_entities_num)
                > (MAX_PARSE_ENTITIES as i64 - 128)
            {
                self.log_error(ParseError::DeltaParseEntitiesNumTooOld);
            } else {
                new_snap.valid = true;
            }
            old_snapshot = Some(candidate);
        }

        let length = reader.read_byte();
        if length > MAX_MAP_AREA_BYTES as i64 {
            self.log_error(ParseError::ParseSnapshotInvalidSize);
            return;
        }
        let mut areamask = vec![0u8; length as usize];
        reader.read_data(&mut areamask);
        new_snap.areamask = areamask;

        if let Some(old) = &old_snapshot {
            new_snap.ps = old.ps.clone();
        }
        let _ = read_delta_player_state(reader, &mut new_snap.ps);

        self.parse_packet_entities(reader, old_snapshot.as_ref(), &mut new_snap);

        if !new_snap.valid {
            return;
        }

        let mut old_message = self.client.snap.message_num + 1;
        if new_snap.message_num - old_message >= PACKET_BACKUP as i64 {
            old_message = new_snap.message_num - (PACKET_BACKUP as i64 - 1);
        }
        for message_num in old_message..new_snap.message_num {
            if let Some(stored) = self.client.snapshots.get_mut(&(message_num & PACKET_MASK as i64)) {
                stored.valid = false;
            }
        }

        self.client.snap = new_snap.clone();
        self.client.snap.ping = 0;
        self.client
            .snapshots
            .insert(self.client.snap.message_num & PACKET_MASK as i64, self.client.snap.clone());
        self.client.new_snapshots = true;
        self.update_client_events(&self.client.snap.clone());
    }

    fn update_client_events(&mut self, snapshot: &CLSnapshot) {
        if self.client.dfvers <= 0 || self.client.mapname.is_empty() {
            return;
        }
        let result = timer::get_time(
            &snapshot.ps,
            snapshot.server_time as u32,
            self.client.dfvers as u32,
            self.client.map_name_checksum as u32,
            self.client.is_online,
            self.client.is_cheats_on,
        );
        let mut event = ClientEvent::new(result.time as i64, result.has_error, snapshot);

        let new_stat = snapshot.ps.stats[12];
        let mut prev_stat = 0;

        if let Some(previous_idx) = self.client.client_events.len().checked_sub(1) {
            let is_normal = snapshot.ps.pm_type == PlayerMode::Normal as i64;
            let (prev_player_num, prev_player_mode, prev_user_stat, prev_event_finish) = {
                let previous = &self.client.client_events[previous_idx];
                (previous.player_num, previous.player_mode, previous.user_stat, previous.event_finish)
            };
            if prev_player_num != snapshot.ps.client_num {
                event.event_change_user = true;
            }
            if prev_player_mode != snapshot.ps.pm_type {
                event.event_change_pm_type = true;
            }
            prev_stat = prev_user_stat;
            let prev_normal = prev_player_mode == PlayerMode::Normal as i64;

            if prev_stat != new_stat {
                if (prev_stat & 4) != (new_stat & 4) {
                    if is_normal {
                        if (prev_stat & 2) == 0 {
                            event.event_start_time = true;
                        } else {
                            event.event_time_reset = true;
                        }
                    }
                } else if (prev_stat & 8) != (new_stat & 8) {
                    if (is_normal || prev_normal) && !event.event_change_user {
                        event.event_finish = true;
                    }
                } else if (prev_stat & 16) != (new_stat & 16) {
                    if is_normal {
                        event.event_check_point = true;
                    }
                } else if prev_event_finish && (prev_stat & 2) != 0 && (new_stat & 2) == 0 {
                    if (is_normal || prev_normal) && !event.event_change_user {
                        self.client.client_events[previous_idx].event_finish = false;
                        if !self.client.client_events[previous_idx].has_any_event() {
                            self.client.client_events.pop();
                        }
                        event.event_finish = true;
                    }
                } else {
                    let previous_start_time = self.client.client_events.last().map(|e| e.event_start_time).unwrap_or(false);
                    let previous_time_reset = self.client.client_events.last().map(|e| e.event_time_reset).unwrap_or(false);
                    if previous_start_time && (prev_stat & 2) == 0 && (new_stat & 2) != 0 {
                        if is_normal {
                            if let Some(last) = self.client.client_events.last_mut() {
                                last.event_start_time = false;
                            }
                            let drop = !self.client.client_events.last().map(|e| e.has_any_event()).unwrap_or(false);
                            if drop {
                                self.client.client_events.pop();
                            }
                            event.event_start_time = true;
                        }
                    } else if previous_time_reset && (prev_stat & 4) == 0 && (new_stat & 2) != 0 {
                        if is_normal {
                            if let Some(last) = self.client.client_events.last_mut() {
                                last.event_time_reset = false;
                            }
                            let drop = !self.client.client_events.last().map(|e| e.has_any_event()).unwrap_or(false);
                            if drop {
                                self.client.client_events.pop();
                            }
                            event.event_time_reset = true;
                        }
                    } else {
                        event.event_some_trigger = true;
                    }
                }
            }
        } else {
            event.event_start_file = true;
            if snapshot.ps.pm_type == PlayerMode::Normal as i64 && (prev_stat & 4) != (new_stat & 4) && (prev_stat & 2) == 0 {
                event.event_start_time = true;
            }
        }

        let x_vel = snapshot.ps.velocity[0].abs();
        let y_vel = snapshot.ps.velocity[1].abs();
        let speed = (x_vel * x_vel + y_vel * y_vel).sqrt() as i64;
        event.speed = speed;
        if speed > self.client.max_speed {
            self.client.max_speed = speed;
        }
        if event.has_any_event() {
            self.client.client_events.push(event.clone());
        }
        self.client.last_client_event = Some(event);
    }

    fn parse_packet_entities(&mut self, reader: &mut MessageReader, oldframe: Option<&CLSnapshot>, newframe: &mut CLSnapshot) {
        newframe.parse_entities_num = self.client.parse_entities_num;
        newframe.num_entities = 0;

        let mut oldindex: i64 = 0;
        let (mut oldnum, mut oldstate) = match oldframe {
            Some(old) if old.num_entities != 0 => {
                let key = (old.parse_entities_num + oldindex) & (MAX_PARSE_ENTITIES as i64 - 1);
                let state = self.client.parse_entities.entry(key).or_default().clone();
                let num = state.number;
                (num, Some(state))
            }
            _ => (99999, None),
        };

        loop {
            let newnum = reader.read_num_bits(GENTITYNUM_BITS);
            if newnum == MAX_GENTITIES as i64 - 1 {
                break;
            }
            if reader.is_eod() {
                self.log_error(ParseError::ParsePacketEntitiesEndOfMessage);
                return;
            }
            while oldframe.is_some() && oldnum < newnum {
                self.cl_delta_entity(reader, newframe, oldnum, oldstate.as_ref(), true);
                oldindex += 1;
                if oldindex >= oldframe.unwrap().num_entities {
                    oldnum = 99999;
                    oldstate = None;
                } else {
                    let key = (oldframe.unwrap().parse_entities_num + oldindex) & (MAX_PARSE_ENTITIES as i64 - 1);
                    let state = self.client.parse_entities.entry(key).or_default().clone();
                    oldnum = state.number;
                    oldstate = Some(state);
                }
            }
            if oldframe.is_some() && oldnum == newnum {
                self.cl_delta_entity(reader, newframe, newnum, oldstate.as_ref(), false);
                oldindex += 1;
                if oldindex >= oldframe.unwrap().num_entities {
                    oldnum = 99999;
                    oldstate = None;
                } else {
                    let key = (oldframe.unwrap().parse_entities_num + oldindex) & (MAX_PARSE_ENTITIES as i64 - 1);
                    let state = self.client.parse_entities.entry(key).or_default().clone();
                    oldnum = state.number;
                    oldstate = Some(state);
                }
                continue;
            }
            if oldnum > newnum || oldframe.is_none() {
                let baseline = self.client.entity_baselines.entry(newnum).or_default().clone();
                self.cl_delta_entity(reader, newframe, newnum, Some(&baseline), false);
            }
        }

        while oldframe.is_some() && oldnum != 99999 {
            self.cl_delta_entity(reader, newframe, oldnum, oldstate.as_ref(), true);
            oldindex += 1;
            if oldindex >= oldframe.unwrap().num_entities {
                break;
            }
            let key = (oldframe.unwrap().parse_entities_num + oldindex) & (MAX_PARSE_ENTITIES as i64 - 1);
            let state = self.client.parse_entities.entry(key).or_default().clone();
            oldnum = state.number;
            oldstate = Some(state);
        }
    }

    /// The decode target is always the stale ring-buffer slot at the current write
    /// index, not `old` — `old` is only consulted on the `unchanged` shorthand, which
    /// matches the reference decoder's `readDeltaEntity` taking no baseline parameter
    /// at all. This looks surprising next to ioquake3's own `MSG_ReadDeltaEntity`
    /// (which always does `*to = *from` first) but it's what the reference decoder
    /// actually does, so it's preserved rather than "corrected".
    fn cl_delta_entity(&mut self, reader: &mut MessageReader, frame: &mut CLSnapshot, newnum: i64, old: Option<&EntityState>, unchanged: bool) {
        let key = self.client.parse_entities_num & (MAX_PARSE_ENTITIES as i64 - 1);
        let mut state = self.client.parse_entities.entry(key).or_default().clone();
        if unchanged {
            if let Some(old) = old {
                state = old.clone();
            }
        } else {
            let _ = read_delta_entity(reader, &mut state, newnum);
        }
        if state.number == MAX_GENTITIES as i64 - 1 {
            return;
        }
        self.client.parse_entities.insert(key, state);
        self.client.parse_entities_num += 1;
        frame.num_entities += 1;
    }

    fn log_error(&mut self, error: ParseError) {
        debug!(%error, "demo parse error");
        self.clc.errors.insert(error.to_string(), String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_engine_has_no_client_events() {
        let engine = Engine::new();
        assert!(engine.client.client_events.is_empty());
    }

    #[test]
    fn update_client_events_is_a_noop_before_dfvers_known() {
        let mut engine = Engine::new();
        let snap = CLSnapshot::default();
        engine.update_client_events(&snap);
        assert!(engine.client.client_events.is_empty());
        assert!(engine.client.last_client_event.is_none());
    }
}
