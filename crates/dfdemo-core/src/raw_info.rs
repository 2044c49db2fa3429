//! Turns the raw parsed-out connection/client state into the demo-level facts
//! downstream naming logic actually cares about: who was playing, what server
//! mod/gametype it was, and which client event actually represents the finish.

use std::collections::HashMap;

use crate::client::{ClientConnection, ClientState};
use crate::console::{remove_colors, remove_non_ascii, ConsoleCommandsParser};
use crate::events::ClientEvent;
use crate::game_info::GameInfo;
use crate::protocol::{Q3_DEMO_CFG_FIELD_CLIENT, Q3_DEMO_CFG_FIELD_GAME, Q3_DEMO_CFG_FIELD_PLAYER};
use crate::util::split_config;

pub const KEY_DEMO_NAME: &str = "demoname";
pub const KEY_PLAYER: &str = "player";
pub const KEY_CLIENT: &str = "client";
pub const KEY_ERRORS: &str = "errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishType {
    Incorrect,
    CorrectStart,
    CorrectTr,
}

pub struct RawInfo {
    pub demo_path: String,
    pub raw_config: HashMap<i64, String>,
    pub console_commands_parser: ConsoleCommandsParser,
    pub client_events: Vec<ClientEvent>,
    pub last_client_event: Option<ClientEvent>,
    pub fin: Option<(FinishType, ClientEvent)>,
    pub max_speed: i64,
    pub is_cpm_in_snapshots: Option<bool>,
    pub game_info: GameInfo,
    client_num: i64,
    errors: HashMap<String, String>,
    friendly_info: Option<HashMap<String, HashMap<String, String>>>,
    player_configs: HashMap<i64, HashMap<String, String>>,
}

impl RawInfo {
    pub fn new(demo_path: impl Into<String>, clc: &ClientConnection, client: &ClientState) -> Self {
        let raw_config = clc.configs.clone();
        let console_commands_parser =
            ConsoleCommandsParser::new(clc.console.values().map(|(_, value)| value.as_str()));
        let mut client_events = client.client_events.clone();
        let last_client_event = client.last_client_event.clone();

        let mut info = RawInfo {
            demo_path: demo_path.into(),
            raw_config,
            console_commands_parser,
            client_events: Vec::new(),
            last_client_event,
            fin: None,
            max_speed: client.max_speed,
            is_cpm_in_snapshots: client.is_cpm_in_snapshots,
            game_info: GameInfo::default(),
            client_num: clc.client_num,
            errors: clc.errors.clone(),
            friendly_info: None,
            player_configs: HashMap::new(),
        };
        info.fin = info.get_correct_finish_event(&mut client_events);
        info.client_events = client_events;
        info.game_info = info.build_game_info();
        info
    }

    pub fn get_friendly_info(&mut self) -> &HashMap<String, HashMap<String, String>> {
        if self.friendly_info.is_none() {
            let mut info = HashMap::new();

            if let Some(client_cfg) = self.raw_config.get(&(Q3_DEMO_CFG_FIELD_CLIENT as i64)) {
                let client_info = split_config(client_cfg);
                if !client_info.is_empty() {
                    info.insert(KEY_CLIENT.to_string(), client_info);
                }
            }

            let client_num = self.client_num;
            if let Some(player_info) = self.get_player_info_by_player_num(client_num) {
                info.insert(KEY_PLAYER.to_string(), player_info.clone());
            }

            if !self.errors.is_empty() {
                let errors: HashMap<String, String> = self
                    .errors
                    .keys()
                    .enumerate()
                    .map(|(idx, message)| ((idx + 1).to_string(), message.clone()))
                    .collect();
                info.insert(KEY_ERRORS.to_string(), errors);
            }

            self.friendly_info = Some(info);
        }
        self.friendly_info.as_ref().unwrap()
    }

    pub fn get_player_info_by_player_num(&mut self, client_num: i64) -> Option<&HashMap<String, String>> {
        let key = Q3_DEMO_CFG_FIELD_PLAYER as i64 + client_num;
        if !self.player_configs.contains_key(&key) {
            let cfg = self.raw_config.get(&key)?.clone();
            let split = Self::split_config_player(&cfg);
            self.player_configs.insert(key, split);
        }
        self.player_configs.get(&key)
    }

    pub fn get_player_info_by_player_name(&mut self, player_name: Option<&str>) -> Option<HashMap<String, String>> {
        let player_name = player_name?;
        if player_name.is_empty() {
            return None;
        }
        for idx in 0..32 {
            if let Some(info) = self.get_player_info_by_player_num(idx) {
                if info.get("name").map(String::as_str) == Some(player_name) {
                    return Some(info.clone());
                }
            }
        }
        None
    }

    fn build_game_info(&self) -> GameInfo {
        let client_cfg = self
            .raw_config
            .get(&(Q3_DEMO_CFG_FIELD_CLIENT as i64))
            .map(|s| split_config(s))
            .unwrap_or_default();
        let game_cfg = self
            .raw_config
            .get(&(Q3_DEMO_CFG_FIELD_GAME as i64))
            .map(|s| split_config(s))
            .unwrap_or_default();
        let additional = self
            .console_commands_parser
            .additional_infos
            .last()
            .map(|info| info.to_dictionary())
            .unwrap_or_default();

        let mut parameters: HashMap<String, String> = HashMap::new();
        for (k, v) in client_cfg.into_iter().chain(game_cfg).chain(additional) {
            parameters.insert(k.to_lowercase(), v);
        }
        GameInfo::new(&parameters, self.is_cpm_in_snapshots)
    }

    /// Walks the event list from the end, picking the fastest confirmed finish. Every
    /// iteration of the inner backward walk stamps `time_by_server_time` on the
    /// candidate finish event even when correctness isn't established yet — the
    /// original decoder does this unconditionally, not just on confirmation, and a
    /// later walk (from an earlier finish) can still observe that stamped value.
    fn get_correct_finish_event(&self, events: &mut [ClientEvent]) -> Option<(FinishType, ClientEvent)> {
        let mut correct: Vec<(FinishType, usize)> = Vec::new();
        for idx in (0..events.len()).rev() {
            let finish_type = Self::is_finish_correct(events, idx);
            if finish_type != FinishType::Incorrect && events[idx].time_no_error() > 0 {
                correct.push((finish_type, idx));
            }
        }
        correct
            .into_iter()
            .min_by_key(|(_, idx)| events[*idx].time_no_error())
            .map(|(ft, idx)| (ft, events[idx].clone()))
    }

    fn is_finish_correct(events: &mut [ClientEvent], index: usize) -> FinishType {
        if !events[index].event_finish {
            return FinishType::Incorrect;
        }
        let mut prev_index = index;
        while prev_index > 0 {
            prev_index -= 1;
            let prev = events[prev_index].clone();
            if prev.event_change_pm_type || prev.event_finish {
                return FinishType::Incorrect;
            }
            let server_time_delta = events[index].server_time - prev.server_time;
            events[index].time_by_server_time = server_time_delta;
            if prev.event_time_reset {
                return FinishType::CorrectTr;
            }
            if prev.event_start_time {
                return if Self::has_start_before(events, prev_index) {
                    FinishType::CorrectTr
                } else {
                    FinishType::CorrectStart
                };
            }
            if prev.event_start_file || prev.event_change_user {
                return FinishType::Incorrect;
            }
        }
        FinishType::Incorrect
    }

    fn has_start_before(events: &[ClientEvent], index: usize) -> bool {
        let mut prev_index = index;
        while prev_index > 0 {
            prev_index -= 1;
            let prev = &events[prev_index];
            if prev.event_change_pm_type || prev.event_change_user {
                return false;
            }
            if prev.event_start_time || prev.event_time_reset {
                return true;
            }
        }
        false
    }

    fn split_config_player(src: &str) -> HashMap<String, String> {
        let split = split_config(src);
        let replaces: &[(&str, &str)] = &[
            ("n", "name"),
            ("dfn", "df_name"),
            ("t", "team"),
            ("c1", "color1"),
            ("c2", "color2"),
            ("hc", "maxHealth"),
            ("w", "wins"),
            ("l", "losses"),
            ("tt", "teamTask"),
            ("tl", "teamLeader"),
        ];
        let mut result: HashMap<String, String> = HashMap::new();
        for (key, value) in split {
            let mapped_key = replaces
                .iter()
                .find(|(short, _)| *short == key)
                .map(|(_, long)| long.to_string())
                .unwrap_or(key);
            result.insert(mapped_key, value);
        }
        if let Some(name) = result.get("name").cloned() {
            let uncolored = remove_colors(&name).unwrap_or_else(|| name.clone());
            let uncolored = remove_non_ascii(&uncolored).unwrap_or(uncolored);
            if uncolored != name {
                result.insert("uncoloredName".to_string(), uncolored);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(finish: bool, server_time: i64, time: i64) -> ClientEvent {
        ClientEvent {
            event_finish: finish,
            server_time,
            time,
            ..Default::default()
        }
    }

    #[test]
    fn is_finish_correct_rejects_finish_with_no_predecessor() {
        let mut events = vec![event(true, 1000, 500)];
        assert_eq!(RawInfo::is_finish_correct(&mut events, 0), FinishType::Incorrect);
    }

    #[test]
    fn is_finish_correct_confirms_start_time_predecessor() {
        let mut events = vec![
            ClientEvent { event_start_time: true, server_time: 0, ..Default::default() },
            event(true, 5000, 5000),
        ];
        assert_eq!(RawInfo::is_finish_correct(&mut events, 1), FinishType::CorrectStart);
        assert_eq!(events[1].time_by_server_time, 5000);
    }

    #[test]
    fn split_config_player_synthesizes_uncolored_name_when_it_differs() {
        let result = RawInfo::split_config_player("\\n\\^1Red^7Name");
        assert_eq!(result.get("name").map(String::as_str), Some("^1Red^7Name"));
        assert_eq!(result.get("uncoloredName").map(String::as_str), Some("RedName"));
    }
}
