use crate::client::CLSnapshot;

/// `ps.pm_type` values relevant to timer tracking — only `Normal` counts as "playing".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMode {
    Normal = 0,
    NoClip = 1,
    Spectator = 2,
    Dead = 3,
}

impl PlayerMode {
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => PlayerMode::NoClip,
            2 => PlayerMode::Spectator,
            3 => PlayerMode::Dead,
            _ => PlayerMode::Normal,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerMode::Normal => "normal",
            PlayerMode::NoClip => "noclip",
            PlayerMode::Spectator => "spectator",
            PlayerMode::Dead => "death",
        }
    }
}

/// One state transition observed on a snapshot. Most snapshots produce no event; the
/// fields below are only meaningful when at least one `event_*` flag is set, per
/// [`Self::has_any_event`].
#[derive(Debug, Clone, Default)]
pub struct ClientEvent {
    pub event_start_file: bool,
    pub event_start_time: bool,
    pub event_time_reset: bool,
    pub event_finish: bool,
    pub event_check_point: bool,
    pub event_some_trigger: bool,
    pub event_change_pm_type: bool,
    pub event_change_user: bool,
    pub time: i64,
    pub time_has_error: bool,
    pub time_by_server_time: i64,
    pub server_time: i64,
    pub player_num: i64,
    pub player_mode: i64,
    pub user_stat: i64,
    pub speed: i64,
}

impl ClientEvent {
    pub fn new(time_value: i64, time_has_error: bool, snapshot: &CLSnapshot) -> Self {
        Self {
            time: if time_has_error { 0 } else { time_value },
            time_has_error,
            server_time: snapshot.server_time,
            player_num: snapshot.ps.client_num,
            user_stat: snapshot.ps.stats[12],
            player_mode: snapshot.ps.pm_type,
            ..Default::default()
        }
    }

    pub fn has_any_event(&self) -> bool {
        self.event_start_file
            || self.event_start_time
            || self.event_time_reset
            || self.event_finish
            || self.event_check_point
            || self.event_change_pm_type
            || self.event_change_user
            || self.event_some_trigger
    }

    pub fn time_no_error(&self) -> i64 {
        if self.time_has_error {
            self.time_by_server_time
        } else {
            self.time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_no_error_prefers_server_time_fallback_on_error() {
        let event = ClientEvent {
            time_has_error: true,
            time_by_server_time: 4200,
            time: 99,
            ..Default::default()
        };
        assert_eq!(event.time_no_error(), 4200);
    }

    #[test]
    fn has_any_event_false_when_nothing_set() {
        assert!(!ClientEvent::default().has_any_event());
    }
}
