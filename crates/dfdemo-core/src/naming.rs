//! Assembles the canonical demo filename: map, mod/physics, time-or-placeholder,
//! player/country, and a validity tag — from a [`RawInfo`] already built from the
//! parsed demo stream.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::console::{normalize_name, remove_colors};
use crate::demo_names::DemoNames;
use crate::game_info::GameInfo;
use crate::protocol::Q3_DEMO_CFG_FIELD_MAP;
use crate::raw_info::{FinishType, RawInfo, KEY_CLIENT, KEY_PLAYER};

/// Checked longest-first so e.g. "scriptland" is matched before the shorter "script".
const TAS_TRIGGERS: &[&str] = &[
    "scriptland", "scripted", "botland", "wizland", "tasbot", "script", "boted", "tas", "bot", "wiz",
];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '(' || c == ')' || c == '[' || c == ']'
}

fn split_non_alnum(data: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for c in data.chars() {
        if c.is_alphanumeric() {
            current.push(c);
        } else if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn contains_any_splitted(data: &str, triggers: &[&str]) -> bool {
    split_non_alnum(data)
        .iter()
        .any(|part| triggers.iter().any(|t| t.eq_ignore_ascii_case(part)))
}

#[derive(Debug, Default, Clone)]
pub struct Demo {
    pub map_name: String,
    pub modphysic: String,
    pub time: Duration,
    pub player_name: String,
    pub names: Option<DemoNames>,
    pub country: String,
    pub file: Option<PathBuf>,
    pub is_broken: bool,
    pub has_error: bool,
    pub has_correct_name: bool,
    pub record_time: Option<NaiveDateTime>,
    pub has_tr: bool,
    pub is_not_finished: bool,
    pub is_tas: bool,
    /// Preserves insertion order so [`Self::validity`] reports the first-flagged key,
    /// matching the original's reliance on Python dict ordering.
    pub valid_dict: Vec<(String, String)>,
    pub use_validation: bool,
    pub raw_time: bool,
    pub trigger_time: bool,
    pub trigger_time_no_finish: bool,
    pub is_spectator: bool,
    pub user_id: i64,

    game_name_short: String,
    has_tr_additional_info: bool,
    demo_new_name: String,
    demo_new_name_simple: String,
    normalized_file_name: String,
}

impl Demo {
    pub fn new() -> Self {
        Self {
            use_validation: true,
            user_id: -1,
            ..Default::default()
        }
    }

    pub fn validity(&self) -> String {
        match self.valid_dict.first() {
            Some((key, value)) => format!("{key}={value}"),
            None => String::new(),
        }
    }

    pub fn normalized_file_name(&mut self) -> String {
        if self.normalized_file_name.is_empty() {
            if let Some(file) = self.file.clone() {
                self.normalized_file_name = get_normalized_file_name(&file);
            }
        }
        self.normalized_file_name.clone()
    }

    pub fn demo_new_name_simple(&mut self) -> String {
        if self.demo_new_name_simple.is_empty() {
            self.fill_demo_new_name();
        }
        self.demo_new_name_simple.clone()
    }

    pub fn demo_new_name(&mut self) -> String {
        if !self.demo_new_name.is_empty() {
            return self.demo_new_name.clone();
        }
        if self.has_error {
            return self.normalized_file_name();
        }
        self.fill_demo_new_name();
        self.demo_new_name.clone()
    }

    pub fn fill_demo_new_name(&mut self) {
        let Some(file) = self.file.clone() else { return };
        let extension = file
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let player_country = if self.country.is_empty() {
            self.player_name.clone()
        } else {
            format!("{}.{}", self.player_name, self.country)
        };

        let demoname = if self.time > Duration::ZERO {
            let total_ms = self.time.as_millis();
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) / 1_000;
            let millis = total_ms % 1_000;
            self.has_correct_name = true;
            format!(
                "{}[{}]{:02}.{:02}.{:03}({})",
                self.map_name, self.modphysic, minutes, seconds, millis, player_country
            )
        } else {
            self.has_correct_name = false;
            let normalized = self.normalized_file_name();
            let mut old_name = if extension.is_empty() {
                normalized.clone()
            } else {
                normalized[..normalized.len() - extension.len()].to_string()
            };
            old_name = remove_substr(&old_name, Some(&self.map_name), true);

            if !self.country.is_empty() {
                let mut pc = player_country.clone();
                if let Some(names) = &self.names {
                    if let Some(f_name) = &names.f_name {
                        pc = format!("{}.{}", f_name, self.country);
                    }
                }
                old_name = remove_substr(&old_name, Some(&pc), false);
            }
            old_name = old_name.replace("[dm]", "").replace("[spect]", "");

            let normalized_name = normalize_name(&self.player_name);
            let mut patterns = vec![
                format!("({}.{})", normalized_name, self.country),
                format!("({})", normalized_name),
            ];
            if let Some(names) = &self.names {
                if let Some(f_name) = &names.f_name {
                    patterns.push(format!("({}.{})", f_name, self.country));
                    patterns.push(format!("({})", f_name));
                }
            }
            for pattern in &patterns {
                old_name = old_name.replace(pattern.as_str(), "");
            }
            old_name = remove_substr(&old_name, Some(&normalized_name), false);
            if let Some(names) = &self.names {
                if let Some(f_name) = names.f_name.clone() {
                    old_name = remove_substr(&old_name, Some(&f_name), false);
                }
            }
            old_name = remove_substr(&old_name, Some(&self.country), false);
            old_name = old_name.replace(&format!("[{}]", self.modphysic), "");
            old_name = remove_substr(&old_name, Some(&self.modphysic), true);
            if !self.game_name_short.is_empty() {
                old_name = remove_substr(&old_name, Some(&self.game_name_short), true);
            }
            let validity = self.validity();
            old_name = remove_substr(&old_name, Some(&validity), true);
            old_name = remove_double(&old_name);
            old_name = old_name.replace("[]", "").replace("()", "");
            old_name = old_name.trim_matches(|c: char| !is_word_char(c)).to_string();
            old_name = old_name.replace(' ', "_");

            let mut demoname = format!("{}[{}]({}){}", self.map_name, self.modphysic, player_country, old_name);
            demoname = demoname.replace(").)", ")").replace(".)", ")");
            demoname
        };

        self.demo_new_name_simple = format!("{demoname}{extension}");
        let mut final_name = demoname;
        if self.use_validation {
            let validity = self.validity();
            if !validity.is_empty() {
                final_name.push_str(&format!("{{{validity}}}"));
            }
        }
        if self.user_id >= 0 {
            final_name.push_str(&format!("[{}]", self.user_id));
        } else if self.is_spectator || self.has_tr_additional_info {
            final_name.push_str("[spect]");
        }
        self.demo_new_name = format!("{final_name}{extension}");
    }

    fn is_tr(raw: &RawInfo, fastest: Option<&crate::console::TimeStringInfo>) -> bool {
        if raw.client_events.iter().any(|ev| ev.event_time_reset) {
            return true;
        }
        if let Some(fastest) = fastest {
            for info in &raw.console_commands_parser.additional_infos {
                if info.time == fastest.time {
                    return info.is_tr;
                }
            }
        }
        false
    }

    pub fn get_demo_from_raw_info(raw: &mut RawInfo) -> Demo {
        let file_path = PathBuf::from(&raw.demo_path);
        let friendly_info = raw.get_friendly_info().clone();
        let mut demo = Demo::new();
        demo.file = Some(file_path.clone());

        let client_info = match friendly_info.get(KEY_CLIENT) {
            Some(info) if !info.is_empty() => info.clone(),
            _ => {
                demo.has_error = true;
                demo.is_broken = true;
                return demo;
            }
        };

        let mut names = DemoNames::default();
        let player_info = friendly_info.get(KEY_PLAYER);
        names.set_names_by_player_info(player_info);

        let fastest = raw
            .console_commands_parser
            .fastest_time_string_info(names.df_name.as_deref(), names.u_name.as_deref());

        if let Some((finish_type, finish_event)) = &raw.fin {
            if !finish_event.time_has_error {
                demo.time = Duration::from_millis(finish_event.time.max(0) as u64);
            }
            demo.has_tr = *finish_type == FinishType::CorrectTr;
            demo.trigger_time = true;
        } else {
            demo.has_tr = Self::is_tr(raw, fastest.as_ref());
        }

        if demo.time == Duration::ZERO {
            if let Some(fastest) = &fastest {
                demo.time = fastest.time;
                if let Some(latest) = raw
                    .console_commands_parser
                    .date_strings
                    .iter()
                    .rev()
                    .find(|d| d.record_date.is_some())
                {
                    demo.record_time = latest.record_date;
                }
                if let Some(user) = raw.get_player_info_by_player_name(fastest.o_name.as_deref()) {
                    names.set_names_by_player_info(Some(&user));
                }
            } else if let Some((_, finish_event)) = &raw.fin {
                demo.time = Duration::from_millis(finish_event.time_by_server_time.max(0) as u64);
            }
        }

        if demo.record_time.is_none() {
            if let Some(latest) = raw
                .console_commands_parser
                .date_strings
                .iter()
                .rev()
                .find(|d| d.record_date.is_some())
            {
                demo.record_time = latest.record_date;
            }
        }

        if let Some(fastest) = &fastest {
            names.set_console_name(fastest.o_name.as_deref(), fastest.l_name.as_deref(), raw.game_info.is_online);
        }

        let filename = demo.normalized_file_name();
        let country_and_name = get_name_and_country(&filename);
        let country_name_parsed = try_get_name_and_country(&country_and_name, &names);
        let normal_name = names.choose_normal_name();
        if normal_name.is_empty() || normal_name == crate::demo_names::DEFAULT_NAME {
            names.set_brackets_name(country_name_parsed.0.clone());
        }
        demo.player_name = names.choose_normal_name();

        demo.country = crate::country::normalize_country_code(&country_name_parsed.1);

        let lower_filename = filename.to_lowercase();
        if lower_filename.contains("tool_assisted=true")
            || contains_any_splitted(&country_and_name, TAS_TRIGGERS)
            || contains_any_splitted(&demo.player_name, TAS_TRIGGERS)
        {
            demo.is_tas = true;
        }

        if demo.time > Duration::ZERO {
            demo.raw_time = true;
        } else if let Some(t) = try_get_time_from_file_name(&filename) {
            demo.time = t;
        }

        let map_info = raw
            .raw_config
            .get(&(Q3_DEMO_CFG_FIELD_MAP as i64))
            .cloned()
            .unwrap_or_default();
        let map_name = client_info.get("mapname").cloned().unwrap_or_default().to_lowercase();
        demo.map_name = if !map_name.is_empty() && map_name == map_info.to_lowercase() {
            map_info
        } else {
            map_name.clone()
        };
        if map_name.is_empty() {
            demo.is_broken = true;
        }

        let game_info = raw.game_info.clone();
        demo.game_name_short = game_info.game_name_short.clone();
        demo.has_tr_additional_info = raw.console_commands_parser.additional_infos.iter().any(|i| i.is_tr);

        demo.modphysic = if game_info.is_defrag {
            if !game_info.mod_type.is_empty() {
                format!("{}.{}.{}", game_info.game_type_short, game_info.gameplay_type_short, game_info.mod_type)
            } else {
                format!("{}.{}", game_info.game_type_short, game_info.gameplay_type_short)
            }
        } else {
            format!("{}.{}", game_info.game_name_short, game_info.game_type_short)
        };
        if demo.has_tr {
            demo.modphysic.push_str(".tr");
        }

        let additional = raw
            .console_commands_parser
            .additional_infos
            .last()
            .map(|i| i.to_dictionary());
        demo.valid_dict = check_validity(
            demo.time > Duration::ZERO,
            demo.raw_time,
            &game_info,
            demo.is_tas,
            demo.trigger_time_no_finish,
            additional.as_ref(),
        );
        if demo.valid_dict.is_empty() {
            if let Some((key, value)) = get_validities(&filename) {
                demo.valid_dict.push((key, value));
            }
        }

        if demo.trigger_time {
            demo.user_id = try_get_user_id_from_file_name(&file_path);
        }

        if demo.valid_dict.iter().any(|(k, v)| k == "client_finish" && v == "false") {
            demo.is_not_finished = true;
        }

        demo
    }
}

fn remove_substr(source: &str, include: Option<&str>, from_start: bool) -> String {
    let Some(include) = include else { return source.to_string() };
    if include.is_empty() || !source.contains(include) {
        return source.to_string();
    }
    let pos = if from_start { source.find(include) } else { source.rfind(include) };
    let Some(pos) = pos else { return source.to_string() };

    let mut crop_start = 0usize;
    let mut crop_end = 0usize;
    let mut symbol = String::new();
    if pos > 0 {
        let prev_char = source[..pos].chars().last().unwrap();
        if !prev_char.is_alphanumeric() {
            crop_start = prev_char.len_utf8();
            symbol = prev_char.to_string();
        }
    }
    let include_end = pos + include.len();
    if include_end < source.len() {
        let next_char = source[include_end..].chars().next().unwrap();
        if !next_char.is_alphanumeric() {
            crop_end = next_char.len_utf8();
            symbol = next_char.to_string();
        }
    }
    if "([{)]}".contains(symbol.as_str()) {
        symbol = "_".to_string();
    }
    format!("{}{}{}", &source[..pos - crop_start], symbol, &source[include_end + crop_end..])
}

/// Collapses runs of adjacent separator characters (anything that isn't alphanumeric
/// or a paren/bracket) down to a single one.
fn remove_double(value: &str) -> String {
    let mut result = String::new();
    let mut prev_was_special = false;
    for c in value.chars() {
        let special = !is_word_char(c);
        if special && prev_was_special {
            continue;
        }
        result.push(c);
        prev_was_special = special;
    }
    result
}

fn get_name_and_country_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^(]*\(([^)]*)\).*").unwrap())
}

fn get_name_and_country(filename: &str) -> String {
    get_name_and_country_re()
        .captures(filename)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn try_get_name_and_country(partname: &str, names: &DemoNames) -> (String, String) {
    let sep = partname.rfind('.').into_iter().chain(partname.rfind(',')).max();
    if let Some(sep) = sep {
        if sep > 0 && sep + 1 < partname.len() {
            let country = partname[sep + 1..].trim().to_string();
            if !country.chars().any(|c| c.is_ascii_digit()) {
                let name_part = partname[..sep].to_string();
                return (name_part, country);
            }
        }
    }
    let _ = names;
    (partname.to_string(), String::new())
}

fn try_get_time_from_brackets(part: &str) -> Option<Duration> {
    let tokens: Vec<&str> = part.split(['-', '.']).collect();
    if !(2..=3).contains(&tokens.len()) {
        return None;
    }
    if tokens.iter().any(|t| t.is_empty() || !t.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    crate::console::get_time_span(part).ok()
}

fn try_get_time_from_file_name(filename: &str) -> Option<Duration> {
    for part in filename.split(['[', ']', '(', ')', '_']) {
        if let Some(t) = try_get_time_from_brackets(part) {
            return Some(t);
        }
    }
    None
}

fn get_key(params: &std::collections::HashMap<String, String>, key: &str) -> f64 {
    params.get(key).and_then(|v| v.parse::<f64>().ok()).unwrap_or(-1.0)
}

fn check_key(invalid: &mut Vec<(String, String)>, params: &std::collections::HashMap<String, String>, key: &str, expected: i64) {
    match params.get(key) {
        Some(raw) if !raw.is_empty() => {
            let value = get_key(params, key);
            if value < 0.0 {
                invalid.push((key.to_string(), raw.clone()));
            } else if value != expected as f64 {
                invalid.push((key.to_string(), format!("{value}")));
            }
        }
        _ => {}
    }
}

fn check_validity(
    has_time: bool,
    has_raw_time: bool,
    game_info: &GameInfo,
    is_tas: bool,
    trigger_time_no_finish: bool,
    additional_info: Option<&std::collections::HashMap<String, String>>,
) -> Vec<(String, String)> {
    let mut invalid: Vec<(String, String)> = Vec::new();
    let mut params: std::collections::HashMap<String, String> =
        game_info.parameters.iter().map(|(k, v)| (k.to_lowercase(), v.clone())).collect();
    if let Some(additional) = additional_info {
        for (k, v) in additional {
            params.insert(k.to_lowercase(), v.clone());
        }
    }

    if !game_info.is_free_style {
        check_key(&mut invalid, &params, "sv_cheats", 0);
    }
    if game_info.is_defrag && ((has_time && !has_raw_time) || trigger_time_no_finish) {
        invalid.push(("client_finish".to_string(), "false".to_string()));
    }
    check_key(&mut invalid, &params, "timescale", 1);
    check_key(&mut invalid, &params, "g_speed", 320);
    check_key(&mut invalid, &params, "g_gravity", 800);
    check_key(&mut invalid, &params, "handicap", 100);
    check_key(&mut invalid, &params, "g_knockback", 1000);
    if has_time && game_info.is_online && !game_info.is_free_style {
        check_key(&mut invalid, &params, "df_mp_interferenceoff", 3);
    }
    if is_tas {
        invalid.push(("tool_assisted".to_string(), "true".to_string()));
    }
    check_key(&mut invalid, &params, "sv_fps", 125);
    check_key(&mut invalid, &params, "com_maxfps", 125);
    let g_sync = get_key(&params, "g_synchronousclients");
    if g_sync != 1.0 {
        check_key(&mut invalid, &params, "pmove_msec", 8);
        check_key(&mut invalid, &params, "pmove_fixed", 1);
    }
    check_key(&mut invalid, &params, "g_killWallbug", 1);
    invalid
}

fn validities_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\[]+\[[^.\]]+.[^\]]+\]\d{2,3}\.\d{2}\.\d{3}\(.+\)\{(\w+)=(\w+)\}(?:\[\d+\])?\.\w+$").unwrap()
    })
}

fn get_validities(filename: &str) -> Option<(String, String)> {
    let caps = validities_re().captures(filename)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

fn user_id_re_double() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.+\[(\d+)\]\[(\d+)\]$").unwrap())
}

fn user_id_re_single() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.+\[.+\].+\(.+\)(?:\{.+\})*\[(\d+)\]$").unwrap())
}

fn try_get_user_id_from_file_name(file: &Path) -> i64 {
    let name_no_ext = file.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    if let Some(caps) = user_id_re_double().captures(&name_no_ext) {
        if let Some(m) = caps.get(2) {
            if let Ok(id) = m.as_str().parse() {
                return id;
            }
        }
    }
    if let Some(caps) = user_id_re_single().captures(&name_no_ext) {
        if let Some(m) = caps.get(1) {
            if let Ok(id) = m.as_str().parse() {
                return id;
            }
        }
    }
    -1
}

fn get_normalized_file_name(file: &Path) -> String {
    let filename = file.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let extension = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name_no_ext = if extension.is_empty() {
        filename
    } else {
        filename[..filename.len() - extension.len()].to_string()
    };
    let name_no_ext = if name_no_ext.contains('^') {
        remove_colors(&name_no_ext).unwrap_or(name_no_ext)
    } else {
        name_no_ext
    };
    format!("{}{}", name_no_ext, extension.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_substr_collapses_the_gap_left_behind() {
        let result = remove_substr("map_player", Some("player"), true);
        assert_eq!(result, "map");
    }

    #[test]
    fn remove_double_collapses_adjacent_separators() {
        assert_eq!(remove_double("a--_b"), "a-b");
    }

    #[test]
    fn get_name_and_country_extracts_parenthesized_segment() {
        assert_eq!(get_name_and_country("map[mod]12.34.567(Name.US)spect.dm_68"), "Name.US");
    }

    #[test]
    fn try_get_name_and_country_splits_on_last_dot() {
        let names = DemoNames::default();
        let (name, country) = try_get_name_and_country("Foo.US", &names);
        assert_eq!(name, "Foo");
        assert_eq!(country, "US");
    }

    #[test]
    fn try_get_time_from_file_name_finds_bracketed_time() {
        let t = try_get_time_from_file_name("map[mod](01.02.345)(Name)").unwrap();
        assert_eq!(t.as_millis(), 62_345);
    }

    #[test]
    fn check_validity_flags_non_default_gravity() {
        let game_info = GameInfo {
            parameters: [("g_gravity".to_string(), "400".to_string())].into_iter().collect(),
            is_free_style: true,
            ..Default::default()
        };
        let invalid = check_validity(true, true, &game_info, false, false, None);
        assert!(invalid.iter().any(|(k, v)| k == "g_gravity" && v == "400"));
    }
}
