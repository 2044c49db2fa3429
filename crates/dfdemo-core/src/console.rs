//! Parses the freeform strings defragged servers print to the console — record
//! announcements, timer start/stop lines, and the handful of legacy formats older
//! server builds used — into structured time/name/date candidates.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::NaiveDateTime;
use regex::Regex;

fn colors_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\^.").unwrap())
}

fn non_ascii_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\u{0020}-\u{007F}]+").unwrap())
}

fn clean_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\^[0-9]|\\"|\\n|")"#).unwrap())
}

fn clean_any_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\^.|\\"|\\n|")"#).unwrap())
}

fn not_digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9]").unwrap())
}

fn normalize_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9!#$%&'()+,\-.;=\[\]^_{}]").unwrap())
}

pub fn remove_colors(text: &str) -> Option<String> {
    Some(colors_re().replace_all(text, "").into_owned())
}

pub fn remove_non_ascii(text: &str) -> Option<String> {
    Some(non_ascii_re().replace_all(text, "").into_owned())
}

pub fn normalize_name(name: &str) -> String {
    normalize_name_re().replace_all(name, "").into_owned()
}

fn clean(text: &str) -> String {
    clean_re().replace_all(text, "").into_owned()
}

/// "minutes:seconds:millis" or "seconds:millis", tolerating stray non-digit
/// characters some demos embed in each component (e.g. "984!!!").
pub fn get_time_span(value: &str) -> anyhow::Result<Duration> {
    let parts: Vec<&str> = value.split(':').collect();
    let (minutes, seconds, millis) = match parts.as_slice() {
        [m, s, ms] => (*m, *s, *ms),
        [s, ms] => ("0", *s, *ms),
        _ => anyhow::bail!("Invalid time format"),
    };
    let minutes: u64 = not_digit_re().replace_all(minutes, "").parse()?;
    let seconds: u64 = not_digit_re().replace_all(seconds, "").parse()?;
    let millis: u64 = not_digit_re().replace_all(millis, "").parse()?;
    Ok(Duration::from_millis(minutes * 60_000 + seconds * 1_000 + millis))
}

#[derive(Debug, Clone, Default)]
pub struct AdditionalTimeInfo {
    pub source: String,
    pub time: Duration,
    pub cp_data: Vec<Duration>,
    pub offset: i64,
    pub pmove_depends: i64,
    pub pmove_fixed: i64,
    pub sv_fps: i64,
    pub com_maxfps: i64,
    pub g_sync: i64,
    pub pmove_msec: i64,
    pub all_weapons: i64,
    pub no_damage: i64,
    pub enable_powerups: i64,
    pub is_tr: bool,
}

impl AdditionalTimeInfo {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            offset: -1,
            pmove_depends: -1,
            pmove_fixed: -1,
            sv_fps: -1,
            com_maxfps: -1,
            g_sync: -1,
            pmove_msec: -1,
            all_weapons: -1,
            no_damage: -1,
            enable_powerups: -1,
            ..Default::default()
        }
    }

    pub fn to_dictionary(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();
        let mut put = |key: &str, value: i64| {
            if value >= 0 {
                result.insert(key.to_string(), value.to_string());
            }
        };
        put("pmove_fixed", self.pmove_fixed);
        put("sv_fps", self.sv_fps);
        put("com_maxfps", self.com_maxfps);
        put("g_sync", self.g_sync);
        put("pmove_msec", self.pmove_msec);
        put("all_weapons", self.all_weapons);
        put("no_damage", self.no_damage);
        put("enable_powerups", self.enable_powerups);
        result
    }
}

pub fn get_name_online(demo_time_cmd: &str) -> String {
    let cleaned = clean(demo_time_cmd);
    let lower = cleaned.to_lowercase();
    let end = lower.rfind(" reached").unwrap_or(cleaned.len());
    let start = 6usize.min(cleaned.len());
    let end = end.max(start);
    normalize_name(&cleaned[start..end])
}

#[derive(Debug, Clone)]
pub struct Q3DfResult {
    pub name: String,
    pub q3df_name: Option<String>,
    pub time: Duration,
}

fn parse_q3df_prefix(prefix: &str) -> (String, Option<String>) {
    let prefix = prefix.trim();
    if let (Some(open_rel), true) = (prefix.rfind('('), prefix.contains(')')) {
        let name = prefix[..open_rel].trim();
        let q3df = prefix[open_rel + 1..].trim_end_matches(')').trim();
        (normalize_name(name), Some(normalize_name(q3df)))
    } else {
        (normalize_name(prefix), None)
    }
}

fn parse_q3df_time(segment: &str) -> String {
    let segment = segment.trim();
    let segment = segment.split(' ').next().unwrap_or(segment);
    let segment = segment.split('(').next().unwrap_or(segment);
    segment.trim().to_string()
}

pub fn get_name_q3df(demo_time_cmd: &str) -> Option<Q3DfResult> {
    let text = remove_non_ascii(demo_time_cmd).unwrap_or_default();
    let text = remove_colors(&text).unwrap_or_default();
    let stripped = text.replace("chat \"", "");
    let stripped = stripped.trim_end_matches('"');

    if let Some((prefix, rest)) = stripped.split_once(" broke the server record with ") {
        let (name, q3df) = parse_q3df_prefix(prefix);
        let time = get_time_span(&parse_q3df_time(rest)).ok()?;
        return Some(Q3DfResult { name, q3df_name: q3df, time });
    }
    if let Some((prefix, rest)) = stripped.split_once(" equalled the server record with ") {
        let (name, q3df) = parse_q3df_prefix(prefix);
        let time = get_time_span(&parse_q3df_time(rest)).ok()?;
        return Some(Q3DfResult { name, q3df_name: q3df, time });
    }
    if stripped.contains(", you are now rank") && stripped.contains(" with ") {
        let (prefix, rest) = stripped.split_once(", you are now rank")?;
        let (name, q3df) = parse_q3df_prefix(prefix);
        if let Some((_, after_with)) = rest.split_once(" with ") {
            let time = get_time_span(&parse_q3df_time(after_with)).ok()?;
            return Some(Q3DfResult { name, q3df_name: q3df, time });
        }
    }
    if stripped.starts_with("console: ") && stripped.contains(" with ") {
        let body = &stripped["console: ".len()..];
        if let Some((name_part, rest)) = body.split_once(" is now rank") {
            let (name, q3df) = parse_q3df_prefix(name_part);
            let (_, after_with) = rest.split_once(" with ")?;
            let time = get_time_span(&parse_q3df_time(after_with)).ok()?;
            return Some(Q3DfResult { name, q3df_name: q3df, time });
        }
    }
    None
}

pub fn get_time_online(demo_time_cmd: &str) -> anyhow::Result<Duration> {
    let cleaned = clean(demo_time_cmd);
    let in_idx = cleaned.rfind("in").map(|i| i + 3).unwrap_or(0);
    let mut demo_time = &cleaned[in_idx.min(cleaned.len())..];
    if let Some(est) = demo_time.find(" (est") {
        if est > 0 {
            demo_time = &demo_time[..est];
        }
    }
    get_time_span(demo_time)
}

pub fn get_time_offline_normal(demo_time_cmd: &str) -> anyhow::Result<Duration> {
    let cleaned = clean_any_color_re().replace_all(demo_time_cmd, "");
    let colon = cleaned.find(':').map(|i| i + 2).unwrap_or(0);
    let mut rest = &cleaned[colon.min(cleaned.len())..];
    if let Some(space) = rest.find(' ') {
        if space > 0 {
            rest = rest[..space].trim();
        }
    }
    get_time_span(rest)
}

pub fn get_name_offline(demo_time_cmd: &str) -> String {
    let cleaned = clean_any_color_re().replace_all(demo_time_cmd, "");
    let mut rest = &cleaned[24.min(cleaned.len())..];
    if let Some(space) = rest.find(" :") {
        rest = &rest[..space];
    }
    normalize_name(rest)
}

pub fn get_time_old1(demo_time_cmd: &str) -> anyhow::Result<Duration> {
    let parts: Vec<&str> = demo_time_cmd.split(' ').collect();
    get_time_span(parts.get(2).copied().unwrap_or(""))
}

pub fn get_name_offline_old1(demo_time_cmd: &str) -> String {
    let parts: Vec<&str> = demo_time_cmd.split(' ').collect();
    let raw = parts.get(3).copied().unwrap_or("");
    normalize_name(&remove_colors(raw).unwrap_or_default())
}

pub fn get_time_old3(demo_time_cmd: &str) -> anyhow::Result<Duration> {
    let parts: Vec<&str> = demo_time_cmd.split(' ').collect();
    let millis: u64 = parts.get(1).copied().unwrap_or("0").parse()?;
    Ok(Duration::from_millis(millis))
}

pub fn get_date_for_demo(text: &str) -> Option<NaiveDateTime> {
    let date_string = &text[13.min(text.len())..];
    let date_string = date_string.replace('\n', "").replace('"', "");
    let date_string = date_string.trim();
    for pattern in ["%m-%d-%y %H:%M", "%m-%d-%y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_string, pattern) {
            return Some(dt);
        }
    }
    None
}

fn to_int(parts: &[&str], index: usize, default: i64) -> i64 {
    parts.get(index).and_then(|s| s.parse().ok()).unwrap_or(default)
}

/// The `TimerStopped` payload: elapsed time, optional checkpoint splits, then (if the
/// server sent them) a `Stats` block of physics cvars. `pmove_msec` is only present when
/// `pmove_depends <= 4` — older servers didn't send it at all.
pub fn parse_additional_info(text: &str) -> AdditionalTimeInfo {
    let parts: Vec<&str> = text.split(' ').collect();
    let mut info = AdditionalTimeInfo::new(text);
    let millis = to_int(&parts, 1, -1);
    if millis < 0 {
        return info;
    }
    info.time = Duration::from_millis(millis as u64);
    let offset = to_int(&parts, 2, -1);
    if offset < 0 {
        return info;
    }
    info.offset = offset;
    if offset > 0 {
        for idx in 0..offset {
            let cp_millis = to_int(&parts, (3 + idx) as usize, -1);
            info.cp_data.push(Duration::from_millis(cp_millis.max(0) as u64));
        }
    }
    if parts.len() as i64 <= offset + 3 {
        return info;
    }
    let stats_string = parts[(offset + 3) as usize];
    if stats_string != "Stats" {
        return info;
    }
    info.pmove_depends = to_int(&parts, (offset + 4) as usize, -1);
    info.pmove_fixed = to_int(&parts, (offset + 5) as usize, -1);
    info.sv_fps = to_int(&parts, (offset + 6) as usize, -1);
    info.com_maxfps = to_int(&parts, (offset + 7) as usize, -1);
    info.g_sync = to_int(&parts, (offset + 8) as usize, -1);
    if info.pmove_depends <= 4 {
        info.pmove_msec = to_int(&parts, (offset + 9) as usize, -1);
    }
    info.all_weapons = to_int(&parts, (offset + 10) as usize, -1);
    info.no_damage = to_int(&parts, (offset + 11) as usize, -1);
    info.enable_powerups = to_int(&parts, (offset + 12) as usize, -1);
    info
}

#[derive(Debug, Clone)]
pub struct TimeStringInfo {
    pub source: String,
    pub time: Duration,
    pub o_name: Option<String>,
    pub l_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DateStringInfo {
    pub source: String,
    pub record_date: Option<NaiveDateTime>,
}

/// Classifies every console line a demo recorded into a time candidate, a date
/// stamp, or a `TimerStopped` physics-cvar block — mirroring the eight message
/// formats defrag servers have printed across its history.
pub struct ConsoleCommandsParser {
    pub time_strings: Vec<TimeStringInfo>,
    pub date_strings: Vec<DateStringInfo>,
    pub additional_infos: Vec<AdditionalTimeInfo>,
}

impl ConsoleCommandsParser {
    pub fn new<'a>(console_commands: impl Iterator<Item = &'a str>) -> Self {
        let mut time_strings = Vec::new();
        let mut date_strings = Vec::new();
        let mut additional_infos = Vec::new();
        let mut timer_started_count = 0u32;

        for value in console_commands {
            if value.starts_with("print \"Date:") {
                date_strings.push(DateStringInfo {
                    source: value.to_string(),
                    record_date: get_date_for_demo(value),
                });
            } else if value.contains("reached the finish line in") {
                if let Ok(time) = get_time_online(value) {
                    time_strings.push(TimeStringInfo {
                        source: value.to_string(),
                        time,
                        o_name: Some(get_name_online(value)),
                        l_name: None,
                    });
                }
            } else if ["broke the server record", "you are now rank", "equalled the server record with"]
                .iter()
                .any(|token| value.contains(token))
            {
                if let Some(result) = get_name_q3df(value) {
                    time_strings.push(TimeStringInfo {
                        source: value.to_string(),
                        time: result.time,
                        o_name: Some(result.name),
                        l_name: result.q3df_name,
                    });
                }
            } else if value.starts_with("print \"Time performed by") {
                if let Ok(time) = get_time_offline_normal(value) {
                    time_strings.push(TimeStringInfo {
                        source: value.to_string(),
                        time,
                        o_name: Some(get_name_offline(value)),
                        l_name: None,
                    });
                }
            } else if value.starts_with("NewTime") {
                if let Ok(time) = get_time_old1(value) {
                    time_strings.push(TimeStringInfo {
                        source: value.to_string(),
                        time,
                        o_name: Some(get_name_offline_old1(value)),
                        l_name: None,
                    });
                }
            } else if value.starts_with("print \"^3Time Performed:") {
                if let Ok(time) = get_time_offline_normal(value) {
                    time_strings.push(TimeStringInfo {
                        source: value.to_string(),
                        time,
                        o_name: None,
                        l_name: None,
                    });
                }
            } else if value.starts_with("newTime") {
                if let Ok(time) = get_time_old3(value) {
                    time_strings.push(TimeStringInfo {
                        source: value.to_string(),
                        time,
                        o_name: None,
                        l_name: None,
                    });
                }
            } else if value.starts_with("TimerStarted") {
                timer_started_count += 1;
            } else if value.starts_with("TimerStopped") {
                let mut info = parse_additional_info(value);
                if timer_started_count > 1 {
                    info.is_tr = true;
                }
                timer_started_count = 0;
                additional_infos.push(info);
            }
        }

        Self { time_strings, date_strings, additional_infos }
    }

    pub fn fastest_time_string_info(&self, df_name: Option<&str>, u_name: Option<&str>) -> Option<TimeStringInfo> {
        if self.time_strings.is_empty() && !self.additional_infos.is_empty() {
            let fastest = self.additional_infos.iter().min_by_key(|info| info.time)?;
            return Some(TimeStringInfo {
                source: fastest.source.clone(),
                time: fastest.time,
                o_name: None,
                l_name: None,
            });
        }
        if self.time_strings.len() == 1 {
            return self.time_strings.first().cloned();
        }
        if self.time_strings.is_empty() {
            return None;
        }

        let mut candidates: Vec<&TimeStringInfo> = self
            .time_strings
            .iter()
            .filter(|ts| match ts.o_name.as_deref() {
                Some(name) => Some(name) == df_name || Some(name) == u_name,
                None => false,
            })
            .collect();

        if candidates.is_empty() {
            let distinct: std::collections::HashSet<_> =
                self.time_strings.iter().map(|ts| ts.o_name.as_deref()).collect();
            if distinct.len() == 1 {
                candidates = self.time_strings.iter().collect();
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let fastest = *candidates.iter().min_by_key(|ts| ts.time)?;
        let ties: Vec<&&TimeStringInfo> = candidates.iter().filter(|ts| ts.time == fastest.time).collect();
        if ties.len() > 1 {
            for item in &ties {
                if item.l_name.is_some() {
                    return Some((*item).clone());
                }
            }
        }
        Some(fastest.clone())
    }

    pub fn good_time_string_info(&self, df_name: Option<&str>, u_name: Option<&str>, time_ms: i64) -> Option<&TimeStringInfo> {
        if time_ms > 0 {
            for ts in &self.time_strings {
                if ts.time.as_millis() as i64 == time_ms {
                    return match ts.o_name.as_deref() {
                        Some(name) if Some(name) == u_name || Some(name) == df_name => Some(ts),
                        Some(_) => continue,
                        None => Some(ts),
                    };
                }
            }
            None
        } else {
            let user_strings: Vec<&TimeStringInfo> = self
                .time_strings
                .iter()
                .filter(|ts| match ts.o_name.as_deref() {
                    Some(name) => Some(name) == u_name || Some(name) == df_name,
                    None => false,
                })
                .collect();
            user_strings.into_iter().min_by_key(|ts| ts.time)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_time_span_parses_minutes_seconds_millis() {
        let d = get_time_span("1:02:500").unwrap();
        assert_eq!(d.as_millis(), 62_500);
    }

    #[test]
    fn get_time_span_tolerates_trailing_junk() {
        let d = get_time_span("0:9:984!!!").unwrap();
        assert_eq!(d.as_millis(), 9_984);
    }

    #[test]
    fn get_name_q3df_parses_broke_record_line() {
        let result = get_name_q3df(r#"chat "Foo(df) broke the server record with 1:02.500 (prev 1:03.000)""#).unwrap();
        assert_eq!(result.name, "Foo");
        assert_eq!(result.q3df_name.as_deref(), Some("df"));
        assert_eq!(result.time.as_millis(), 62_500);
    }

    #[test]
    fn parse_additional_info_reads_stats_block_when_pmove_depends_is_low() {
        let info = parse_additional_info("TimerStopped 12345 0 Stats 4 1 125 125 0 8 1 0 1");
        assert_eq!(info.time.as_millis(), 12_345);
        assert_eq!(info.pmove_depends, 4);
        assert_eq!(info.pmove_msec, 8);
    }

    #[test]
    fn parse_additional_info_skips_pmove_msec_when_depends_is_high() {
        let info = parse_additional_info("TimerStopped 12345 0 Stats 5 1 125 125 0 1 0 1");
        assert_eq!(info.pmove_depends, 5);
        assert_eq!(info.pmove_msec, -1);
    }

    #[test]
    fn console_commands_parser_flags_tr_on_repeated_timer_starts() {
        let lines = vec!["TimerStarted", "TimerStarted", "TimerStopped 500 0 Stats 4 1 125 125 0 8 1 0 1"];
        let parser = ConsoleCommandsParser::new(lines.into_iter());
        assert!(parser.additional_infos[0].is_tr);
    }
}
