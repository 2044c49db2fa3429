//! Classifies a demo's mod, gametype, and physics flavor from its `\`-delimited
//! server info string (`serverinfo` config string, parsed into a lowercased
//! key/value map before reaching here).

use std::collections::HashMap;

fn get_or_null<'a>(parameters: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    parameters.get(key).map(|s| s.as_str())
}

fn get_or_zero(parameters: &HashMap<String, String>, key: &str) -> i64 {
    parameters.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn to_int(value: Option<&str>, default: i64) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn lower_keys(parameters: &HashMap<String, String>) -> HashMap<String, String> {
    parameters.iter().map(|(k, v)| (k.to_lowercase(), v.clone())).collect()
}

#[derive(Debug, Clone, Default)]
pub struct GameInfo {
    pub parameters: HashMap<String, String>,
    pub is_defrag: bool,
    pub is_free_style: bool,
    pub is_online: bool,
    pub game_name: String,
    pub game_name_short: String,
    pub game_type: String,
    pub game_type_short: String,
    pub gameplay_type: String,
    pub gameplay_type_short: String,
    pub mod_type: String,
    pub mod_type_name: String,
}

impl GameInfo {
    pub fn new(parameters: &HashMap<String, String>, is_cpm_in_snapshots: Option<bool>) -> Self {
        let mut info = GameInfo {
            parameters: lower_keys(parameters),
            is_online: true,
            ..Default::default()
        };

        let (short, name) = info.get_game_name();
        info.game_name_short = short;
        info.game_name = name;

        let (short, name) = info.get_game_type();
        info.game_type_short = short;
        info.game_type = name;

        info.gameplay_type_short = info.get_gameplay_type_short(is_cpm_in_snapshots);
        info.gameplay_type = info.get_gameplay_type();

        let (short, name) = info.get_mod_type();
        info.mod_type = short;
        info.mod_type_name = name;

        info
    }

    fn get_mod_type(&self) -> (String, String) {
        let defrag_gametype = get_or_zero(&self.parameters, "defrag_gametype");
        if defrag_gametype > 1 && defrag_gametype != 5 {
            let df_mode = get_or_zero(&self.parameters, "defrag_mode");
            return (df_mode.to_string(), df_mod_text(df_mode));
        }
        if self.game_type_short == "fc" {
            let all_weapons = to_int(get_or_null(&self.parameters, "all_weapons"), -1);
            let df_mode = match all_weapons {
                0 => 7,
                1 => 2,
                2 => 8,
                3 => 3,
                _ => 8,
            };
            return (df_mode.to_string(), old_df_mod_text(all_weapons));
        }
        (String::new(), String::new())
    }

    fn get_game_name(&mut self) -> (String, String) {
        let game = get_or_null(&self.parameters, "fs_game").unwrap_or("").to_lowercase();
        let g_name = get_or_null(&self.parameters, "gamename").unwrap_or("").to_lowercase();
        let game_version = get_or_null(&self.parameters, "gameversion").unwrap_or("").to_lowercase();
        let df_vers = get_or_null(&self.parameters, "defrag_vers").unwrap_or("");
        let df_version = get_or_null(&self.parameters, "defrag_version").unwrap_or("");

        if game.starts_with("defrag") || g_name == "defrag" || !df_vers.is_empty() || !df_version.is_empty() {
            self.is_defrag = true;
            return ("defrag".into(), "Defrag".into());
        }

        let mapping: &[(&str, &str, &str)] = &[
            ("cpma", "cpma", "Challenge ProMode Arena"),
            ("osp", "osp", "Orange Smoothie Productions"),
            ("arena", "ra3", "Rocket Arena"),
            ("threewave", "q3w", "Threewave CTF"),
            ("freeze", "q3ft", "Freeze Tag"),
            ("ufreeze", "q3uft", "Ultra Freeze Tag"),
            ("q3ut", "q3ut", "Urban Terror"),
            ("excessiveplus", "q3xp", "Excessive Plus"),
            ("excessive", "q3ex", "Excessive"),
            ("reactance:iu", "q3insta", "InstaUnlagged"),
            ("battle", "battle", "Battle"),
            ("beryllium", "beryllium", "Beryllium"),
            ("bma", "bma", "Black Metal Assault"),
            ("the corkscrew mod", "corkscrew", "The CorkScrew Mod"),
            ("f4a", "f4a", "Freeze For All"),
            ("freezeplus", "fp", "Freeze Plus"),
            ("generations", "gen", "Generations"),
            ("nemesis", "nemesis", "Nemesis"),
            ("noghost", "noghost", "NoGhost"),
            ("q3f", "q3f", "Quake 3 Fortress"),
            ("q3f2", "q3f", "Quake 3 Fortress"),
            ("truecombat", "truecombat", "Quake 3 True Combat"),
            ("q3tc", "q3tc", "Quake 3 True Combat"),
        ];
        if let Some((_, short, name)) = mapping.iter().find(|(key, _, _)| *key == game) {
            return (short.to_string(), name.to_string());
        }
        if game_version.starts_with("osp") {
            return ("osp".into(), "Orange Smoothie Productions".into());
        }
        let xp_version = get_or_null(&self.parameters, "xp_version").unwrap_or("").to_lowercase();
        if xp_version.starts_with("xp") {
            return ("q3xp".into(), "Excessive Plus".into());
        }
        if game.starts_with("pkarena") {
            return (game.clone(), "Painkeep".into());
        }
        if game.contains("unlagged") {
            return ("unlagged".into(), "Unlagged".into());
        }
        if game.contains("westernq3") {
            return ("westernq3".into(), "Western Quake 3".into());
        }
        ("q3a".into(), "Quake 3 Arena".into())
    }

    fn get_gameplay_type_short(&self, is_cpm_in_snapshots: Option<bool>) -> String {
        match self.game_name_short.as_str() {
            "defrag" => {
                if let Some(is_cpm) = is_cpm_in_snapshots {
                    return if is_cpm { "cpm".into() } else { "vq3".into() };
                }
                let promode = get_or_zero(&self.parameters, "df_promode");
                if promode > 0 { "cpm".into() } else { "vq3".into() }
            }
            "cpma" => {
                let server_gameplay = get_or_null(&self.parameters, "server_gameplay").unwrap_or("");
                match server_gameplay {
                    "0" | "vq3" => "vq3".into(),
                    "1" | "pmc" => "pmc".into(),
                    "2" | "cpm" => "cpm".into(),
                    "cq3" => "cq3".into(),
                    _ => {
                        let promode = get_or_zero(&self.parameters, "server_promode");
                        if promode > 0 { "cpm".into() } else { "vq3".into() }
                    }
                }
            }
            "osp" => {
                let promode = get_or_zero(&self.parameters, "server_promode");
                if promode > 0 { "cpm".into() } else { "vq3".into() }
            }
            _ => String::new(),
        }
    }

    fn get_gameplay_type(&self) -> String {
        match self.gameplay_type_short.as_str() {
            "vq3" => "Vanilla Quake3".into(),
            "cpm" => "Challenge ProMode".into(),
            "pmc" => "ProMode Classic".into(),
            "cq3" => "Challenge Quake3".into(),
            _ => String::new(),
        }
    }

    fn get_game_type(&mut self) -> (String, String) {
        let g_gametype = get_or_zero(&self.parameters, "g_gametype");

        if self.game_name_short == "defrag" {
            let df_gtype = get_or_zero(&self.parameters, "defrag_gametype");
            self.is_free_style = df_gtype == 2 || df_gtype == 6;
            self.is_online = df_gtype > 4;
            let result = match df_gtype {
                1 => Some(("df", "Offline Defrag")),
                2 => Some(("fs", "Offline Freestyle")),
                3 => Some(("fc", "Offline Fast Caps")),
                5 => Some(("mdf", "Multiplayer Defrag")),
                6 => Some(("mfs", "Multiplayer Freestyle")),
                7 => Some(("mfc", "Multiplayer Fast Caps")),
                _ => None,
            };
            if let Some((short, name)) = result {
                return (short.into(), name.into());
            }
            if g_gametype == 4 {
                return ("fc".into(), "Offline Fast Caps".into());
            }
            return ("df".into(), "Offline Defrag".into());
        }

        if self.game_name_short == "cpma" {
            let result = match g_gametype {
                5 => Some(("ca", "Clan Arena")),
                6 => Some(("ft", "Freeze Tag")),
                7 => Some(("ctfs", "Capturestrike")),
                8 => Some(("ntf", "Not Team Fortress")),
                -1 => Some(("hm", "Hoonymode")),
                _ => None,
            };
            if let Some((short, name)) = result {
                return (short.into(), name.into());
            }
        }

        if self.game_name_short == "osp" && g_gametype >= 5 {
            if g_gametype == 5 {
                return ("ca".into(), "Clan Arena".into());
            }
            let server_freezetag = get_or_zero(&self.parameters, "server_freezetag");
            if server_freezetag == 1 {
                return ("fto".into(), "Freeze Tag (OSP)".into());
            }
            if server_freezetag == 2 {
                return ("ftv".into(), "Freeze Tag (Vanilla)".into());
            }
        }

        if self.game_name_short == "q3w" {
            let g_serverdata = get_or_null(&self.parameters, "g_serverdata").unwrap_or("").to_uppercase();
            let mapping: &[(&str, &str, &str)] = &[
                ("G00", "ffa", "Free for All"),
                ("G01", "1v1", "Duel"),
                ("G03", "tdm", "Team Deathmatch"),
                ("G04", "ctf", "Capture the Flag"),
                ("G05", "ofc", "One Flag CTF"),
                ("G09", "ctfs", "Capturestrike"),
                ("G10", "cctf", "Classic CTF"),
                ("G010", "cctf", "Classic CTF"),
                ("G11", "ar", "Arena"),
                ("G011", "ar", "Arena"),
            ];
            for (key, short, name) in mapping {
                if g_serverdata.contains(key) {
                    return (short.to_string(), name.to_string());
                }
            }
        }

        if self.game_name_short == "q3ut" {
            let result = match g_gametype {
                0 | 1 => Some(("ffa", "Free for All")),
                3 => Some(("tdm", "Team Deathmatch")),
                4 => Some(("tsv", "Team Survivor")),
                5 => Some(("ftl", "Follow the Leader")),
                6 => Some(("ch", "Capture & Hold")),
                7 => Some(("ctf", "Capture the Flag")),
                8 => Some(("bd", "Bomb & Defuse")),
                _ => None,
            };
            if let Some((short, name)) = result {
                return (short.into(), name.into());
            }
        }

        if self.game_name_short == "q3xp" {
            let result = match g_gametype {
                5 => Some(("rtf", "Return The Flag")),
                6 => Some(("ofc", "One Flag CTF")),
                7 => Some(("ca", "Clan Arena")),
                8 => Some(("ft", "Freeze Tag")),
                9 => Some(("ptl", "Protect The Leader")),
                _ => None,
            };
            if let Some((short, name)) = result {
                return (short.into(), name.into());
            }
        }

        match g_gametype {
            0 => ("ffa".into(), "Free for All".into()),
            1 => ("1v1".into(), "Duel".into()),
            2 => ("ffa".into(), "Free for All".into()),
            3 => ("tdm".into(), "Team Deathmatch".into()),
            4 => ("ctf".into(), "Capture the Flag".into()),
            _ => ("ffa".into(), "Free for All".into()),
        }
    }
}

fn df_mod_text(df_mode: i64) -> String {
    match df_mode {
        0 => "Custom",
        1 => "No weapon / No map objects",
        2 => "Weapons & Map Objects",
        3 => "Map Objects Only",
        4 => "Weapons Only",
        5 => "Swinging Hook",
        6 => "Quake3 Hook",
        7 => "Original quake 3",
        8 => "Custom",
        _ => "",
    }
    .to_string()
}

fn old_df_mod_text(df_mode: i64) -> String {
    match df_mode {
        0 => "Pickup",
        1 => "Give All, No BFG",
        2 => "Give All",
        3 => "No weapons",
        _ => "Custom",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn recognizes_defrag_by_fs_game_prefix() {
        let info = GameInfo::new(&params(&[("fs_game", "defrag"), ("defrag_gametype", "5")]), None);
        assert!(info.is_defrag);
        assert_eq!(info.game_name_short, "defrag");
        assert_eq!(info.game_type_short, "mdf");
    }

    #[test]
    fn defrag_gameplay_type_prefers_snapshot_hint_over_df_promode() {
        let info = GameInfo::new(
            &params(&[("fs_game", "defrag"), ("defrag_gametype", "5"), ("df_promode", "0")]),
            Some(true),
        );
        assert_eq!(info.gameplay_type_short, "cpm");
        assert_eq!(info.gameplay_type, "Challenge ProMode");
    }

    #[test]
    fn unknown_mod_falls_back_to_quake3_arena() {
        let info = GameInfo::new(&params(&[]), None);
        assert_eq!(info.game_name_short, "q3a");
        assert_eq!(info.game_name, "Quake 3 Arena");
    }

    #[test]
    fn q3w_gametype_matched_by_substring_in_serverdata() {
        let info = GameInfo::new(&params(&[("fs_game", "threewave"), ("g_serverdata", "xG04y")]), None);
        assert_eq!(info.game_type_short, "ctf");
    }
}
