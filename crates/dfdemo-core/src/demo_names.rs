//! Candidate-name bookkeeping: a demo can surface a player's name from several
//! independent sources (df_name config string, console chat, online login, a
//! filename already in brackets) and they don't always agree.

use std::collections::HashMap;

use crate::console::{normalize_name, remove_colors};

pub const DEFAULT_NAME: &str = "UnnamedPlayer";

#[derive(Debug, Default, Clone)]
pub struct DemoNames {
    pub df_name: Option<String>,
    pub u_name: Option<String>,
    pub o_name: Option<String>,
    pub l_name: Option<String>,
    pub c_name: Option<String>,
    pub f_name: Option<String>,
}

impl DemoNames {
    pub fn set_names_by_player_info(&mut self, player_info: Option<&HashMap<String, String>>) {
        let Some(info) = player_info else { return };
        self.df_name = info.get("df_name").cloned();
        if let Some(raw_name) = info.get("name") {
            self.u_name = Some(normalize_name(&remove_colors(raw_name).unwrap_or_default()));
        }
    }

    pub fn set_console_name(&mut self, online_name: Option<&str>, login_name: Option<&str>, is_online: bool) {
        if is_online {
            self.o_name = online_name.map(|n| normalize_name(&remove_colors(n).unwrap_or_default()));
            self.l_name = login_name.map(|n| normalize_name(&remove_colors(n).unwrap_or_default()));
        } else {
            self.c_name = online_name.map(|n| normalize_name(&remove_colors(n).unwrap_or_default()));
        }
    }

    pub fn set_brackets_name(&mut self, brackets_name: impl Into<String>) {
        self.f_name = Some(brackets_name.into());
    }

    /// Priority order is df, c, u, o, l, f — deliberately NOT the struct's field order.
    pub fn choose_normal_name(&self) -> String {
        choose_name(&[
            self.df_name.as_deref(),
            self.c_name.as_deref(),
            self.u_name.as_deref(),
            self.o_name.as_deref(),
            self.l_name.as_deref(),
            self.f_name.as_deref(),
        ])
    }
}

pub fn choose_name(names: &[Option<&str>]) -> String {
    for name in names {
        if let Some(n) = name {
            if !n.is_empty() && *n != DEFAULT_NAME {
                return n.to_string();
            }
        }
    }
    DEFAULT_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_name_strips_unsafe_characters() {
        assert_eq!(normalize_name("pl@yer^1"), "player1");
    }

    #[test]
    fn choose_normal_name_prefers_df_name_over_others() {
        let mut names = DemoNames::default();
        names.u_name = Some("fallback".into());
        names.df_name = Some("primary".into());
        assert_eq!(names.choose_normal_name(), "primary");
    }

    #[test]
    fn choose_normal_name_falls_back_to_default() {
        let names = DemoNames::default();
        assert_eq!(names.choose_normal_name(), DEFAULT_NAME);
    }

    #[test]
    fn choose_name_skips_default_name_entries() {
        let result = choose_name(&[Some(DEFAULT_NAME), Some("real")]);
        assert_eq!(result, "real");
    }
}
