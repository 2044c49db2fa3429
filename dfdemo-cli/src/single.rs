//! `process-single` subcommand: suggests a canonical filename for one demo file,
//! optionally emitting full metadata as JSON. Ports `process_single_demo.py` and
//! `renamer.py`'s `parse_demo_metadata`.

use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use dfdemo_core::naming::Demo;
use dfdemo_core::parser::parse_demo_file;

#[derive(Debug, Serialize)]
pub struct DemoMetadata {
    pub suggested_filename: String,
    pub record_date: Option<String>,
    pub map_name: String,
    pub player_name: String,
    pub physics: String,
    pub time_seconds: f64,
}

fn build_demo(file_path: impl AsRef<Path>) -> Result<Demo> {
    let mut raw = parse_demo_file(file_path)?;
    Ok(Demo::get_demo_from_raw_info(&mut raw))
}

fn bare_name(demo_new_name: &str) -> Option<String> {
    Path::new(demo_new_name).file_name().map(|n| n.to_string_lossy().into_owned())
}

pub fn suggested_filename(file_path: impl AsRef<Path>) -> Option<String> {
    let mut demo = build_demo(file_path).ok()?;
    if demo.has_error {
        return None;
    }
    bare_name(&demo.demo_new_name())
}

pub fn metadata(file_path: impl AsRef<Path>) -> Option<DemoMetadata> {
    let mut demo = build_demo(file_path).ok()?;
    if demo.has_error {
        return None;
    }
    let suggested_filename = bare_name(&demo.demo_new_name())?;
    Some(DemoMetadata {
        suggested_filename,
        record_date: demo.record_time.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        map_name: demo.map_name.clone(),
        player_name: demo.player_name.clone(),
        physics: demo.modphysic.clone(),
        time_seconds: demo.time.as_secs_f64(),
    })
}

pub fn run(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        bail!("Demo file not found: {}", file.display());
    }

    if json {
        match metadata(file) {
            Some(meta) => {
                println!("{}", serde_json::to_string_pretty(&meta)?);
                Ok(())
            }
            None => bail!("Could not parse demo file"),
        }
    } else {
        match suggested_filename(file) {
            Some(name) => {
                println!("{name}");
                Ok(())
            }
            None => bail!("Could not parse demo file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_strips_directory_component() {
        assert_eq!(bare_name("/tmp/demos/foo.dm_68"), Some("foo.dm_68".to_string()));
    }

    #[test]
    fn run_reports_missing_file() {
        let result = run(Path::new("/nonexistent/demo.dm_68"), false);
        assert!(result.is_err());
    }
}
