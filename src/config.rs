use std::path::PathBuf;
use std::str::FromStr;

use crate::field::seed::Droplet;

/// Startup configuration.
///
/// Defaults reproduce the stock demo: an 800x600 window showing an 800x600
/// field seeded with a single drop. Every value can be overridden from the
/// environment, see [`Config::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub window_width: u32,
    pub window_height: u32,

    /// Simulation size. Independent of the window size; the field is
    /// stretched over the quad.
    pub field_width: usize,
    pub field_height: usize,

    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,

    pub drops: Vec<Droplet>,
    /// Squared radius shared by all drops.
    pub drop_radius2: i64,

    /// Abort startup on shader compile or link failures instead of logging
    /// them and running without a pipeline.
    pub strict_shaders: bool,
}

impl Default for Config {
    fn default() -> Self {
        let shader_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders");
        Self {
            window_width: 800,
            window_height: 600,
            field_width: 800,
            field_height: 600,
            vertex_shader: shader_dir.join("field.vert.wgsl"),
            fragment_shader: shader_dir.join("field.frag.wgsl"),
            drops: vec![Droplet::new(100, 100)],
            drop_radius2: 100,
            strict_shaders: false,
        }
    }
}

impl Config {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from the defaults and whatever `lookup` returns
    /// for the `FIELD_*` keys. Values that fail to parse are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        override_positive(&lookup, "FIELD_WINDOW_WIDTH", &mut config.window_width);
        override_positive(&lookup, "FIELD_WINDOW_HEIGHT", &mut config.window_height);
        override_positive(&lookup, "FIELD_SIM_WIDTH", &mut config.field_width);
        override_positive(&lookup, "FIELD_SIM_HEIGHT", &mut config.field_height);
        override_positive(&lookup, "FIELD_DROP_RADIUS2", &mut config.drop_radius2);

        if let Some(path) = lookup("FIELD_VERTEX_SHADER") {
            config.vertex_shader = path.into();
        }
        if let Some(path) = lookup("FIELD_FRAGMENT_SHADER") {
            config.fragment_shader = path.into();
        }

        if let Some(value) = lookup("FIELD_DROPS") {
            match parse_drops(&value) {
                Some(drops) => config.drops = drops,
                None => log::warn!("Ignoring malformed FIELD_DROPS={value:?}"),
            }
        }

        if let Some(value) = lookup("FIELD_STRICT_SHADERS") {
            config.strict_shaders = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config
    }
}

fn override_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T)
where
    T: FromStr + PartialOrd + Default,
{
    let Some(value) = lookup(key) else {
        return;
    };
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => *target = parsed,
        _ => log::warn!("Ignoring invalid {key}={value:?}"),
    }
}

/// Parses `row:col` pairs separated by commas. An empty string is an empty
/// drop list.
fn parse_drops(value: &str) -> Option<Vec<Droplet>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (row, col) = pair.split_once(':')?;
            Some(Droplet::new(
                row.trim().parse().ok()?,
                col.trim().parse().ok()?,
            ))
        })
        .collect()
}
