use crate::form::{FormOptions, OverridePolicy};
use crate::schema::PropertyOrder;
use crate::statics;
use clap::Parser;
use std::{ffi::OsString, path::PathBuf, time::Duration};

/// Command line: `valform [values.yaml] [schema.json]` plus a few switches.
#[derive(Parser, Debug)]
#[command(name = "valform", version)]
#[command(about = "Edit a YAML values file as text and as a form generated from its JSON Schema")]
pub struct Cli {
    /// Values document to edit.
    #[arg(default_value = statics::DEFAULT_VALUES_FILE)]
    pub values: PathBuf,
    /// JSON (or JSON5) schema the form is generated from.
    #[arg(default_value = statics::DEFAULT_SCHEMA_FILE)]
    pub schema: PathBuf,
    /// Order properties by label instead of declaration order.
    #[arg(long, default_value_t = false)]
    pub alphabetical: bool,
    /// A value equal to its schema default stops counting as an override.
    #[arg(long, default_value_t = false)]
    pub match_default_clears: bool,
    /// Quiet period in milliseconds before an edit reaches the other view.
    #[arg(long = "debounce-ms", default_value_t = statics::DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,
}

/// Startup configuration: where the two sources live and how the editor behaves.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub values_path: PathBuf,
    pub schema_path: PathBuf,
    /// Quiet period before an edit is propagated to the other view.
    pub debounce: Duration,
    pub order: PropertyOrder,
    pub override_policy: OverridePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            values_path: PathBuf::from(statics::DEFAULT_VALUES_FILE),
            schema_path: PathBuf::from(statics::DEFAULT_SCHEMA_FILE),
            debounce: Duration::from_millis(statics::DEFAULT_DEBOUNCE_MS),
            order: PropertyOrder::Declaration,
            override_policy: OverridePolicy::Sticky,
        }
    }
}

impl From<Cli> for EditorConfig {
    fn from(cli: Cli) -> Self {
        Self {
            values_path: cli.values,
            schema_path: cli.schema,
            debounce: Duration::from_millis(cli.debounce_ms),
            order: if cli.alphabetical {
                PropertyOrder::Alphabetical
            } else {
                PropertyOrder::Declaration
            },
            override_policy: if cli.match_default_clears {
                OverridePolicy::MatchDefaultClears
            } else {
                OverridePolicy::Sticky
            },
        }
    }
}

impl EditorConfig {
    /// Parse a full argument list, program name first.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from)
    }

    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            order: self.order,
            override_policy: self.override_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EditorConfig;
    use crate::form::OverridePolicy;
    use crate::schema::PropertyOrder;
    use pretty_assertions::assert_eq;
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn no_args_uses_defaults() {
        let config = EditorConfig::from_args(["valform"]).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.debounce, Duration::from_millis(500));
    }

    #[test]
    fn positional_paths_and_switches() {
        let config = EditorConfig::from_args([
            "valform",
            "chart/values.yaml",
            "--alphabetical",
            "chart/values.schema.json",
            "--match-default-clears",
            "--debounce-ms",
            "50",
        ])
        .unwrap();
        assert_eq!(config.values_path, PathBuf::from("chart/values.yaml"));
        assert_eq!(config.schema_path, PathBuf::from("chart/values.schema.json"));
        assert_eq!(config.order, PropertyOrder::Alphabetical);
        assert_eq!(config.override_policy, OverridePolicy::MatchDefaultClears);
        assert_eq!(config.debounce, Duration::from_millis(50));
    }

    #[test]
    fn values_path_alone_keeps_default_schema() {
        let config = EditorConfig::from_args(["valform", "my.yaml"]).unwrap();
        assert_eq!(config.values_path, PathBuf::from("my.yaml"));
        assert_eq!(config.schema_path, EditorConfig::default().schema_path);
    }

    #[test]
    fn bad_args_are_rejected() {
        assert!(EditorConfig::from_args(["valform", "--bogus"]).is_err());
        assert!(EditorConfig::from_args(["valform", "--debounce-ms", "soon"]).is_err());
        assert!(EditorConfig::from_args(["valform", "a", "b", "c"]).is_err());
    }
}
