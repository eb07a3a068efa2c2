//! Scenario files: a match configuration plus a timed input script.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use waypoint_defence_core::{MatchConfig, Point, TowerKind};
use waypoint_defence_system_builder::Input;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Scenario used when no file is provided on the command line.
const BUILTIN_SCENARIO: &str = include_str!("../scenarios/level1.toml");

/// Parsed and validated scenario.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    version: u32,
    #[serde(rename = "match", default)]
    pub(crate) config: MatchConfig,
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

/// Player action issued once the simulated clock reaches `at_secs`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct ScriptStep {
    pub(crate) at_secs: f32,
    pub(crate) action: Action,
}

impl ScriptStep {
    pub(crate) fn at(&self) -> Duration {
        Duration::try_from_secs_f32(self.at_secs).unwrap_or(Duration::ZERO)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Action {
    SelectTower { kind: u32 },
    PlaceAt { x: f32, y: f32 },
    SelectAt { x: f32, y: f32 },
    Deselect,
    Upgrade,
    Sell,
    TogglePause,
    Restart,
}

impl Action {
    pub(crate) fn to_input(self) -> Input {
        match self {
            Self::SelectTower { kind } => Input::SelectTowerKind(TowerKind::new(kind)),
            Self::PlaceAt { x, y } => Input::PlaceAt(Point::new(x, y)),
            Self::SelectAt { x, y } => Input::SelectTowerAt(Point::new(x, y)),
            Self::Deselect => Input::Deselect,
            Self::Upgrade => Input::UpgradeSelected,
            Self::Sell => Input::SellSelected,
            Self::TogglePause => Input::TogglePause,
            Self::Restart => Input::Restart,
        }
    }
}

impl Scenario {
    /// Loads the bundled demo level.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_SCENARIO).context("bundled scenario is invalid")
    }

    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to load scenario from {}", path.display()))
    }

    /// Parses and validates scenario contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let mut scenario: Scenario =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if scenario.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                scenario.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }

        scenario
            .config
            .validate()
            .context("scenario match configuration is invalid")?;

        if let Some(step) = scenario
            .script
            .iter()
            .find(|step| !(step.at_secs.is_finite() && step.at_secs >= 0.0))
        {
            bail!("script step scheduled at invalid time {}", step.at_secs);
        }
        scenario
            .script
            .sort_by(|left, right| left.at_secs.total_cmp(&right.at_secs));

        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scenario_is_valid() {
        let scenario = Scenario::builtin().expect("bundled scenario parses");
        assert_eq!(scenario.config.waves.len(), 3);
        assert_eq!(scenario.config.towers.len(), 2);
        assert_eq!(
            scenario.script[0].action.to_input(),
            Input::SelectTowerKind(TowerKind::new(0))
        );
    }

    #[test]
    fn missing_match_table_uses_default_level() {
        let scenario = Scenario::parse("version = 1").expect("minimal scenario parses");
        assert_eq!(scenario.config, MatchConfig::default());
        assert!(scenario.script.is_empty());
    }

    #[test]
    fn partial_match_table_overrides_defaults() {
        let scenario = Scenario::parse(
            r#"
            version = 1

            [match]
            starting_money = 250
            "#,
        )
        .expect("partial scenario parses");
        assert_eq!(scenario.config.starting_money, 250);
        assert_eq!(scenario.config.waves, MatchConfig::default().waves);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let error = Scenario::parse("version = 7").expect_err("version 7 is unsupported");
        assert!(error.to_string().contains("unsupported scenario version"));
    }

    #[test]
    fn invalid_match_configuration_is_rejected() {
        let error = Scenario::parse(
            r#"
            version = 1

            [match]
            path = []
            "#,
        )
        .expect_err("empty path is invalid");
        assert!(format!("{error:#}").contains("no waypoint path assigned"));
    }

    #[test]
    fn script_is_sorted_by_time() {
        let scenario = Scenario::parse(
            r#"
            version = 1

            [[script]]
            at_secs = 4.0
            action = { type = "upgrade" }

            [[script]]
            at_secs = 1.0
            action = { type = "select_at", x = 2.0, y = 3.0 }
            "#,
        )
        .expect("script parses");

        assert_eq!(
            scenario
                .script
                .iter()
                .map(|step| step.action.to_input())
                .collect::<Vec<_>>(),
            vec![
                Input::SelectTowerAt(Point::new(2.0, 3.0)),
                Input::UpgradeSelected,
            ]
        );
        assert_eq!(scenario.script[0].at(), Duration::from_secs(1));
    }

    #[test]
    fn negative_step_time_is_rejected() {
        let result = Scenario::parse(
            r#"
            version = 1

            [[script]]
            at_secs = -1.0
            action = { type = "sell" }
            "#,
        );
        assert!(result.is_err());
    }
}
