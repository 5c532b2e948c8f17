//! Command Line
//!
//! Flags are the last configuration layer, applied over the file and
//! environment layers resolved by [`CelebrationConfig::load`].

use std::path::PathBuf;

use clap::Parser;

use countdown_core::{CelebrationConfig, Clock, LaunchQuery, Target, TargetError};

/// Terminal New Year countdown with snowfall and fireworks
#[derive(Parser, Debug)]
#[command(name = "newyear")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Start directly in fireworks mode
    #[arg(long)]
    pub fireworks: bool,

    /// Launch options in query form (`fireworks=1`)
    #[arg(long, env = "NEWYEAR_QUERY", value_name = "QUERY")]
    pub query: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "NEWYEAR_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Count down to N seconds from now instead of the next New Year
    #[arg(long, value_name = "N")]
    pub in_seconds: Option<u64>,

    /// Directory holding the fireworks modules
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Ambient audio track for the celebration
    #[arg(long, value_name = "FILE")]
    pub audio: Option<PathBuf>,
}

impl Args {
    /// Whether the fireworks override is set by flag or query
    pub fn force_fireworks(&self) -> bool {
        self.fireworks
            || self
                .query
                .as_deref()
                .is_some_and(|q| LaunchQuery::parse(q).force_fireworks)
    }

    /// Apply flag overrides to a resolved configuration
    pub fn apply(&self, mut config: CelebrationConfig) -> CelebrationConfig {
        if let Some(dir) = &self.assets {
            config.assets_dir = Some(dir.clone());
        }
        if let Some(track) = &self.audio {
            config.audio_path = Some(track.clone());
        }
        config
    }

    /// The countdown target
    pub fn target(&self, clock: &dyn Clock) -> Result<Target, TargetError> {
        match self.in_seconds {
            Some(secs) => {
                let offset = i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX / 2);
                Ok(Target::at_epoch_ms(clock.now_ms().saturating_add(offset)))
            }
            None => Target::next_local_new_year(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countdown_core::ManualClock;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fireworks_by_flag_or_query() {
        let args = Args::try_parse_from(["newyear", "--fireworks"]).unwrap();
        assert!(args.force_fireworks());

        let args = Args::try_parse_from(["newyear", "--query", "?fireworks=1"]).unwrap();
        assert!(args.force_fireworks());

        let args = Args::try_parse_from(["newyear", "--query", "fireworks=yes"]).unwrap();
        assert!(!args.force_fireworks());
    }

    #[test]
    fn test_in_seconds_target() {
        let args = Args::try_parse_from(["newyear", "--in-seconds", "10"]).unwrap();
        let clock = ManualClock::new(1_700_000_000_000);
        let target = args.target(&clock).unwrap();
        assert_eq!(target.epoch_ms(), 1_700_000_010_000);
    }

    #[test]
    fn test_flags_override_config() {
        let args =
            Args::try_parse_from(["newyear", "--assets", "/srv/fireworks", "--audio", "bgm.mp3"])
                .unwrap();
        let config = args.apply(CelebrationConfig::default());
        assert_eq!(config.assets_dir, Some(PathBuf::from("/srv/fireworks")));
        assert_eq!(config.audio_path, Some(PathBuf::from("bgm.mp3")));
    }
}
