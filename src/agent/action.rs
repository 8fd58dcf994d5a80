//! Flipper actions and the reward scale they are judged on.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, ports::FlipperControl};

/// Neutral value for a (state, action) pair nothing is known about yet.
pub const DEFAULT_REWARD: f64 = 0.5;
/// Penalty for losing the ball.
pub const MIN_REWARD: f64 = 0.0;
/// Best possible reward.
pub const MAX_REWARD: f64 = 1.0;

/// One discrete flipper command the agent can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    EnableLeftFlipper,
    DisableLeftFlipper,
    EnableRightFlipper,
    DisableRightFlipper,
}

impl Action {
    /// Every flipper action, in identifier order.
    pub const ALL: [Action; 4] = [
        Action::EnableLeftFlipper,
        Action::DisableLeftFlipper,
        Action::EnableRightFlipper,
        Action::DisableRightFlipper,
    ];

    /// Stable identifier, used as the column name in persisted policies.
    pub fn uid(&self) -> &'static str {
        match self {
            Action::EnableLeftFlipper => "ENABLE_LEFT_FLIPPER",
            Action::DisableLeftFlipper => "DISABLE_LEFT_FLIPPER",
            Action::EnableRightFlipper => "ENABLE_RIGHT_FLIPPER",
            Action::DisableRightFlipper => "DISABLE_RIGHT_FLIPPER",
        }
    }

    /// Execute the command against the environment.
    pub fn run<C: FlipperControl + ?Sized>(&self, control: &mut C) {
        match self {
            Action::EnableLeftFlipper => control.set_left_flipper(true),
            Action::DisableLeftFlipper => control.set_left_flipper(false),
            Action::EnableRightFlipper => control.set_right_flipper(true),
            Action::DisableRightFlipper => control.set_right_flipper(false),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uid())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Action::ALL
            .into_iter()
            .find(|action| action.uid() == trimmed)
            .ok_or_else(|| Error::UnknownAction {
                uid: trimmed.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        left: Option<bool>,
        right: Option<bool>,
    }

    impl FlipperControl for Recorder {
        fn set_left_flipper(&mut self, enabled: bool) {
            self.left = Some(enabled);
        }

        fn set_right_flipper(&mut self, enabled: bool) {
            self.right = Some(enabled);
        }
    }

    #[test]
    fn test_uids_are_unique_and_parse_back() {
        let mut uids: Vec<&str> = Action::ALL.iter().map(Action::uid).collect();
        uids.sort_unstable();
        uids.dedup();
        assert_eq!(uids.len(), Action::ALL.len());

        for action in Action::ALL {
            assert_eq!(action.uid().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_uid_is_rejected() {
        let err = "PULL_PLUNGER".parse::<Action>().unwrap_err();
        assert!(matches!(err, Error::UnknownAction { uid } if uid == "PULL_PLUNGER"));
    }

    #[test]
    fn test_run_dispatches_to_flipper() {
        let mut recorder = Recorder::default();
        Action::EnableLeftFlipper.run(&mut recorder);
        assert_eq!(recorder.left, Some(true));
        assert_eq!(recorder.right, None);

        Action::DisableRightFlipper.run(&mut recorder);
        assert_eq!(recorder.right, Some(false));
    }

    #[test]
    fn test_reward_scale() {
        assert!(MIN_REWARD < DEFAULT_REWARD && DEFAULT_REWARD < MAX_REWARD);
    }
}
