//! Application states and their view regions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use arlearn_core::ArError;

/// Auxiliary header region shown alongside video, quiz and summary
pub const PROGRESS_REGION: &str = "progress";

/// UI state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    Loading,
    CampusSelection,
    Topics,
    Menu,
    Scanning,
    ArReady,
    Animating,
    Video,
    Quiz,
    Summary,
}

impl AppState {
    pub const ALL: [AppState; 10] = [
        AppState::Loading,
        AppState::CampusSelection,
        AppState::Topics,
        AppState::Menu,
        AppState::Scanning,
        AppState::ArReady,
        AppState::Animating,
        AppState::Video,
        AppState::Quiz,
        AppState::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppState::Loading => "loading",
            AppState::CampusSelection => "campus_selection",
            AppState::Topics => "topics",
            AppState::Menu => "menu",
            AppState::Scanning => "scanning",
            AppState::ArReady => "ar_ready",
            AppState::Animating => "animating",
            AppState::Video => "video",
            AppState::Quiz => "quiz",
            AppState::Summary => "summary",
        }
    }

    /// The one primary region visible in this state
    pub fn primary_region(self) -> &'static str {
        match self {
            AppState::Loading => "loading-section",
            AppState::CampusSelection => "campus-selection",
            AppState::Topics => "topics",
            AppState::Menu => "menu-section",
            AppState::Scanning => "scanning-section",
            AppState::ArReady => "ar-ready-section",
            AppState::Animating => "animating-section",
            AppState::Video => "video-section",
            AppState::Quiz => "quiz-section",
            AppState::Summary => "summary-section",
        }
    }

    /// Whether the progress header is shown
    pub fn shows_progress(self) -> bool {
        matches!(self, AppState::Video | AppState::Quiz | AppState::Summary)
    }

    /// Every region this state makes visible
    pub fn regions(self) -> Vec<&'static str> {
        let mut regions = vec![self.primary_region()];
        if self.shows_progress() {
            regions.push(PROGRESS_REGION);
        }
        regions
    }

    /// States during which an AR scene may be live
    pub fn is_ar(self) -> bool {
        matches!(self, AppState::ArReady | AppState::Animating)
    }
}

/// Every primary region, in display order
pub fn primary_regions() -> impl Iterator<Item = &'static str> {
    AppState::ALL.into_iter().map(AppState::primary_region)
}

/// Every region the machine manages
pub fn all_regions() -> impl Iterator<Item = &'static str> {
    primary_regions().chain(std::iter::once(PROGRESS_REGION))
}

impl FromStr for AppState {
    type Err = ArError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ArError::InvalidState(s.to_string()))
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_round_trip() {
        for state in AppState::ALL {
            assert_eq!(state.as_str().parse::<AppState>().unwrap(), state);
        }
        assert_eq!(
            "bogus".parse::<AppState>(),
            Err(ArError::InvalidState("bogus".into()))
        );
    }

    #[test]
    fn test_serde_names_match() {
        let json = serde_json::to_string(&AppState::CampusSelection).unwrap();
        assert_eq!(json, "\"campus_selection\"");
    }

    #[test]
    fn test_regions() {
        assert_eq!(AppState::Quiz.regions(), vec!["quiz-section", PROGRESS_REGION]);
        assert_eq!(AppState::Menu.regions(), vec!["menu-section"]);
        assert_eq!(primary_regions().count(), 10);
        assert_eq!(all_regions().count(), 11);
    }
}
