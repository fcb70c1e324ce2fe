//! Light/dark theme preference

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::SessionStore;

/// Color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Background color advertised to the host chrome
    pub fn meta_color(self) -> &'static str {
        match self {
            Theme::Light => "#ffffff",
            Theme::Dark => "#0f172a",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Flip the stored theme and persist the result
pub fn toggle_theme(store: &dyn SessionStore) -> Result<Theme> {
    let theme = store.theme()?.toggled();
    store.save_theme(theme)?;
    tracing::info!("Switched to {} theme", theme);
    Ok(theme)
}
