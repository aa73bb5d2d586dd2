use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colours that change with the theme. Zone and series colours do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub track: &'static str,
    pub needle: &'static str,
    pub grid: &'static str,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: "#ffffff",
                text: "#333333",
                track: "#e0e0e0",
                needle: "#333333",
                grid: "#cccccc",
            },
            Theme::Dark => Palette {
                background: "#1e1e1e",
                text: "#e0e0e0",
                track: "#444444",
                needle: "#f0f0f0",
                grid: "#555555",
            },
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn parse(raw: &str) -> Option<Theme> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Publishes theme changes to every widget that subscribed.
pub struct ThemeBus {
    tx: watch::Sender<Theme>,
}

impl ThemeBus {
    pub fn new(initial: Theme) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    /// Returns true when the theme actually changed; subscribers are only
    /// notified in that case.
    pub fn set(&self, theme: Theme) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == theme {
                return false;
            }
            *current = theme;
            true
        });
        if changed {
            tracing::debug!("Theme changed to {:?}", theme);
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }
}

impl Default for ThemeBus {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}
