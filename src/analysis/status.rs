// Cleanliness status - four-way mapping of the cleanliness percent
//
// >70 Clean, 41-70 Moderate, 1-40 Dirty, 0 Unknown. The mapping is total
// over u8; values above 100 never reach it because percents are clamped.

use serde::{Deserialize, Serialize};

/// Status shown on the dashboard badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CleanlinessStatus {
    /// Percent above 70
    Clean,
    /// Percent 41-70
    Moderate,
    /// Percent 1-40
    Dirty,
    /// Percent 0 (no clean class, or zero confidence)
    Unknown,
}

/// Bootstrap-style badge colour for each status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Success,
    Warning,
    Danger,
    Secondary,
}

impl Badge {
    /// CSS class used by the progress bar and badge
    pub fn css_class(&self) -> &'static str {
        match self {
            Badge::Success => "bg-success",
            Badge::Warning => "bg-warning",
            Badge::Danger => "bg-danger",
            Badge::Secondary => "bg-secondary",
        }
    }
}

impl CleanlinessStatus {
    /// Derive the status from a cleanliness percent
    pub fn from_percent(percent: u8) -> Self {
        if percent > 70 {
            CleanlinessStatus::Clean
        } else if percent > 40 {
            CleanlinessStatus::Moderate
        } else if percent > 0 {
            CleanlinessStatus::Dirty
        } else {
            CleanlinessStatus::Unknown
        }
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            CleanlinessStatus::Clean => "Clean",
            CleanlinessStatus::Moderate => "Moderate",
            CleanlinessStatus::Dirty => "Dirty",
            CleanlinessStatus::Unknown => "Unknown",
        }
    }

    /// Free-text note shown under the badge
    pub fn note(&self) -> &'static str {
        match self {
            CleanlinessStatus::Clean => "Oil is in good condition",
            CleanlinessStatus::Moderate => "Oil may need checking",
            CleanlinessStatus::Dirty => "Oil needs replacement",
            CleanlinessStatus::Unknown => "Unable to determine",
        }
    }

    pub fn badge(&self) -> Badge {
        match self {
            CleanlinessStatus::Clean => Badge::Success,
            CleanlinessStatus::Moderate => Badge::Warning,
            CleanlinessStatus::Dirty => Badge::Danger,
            CleanlinessStatus::Unknown => Badge::Secondary,
        }
    }

    /// Font Awesome icon class
    pub fn icon(&self) -> &'static str {
        match self {
            CleanlinessStatus::Clean => "fas fa-check-circle",
            CleanlinessStatus::Moderate => "fas fa-exclamation-circle",
            CleanlinessStatus::Dirty => "fas fa-exclamation-triangle",
            CleanlinessStatus::Unknown => "fas fa-question-circle",
        }
    }
}

impl std::fmt::Display for CleanlinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
