//! Admin-area page selection sub-state.

use serde::{Deserialize, Serialize};

/// Pages of the authenticated admin area. The selection is view sub-state
/// only; it is reset on logout and has no effect on the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Dashboard,
    Projects,
    Clients,
    Opportunities,
    Team,
    Finance,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Dashboard,
        Page::Projects,
        Page::Clients,
        Page::Opportunities,
        Page::Team,
        Page::Finance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Projects => "Projects",
            Page::Clients => "Clients",
            Page::Opportunities => "Opportunities",
            Page::Team => "Team",
            Page::Finance => "Finance",
        }
    }

    /// Map a 1-based ordinal (the keyboard shortcut) to a page.
    pub fn from_ordinal(n: usize) -> Option<Page> {
        Page::ALL.get(n.checked_sub(1)?).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dashboard() {
        assert_eq!(Page::default(), Page::Dashboard);
    }

    #[test]
    fn ordinals_match_order() {
        assert_eq!(Page::from_ordinal(1), Some(Page::Dashboard));
        assert_eq!(Page::from_ordinal(6), Some(Page::Finance));
        assert_eq!(Page::from_ordinal(0), None);
        assert_eq!(Page::from_ordinal(7), None);
    }
}
