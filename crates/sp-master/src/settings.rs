//! User settings consulted by the session.

/// Persisted user preferences. The embedding application decides where
/// they live; the session only reads and writes through this trait.
pub trait SettingsService {
    /// Whether to warn when a linked secondary source cannot be moved.
    fn show_link_warning(&self) -> bool;
    fn set_show_link_warning(&mut self, show: bool);
}

/// Settings held in memory for the lifetime of the session.
#[derive(Clone, Debug)]
pub struct InMemorySettings {
    show_link_warning: bool,
}

impl Default for InMemorySettings {
    fn default() -> Self {
        Self { show_link_warning: true }
    }
}

impl SettingsService for InMemorySettings {
    fn show_link_warning(&self) -> bool {
        self.show_link_warning
    }

    fn set_show_link_warning(&mut self, show: bool) {
        self.show_link_warning = show;
    }
}
