use crate::model::Fruit;
use record_client::AccountStatus;

/// Snapshot of everything a frontend renders.
///
/// Published over a `watch` channel by the view model actor; every observer
/// sees the latest complete snapshot. The fruit list mirrors the remote
/// store's contents for the record type, sorted by name ascending, modulo
/// in-flight operations and eventual-consistency lag after pushed changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// The fruit list, sorted by name ascending.
    pub fruits: Vec<Fruit>,
    /// Account usability, once the startup check has answered.
    pub account_status: Option<AccountStatus>,
    /// Human-readable account status for direct display.
    pub status_text: String,
    /// Whether the user granted the discoverability capability.
    pub have_permission: bool,
    /// The account's display name; empty when unavailable.
    pub user_identity: String,
    /// Last user-visible error or status message.
    pub message: String,
}

impl ViewState {
    /// Fruit names in display order, mostly useful in tests and logs.
    pub fn fruit_names(&self) -> Vec<&str> {
        self.fruits.iter().map(Fruit::name).collect()
    }
}
