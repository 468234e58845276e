//! Testing helpers and mock utilities.
//!
//! Provides convenient constructors for mocked catalogs and admin directories.

use crate::admin::{MockAdminDirectory, NotifySummary};
use crate::storage::guides::MockGuideCatalog;
use crate::storage::Guide;

/// Build a guide with a file attached.
#[must_use]
pub fn guide(id: &str, title: &str) -> Guide {
    Guide {
        id: id.to_string(),
        title: title.to_string(),
        file_id: format!("file-{id}"),
        created_at: None,
    }
}

/// Create a mock catalog whose read operations serve `guides`.
///
/// Write operations have no expectations; tests add the ones they need.
#[must_use]
pub fn mock_catalog_with(guides: Vec<Guide>) -> MockGuideCatalog {
    let mut mock = MockGuideCatalog::new();

    let all = guides.clone();
    mock.expect_list_all().returning(move || Ok(all.clone()));

    let available: Vec<Guide> = guides.iter().filter(|g| g.is_available()).cloned().collect();
    mock.expect_list_available()
        .returning(move || Ok(available.clone()));

    mock.expect_get_by_id()
        .returning(move |id| Ok(guides.iter().find(|g| g.id == id).cloned()));

    mock
}

/// Create a mock admin directory for the given ids.
///
/// Notifications always report full delivery.
#[must_use]
pub fn mock_admins(ids: &[i64]) -> MockAdminDirectory {
    let mut mock = MockAdminDirectory::new();

    let admins = ids.to_vec();
    mock.expect_is_admin()
        .returning(move |id| admins.contains(&id));

    let count = ids.len();
    mock.expect_notify_all().returning(move |_, _| NotifySummary {
        delivered: count,
        failed: Vec::new(),
    });

    mock
}
