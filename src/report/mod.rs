//! Report presentation layer.
//!
//! - [`format`] - percent-change and ROI display formatting
//! - [`access`] - role capability checks
//! - [`view`] - report payload composition from snapshot rows

pub mod access;
pub mod format;
pub mod view;

pub use access::{can_manage_market_data, can_view_reports, Role};
pub use format::{percent_change, percent_change_display, roi_display, SENTINEL};
pub use view::{BucketReport, EntityReport};
