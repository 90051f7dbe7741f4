//! Column-level repair rules applied between loading and shaping.

pub mod date;
pub mod identity;
pub mod misplaced;
pub mod patterns;
pub mod url;

pub use self::date::{normalize_date, normalize_dates};
pub use self::identity::reconcile_identity;
pub use self::misplaced::correct_misplaced;
pub use self::url::reconcile_urls;
