use tracing::{debug, instrument};

use crate::columns::{LINK, MA_PATH, MA_REFERRER, MA_URL, URL};
use crate::error::SchemaError;
use crate::records::{Record, RecordSet};

/// Origin used to turn relative `ma_path` values into full URLs and back.
pub const BASE_ORIGIN: &str = "https://uniace.vn";
/// Placeholder for rows where no URL source produced anything.
pub const ONGOING_USE: &str = "Ongoing Use";
/// Placeholder for a missing referrer.
pub const LIVE_ACCESS: &str = "Live Access";

#[derive(Debug, Clone, Copy)]
struct UrlColumns {
    ma_url: usize,
    ma_path: usize,
    url: usize,
    link: usize,
    referrer: usize,
}

#[derive(Debug, Default)]
struct UrlFixCounts {
    from_path: usize,
    from_url: usize,
    from_link: usize,
    path_derived: usize,
    ongoing_use: usize,
    path_fallback: usize,
    live_access: usize,
}

/// Populate `MA URL`, `ma_path` and `MA Referrer`.
///
/// Rules run in order and each only touches rows the earlier ones left null:
///
/// 1. `MA URL` from [`BASE_ORIGIN`] + `ma_path`
/// 2. `MA URL` from `URL`
/// 3. `MA URL` from `Link` when it mentions [`BASE_ORIGIN`]
/// 4. `ma_path` from `MA URL` with the origin stripped out
/// 5. sentinels: `MA URL` to [`ONGOING_USE`], then `ma_path` to `MA URL`,
///    then `MA Referrer` to [`LIVE_ACCESS`]
#[instrument(skip_all, fields(rows = set.len()))]
pub fn reconcile_urls(mut set: RecordSet) -> Result<RecordSet, SchemaError> {
    let cols = UrlColumns {
        ma_url: set.column(MA_URL)?,
        ma_path: set.column(MA_PATH)?,
        url: set.column(URL)?,
        link: set.column(LINK)?,
        referrer: set.column(MA_REFERRER)?,
    };

    let mut counts = UrlFixCounts::default();
    for row in set.rows_mut() {
        fix_row(row, cols, &mut counts);
    }

    debug!(?counts, "url columns reconciled");
    Ok(set)
}

fn fix_row(row: &mut Record, cols: UrlColumns, counts: &mut UrlFixCounts) {
    if row.is_null(cols.ma_url) {
        if let Some(full) = row.get(cols.ma_path).map(|p| format!("{BASE_ORIGIN}{p}")) {
            row.set(cols.ma_url, Some(full));
            counts.from_path += 1;
        }
    }

    if row.is_null(cols.ma_url) {
        if let Some(url) = row.get(cols.url).map(str::to_owned) {
            row.set(cols.ma_url, Some(url));
            counts.from_url += 1;
        }
    }

    if row.is_null(cols.ma_url) {
        let link = row
            .get(cols.link)
            .filter(|l| l.contains(BASE_ORIGIN))
            .map(str::to_owned);
        if let Some(link) = link {
            row.set(cols.ma_url, Some(link));
            counts.from_link += 1;
        }
    }

    if row.is_null(cols.ma_path) {
        if let Some(path) = row.get(cols.ma_url).map(|u| u.replace(BASE_ORIGIN, "")) {
            row.set(cols.ma_path, Some(path));
            counts.path_derived += 1;
        }
    }

    if row.is_null(cols.ma_url) {
        row.set(cols.ma_url, Some(ONGOING_USE.to_string()));
        counts.ongoing_use += 1;
    }
    if row.is_null(cols.ma_path) {
        let url = row.get(cols.ma_url).map(str::to_owned);
        row.set(cols.ma_path, url);
        counts.path_fallback += 1;
    }
    if row.is_null(cols.referrer) {
        row.set(cols.referrer, Some(LIVE_ACCESS.to_string()));
        counts.live_access += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HEADER: [&str; 5] = [MA_URL, MA_PATH, URL, LINK, MA_REFERRER];

    fn one_row(cells: [Option<&str>; 5]) -> RecordSet {
        RecordSet::from_rows(
            HEADER,
            vec![cells.iter().map(|c| c.map(str::to_owned)).collect()],
        )
        .unwrap()
    }

    #[test]
    fn path_wins_over_url_and_link() {
        let set = reconcile_urls(one_row([
            None,
            Some("/khoa-hoc"),
            Some("https://other.example/x"),
            Some("https://uniace.vn/link"),
            Some("google"),
        ]))
        .unwrap();
        assert_eq!(set.value(0, MA_URL), Some("https://uniace.vn/khoa-hoc"));
        assert_eq!(set.value(0, MA_PATH), Some("/khoa-hoc"));
        assert_eq!(set.value(0, MA_REFERRER), Some("google"));
    }

    #[test]
    fn url_copied_verbatim_and_path_derived() {
        let set = reconcile_urls(one_row([
            None,
            None,
            Some("https://uniace.vn/lien-he"),
            None,
            None,
        ]))
        .unwrap();
        assert_eq!(set.value(0, MA_URL), Some("https://uniace.vn/lien-he"));
        assert_eq!(set.value(0, MA_PATH), Some("/lien-he"));
        assert_eq!(set.value(0, MA_REFERRER), Some(LIVE_ACCESS));
    }

    #[test]
    fn link_needs_base_origin() {
        let ignored = reconcile_urls(one_row([
            None,
            None,
            None,
            Some("https://facebook.com/post"),
            None,
        ]))
        .unwrap();
        assert_eq!(ignored.value(0, MA_URL), Some(ONGOING_USE));
        assert_eq!(ignored.value(0, MA_PATH), Some(ONGOING_USE));

        let taken = reconcile_urls(one_row([
            None,
            None,
            None,
            Some("ref=https://uniace.vn/blog"),
            None,
        ]))
        .unwrap();
        assert_eq!(taken.value(0, MA_URL), Some("ref=https://uniace.vn/blog"));
        // substring removal, not prefix stripping
        assert_eq!(taken.value(0, MA_PATH), Some("ref=/blog"));
    }

    #[test]
    fn existing_values_are_not_displaced() {
        let set = reconcile_urls(one_row([
            Some("https://uniace.vn/a"),
            Some("/b"),
            Some("https://uniace.vn/c"),
            None,
            Some("direct"),
        ]))
        .unwrap();
        assert_eq!(set.value(0, MA_URL), Some("https://uniace.vn/a"));
        assert_eq!(set.value(0, MA_PATH), Some("/b"));
    }

    proptest! {
        #[test]
        fn ma_url_and_path_never_null(
            cells in proptest::array::uniform5(proptest::option::of("[a-z:/.]{0,16}"))
        ) {
            let set = RecordSet::from_rows(HEADER, vec![cells.to_vec()]).unwrap();
            let set = reconcile_urls(set).unwrap();
            prop_assert!(set.value(0, MA_URL).is_some());
            prop_assert!(set.value(0, MA_PATH).is_some());
            prop_assert!(set.value(0, MA_REFERRER).is_some());
        }
    }
}
