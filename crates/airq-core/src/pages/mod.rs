//! Rotating dashboard pages.
//!
//! Which page is shown is a pure function of wall-clock time, so the
//! rotation needs no state and restarts deterministically.

pub mod constants;
mod dashboard;

pub use dashboard::{DEFAULT_TREND_THRESHOLD, Dashboard};

use crate::sample::Field;

/// One dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Temperature and humidity
    Climate,
    Co2,
    /// TVOC and eCO2
    Voc,
    /// PM2.5 and PM10
    Particulates,
}

const ALL_PAGES: [PageKind; 4] = [
    PageKind::Climate,
    PageKind::Co2,
    PageKind::Voc,
    PageKind::Particulates,
];

impl PageKind {
    /// Pages available for the fitted sensors, in rotation order.
    pub fn for_sensors(has_particulates: bool) -> &'static [PageKind] {
        if has_particulates {
            &ALL_PAGES
        } else {
            &ALL_PAGES[..3]
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Climate => "Environment",
            Self::Co2 => "CO2 Levels",
            Self::Voc => "Air Quality",
            Self::Particulates => "Particulates",
        }
    }

    /// Fields shown on this page; the first one is the primary field.
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Climate => &[Field::Temperature, Field::Humidity],
            Self::Co2 => &[Field::Co2],
            Self::Voc => &[Field::Tvoc, Field::Eco2],
            Self::Particulates => &[Field::Pm2_5, Field::Pm10],
        }
    }
}

/// Index of the page shown at `now_secs`.
///
/// `floor(now / page_seconds) mod page_count`. Returns 0 when there are no
/// pages, a zero page duration, or a time before the epoch.
pub fn page_index(now_secs: f64, page_seconds: u32, page_count: usize) -> usize {
    if page_count == 0 || page_seconds == 0 {
        return 0;
    }
    // Float to int `as` saturates; NaN and negative times land on 0.
    let slot = (now_secs / f64::from(page_seconds)).floor() as u64;
    (slot % page_count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_rotation() {
        assert_eq!(page_index(0.0, 6, 3), 0);
        assert_eq!(page_index(6.0, 6, 3), 1);
        assert_eq!(page_index(17.0, 6, 3), 2);
        assert_eq!(page_index(18.0, 6, 3), 0);
    }

    #[test]
    fn test_page_index_degenerate_inputs() {
        assert_eq!(page_index(100.0, 6, 0), 0);
        assert_eq!(page_index(100.0, 0, 3), 0);
        assert_eq!(page_index(-5.0, 6, 3), 0);
        assert_eq!(page_index(f64::NAN, 6, 3), 0);
    }

    #[test]
    fn test_pages_follow_fitted_sensors() {
        assert_eq!(PageKind::for_sensors(true).len(), 4);
        assert_eq!(
            PageKind::for_sensors(false),
            &[PageKind::Climate, PageKind::Co2, PageKind::Voc]
        );
    }

    #[test]
    fn test_every_page_has_a_primary_field() {
        for page in PageKind::for_sensors(true) {
            assert!(!page.fields().is_empty(), "{page:?}");
        }
    }
}
