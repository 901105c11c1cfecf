//! Cumulative-weight allocation tables.

/// Size of the domain used to select a campaign (traffic percent).
pub const CAMPAIGN_DOMAIN: u32 = 100;
/// Size of the domain used to select a variation (basis points).
pub const VARIATION_DOMAIN: u32 = 10_000;

/// An ordered allocation table mapping `[1, domain]` onto items by cumulative weight.
///
/// Items are laid out in insertion order, so appending or resizing the last items never moves the
/// intervals of the items before them. Values not covered by any interval belong to nobody.
#[derive(Debug, Clone)]
pub struct RangeBucket<T> {
    domain: u32,
    ranges: Vec<Range<T>>,
}

/// One inclusive interval of a [`RangeBucket`].
///
/// An interval with `end < start` has zero width and never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Range<T> {
    pub start: u32,
    pub end: u32,
    pub item: T,
}

impl<T> Range<T> {
    fn contains(&self, value: u32) -> bool {
        self.start <= value && value <= self.end
    }

    /// Number of domain values covered by this interval.
    pub fn width(&self) -> u32 {
        (self.end + 1).saturating_sub(self.start)
    }
}

impl<T> RangeBucket<T> {
    pub fn new(domain: u32) -> Self {
        RangeBucket {
            domain,
            ranges: Vec::new(),
        }
    }

    pub fn domain(&self) -> u32 {
        self.domain
    }

    /// Append `item` with a `weight` expressed in percent of the domain.
    ///
    /// The interval width is `round(weight * domain / 100)` with halves rounded up. Non-finite or
    /// negative weights produce a zero-width interval.
    pub fn add(&mut self, weight: f64, item: T) -> &Range<T> {
        let start = self.ranges.last().map_or(1, |last| last.end + 1);
        let width = width_for(weight, self.domain);
        self.ranges.push(Range {
            start,
            end: start + width - 1,
            item,
        });
        let idx = self.ranges.len() - 1;
        &self.ranges[idx]
    }

    /// Return the item whose interval contains `value`.
    pub fn find(&self, value: u32) -> Option<&T> {
        self.ranges
            .iter()
            .find(|range| range.contains(value))
            .map(|range| &range.item)
    }

    pub fn ranges(&self) -> &[Range<T>] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn width_for(weight: f64, domain: u32) -> u32 {
    let scaled = weight * f64::from(domain) / 100.0;
    if !scaled.is_finite() || scaled <= 0.0 {
        return 0;
    }
    // Weights above 100% are a settings error; cap them so the interval arithmetic stays bounded.
    (scaled + 0.5).floor().min(f64::from(domain)) as u32
}
