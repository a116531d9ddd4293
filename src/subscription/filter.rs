//! Subscriber filters for each grammar.

use crate::protocol::binary_header::EnabledMeasurements;

/// How an ASCII filter compares headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AsciiFilterKind {
    /// Deliver sentences whose header starts with the filter.
    #[default]
    StartsWith,
    /// Deliver sentences whose header does not start with the filter.
    DoesNotStartWith,
}

/// Header filter for ASCII subscribers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AsciiFilter {
    header: String,
    kind: AsciiFilterKind,
}

impl AsciiFilter {
    /// Build a filter. A leading `$` in `header` is ignored and an empty
    /// header always uses [`AsciiFilterKind::StartsWith`], matching every
    /// sentence.
    ///
    /// # Examples
    ///
    /// ```
    /// use vnframe::subscription::{AsciiFilter, AsciiFilterKind};
    ///
    /// let filter = AsciiFilter::new("$VNYPR", AsciiFilterKind::StartsWith);
    /// assert!(filter.matches("VNYPR"));
    /// assert!(!filter.matches("VNQTN"));
    /// ```
    #[must_use]
    pub fn new(header: impl Into<String>, kind: AsciiFilterKind) -> Self {
        let header = header.into();
        let header = header.strip_prefix('$').map_or_else(|| header.clone(), str::to_owned);
        let kind = if header.is_empty() {
            AsciiFilterKind::StartsWith
        } else {
            kind
        };
        Self { header, kind }
    }

    /// Filter delivering sentences whose header starts with `header`.
    #[must_use]
    pub fn starts_with(header: impl Into<String>) -> Self {
        Self::new(header, AsciiFilterKind::StartsWith)
    }

    /// Filter delivering sentences whose header does not start with `header`.
    #[must_use]
    pub fn does_not_start_with(header: impl Into<String>) -> Self {
        Self::new(header, AsciiFilterKind::DoesNotStartWith)
    }

    /// Header prefix compared against.
    #[must_use]
    pub fn header(&self) -> &str { &self.header }

    /// Whether a sentence with `header` passes the filter.
    #[must_use]
    pub fn matches(&self, header: &str) -> bool {
        let starts = header.starts_with(&self.header);
        match self.kind {
            AsciiFilterKind::StartsWith => starts,
            AsciiFilterKind::DoesNotStartWith => !starts,
        }
    }
}

/// How a binary filter compares measurement sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BinaryFilterKind {
    /// Every group mask equals the filter's.
    ExactMatch,
    /// At least one field is shared.
    #[default]
    AnyMatch,
    /// The masks differ somewhere.
    NotExactMatch,
}

/// Measurement filter for FA subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BinaryFilter {
    measurements: EnabledMeasurements,
    kind: BinaryFilterKind,
}

impl BinaryFilter {
    /// Build a filter. An empty measurement set becomes "any match over every
    /// field", delivering every FA packet.
    #[must_use]
    pub fn new(measurements: EnabledMeasurements, kind: BinaryFilterKind) -> Self {
        if measurements.is_empty() {
            Self::any()
        } else {
            Self { measurements, kind }
        }
    }

    /// Filter delivering every FA packet.
    #[must_use]
    pub fn any() -> Self {
        Self {
            measurements: EnabledMeasurements::all(),
            kind: BinaryFilterKind::AnyMatch,
        }
    }

    /// Measurements compared against.
    #[must_use]
    pub const fn measurements(&self) -> &EnabledMeasurements { &self.measurements }

    /// Whether a packet carrying `packet` passes the filter.
    #[must_use]
    pub fn matches(&self, packet: &EnabledMeasurements) -> bool {
        match self.kind {
            BinaryFilterKind::ExactMatch => self.measurements == *packet,
            BinaryFilterKind::AnyMatch => self.measurements.intersects(packet),
            BinaryFilterKind::NotExactMatch => self.measurements != *packet,
        }
    }
}

impl Default for BinaryFilter {
    fn default() -> Self { Self::any() }
}

/// What an FB subscriber receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FbFilter {
    /// Every raw FB fragment.
    pub packet: bool,
    /// Every FA packet reassembled from fragments.
    pub completed_fa_message: bool,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{AsciiFilter, AsciiFilterKind, BinaryFilter, BinaryFilterKind};
    use crate::protocol::binary_header::{EnabledMeasurements, Group};

    #[rstest]
    #[case("VNYPR", AsciiFilterKind::StartsWith, "VNYPR", true)]
    #[case("VN", AsciiFilterKind::StartsWith, "VNQTN", true)]
    #[case("VN", AsciiFilterKind::DoesNotStartWith, "VNQTN", false)]
    #[case("VN", AsciiFilterKind::DoesNotStartWith, "GPGGA", true)]
    #[case("", AsciiFilterKind::DoesNotStartWith, "GPGGA", true)]
    #[case("$", AsciiFilterKind::DoesNotStartWith, "VNYPR", true)]
    fn ascii_filters(
        #[case] filter: &str,
        #[case] kind: AsciiFilterKind,
        #[case] header: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(AsciiFilter::new(filter, kind).matches(header), expected);
    }

    #[rstest]
    #[case(BinaryFilterKind::ExactMatch, false, true)]
    #[case(BinaryFilterKind::AnyMatch, true, true)]
    #[case(BinaryFilterKind::NotExactMatch, true, false)]
    fn binary_filters(
        #[case] kind: BinaryFilterKind,
        #[case] superset: bool,
        #[case] equal: bool,
    ) {
        let ypr = EnabledMeasurements::new().with(Group::Common, 3);
        let ypr_and_quat = ypr.with(Group::Common, 4);
        let filter = BinaryFilter::new(ypr, kind);
        assert_eq!(filter.matches(&ypr_and_quat), superset);
        assert_eq!(filter.matches(&ypr), equal);
    }

    #[test]
    fn empty_binary_filter_matches_everything() {
        let filter = BinaryFilter::new(EnabledMeasurements::new(), BinaryFilterKind::ExactMatch);
        assert!(filter.matches(&EnabledMeasurements::new().with(Group::Time, 9)));
    }
}
