//! Validation policy: the field rules that differ between deployments.

/// Tunable field rules. The defaults are the strict policy: academic year
/// 1 to 4 and a required ten-digit Indian mobile number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Highest accepted academic year (lowest is always 1).
    pub max_year: i32,
    /// When false, phone may be omitted; a supplied phone must still match.
    pub phone_required: bool,
}

impl ValidationPolicy {
    pub const MIN_YEAR: i32 = 1;
    pub const DEFAULT_MAX_YEAR: i32 = 4;
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            max_year: Self::DEFAULT_MAX_YEAR,
            phone_required: true,
        }
    }
}
