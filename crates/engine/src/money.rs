use std::fmt;

/// Amount of Mongolian tögrög.
///
/// The tögrög has no circulating minor unit, so every amount in the engine
/// (contributions, payments, deposits) is a whole number of tögrög stored as
/// `i64`.
///
/// ```rust
/// use engine::Tugrik;
///
/// assert_eq!(Tugrik::new(50_000).to_string(), "50,000₮");
/// assert_eq!(Tugrik::new(i64::MAX).checked_add(Tugrik::new(1)), None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tugrik(i64);

impl Tugrik {
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Sum of two amounts, `None` when it leaves the `i64` range.
    #[must_use]
    pub const fn checked_add(self, other: Tugrik) -> Option<Tugrik> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Tugrik(sum)),
            None => None,
        }
    }
}

impl fmt::Display for Tugrik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}{grouped}₮")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_groups_thousands() {
        assert_eq!(Tugrik::new(0).to_string(), "0₮");
        assert_eq!(Tugrik::new(999).to_string(), "999₮");
        assert_eq!(Tugrik::new(1000).to_string(), "1,000₮");
        assert_eq!(Tugrik::new(1_234_567).to_string(), "1,234,567₮");
        assert_eq!(Tugrik::new(-50_000).to_string(), "-50,000₮");
    }

    #[test]
    fn checked_add_stops_at_the_edge() {
        assert_eq!(
            Tugrik::new(1_000).checked_add(Tugrik::new(2_500)),
            Some(Tugrik::new(3_500))
        );
        assert_eq!(
            Tugrik::new(i64::MAX - 1)
                .checked_add(Tugrik::new(1))
                .map(Tugrik::amount),
            Some(i64::MAX)
        );
        assert_eq!(Tugrik::new(i64::MAX).checked_add(Tugrik::new(10)), None);
    }
}
