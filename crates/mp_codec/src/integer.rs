use core::fmt;

/// An integer as it was found on the wire, before narrowing to a target width.
///
/// `Signed` is produced by the signed codes (`int8`..`int64` and negative
/// fixints), `Unsigned` by the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integer {
    Unsigned(u64),
    Signed(i64),
}

impl Integer {
    /// Narrows the value into `T`, or `None` when it does not fit.
    ///
    /// # Examples
    ///
    /// ```
    /// use mp_codec::Integer;
    ///
    /// assert_eq!(Integer::Unsigned(200).narrow::<u8>(), Some(200));
    /// assert_eq!(Integer::Unsigned(200).narrow::<i8>(), None);
    /// assert_eq!(Integer::Signed(-1).narrow::<u64>(), None);
    /// ```
    pub fn narrow<T: TryFrom<u64> + TryFrom<i64>>(self) -> Option<T> {
        match self {
            Self::Unsigned(v) => T::try_from(v).ok(),
            Self::Signed(v) => T::try_from(v).ok(),
        }
    }

    /// The value as `f64`, possibly losing precision beyond 2^53.
    #[inline]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Unsigned(v) => v as f64,
            Self::Signed(v) => v as f64,
        }
    }
}

impl From<u64> for Integer {
    #[inline]
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<i64> for Integer {
    #[inline]
    fn from(value: i64) -> Self {
        if value >= 0 {
            Self::Unsigned(value as u64)
        } else {
            Self::Signed(value)
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(v) => fmt::Display::fmt(v, f),
            Self::Signed(v) => fmt::Display::fmt(v, f),
        }
    }
}
