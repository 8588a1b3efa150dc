////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

use strsim::normalized_damerau_levenshtein;

const EPSILON: f32 = 0.0001;

/// A similarity score of a candidate name to a missing name.
///
/// The score is a percentage with fractional precision: "100%" means the
/// names are equal, "0%" means they have nothing in common. Debug and
/// Display round the percentage to the nearest integer.
///
/// The session ranks the names visible at an unresolved reference by this
/// score, and attaches the closest ones to the
/// [Unresolved](crate::semantics::Reference::Unresolved) marker as
/// suggestions.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct Closeness(f32);

impl Debug for Closeness {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl Display for Closeness {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("{}%", self.percents()))
    }
}

impl PartialEq for Closeness {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.normalized().eq(&other.normalized())
    }
}

impl Eq for Closeness {}

impl PartialOrd for Closeness {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Closeness {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl Hash for Closeness {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state)
    }
}

impl Default for Closeness {
    #[inline(always)]
    fn default() -> Self {
        Self::zero()
    }
}

impl Closeness {
    #[inline(always)]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    #[inline(always)]
    pub const fn one() -> Self {
        Self(1.0)
    }

    /// Creates a score from an integer percentage. Values above 100 are
    /// clamped.
    #[inline(always)]
    pub fn from_percents(percents: u16) -> Self {
        Self(percents.min(100) as f32 / 100.0)
    }

    /// Returns the percentage rounded to the nearest integer.
    #[inline(always)]
    pub fn percents(self) -> u16 {
        ((self.0 * 1000.0).round() / 10.0) as u16
    }

    /// Returns true if this score is not below the `threshold` percentage.
    #[inline(always)]
    pub fn reaches(self, threshold: u16) -> bool {
        self.percents() >= threshold.min(100)
    }

    #[inline(always)]
    fn normalized(self) -> u32 {
        (self.0 / EPSILON) as u32
    }
}

/// Estimates the similarity of a string to a pattern.
pub trait StringEstimation {
    /// Returns the [Closeness] of this string to the `pattern`.
    ///
    /// The estimation is based on the normalized Damerau-Levenshtein
    /// distance, so transposed characters are cheaper than unrelated ones.
    ///
    /// ```rust
    /// use ad_astra_resolve::analysis::{Closeness, StringEstimation};
    ///
    /// assert_eq!("count".estimate("count"), Closeness::one());
    /// assert_eq!("abc".estimate("xyz"), Closeness::zero());
    /// assert!("conut".estimate("count") > "cat".estimate("count"));
    /// ```
    fn estimate(&self, pattern: impl AsRef<str>) -> Closeness;
}

impl<S: AsRef<str>> StringEstimation for S {
    fn estimate(&self, pattern: impl AsRef<str>) -> Closeness {
        let closeness = normalized_damerau_levenshtein(pattern.as_ref(), self.as_ref());

        Closeness((closeness as f32 / EPSILON) as usize as f32 * EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::{Closeness, StringEstimation};

    #[test]
    fn test_closeness_threshold() {
        assert!("size".estimate("size").reaches(100));
        assert!("sise".estimate("size").reaches(50));
        assert!(!"width".estimate("size").reaches(50));
        assert!(Closeness::zero().reaches(0));
        assert!(Closeness::one().reaches(500));

        assert_eq!(Closeness::from_percents(50).percents(), 50);
        assert_eq!(Closeness::from_percents(250), Closeness::one());
        assert_eq!(Closeness::from_percents(75).to_string(), "75%");
    }
}
