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

use std::fmt::{Debug, Display, Formatter};

use compact_str::CompactString;

use crate::semantics::DescriptorRef;

/// A fully qualified name of a package or a class.
///
/// The root package has no segments.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FqName {
    segments: Vec<CompactString>,
}

impl Debug for FqName {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl Display for FqName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return formatter.write_str("<root>");
        }

        let mut first = true;

        for segment in &self.segments {
            if !first {
                formatter.write_str(".")?;
            }

            first = false;

            formatter.write_str(segment)?;
        }

        Ok(())
    }
}

impl<'a> From<&'a str> for FqName {
    #[inline(always)]
    fn from(value: &'a str) -> Self {
        Self::parse(value)
    }
}

impl FqName {
    /// Returns the name of the root package.
    #[inline(always)]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dot-separated name. Empty segments are ignored.
    pub fn parse(string: &str) -> Self {
        Self {
            segments: string
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(CompactString::from)
                .collect(),
        }
    }

    /// Creates a name from the sequence of segments.
    #[inline(always)]
    pub fn from_segments(segments: impl IntoIterator<Item = impl Into<CompactString>>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the name segments.
    #[inline(always)]
    pub fn segments(&self) -> &[CompactString] {
        &self.segments
    }

    /// Returns true if this is the root package name.
    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the last segment, or an empty string for the root name.
    #[inline(always)]
    pub fn last(&self) -> &str {
        match self.segments.last() {
            Some(last) => last.as_str(),
            None => "",
        }
    }

    /// Returns a name of the enclosing package, or None for the root name.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }

        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns a nested name.
    pub fn child(&self, segment: impl Into<CompactString>) -> Self {
        let mut segments = self.segments.clone();

        segments.push(segment.into());

        Self { segments }
    }

    /// Returns the name consisting of the first `length` segments.
    #[inline(always)]
    pub fn prefix(&self, length: usize) -> Self {
        Self {
            segments: self.segments[..length.min(self.segments.len())].to_vec(),
        }
    }

    /// Returns true if this name starts with all segments of `other`.
    #[inline(always)]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

/// A type of a value, a declaration or an expression.
///
/// Types refer to the class and type parameter descriptors of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ty {
    /// The type cannot be inferred or refers to a missing class.
    #[default]
    Unresolved,

    /// An instance of a class.
    Class(DescriptorRef),

    /// A value of a type parameter.
    Parameter(DescriptorRef),
}

impl Ty {
    /// Returns the class or type parameter descriptor of this type.
    #[inline(always)]
    pub fn descriptor(&self) -> Option<DescriptorRef> {
        match self {
            Self::Unresolved => None,
            Self::Class(descriptor) => Some(*descriptor),
            Self::Parameter(descriptor) => Some(*descriptor),
        }
    }

    /// Returns true unless the type is [Unresolved](Self::Unresolved).
    #[inline(always)]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// Classes of the builtins package that the engine and the
/// [ExpressionTyper](crate::analysis::ExpressionTyper) rely on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Builtins {
    /// The root of the class hierarchy.
    pub any: Ty,
    /// Integer numbers.
    pub int: Ty,
    /// Strings.
    pub string: Ty,
    /// Booleans.
    pub boolean: Ty,
    /// The type of statements and blocks without a value.
    pub unit: Ty,
    /// The type of `return` expressions.
    pub nothing: Ty,
}
