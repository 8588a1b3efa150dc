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
    error::Error,
    fmt::{Display, Formatter},
};

use lady_deirdre::arena::{Id, Identifiable};

/// An alias type for resolution results.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// An error type of the [ResolveSession](crate::analysis::ResolveSession)
/// requests.
///
/// Missing or ambiguous references are not errors: they are recorded in the
/// [SemanticBinding](crate::semantics::SemanticBinding) as
/// [Reference](crate::semantics::Reference) markers. This type only reports
/// the cases when the request cannot be fulfilled at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ResolveError {
    /// Indicates that the request has been cancelled through the task handle
    /// supplied by the caller.
    ///
    /// An interrupted request does not store anything in the session's
    /// caches, and the descriptors it was forcing return to the unforced
    /// state. Repeating the request later produces the same result as an
    /// uninterrupted request would.
    Interrupted(Id),

    /// Indicates that the addressed syntax element does not belong to the
    /// session's syntax tree, or is nil.
    Cursor(Id),
}

impl Error for ResolveError {}

impl Identifiable for ResolveError {
    #[inline(always)]
    fn id(&self) -> Id {
        match self {
            Self::Interrupted(id) => *id,
            Self::Cursor(id) => *id,
        }
    }
}

impl Display for ResolveError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted(id) => formatter.write_fmt(format_args!(
                "Cannot complete session {id} resolution request because the \
                operation was interrupted.",
            )),

            Self::Cursor(id) => formatter.write_fmt(format_args!(
                "The specified syntax element is not valid for session {id}.",
            )),
        }
    }
}
