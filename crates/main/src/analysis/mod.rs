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

//! The entry point of the resolution engine.
//!
//! A [ResolveSession] owns a syntax tree together with the descriptors and
//! the caches computed for it. The session depends on a set of
//! [Collaborators]: the foreign symbol loader, the descriptor storage, the
//! expression typer and the flow checker. Each of them has a default
//! implementation in this module.

mod classifier;
mod closeness;
mod collaborators;
mod config;
mod dispatcher;
mod error;
mod session;
mod stitcher;
mod storage;

pub use crate::analysis::{
    classifier::{Declaration, ElementClassifier},
    closeness::{Closeness, StringEstimation},
    collaborators::{
        BuiltinTyper,
        Collaborators,
        ExpressionTyper,
        FlowChecker,
        ForeignClass,
        ForeignLibrary,
        ForeignMember,
        ForeignMemberKind,
        ForeignSymbolLoader,
        SilentFlowChecker,
        StorageManager,
        TypeQuery,
        BUILTINS_PACKAGE,
    },
    config::ResolveConfig,
    error::{ResolveError, ResolveResult},
    session::ResolveSession,
    storage::MemoryStorage,
};
