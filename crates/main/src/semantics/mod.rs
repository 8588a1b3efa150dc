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

//! Semantic model of the resolution engine: descriptors, scopes, flow facts
//! and the semantic binding.
//!
//! The types of this module are produced by the
//! [ResolveSession](crate::analysis::ResolveSession) and are read-only for
//! the API user.

mod binding;
mod body;
mod contents;
mod descriptor;
mod filter;
mod flow;
mod force;
mod imports;
mod lookup;
mod resolver;
mod scope;
mod ty;

pub(crate) static RESOLVE_LOG: &'static str = "ad-astra-resolve::$resolve";
pub(crate) static FORCE_LOG: &'static str = "ad-astra-resolve::$force";

pub use crate::semantics::{
    binding::{BindingKey, BindingValue, Category, Reference, SemanticBinding, Symbol},
    descriptor::{
        AnnotationDescriptor,
        DescriptorContents,
        DescriptorKind,
        DescriptorOrigin,
        DescriptorRef,
        DescriptorSeed,
        ForceOutcome,
        ForceState,
        LazyDescriptor,
    },
    filter::BodyResolveMode,
    flow::FlowFacts,
    scope::{ResolutionScope, ScopeLayer},
    ty::{Builtins, FqName, Ty},
};
pub(crate) use crate::semantics::{
    binding::{BindingDelta, GlobalBinding},
    body::BodyResolver,
    filter::StatementFilter,
    force::DependencyForcer,
    imports::{FileImports, PackageIndex},
    resolver::Resolver,
};
