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

//! # Ad Astra Resolve
//!
//! An on-demand semantic resolution engine for a compiler frontend.
//!
//! The engine receives an immutable [syntax tree](syntax::SyntaxTree) and
//! answers semantic queries about its elements lazily: which declaration a
//! name refers to, which names are visible at an element, what type an
//! expression has, and which flow facts hold after a statement. Nothing is
//! analyzed until it is requested, and every request analyzes only the
//! smallest unit of the tree that determines the answer.
//!
//! The entry point is the [ResolveSession](analysis::ResolveSession). The
//! results are returned as [SemanticBinding](semantics::SemanticBinding)
//! objects.
//!
//! ## Logging
//!
//! The crate reports its activity through the [log](https://docs.rs/log)
//! facade under the `ad-astra-resolve::$resolve` and
//! `ad-astra-resolve::$force` targets, and never installs a logger by
//! itself.

pub extern crate lady_deirdre;

pub mod analysis;
mod report;
pub mod semantics;
pub mod syntax;
