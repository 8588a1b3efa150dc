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

use lady_deirdre::analysis::TaskHandle;
use log::debug;

use crate::{
    analysis::ResolveResult,
    semantics::{BodyResolveMode, FlowFacts, ResolutionScope, Resolver, SemanticBinding, RESOLVE_LOG},
    syntax::{ElementRef, SyntaxKind},
};

// The scope and the flow facts a code fragment is evaluated with.
pub(crate) struct Stitched {
    pub(crate) scope: ResolutionScope,
    pub(crate) facts: FlowFacts,
}

// Builds the resolution environment of a code fragment from the context
// element the fragment is attached to.
pub(crate) struct ScopeStitcher<'r, 's, H: TaskHandle> {
    resolver: &'r Resolver<'s, H>,
}

impl<'r, 's, H: TaskHandle> ScopeStitcher<'r, 's, H> {
    #[inline(always)]
    pub(crate) fn new(resolver: &'r Resolver<'s, H>) -> Self {
        Self { resolver }
    }

    // Returns None if the fragment has no context, or if the context does
    // not provide a scope.
    //
    // The context scope goes first. Names declared inside the fragment are
    // pushed on top of the stitched scope during the fragment analysis.
    pub(crate) fn stitch(
        &self,
        fragment: &ElementRef,
        mode: BodyResolveMode,
    ) -> ResolveResult<Option<Stitched>> {
        let tree = self.resolver.tree();

        let Some(context) = tree.fragment_context(fragment) else {
            return Ok(None);
        };

        let Some(context_element) = context.deref(tree) else {
            debug!(
                target: RESOLVE_LOG,
                "[{fragment}] Fragment context {context} is not a part of the tree.",
            );

            return Ok(None);
        };

        let (context_scope, facts) = match context_element.kind {
            SyntaxKind::Class => (self.resolver.class_member_scope(&context), FlowFacts::new()),

            SyntaxKind::Block => {
                let Some(anchor) = context_element.children.last() else {
                    debug!(
                        target: RESOLVE_LOG,
                        "[{fragment}] Fragment context block {context} is empty.",
                    );

                    return Ok(None);
                };

                let binding = self.resolve_context(anchor, BodyResolveMode::Full)?;

                match Self::read_context(&binding, anchor) {
                    Some(environment) => environment,
                    None => return Ok(None),
                }
            }

            kind if kind.is_expression() => {
                let binding = self.resolve_context(&context, mode)?;

                match Self::read_context(&binding, &context) {
                    Some(environment) => environment,
                    None => return Ok(None),
                }
            }

            _ => {
                debug!(
                    target: RESOLVE_LOG,
                    "[{fragment}] Unsupported fragment context {} {context}.",
                    context_element.kind,
                );

                return Ok(None);
            }
        };

        let own_scope = self.resolver.file_scope(fragment);

        Ok(Some(Stitched {
            scope: ResolutionScope::chain(&context_scope, &own_scope),
            facts,
        }))
    }

    #[inline(always)]
    fn resolve_context(
        &self,
        context: &ElementRef,
        mode: BodyResolveMode,
    ) -> ResolveResult<SemanticBinding> {
        self.resolver.session.resolve_with(self.resolver, context, mode)
    }

    fn read_context(
        binding: &SemanticBinding,
        anchor: &ElementRef,
    ) -> Option<(ResolutionScope, FlowFacts)> {
        let scope = binding
            .accumulated_scope(anchor)
            .or_else(|| binding.resolution_scope(anchor))?;

        let facts = binding.flow_facts(anchor).unwrap_or_default();

        Some((scope, facts))
    }
}
