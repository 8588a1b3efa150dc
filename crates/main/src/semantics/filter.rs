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

use ahash::AHashSet;
use lady_deirdre::lexis::Site;

use crate::syntax::{ElementRef, SyntaxKind, SyntaxTree};

/// A depth of the body analysis requested by the caller.
///
/// Partial modes only omit work. An entry recorded by a partial resolution is
/// always equal to the entry recorded by the [Full](BodyResolveMode::Full)
/// resolution of the same unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyResolveMode {
    /// Every statement of the unit is analyzed.
    #[default]
    Full,

    /// Only the statements that contribute to the facts visible at the
    /// target element are analyzed.
    PartialForContext,

    /// Same as [PartialForContext](Self::PartialForContext), and the
    /// statement that contains the target is analyzed only up to the end of
    /// the target.
    PartialForCompletion,
}

impl BodyResolveMode {
    #[inline(always)]
    pub fn is_partial(self) -> bool {
        self != Self::Full
    }
}

// Decides which statements of the unit's blocks the body resolver analyzes.
pub(crate) struct StatementFilter {
    path: AHashSet<ElementRef>,
    completion_end: Option<Site>,
}

impl StatementFilter {
    // A filter that keeps everything.
    #[inline(always)]
    pub(crate) fn full() -> Self {
        Self {
            path: AHashSet::new(),
            completion_end: None,
        }
    }

    pub(crate) fn new(tree: &SyntaxTree, mode: BodyResolveMode, target: &ElementRef) -> Self {
        if mode == BodyResolveMode::Full {
            return Self::full();
        }

        let mut path = AHashSet::new();
        let mut current = *target;

        while let Some(element) = current.deref(tree) {
            let _ = path.insert(current);
            current = element.parent;
        }

        let completion_end = match mode {
            BodyResolveMode::PartialForCompletion => target.deref(tree).map(|target| target.span.end),
            _ => None,
        };

        Self {
            path,
            completion_end,
        }
    }

    #[inline(always)]
    pub(crate) fn is_full(&self) -> bool {
        self.path.is_empty()
    }

    // Returns the block's statements to analyze, and true if some statements
    // have been dropped.
    //
    // Only the blocks that contain the target inside one of their statements
    // are cut. Statements after the one that contains the target are
    // dropped, and the earlier ones are kept only if they declare or assign
    // local variables.
    pub(crate) fn statements(&self, tree: &SyntaxTree, block: &ElementRef) -> (Vec<ElementRef>, bool) {
        let Some(element) = block.deref(tree) else {
            return (Vec::new(), false);
        };

        if self.is_full() || !self.path.contains(block) {
            return (element.children.clone(), false);
        }

        // The block is the target itself.
        if !element.children.iter().any(|child| self.path.contains(child)) {
            return (element.children.clone(), false);
        }

        let mut result = Vec::with_capacity(element.children.len());
        let mut cut = false;

        for statement in &element.children {
            if self.path.contains(statement) {
                result.push(*statement);
                cut = cut || result.len() < element.children.len();
                return (result, cut);
            }

            match tree.subtree_contains(statement, &mut SyntaxKind::affects_flow) {
                true => result.push(*statement),
                false => cut = true,
            }
        }

        (result, cut)
    }

    // Returns true if the element starts at or after the end of the
    // completion target.
    #[inline(always)]
    pub(crate) fn skips(&self, tree: &SyntaxTree, element: &ElementRef) -> bool {
        let Some(end) = self.completion_end else {
            return false;
        };

        match element.deref(tree) {
            Some(element) => element.span.start >= end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        semantics::{filter::StatementFilter, BodyResolveMode},
        syntax::{fixtures::five_statements, SyntaxKind},
    };

    #[test]
    fn test_filter_context() {
        let fixture = five_statements();
        let tree = &fixture.tree;

        let full = StatementFilter::new(tree, BodyResolveMode::Full, &fixture.statements[2]);
        let (statements, cut) = full.statements(tree, &fixture.body);

        assert_eq!(statements, fixture.statements);
        assert!(!cut);

        let partial = StatementFilter::new(
            tree,
            BodyResolveMode::PartialForContext,
            &fixture.statements[2],
        );
        let (statements, cut) = partial.statements(tree, &fixture.body);

        assert!(cut);
        assert_eq!(statements.last(), Some(&fixture.statements[2]));
        assert!(!statements.contains(&fixture.statements[3]));
        assert!(!statements.contains(&fixture.statements[4]));

        for statement in &statements[..statements.len() - 1] {
            assert_eq!(statement.kind(tree), Some(SyntaxKind::LocalVariable));
        }
    }

    #[test]
    fn test_filter_block_target() {
        let fixture = five_statements();
        let tree = &fixture.tree;

        for mode in [
            BodyResolveMode::PartialForContext,
            BodyResolveMode::PartialForCompletion,
        ] {
            let filter = StatementFilter::new(tree, mode, &fixture.body);
            let (statements, cut) = filter.statements(tree, &fixture.body);

            assert_eq!(statements, fixture.statements);
            assert!(!cut);

            for statement in &statements {
                assert!(!filter.skips(tree, statement));
            }
        }
    }

    #[test]
    fn test_filter_completion() {
        let fixture = five_statements();
        let tree = &fixture.tree;

        let filter = StatementFilter::new(
            tree,
            BodyResolveMode::PartialForCompletion,
            &fixture.statements[1],
        );

        assert!(!filter.skips(tree, &fixture.statements[0]));
        assert!(!filter.skips(tree, &fixture.statements[1]));
        assert!(filter.skips(tree, &fixture.statements[2]));

        assert!(!StatementFilter::full().skips(tree, &fixture.statements[4]));
    }
}
