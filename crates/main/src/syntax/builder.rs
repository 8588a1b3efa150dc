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

use ahash::AHashMap;
use compact_str::CompactString;
use lady_deirdre::{arena::Id, lexis::Site};

use crate::syntax::{ElementRef, SyntaxElement, SyntaxKind, SyntaxTree};

/// A builder of the [SyntaxTree].
///
/// The tree provider walks its own parse tree in source order and reports
/// every node through [start](Self::start)/[finish](Self::finish) pairs
/// (or through [leaf](Self::leaf) for the nodes without children). Byte
/// ranges are assigned from the builder's cursor, so nested nodes always
/// receive nested ranges and siblings receive increasing ranges.
///
/// ```rust
/// use ad_astra_resolve::syntax::{SyntaxKind, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
///
/// let file = builder.start(SyntaxKind::File);
/// let function = builder.start_named(SyntaxKind::Function, "main");
/// builder.start(SyntaxKind::ParameterList);
/// builder.finish();
/// builder.start(SyntaxKind::Block);
/// builder.leaf(SyntaxKind::IntLiteral, "1");
/// builder.finish();
/// builder.finish();
/// builder.finish();
///
/// let tree = builder.build();
///
/// assert_eq!(function.parent(&tree), file);
/// ```
pub struct TreeBuilder {
    id: Id,
    elements: Vec<SyntaxElement>,
    roots: Vec<ElementRef>,
    contexts: AHashMap<ElementRef, ElementRef>,
    stack: Vec<ElementRef>,
    cursor: Site,
}

impl Default for TreeBuilder {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Creates a builder of a new tree with a unique identifier.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            id: Id::new(),
            elements: Vec::new(),
            roots: Vec::new(),
            contexts: AHashMap::new(),
            stack: Vec::new(),
            cursor: 0,
        }
    }

    /// Returns the identifier of the tree under construction.
    #[inline(always)]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Opens a new node without text.
    #[inline(always)]
    pub fn start(&mut self, kind: SyntaxKind) -> ElementRef {
        self.open(kind, None)
    }

    /// Opens a new node that carries a text (an identifier, an operator or
    /// an alias).
    #[inline(always)]
    pub fn start_named(&mut self, kind: SyntaxKind, text: impl Into<CompactString>) -> ElementRef {
        self.open(kind, Some(text.into()))
    }

    /// Closes the most recently opened node.
    ///
    /// **Panic**
    ///
    /// Panics if there are no open nodes.
    pub fn finish(&mut self) -> ElementRef {
        let Some(element_ref) = self.stack.pop() else {
            panic!("TreeBuilder::finish called without a matching start.");
        };

        let end = self.cursor;
        self.elements[element_ref.index].span.end = end;
        self.cursor += 1;

        element_ref
    }

    /// Adds a node without children.
    #[inline(always)]
    pub fn leaf(&mut self, kind: SyntaxKind, text: impl Into<CompactString>) -> ElementRef {
        let _ = self.open(kind, Some(text.into()));

        self.finish()
    }

    /// Adds a node without children and without text.
    #[inline(always)]
    pub fn empty_leaf(&mut self, kind: SyntaxKind) -> ElementRef {
        let _ = self.open(kind, None);

        self.finish()
    }

    /// Specifies the context element of a [CodeFragment](SyntaxKind::CodeFragment)
    /// root.
    ///
    /// The context element is usually an element of another root that has
    /// been built before.
    #[inline(always)]
    pub fn set_context(&mut self, fragment: ElementRef, context: ElementRef) {
        let _ = self.contexts.insert(fragment, context);
    }

    /// Finishes the construction and returns the tree.
    ///
    /// **Panic**
    ///
    /// Panics if some nodes have not been [finished](Self::finish).
    pub fn build(self) -> SyntaxTree {
        if !self.stack.is_empty() {
            panic!(
                "TreeBuilder::build called with {} unfinished nodes.",
                self.stack.len()
            );
        }

        SyntaxTree {
            id: self.id,
            elements: self.elements,
            roots: self.roots,
            contexts: self.contexts,
        }
    }

    fn open(&mut self, kind: SyntaxKind, text: Option<CompactString>) -> ElementRef {
        let element_ref = ElementRef {
            id: self.id,
            index: self.elements.len(),
        };

        let parent = match self.stack.last() {
            Some(parent) => {
                self.elements[parent.index].children.push(element_ref);
                *parent
            }

            None => {
                self.roots.push(element_ref);
                ElementRef::nil()
            }
        };

        let start = self.cursor;

        self.cursor += match &text {
            Some(text) => text.len() + 1,
            None => 1,
        };

        self.elements.push(SyntaxElement {
            element_ref,
            kind,
            span: start..start,
            parent,
            children: Vec::new(),
            text,
        });

        self.stack.push(element_ref);

        element_ref
    }
}
