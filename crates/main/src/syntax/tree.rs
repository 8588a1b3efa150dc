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

use ahash::AHashMap;
use compact_str::CompactString;
use lady_deirdre::{
    arena::{Id, Identifiable},
    lexis::SiteSpan,
};

use crate::syntax::SyntaxKind;

/// A reference to a [SyntaxElement] inside a [SyntaxTree].
///
/// The reference consists of the tree's [Id] and the element's index in the
/// tree's arena. References are cheap to copy and remain valid for the
/// lifetime of the tree they were created for.
///
/// The [nil](ElementRef::nil) reference does not point to any element.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementRef {
    /// An identifier of the tree.
    pub id: Id,

    /// An index of the element within the tree.
    pub index: usize,
}

impl Debug for ElementRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.is_nil() {
            true => formatter.write_str("ElementRef(nil)"),
            false => formatter.write_fmt(format_args!("ElementRef({}:{})", self.id, self.index)),
        }
    }
}

impl Display for ElementRef {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, formatter)
    }
}

impl Identifiable for ElementRef {
    #[inline(always)]
    fn id(&self) -> Id {
        self.id
    }
}

impl Default for ElementRef {
    #[inline(always)]
    fn default() -> Self {
        Self::nil()
    }
}

impl ElementRef {
    /// Returns a reference that does not point to any element.
    #[inline(always)]
    pub fn nil() -> Self {
        Self {
            id: Id::nil(),
            index: usize::MAX,
        }
    }

    /// Returns true if this reference is [nil](Self::nil).
    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        self.id.is_nil() || self.index == usize::MAX
    }

    /// Returns the referred element, or None if the reference does not belong
    /// to the `tree`.
    #[inline(always)]
    pub fn deref<'a>(&self, tree: &'a SyntaxTree) -> Option<&'a SyntaxElement> {
        tree.get(self)
    }

    /// Returns the kind of the referred element.
    #[inline(always)]
    pub fn kind(&self, tree: &SyntaxTree) -> Option<SyntaxKind> {
        Some(self.deref(tree)?.kind)
    }

    /// Returns a reference to the parent element. Returns a nil reference for
    /// the root elements and for invalid references.
    #[inline(always)]
    pub fn parent(&self, tree: &SyntaxTree) -> ElementRef {
        match self.deref(tree) {
            Some(element) => element.parent,
            None => ElementRef::nil(),
        }
    }

    /// Returns true if this element is `other` or one of its descendants.
    pub fn is_within(&self, tree: &SyntaxTree, other: &ElementRef) -> bool {
        let mut current = *self;

        while !current.is_nil() {
            if &current == other {
                return true;
            }

            current = current.parent(tree);
        }

        false
    }
}

/// A node of the [SyntaxTree].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxElement {
    /// A reference to this element.
    pub element_ref: ElementRef,

    /// The kind of this element.
    pub kind: SyntaxKind,

    /// The byte range of this element in the source text.
    pub span: SiteSpan,

    /// A reference to the parent element, or nil for the root elements.
    pub parent: ElementRef,

    /// Child elements in source order.
    pub children: Vec<ElementRef>,

    /// An identifier, a literal, an operator or an import alias, depending
    /// on the element's kind.
    pub text: Option<CompactString>,
}

impl SyntaxElement {
    /// Returns the element's text, or an empty string if the element does not
    /// carry any text.
    #[inline(always)]
    pub fn text(&self) -> &str {
        match &self.text {
            Some(text) => text.as_str(),
            None => "",
        }
    }

    /// Returns the first child of the specified kind.
    pub fn child_of(&self, tree: &SyntaxTree, kind: SyntaxKind) -> Option<ElementRef> {
        self.children
            .iter()
            .copied()
            .find(|child| child.kind(tree) == Some(kind))
    }

    /// Returns all children of the specified kind.
    pub fn children_of<'a>(
        &'a self,
        tree: &'a SyntaxTree,
        kind: SyntaxKind,
    ) -> impl Iterator<Item = ElementRef> + 'a {
        self.children
            .iter()
            .copied()
            .filter(move |child| child.kind(tree) == Some(kind))
    }

    /// Returns the first child that is an expression.
    pub fn expression_child(&self, tree: &SyntaxTree) -> Option<ElementRef> {
        self.children.iter().copied().find(|child| match child.kind(tree) {
            Some(kind) => kind.is_expression(),
            None => false,
        })
    }
}

/// An immutable parent-linked syntax tree.
///
/// The tree may hold several roots: [files](SyntaxKind::File) of the analyzed
/// program and [code fragments](SyntaxKind::CodeFragment) evaluated in the
/// context of other elements.
///
/// The tree is produced by the [TreeBuilder](crate::syntax::TreeBuilder) and
/// never changes afterwards. Every resolution session is bound to a single
/// tree instance.
///
/// A clone of the tree keeps the original [Id], so the element references
/// are valid in both instances.
#[derive(Clone)]
pub struct SyntaxTree {
    pub(super) id: Id,
    pub(super) elements: Vec<SyntaxElement>,
    pub(super) roots: Vec<ElementRef>,
    pub(super) contexts: AHashMap<ElementRef, ElementRef>,
}

impl Identifiable for SyntaxTree {
    #[inline(always)]
    fn id(&self) -> Id {
        self.id
    }
}

impl Debug for SyntaxTree {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyntaxTree")
            .field("id", &self.id)
            .field("elements", &self.elements.len())
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl SyntaxTree {
    /// Returns an element by reference.
    #[inline(always)]
    pub fn get(&self, element_ref: &ElementRef) -> Option<&SyntaxElement> {
        if element_ref.id != self.id {
            return None;
        }

        self.elements.get(element_ref.index)
    }

    /// Returns true if the reference points to an element of this tree.
    #[inline(always)]
    pub fn contains(&self, element_ref: &ElementRef) -> bool {
        self.get(element_ref).is_some()
    }

    /// Returns all root elements in creation order.
    #[inline(always)]
    pub fn roots(&self) -> &[ElementRef] {
        &self.roots
    }

    /// Returns references to all elements of the tree in creation order.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef> + '_ {
        self.elements.iter().map(|element| element.element_ref)
    }

    /// Returns the number of elements in the tree.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns all [File](SyntaxKind::File) roots.
    pub fn files(&self) -> impl Iterator<Item = ElementRef> + '_ {
        self.roots
            .iter()
            .copied()
            .filter(|root| root.kind(self) == Some(SyntaxKind::File))
    }

    /// Returns the root element that contains the specified element.
    pub fn root_of(&self, element_ref: &ElementRef) -> ElementRef {
        let mut current = *element_ref;

        loop {
            let parent = current.parent(self);

            if parent.is_nil() {
                return current;
            }

            current = parent;
        }
    }

    /// Returns the context element of the code fragment, if specified.
    #[inline(always)]
    pub fn fragment_context(&self, fragment: &ElementRef) -> Option<ElementRef> {
        self.contexts.get(fragment).copied()
    }

    /// Returns the nearest self-or-ancestor element that satisfies the
    /// predicate.
    pub fn ancestor(
        &self,
        element_ref: &ElementRef,
        mut predicate: impl FnMut(SyntaxKind) -> bool,
    ) -> Option<ElementRef> {
        let mut current = *element_ref;

        while let Some(element) = current.deref(self) {
            if predicate(element.kind) {
                return Some(current);
            }

            current = element.parent;
        }

        None
    }

    /// Returns the nearest strict ancestor of the specified kind.
    #[inline(always)]
    pub fn parent_of_kind(&self, element_ref: &ElementRef, kind: SyntaxKind) -> Option<ElementRef> {
        let parent = element_ref.parent(self);

        self.ancestor(&parent, |candidate| candidate == kind)
    }

    /// Returns the direct child of `ancestor` that contains `element_ref`.
    pub fn child_on_path(&self, ancestor: &ElementRef, element_ref: &ElementRef) -> Option<ElementRef> {
        let mut current = *element_ref;

        loop {
            let parent = current.parent(self);

            if parent.is_nil() {
                return None;
            }

            if &parent == ancestor {
                return Some(current);
            }

            current = parent;
        }
    }

    /// Returns true if the element's subtree contains an element of kind
    /// that satisfies the predicate.
    pub fn subtree_contains(
        &self,
        element_ref: &ElementRef,
        predicate: &mut impl FnMut(SyntaxKind) -> bool,
    ) -> bool {
        let Some(element) = element_ref.deref(self) else {
            return false;
        };

        if predicate(element.kind) {
            return true;
        }

        element
            .children
            .iter()
            .any(|child| self.subtree_contains(child, predicate))
    }

    /// Returns the package name segments declared by the file, or an empty
    /// vector for the root package.
    pub fn package_segments(&self, file: &ElementRef) -> Vec<CompactString> {
        let Some(file) = file.deref(self) else {
            return Vec::new();
        };

        let Some(directive) = file.child_of(self, SyntaxKind::PackageDirective) else {
            return Vec::new();
        };

        let Some(directive) = directive.deref(self) else {
            return Vec::new();
        };

        directive
            .children_of(self, SyntaxKind::NameRef)
            .filter_map(|segment| segment.deref(self)?.text.clone())
            .collect()
    }
}
