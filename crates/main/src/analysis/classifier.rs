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

use std::fmt::{Display, Formatter};

use crate::{
    report::system_panic,
    syntax::{ElementRef, SyntaxKind, SyntaxTree},
};

/// A resolvable unit: the declaration, the directive or the code fragment
/// whose resolution produces the facts about an element.
///
/// Each variant holds the unit's syntax element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Declaration {
    Function(ElementRef),
    Property(ElementRef),
    Class(ElementRef),

    /// Resolved as the owning [Class](Self::Class).
    PrimaryConstructorParameterList(ElementRef),

    ClassInitializer(ElementRef),
    SecondaryConstructor(ElementRef),
    DelegationList(ElementRef),
    ImportDirective(ElementRef),
    AnnotationEntry(ElementRef),
    TypeParameter(ElementRef),
    TypeConstraint(ElementRef),

    /// A package directive or one of its segments. The unit is the
    /// classified element itself.
    PackageDirective(ElementRef),

    CodeFragment(ElementRef),
}

impl Display for Declaration {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("{}({})", self.name(), self.element()))
    }
}

impl Declaration {
    /// Returns the unit's syntax element.
    #[inline(always)]
    pub fn element(&self) -> ElementRef {
        match self {
            Self::Function(element) => *element,
            Self::Property(element) => *element,
            Self::Class(element) => *element,
            Self::PrimaryConstructorParameterList(element) => *element,
            Self::ClassInitializer(element) => *element,
            Self::SecondaryConstructor(element) => *element,
            Self::DelegationList(element) => *element,
            Self::ImportDirective(element) => *element,
            Self::AnnotationEntry(element) => *element,
            Self::TypeParameter(element) => *element,
            Self::TypeConstraint(element) => *element,
            Self::PackageDirective(element) => *element,
            Self::CodeFragment(element) => *element,
        }
    }

    /// Returns the name of the variant.
    #[inline(always)]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Function(_) => "Function",
            Self::Property(_) => "Property",
            Self::Class(_) => "Class",
            Self::PrimaryConstructorParameterList(_) => "PrimaryConstructorParameterList",
            Self::ClassInitializer(_) => "ClassInitializer",
            Self::SecondaryConstructor(_) => "SecondaryConstructor",
            Self::DelegationList(_) => "DelegationList",
            Self::ImportDirective(_) => "ImportDirective",
            Self::AnnotationEntry(_) => "AnnotationEntry",
            Self::TypeParameter(_) => "TypeParameter",
            Self::TypeConstraint(_) => "TypeConstraint",
            Self::PackageDirective(_) => "PackageDirective",
            Self::CodeFragment(_) => "CodeFragment",
        }
    }
}

/// Maps an arbitrary syntax element to the unit that must be resolved to
/// obtain the facts about the element.
///
/// The unit is the nearest self-or-ancestor element that is a
/// [Declaration]. Elements of a primary constructor parameter list belong to
/// the owning class. Elements of a package directive are units by
/// themselves. Code fragments are never looked through: the fragment's
/// context element belongs to another root.
#[derive(Clone, Copy)]
pub struct ElementClassifier<'a> {
    tree: &'a SyntaxTree,
}

impl<'a> ElementClassifier<'a> {
    #[inline(always)]
    pub fn new(tree: &'a SyntaxTree) -> Self {
        Self { tree }
    }

    /// Returns the unit of the element.
    ///
    /// **Panic**
    ///
    /// Panics if the element does not have a resolvable unit (for example,
    /// if the element is a [File](SyntaxKind::File) root).
    pub fn classify(&self, element: &ElementRef) -> Declaration {
        let Some(declaration) = self.try_classify(element) else {
            system_panic!("Element {element} does not belong to a resolvable unit.");
        };

        declaration
    }

    /// Returns the unit of the element, or None if the element does not
    /// belong to a unit.
    pub fn try_classify(&self, element: &ElementRef) -> Option<Declaration> {
        let tree = self.tree;
        let mut current = *element;

        while let Some(node) = current.deref(tree) {
            let declaration = match node.kind {
                SyntaxKind::Function => Declaration::Function(current),
                SyntaxKind::Property => Declaration::Property(current),
                SyntaxKind::Class => Declaration::Class(current),
                SyntaxKind::ClassInitializer => Declaration::ClassInitializer(current),
                SyntaxKind::SecondaryConstructor => Declaration::SecondaryConstructor(current),
                SyntaxKind::DelegationList => Declaration::DelegationList(current),
                SyntaxKind::ImportDirective => Declaration::ImportDirective(current),
                SyntaxKind::AnnotationEntry => Declaration::AnnotationEntry(current),
                SyntaxKind::TypeParameter => Declaration::TypeParameter(current),
                SyntaxKind::TypeConstraint => Declaration::TypeConstraint(current),
                SyntaxKind::PackageDirective => Declaration::PackageDirective(*element),
                SyntaxKind::CodeFragment => return Some(Declaration::CodeFragment(current)),

                SyntaxKind::PrimaryConstructorParameterList => {
                    let class = tree.parent_of_kind(&current, SyntaxKind::Class)?;

                    Declaration::Class(class)
                }

                _ => {
                    current = node.parent;
                    continue;
                }
            };

            return Some(declaration);
        }

        None
    }
}

macro_rules! log_unit {
    ($session:expr, $unit:expr, $mode:expr) => {
        #[cfg(debug_assertions)]
        {
            use log::trace;

            use crate::semantics::RESOLVE_LOG;

            let unit: &crate::analysis::Declaration = $unit;

            trace!(
                target: RESOLVE_LOG,
                "[{}] {}::resolve({:?})",
                $session.id,
                unit,
                $mode,
            );
        }
    };
}

pub(super) use log_unit;

#[cfg(test)]
mod tests {
    use crate::{
        analysis::{Declaration, ElementClassifier},
        syntax::fixtures::classifier_tree,
    };

    #[test]
    fn test_classify_nearest() {
        let fixture = classifier_tree();
        let classifier = ElementClassifier::new(&fixture.tree);

        assert_eq!(
            classifier.classify(&fixture.body_name),
            Declaration::Function(fixture.function),
        );

        assert_eq!(
            classifier.classify(&fixture.function),
            Declaration::Function(fixture.function),
        );

        assert_eq!(
            classifier.classify(&fixture.annotation_name),
            Declaration::AnnotationEntry(fixture.annotation),
        );

        assert_eq!(
            classifier.classify(&fixture.type_parameter_bound),
            Declaration::TypeParameter(fixture.type_parameter),
        );

        assert_eq!(
            classifier.classify(&fixture.super_call_argument),
            Declaration::DelegationList(fixture.delegation_list),
        );
    }

    #[test]
    fn test_classify_exceptions() {
        let fixture = classifier_tree();
        let classifier = ElementClassifier::new(&fixture.tree);

        assert_eq!(
            classifier.classify(&fixture.constructor_parameter),
            Declaration::Class(fixture.class),
        );

        assert_eq!(
            classifier.classify(&fixture.package_segment),
            Declaration::PackageDirective(fixture.package_segment),
        );

        assert_eq!(
            classifier.classify(&fixture.fragment_name),
            Declaration::CodeFragment(fixture.fragment),
        );

        assert_eq!(classifier.try_classify(&fixture.file), None);
    }

    #[test]
    fn test_classify_determinism() {
        let fixture = classifier_tree();
        let classifier = ElementClassifier::new(&fixture.tree);

        for element in fixture.tree.elements() {
            assert_eq!(
                classifier.try_classify(&element),
                classifier.try_classify(&element),
            );
        }
    }
}
