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

/// A kind of the [syntax element](crate::syntax::SyntaxElement).
///
/// The set of kinds is closed. The tree provider lowers its own parse tree
/// into these kinds using the [TreeBuilder](crate::syntax::TreeBuilder).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum SyntaxKind {
    /// A root of a source file.
    ///
    /// Children: an optional [PackageDirective](Self::PackageDirective),
    /// [ImportDirective](Self::ImportDirective)s, an optional
    /// [FileAnnotationList](Self::FileAnnotationList), top-level declarations
    /// and dangling [AnnotationEntry](Self::AnnotationEntry)s.
    File,

    /// A root of a code fragment evaluated in the context of another
    /// element.
    ///
    /// Children: [ImportDirective](Self::ImportDirective)s followed by exactly
    /// one expression.
    CodeFragment,

    /// `package a.b.c`. Children: [NameRef](Self::NameRef) segments.
    PackageDirective,

    /// `import a.b.C as D` or `import a.b.*`.
    ///
    /// Children: [NameRef](Self::NameRef) segments, optionally terminated by
    /// a [Star](Self::Star). The text is the alias, if any.
    ImportDirective,

    /// The `*` terminator of a star import.
    Star,

    /// `@file:...` annotations. Children: [AnnotationEntry](Self::AnnotationEntry)s.
    FileAnnotationList,

    /// `@Name(args)`. Children: a [TypeRef](Self::TypeRef) and optional
    /// [ValueArgs](Self::ValueArgs).
    AnnotationEntry,

    /// A class declaration. The text is the class name.
    ///
    /// Children: [AnnotationEntry](Self::AnnotationEntry)s, an optional
    /// [TypeParameterList](Self::TypeParameterList), an optional
    /// [PrimaryConstructor](Self::PrimaryConstructor), an optional
    /// [DelegationList](Self::DelegationList), an optional
    /// [TypeConstraintList](Self::TypeConstraintList) and an optional
    /// [ClassBody](Self::ClassBody).
    Class,

    /// Children: [AnnotationEntry](Self::AnnotationEntry)s and a
    /// [PrimaryConstructorParameterList](Self::PrimaryConstructorParameterList).
    PrimaryConstructor,

    /// Children: [Parameter](Self::Parameter)s.
    PrimaryConstructorParameterList,

    /// The supertype list of a class.
    ///
    /// Children: [TypeRef](Self::TypeRef)s and
    /// [SuperTypeCall](Self::SuperTypeCall)s.
    DelegationList,

    /// `Base(args)` inside a delegation list.
    ///
    /// Children: a [TypeRef](Self::TypeRef) and [ValueArgs](Self::ValueArgs).
    SuperTypeCall,

    /// Children: member declarations, [ClassInitializer](Self::ClassInitializer)s,
    /// [SecondaryConstructor](Self::SecondaryConstructor)s and dangling
    /// [AnnotationEntry](Self::AnnotationEntry)s.
    ClassBody,

    /// `init { ... }`. Children: a [Block](Self::Block).
    ClassInitializer,

    /// `constructor(params) { ... }`.
    ///
    /// Children: [AnnotationEntry](Self::AnnotationEntry)s, a
    /// [ParameterList](Self::ParameterList) and an optional
    /// [Block](Self::Block).
    SecondaryConstructor,

    /// A function declaration. The text is the function name.
    ///
    /// Children: [AnnotationEntry](Self::AnnotationEntry)s, an optional
    /// [TypeParameterList](Self::TypeParameterList), a
    /// [ParameterList](Self::ParameterList), an optional return
    /// [TypeRef](Self::TypeRef), an optional
    /// [TypeConstraintList](Self::TypeConstraintList) and an optional body
    /// (a [Block](Self::Block) or an expression).
    Function,

    /// Children: [Parameter](Self::Parameter)s.
    ParameterList,

    /// A value parameter. The text is the parameter name.
    ///
    /// Children: [AnnotationEntry](Self::AnnotationEntry)s, an optional
    /// [TypeRef](Self::TypeRef) and an optional default value expression.
    Parameter,

    /// A property declaration. The text is the property name.
    ///
    /// Children: [AnnotationEntry](Self::AnnotationEntry)s, an optional
    /// [TypeRef](Self::TypeRef), an optional initializer expression, an
    /// optional [PropertyDelegate](Self::PropertyDelegate) and
    /// [Accessor](Self::Accessor)s.
    Property,

    /// `by expr`. Children: one expression.
    PropertyDelegate,

    /// `get() = ...` or `set(value) { ... }`. The text is `get` or `set`.
    ///
    /// Children: an optional [ParameterList](Self::ParameterList) and an
    /// optional body.
    Accessor,

    /// Children: [TypeParameter](Self::TypeParameter)s.
    TypeParameterList,

    /// The text is the parameter name. Children: an optional bound
    /// [TypeRef](Self::TypeRef).
    TypeParameter,

    /// Children: [TypeConstraint](Self::TypeConstraint)s.
    TypeConstraintList,

    /// `where T : Bound`.
    ///
    /// Children: a [NameRef](Self::NameRef) subject and a bound
    /// [TypeRef](Self::TypeRef).
    TypeConstraint,

    /// A reference to a type. The text is a possibly qualified type name
    /// (`a.b.C`).
    TypeRef,

    /// `{ statements }`. Used as a function body and as an expression.
    Block,

    /// `var name: Type = initializer`. The text is the variable name.
    ///
    /// Children: an optional [TypeRef](Self::TypeRef) and an optional
    /// initializer expression.
    LocalVariable,

    /// `name = expr`. Children: a [NameRef](Self::NameRef) and an expression.
    Assignment,

    /// `return expr`. Children: an optional expression.
    Return,

    /// `if (cond) then else other`. Children: two or three expressions.
    If,

    /// An identifier reference. The text is the identifier.
    NameRef,

    /// `this`.
    This,

    /// `callee(args)`. Children: a [NameRef](Self::NameRef) and
    /// [ValueArgs](Self::ValueArgs).
    Call,

    /// Children: argument expressions.
    ValueArgs,

    /// `receiver.selector`. Children: an expression and a
    /// [NameRef](Self::NameRef) or [Call](Self::Call).
    DotQualified,

    /// `left op right`. The text is the operator.
    Binary,

    /// `expr is Type`. Children: an expression and a [TypeRef](Self::TypeRef).
    IsCheck,

    /// An integer literal. The text is the literal.
    IntLiteral,

    /// A string literal. The text is the literal content.
    StringLiteral,

    /// `true` or `false`.
    BoolLiteral,
}

impl Display for SyntaxKind {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, formatter)
    }
}

impl SyntaxKind {
    /// Returns true if elements of this kind are expressions.
    #[inline]
    pub fn is_expression(self) -> bool {
        match self {
            Self::Block
            | Self::If
            | Self::NameRef
            | Self::This
            | Self::Call
            | Self::DotQualified
            | Self::Binary
            | Self::IsCheck
            | Self::IntLiteral
            | Self::StringLiteral
            | Self::BoolLiteral => true,

            _ => false,
        }
    }

    /// Returns true if elements of this kind can appear as block statements.
    #[inline]
    pub fn is_statement(self) -> bool {
        match self {
            Self::LocalVariable | Self::Assignment | Self::Return => true,
            other => other.is_expression(),
        }
    }

    /// Returns true if elements of this kind introduce a named symbol.
    #[inline]
    pub fn is_declaration(self) -> bool {
        match self {
            Self::Class
            | Self::Function
            | Self::Property
            | Self::Parameter
            | Self::TypeParameter
            | Self::SecondaryConstructor
            | Self::LocalVariable => true,

            _ => false,
        }
    }

    /// Returns true if elements of this kind can own a local flow of values.
    ///
    /// Assignments and variable declarations inside such elements change
    /// flow facts visible to the subsequent statements.
    #[inline(always)]
    pub fn affects_flow(self) -> bool {
        match self {
            Self::LocalVariable | Self::Assignment => true,
            _ => false,
        }
    }
}
