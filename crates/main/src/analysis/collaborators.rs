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

use std::fmt::{Debug, Formatter};

use ahash::AHashMap;
use compact_str::CompactString;
use lady_deirdre::sync::Shared;

use crate::{
    analysis::{Declaration, MemoryStorage},
    semantics::{
        Builtins,
        DescriptorOrigin,
        DescriptorRef,
        DescriptorSeed,
        FqName,
        LazyDescriptor,
        SemanticBinding,
        Ty,
    },
    syntax::{ElementRef, SyntaxKind},
};

/// The name of the package that contains the primitive classes.
///
/// The default [ResolveConfig](crate::analysis::ResolveConfig) imports this
/// package into every file.
pub const BUILTINS_PACKAGE: &'static str = "builtins";

/// A source of the packages and classes defined outside of the syntax tree.
pub trait ForeignSymbolLoader: Send + Sync + 'static {
    /// Returns all packages that contain foreign classes.
    fn packages(&self) -> Vec<FqName>;

    /// Returns the simple names of the foreign classes of the package.
    fn classes(&self, package: &FqName) -> Vec<CompactString>;

    /// Returns the class by its fully qualified name.
    fn class(&self, name: &FqName) -> Option<ForeignClass>;
}

/// A description of a class provided by the [ForeignSymbolLoader].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignClass {
    pub name: FqName,
    pub supertypes: Vec<FqName>,
    pub annotations: Vec<FqName>,
    pub members: Vec<ForeignMember>,
}

impl ForeignClass {
    /// Creates a class without supertypes, annotations and members.
    #[inline(always)]
    pub fn new(name: impl Into<FqName>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            annotations: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForeignMemberKind {
    Function,
    Property,
}

/// A member of the [ForeignClass].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignMember {
    pub name: CompactString,
    pub kind: ForeignMemberKind,

    /// Names and types of the function parameters.
    pub parameters: Vec<(CompactString, FqName)>,

    /// The property type, or the function return type.
    pub ty: FqName,
}

/// An in-memory [ForeignSymbolLoader].
#[derive(Clone, Default)]
pub struct ForeignLibrary {
    classes: AHashMap<FqName, ForeignClass>,
}

impl Debug for ForeignLibrary {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = self.classes.keys().map(ToString::to_string).collect::<Vec<_>>();

        names.sort();

        formatter
            .debug_struct("ForeignLibrary")
            .field("classes", &names)
            .finish()
    }
}

impl ForeignSymbolLoader for ForeignLibrary {
    fn packages(&self) -> Vec<FqName> {
        let mut packages = self
            .classes
            .keys()
            .filter_map(|name| name.parent())
            .collect::<Vec<_>>();

        packages.sort_by(|a, b| a.segments().cmp(b.segments()));
        packages.dedup();

        packages
    }

    fn classes(&self, package: &FqName) -> Vec<CompactString> {
        let mut classes = self
            .classes
            .keys()
            .filter(|name| name.parent().as_ref() == Some(package))
            .map(|name| CompactString::from(name.last()))
            .collect::<Vec<_>>();

        classes.sort();

        classes
    }

    #[inline(always)]
    fn class(&self, name: &FqName) -> Option<ForeignClass> {
        self.classes.get(name).cloned()
    }
}

impl ForeignLibrary {
    /// Creates an empty library.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library of the [builtins](BUILTINS_PACKAGE) package: `Any`,
    /// `Int`, `String`, `Boolean`, `Unit` and `Nothing`.
    pub fn builtins() -> Self {
        let mut library = Self::new();

        for name in ["Any", "Int", "String", "Boolean", "Unit", "Nothing"] {
            library.add_class(ForeignClass::new(Self::builtin(name)));
        }

        library
    }

    /// Adds the class, replacing the class with the same name.
    #[inline(always)]
    pub fn add_class(&mut self, class: ForeignClass) -> &mut Self {
        let _ = self.classes.insert(class.name.clone(), class);

        self
    }

    /// Returns the fully qualified name of the builtin class.
    #[inline(always)]
    pub fn builtin(name: &str) -> FqName {
        FqName::parse(BUILTINS_PACKAGE).child(name)
    }
}

/// An arena of descriptors and a memo of the full bindings.
///
/// Implementations must not create two descriptors with equal
/// [origins](DescriptorOrigin): [create_lazy](Self::create_lazy) returns the
/// existing descriptor in this case.
pub trait StorageManager: Send + Sync + 'static {
    /// Returns a descriptor with the seed's origin, creating an Unforced one
    /// if it does not exist yet.
    fn create_lazy(&self, seed: DescriptorSeed) -> DescriptorRef;

    fn get(&self, descriptor: DescriptorRef) -> Option<Shared<LazyDescriptor>>;

    fn find(&self, origin: &DescriptorOrigin) -> Option<DescriptorRef>;

    /// Returns the memoized binding of the full resolution of the unit.
    fn cached_binding(&self, unit: &ElementRef) -> Option<SemanticBinding>;

    /// Memoizes the binding of the full resolution of the unit. Keeps the
    /// first binding if the unit already has one.
    fn put_binding(&self, unit: ElementRef, binding: SemanticBinding);
}

/// A request to the [ExpressionTyper] to compute the type of an expression
/// from its operands.
#[derive(Clone, Copy, Debug)]
pub struct TypeQuery<'a> {
    /// The kind of the expression.
    pub kind: SyntaxKind,

    /// The literal, the operator or the name of the expression.
    pub text: &'a str,

    /// Types of the operands: the binary operands, the tested value and the
    /// tested type of an `is` check, or the branches of an `if`.
    pub operands: &'a [Ty],

    /// The type of the value the expression refers to: a variable type, a
    /// function return type, or a constructed class.
    pub symbol_type: Ty,

    pub builtins: &'a Builtins,
}

/// A computation of the expression types.
pub trait ExpressionTyper: Send + Sync + 'static {
    fn expression_type(&self, query: &TypeQuery<'_>) -> Ty;
}

/// The default [ExpressionTyper] for the primitive types of the
/// [builtins](BUILTINS_PACKAGE) package.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinTyper;

impl ExpressionTyper for BuiltinTyper {
    fn expression_type(&self, query: &TypeQuery<'_>) -> Ty {
        let builtins = query.builtins;

        match query.kind {
            SyntaxKind::IntLiteral => builtins.int,
            SyntaxKind::StringLiteral => builtins.string,
            SyntaxKind::BoolLiteral | SyntaxKind::IsCheck => builtins.boolean,

            SyntaxKind::Binary => match query.text {
                "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => builtins.boolean,

                "+" if query.operands.iter().any(|ty| ty == &builtins.string) => builtins.string,

                "+" | "-" | "*" | "/" | "%"
                    if query.operands.iter().all(|ty| ty == &builtins.int) =>
                {
                    builtins.int
                }

                _ => Ty::Unresolved,
            },

            SyntaxKind::If => match query.operands {
                [then_branch, else_branch] if then_branch == else_branch => *then_branch,
                [_, _] => builtins.any,
                _ => Ty::Unresolved,
            },

            _ => query.symbol_type,
        }
    }
}

/// A control and data flow analysis invoked once per resolved unit.
pub trait FlowChecker: Send + Sync + 'static {
    fn check_declaration(&self, unit: &Declaration, binding: &SemanticBinding);
}

/// A [FlowChecker] that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentFlowChecker;

impl FlowChecker for SilentFlowChecker {
    #[inline(always)]
    fn check_declaration(&self, _unit: &Declaration, _binding: &SemanticBinding) {}
}

/// External services used by the [ResolveSession](crate::analysis::ResolveSession).
pub struct Collaborators {
    pub loader: Box<dyn ForeignSymbolLoader>,
    pub storage: Box<dyn StorageManager>,
    pub typer: Box<dyn ExpressionTyper>,
    pub flow_checker: Box<dyn FlowChecker>,
}

impl Debug for Collaborators {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Default for Collaborators {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Collaborators {
    /// Creates the default collaborators: the [builtins](ForeignLibrary::builtins)
    /// library, the [MemoryStorage], the [BuiltinTyper] and the
    /// [SilentFlowChecker].
    #[inline(always)]
    pub fn new() -> Self {
        Self::with_loader(ForeignLibrary::builtins())
    }

    /// Creates the default collaborators with a custom foreign symbol loader.
    #[inline(always)]
    pub fn with_loader(loader: impl ForeignSymbolLoader) -> Self {
        Self {
            loader: Box::new(loader),
            storage: Box::new(MemoryStorage::new()),
            typer: Box::new(BuiltinTyper),
            flow_checker: Box::new(SilentFlowChecker),
        }
    }
}
