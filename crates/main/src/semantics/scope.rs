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

use compact_str::CompactString;
use lady_deirdre::{analysis::TaskHandle, sync::Shared};

use crate::{
    report::system_panic,
    semantics::{DescriptorRef, FqName, Resolver, Symbol},
    syntax::{ElementRef, SyntaxKind},
};

/// A single layer of the [ResolutionScope].
///
/// Most layers are lazy: they name a container, and the session looks the
/// name up in the container's declarations on demand, creating descriptors
/// for the found declarations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeLayer {
    /// Explicit bindings: local variables and accessor parameters.
    Locals(Vec<(CompactString, Symbol)>),

    /// Value parameters of the function or the constructor.
    Parameters(DescriptorRef),

    /// Type parameters of the class or the function.
    TypeParameters(DescriptorRef),

    /// Parameters of the class's primary constructor.
    ConstructorParameters(DescriptorRef),

    /// The `this` receiver of the class.
    Receiver(DescriptorRef),

    /// Declared and inherited members of the class.
    Members(DescriptorRef),

    /// Top-level declarations of the package across all files, and the
    /// foreign classes of the package.
    Package(FqName),

    /// Non-star imports of the file or the code fragment.
    ExplicitImports(ElementRef),

    /// Star imports of the file or the code fragment.
    StarImports(ElementRef),

    /// Packages imported into every file.
    DefaultImports,

    /// Top-level package names.
    RootPackages,
}

/// A layered name lookup environment.
///
/// Lookup walks the layers in order and stops at the first layer that
/// has matches. Scopes are immutable values: [chain](Self::chain) and
/// [with](Self::with) build new scopes without changing their inputs.
#[derive(Clone)]
pub struct ResolutionScope {
    layers: Shared<Vec<ScopeLayer>>,
}

impl Default for ResolutionScope {
    #[inline(always)]
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for ResolutionScope {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_list().entries(self.layers()).finish()
    }
}

impl PartialEq for ResolutionScope {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.layers() == other.layers()
    }
}

impl Eq for ResolutionScope {}

impl ResolutionScope {
    /// Creates a scope from the layers listed in lookup order.
    #[inline(always)]
    pub fn new(layers: Vec<ScopeLayer>) -> Self {
        Self {
            layers: Shared::new(layers),
        }
    }

    /// Returns a scope without layers.
    #[inline(always)]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns a scope that looks names up in `first`, and then in `second`.
    pub fn chain(first: &Self, second: &Self) -> Self {
        let mut layers = Vec::with_capacity(first.layers().len() + second.layers().len());

        layers.extend(first.layers().iter().cloned());
        layers.extend(second.layers().iter().cloned());

        Self::new(layers)
    }

    /// Returns a scope with the `layer` in front of this scope's layers.
    pub fn with(&self, layer: ScopeLayer) -> Self {
        let mut layers = Vec::with_capacity(self.layers().len() + 1);

        layers.push(layer);
        layers.extend(self.layers().iter().cloned());

        Self::new(layers)
    }

    /// Returns the layers in lookup order.
    #[inline(always)]
    pub fn layers(&self) -> &[ScopeLayer] {
        self.layers.as_ref().as_slice()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.layers().is_empty()
    }

    /// Returns the symbol bound to the name by the [Locals](ScopeLayer::Locals)
    /// layers, ignoring the lazy layers.
    pub fn local(&self, name: &str) -> Option<&Symbol> {
        for layer in self.layers() {
            let ScopeLayer::Locals(entries) = layer else {
                continue;
            };

            if let Some((_, symbol)) = entries.iter().rev().find(|(entry, _)| *entry == name) {
                return Some(symbol);
            }
        }

        None
    }
}

impl<'s, H: TaskHandle> Resolver<'s, H> {
    pub(crate) fn file_scope(&self, root: &ElementRef) -> ResolutionScope {
        let package = FqName::from_segments(self.tree().package_segments(root));

        ResolutionScope::new(vec![
            ScopeLayer::ExplicitImports(*root),
            ScopeLayer::Package(package),
            ScopeLayer::StarImports(*root),
            ScopeLayer::DefaultImports,
            ScopeLayer::RootPackages,
        ])
    }

    // The scope in which the declaration's header is resolved.
    pub(crate) fn outer_scope(&self, declaration: &ElementRef) -> ResolutionScope {
        let tree = self.tree();
        let mut current = declaration.parent(tree);

        while let Some(element) = current.deref(tree) {
            match element.kind {
                SyntaxKind::ClassBody => {
                    return self.class_member_scope(&element.parent);
                }

                SyntaxKind::File | SyntaxKind::CodeFragment => {
                    return self.file_scope(&current);
                }

                SyntaxKind::Class
                | SyntaxKind::Function
                | SyntaxKind::Property
                | SyntaxKind::SecondaryConstructor => {
                    return self.declaration_inner_scope(&current);
                }

                _ => (),
            }

            current = element.parent;
        }

        system_panic!("Declaration {declaration} is not attached to a root.");
    }

    // The scope visible to the declarations nested into `owner`.
    fn declaration_inner_scope(&self, owner: &ElementRef) -> ResolutionScope {
        match owner.kind(self.tree()) {
            Some(SyntaxKind::Class) => self.class_header_scope(owner),
            Some(SyntaxKind::Function) => self.function_body_scope(owner),
            Some(SyntaxKind::SecondaryConstructor) => self.constructor_body_scope(owner),
            _ => self.outer_scope(owner),
        }
    }

    pub(crate) fn class_header_scope(&self, class: &ElementRef) -> ResolutionScope {
        let descriptor = self.require_descriptor(class);

        self.outer_scope(class)
            .with(ScopeLayer::TypeParameters(descriptor))
    }

    pub(crate) fn class_member_scope(&self, class: &ElementRef) -> ResolutionScope {
        let descriptor = self.require_descriptor(class);

        let outer = self.outer_scope(class);

        ResolutionScope::chain(
            &ResolutionScope::new(vec![
                ScopeLayer::Receiver(descriptor),
                ScopeLayer::Members(descriptor),
                ScopeLayer::TypeParameters(descriptor),
            ]),
            &outer,
        )
    }

    pub(crate) fn class_initializer_scope(&self, class: &ElementRef) -> ResolutionScope {
        let descriptor = self.require_descriptor(class);

        self.class_member_scope(class)
            .with(ScopeLayer::ConstructorParameters(descriptor))
    }

    pub(crate) fn function_header_scope(&self, function: &ElementRef) -> ResolutionScope {
        let descriptor = self.require_descriptor(function);

        self.outer_scope(function)
            .with(ScopeLayer::TypeParameters(descriptor))
    }

    pub(crate) fn function_body_scope(&self, function: &ElementRef) -> ResolutionScope {
        let descriptor = self.require_descriptor(function);

        self.function_header_scope(function)
            .with(ScopeLayer::Parameters(descriptor))
    }

    pub(crate) fn constructor_body_scope(&self, constructor: &ElementRef) -> ResolutionScope {
        let descriptor = self.require_descriptor(constructor);

        self.outer_scope(constructor)
            .with(ScopeLayer::Parameters(descriptor))
    }

    // Member property initializers see the primary constructor parameters.
    pub(crate) fn property_scope(&self, property: &ElementRef) -> ResolutionScope {
        let tree = self.tree();
        let parent = property.parent(tree);

        match parent.kind(tree) {
            Some(SyntaxKind::ClassBody) => self.class_initializer_scope(&parent.parent(tree)),
            _ => self.outer_scope(property),
        }
    }

    pub(crate) fn accessor_scope(&self, accessor: &ElementRef) -> ResolutionScope {
        let tree = self.tree();
        let property = accessor.parent(tree);
        let outer = self.outer_scope(&property);

        let Some(accessor_element) = accessor.deref(tree) else {
            return outer;
        };

        let Some(parameters) = accessor_element.child_of(tree, SyntaxKind::ParameterList) else {
            return outer;
        };

        let Some(parameters) = parameters.deref(tree) else {
            return outer;
        };

        let entries = parameters
            .children_of(tree, SyntaxKind::Parameter)
            .filter_map(|parameter| {
                let name = parameter.deref(tree)?.text.clone()?;
                let descriptor = self.descriptor_for(&parameter)?;

                Some((name, Symbol::Descriptor(descriptor)))
            })
            .collect::<Vec<_>>();

        match entries.is_empty() {
            true => outer,
            false => outer.with(ScopeLayer::Locals(entries)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        semantics::{DescriptorRef, FqName, ResolutionScope, ScopeLayer, Symbol},
        syntax::ElementRef,
    };

    #[test]
    fn test_scope_chain() {
        let first = ResolutionScope::new(vec![ScopeLayer::Locals(vec![(
            "a".into(),
            Symbol::Descriptor(DescriptorRef(1)),
        )])]);

        let second = ResolutionScope::new(vec![
            ScopeLayer::Locals(vec![
                ("a".into(), Symbol::Descriptor(DescriptorRef(2))),
                ("b".into(), Symbol::Descriptor(DescriptorRef(3))),
            ]),
            ScopeLayer::Package(FqName::root()),
        ]);

        let chained = ResolutionScope::chain(&first, &second);

        assert_eq!(chained.layers().len(), 3);
        assert_eq!(first.layers().len(), 1);
        assert_eq!(second.layers().len(), 2);
        assert_eq!(chained.local("a"), Some(&Symbol::Descriptor(DescriptorRef(1))));
        assert_eq!(chained.local("b"), Some(&Symbol::Descriptor(DescriptorRef(3))));
        assert_eq!(chained.local("c"), None);

        let extended = chained.with(ScopeLayer::StarImports(ElementRef::nil()));

        assert_eq!(extended.layers().len(), 4);
        assert_eq!(chained.layers().len(), 3);
        assert_ne!(extended, chained);
        assert_eq!(ResolutionScope::chain(&first, &second), chained);
    }
}
