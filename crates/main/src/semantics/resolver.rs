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

use std::cell::Cell;

use lady_deirdre::{analysis::TaskHandle, sync::Shared};
use log::warn;

use crate::{
    analysis::{ResolveConfig, ResolveError, ResolveResult, ResolveSession, BUILTINS_PACKAGE},
    report::system_panic,
    semantics::{
        Builtins,
        DescriptorContents,
        DescriptorKind,
        DescriptorOrigin,
        DescriptorRef,
        DescriptorSeed,
        FlowFacts,
        FqName,
        LazyDescriptor,
        Symbol,
        Ty,
        FORCE_LOG,
    },
    syntax::{ElementRef, SyntaxKind, SyntaxTree},
};

// A context of a single resolution call: the session and the cancellation
// handle of the caller.
pub(crate) struct Resolver<'s, H: TaskHandle> {
    pub(crate) session: &'s ResolveSession,
    pub(crate) handle: &'s H,
    builtins: Cell<Option<Builtins>>,
}

impl<'s, H: TaskHandle> Resolver<'s, H> {
    #[inline(always)]
    pub(crate) fn new(session: &'s ResolveSession, handle: &'s H) -> Self {
        Self {
            session,
            handle,
            builtins: Cell::new(None),
        }
    }

    #[inline(always)]
    pub(crate) fn tree(&self) -> &'s SyntaxTree {
        self.session.tree.as_ref()
    }

    #[inline(always)]
    pub(crate) fn config(&self) -> &'s ResolveConfig {
        &self.session.config
    }

    #[inline(always)]
    pub(crate) fn checkpoint(&self) -> ResolveResult<()> {
        if self.handle.is_triggered() {
            warn!(
                target: FORCE_LOG,
                "[{}] Resolution interrupted.",
                self.session.id,
            );

            return Err(ResolveError::Interrupted(self.session.id));
        }

        Ok(())
    }

    pub(crate) fn descriptor(&self, descriptor: DescriptorRef) -> Shared<LazyDescriptor> {
        let Some(lazy) = self.session.collaborators.storage.get(descriptor) else {
            system_panic!("Descriptor {descriptor:?} is missing in the storage.");
        };

        lazy
    }

    #[inline(always)]
    pub(crate) fn kind_of(&self, descriptor: DescriptorRef) -> DescriptorKind {
        self.descriptor(descriptor).as_ref().kind()
    }

    // Returns a descriptor of the declaration element, creating an Unforced
    // one on first request.
    pub(crate) fn descriptor_for(&self, element: &ElementRef) -> Option<DescriptorRef> {
        let tree = self.tree();
        let declaration = element.deref(tree)?;

        let kind = match declaration.kind {
            SyntaxKind::Class => DescriptorKind::Class,
            SyntaxKind::Function => DescriptorKind::Function,
            SyntaxKind::Property => DescriptorKind::Property,
            SyntaxKind::Parameter => DescriptorKind::Parameter,
            SyntaxKind::TypeParameter => DescriptorKind::TypeParameter,
            SyntaxKind::SecondaryConstructor => DescriptorKind::Constructor,
            _ => return None,
        };

        let origin = DescriptorOrigin::Source(*element);

        let storage = &self.session.collaborators.storage;

        if let Some(existing) = storage.find(&origin) {
            return Some(existing);
        }

        let name = match kind {
            DescriptorKind::Constructor => "<init>".into(),
            _ => declaration.text.clone().unwrap_or_default(),
        };

        let container = self.container_of(element);

        Some(storage.create_lazy(DescriptorSeed {
            origin,
            kind,
            name,
            container,
        }))
    }

    #[inline(always)]
    pub(crate) fn require_descriptor(&self, element: &ElementRef) -> DescriptorRef {
        let Some(descriptor) = self.descriptor_for(element) else {
            system_panic!("Element {element} is not a declaration.");
        };

        descriptor
    }

    pub(crate) fn primary_constructor(&self, class: &ElementRef) -> DescriptorRef {
        let container = self.require_descriptor(class);

        self.session.collaborators.storage.create_lazy(DescriptorSeed {
            origin: DescriptorOrigin::PrimaryConstructor(*class),
            kind: DescriptorKind::Constructor,
            name: "<init>".into(),
            container: Some(container),
        })
    }

    fn container_of(&self, element: &ElementRef) -> Option<DescriptorRef> {
        let tree = self.tree();
        let mut current = element.parent(tree);

        while let Some(parent) = current.deref(tree) {
            match parent.kind {
                SyntaxKind::PrimaryConstructorParameterList => {
                    let class = tree.parent_of_kind(&current, SyntaxKind::Class)?;

                    return Some(self.primary_constructor(&class));
                }

                SyntaxKind::Class
                | SyntaxKind::Function
                | SyntaxKind::Property
                | SyntaxKind::SecondaryConstructor => return self.descriptor_for(&current),

                SyntaxKind::File | SyntaxKind::CodeFragment => return None,

                _ => (),
            }

            current = parent.parent;
        }

        None
    }

    // Returns a Forced descriptor of the foreign class, or None if the loader
    // does not know the class.
    pub(crate) fn foreign_class(&self, name: &FqName) -> ResolveResult<Option<DescriptorRef>> {
        let Some(descriptor) = self.foreign_class_stub(name) else {
            return Ok(None);
        };

        let _ = self.force(descriptor)?;

        Ok(Some(descriptor))
    }

    pub(crate) fn foreign_class_stub(&self, name: &FqName) -> Option<DescriptorRef> {
        let origin = DescriptorOrigin::ForeignClass(name.clone());
        let storage = &self.session.collaborators.storage;

        if let Some(existing) = storage.find(&origin) {
            return Some(existing);
        }

        let _ = self.session.collaborators.loader.class(name)?;

        Some(storage.create_lazy(DescriptorSeed {
            origin,
            kind: DescriptorKind::Class,
            name: name.last().into(),
            container: None,
        }))
    }

    pub(crate) fn foreign_type(&self, name: &FqName) -> Ty {
        match self.foreign_class_stub(name) {
            Some(descriptor) => Ty::Class(descriptor),
            None => Ty::Unresolved,
        }
    }

    pub(crate) fn builtins(&self) -> ResolveResult<Builtins> {
        if let Some(builtins) = self.builtins.get() {
            return Ok(builtins);
        }

        let package = FqName::parse(BUILTINS_PACKAGE);

        let resolve = |name: &str| -> ResolveResult<Ty> {
            Ok(match self.foreign_class(&package.child(name))? {
                Some(descriptor) => Ty::Class(descriptor),
                None => Ty::Unresolved,
            })
        };

        let builtins = Builtins {
            any: resolve("Any")?,
            int: resolve("Int")?,
            string: resolve("String")?,
            boolean: resolve("Boolean")?,
            unit: resolve("Unit")?,
            nothing: resolve("Nothing")?,
        };

        self.builtins.set(Some(builtins));

        Ok(builtins)
    }

    // Forces the descriptor and returns its contents. The contents are
    // partial if the descriptor is a part of a dependency cycle.
    pub(crate) fn contents(
        &self,
        descriptor: DescriptorRef,
    ) -> ResolveResult<Shared<DescriptorContents>> {
        let _ = self.force(descriptor)?;

        Ok(self.descriptor(descriptor).as_ref().contents())
    }

    // The element that identifies the variable in flow facts.
    pub(crate) fn variable_key(&self, symbol: &Symbol) -> Option<ElementRef> {
        match symbol {
            Symbol::Local { declaration, .. } => Some(*declaration),

            Symbol::Descriptor(descriptor) => {
                let lazy = self.descriptor(*descriptor);

                match lazy.as_ref().kind() {
                    DescriptorKind::Parameter => lazy.as_ref().origin().source(),
                    _ => None,
                }
            }

            Symbol::Package(_) => None,
        }
    }

    // The type of the value denoted by the symbol at the point described by
    // the flow facts.
    pub(crate) fn value_type(&self, symbol: &Symbol, facts: &FlowFacts) -> ResolveResult<Ty> {
        if let Some(key) = self.variable_key(symbol) {
            if let Some(known) = facts.known_type(&key) {
                return Ok(known);
            }
        }

        match symbol {
            Symbol::Local { ty, .. } => Ok(*ty),

            Symbol::Descriptor(descriptor) => match self.kind_of(*descriptor) {
                DescriptorKind::Property
                | DescriptorKind::Parameter
                | DescriptorKind::Function
                | DescriptorKind::Constructor => {
                    Ok(self.contents(*descriptor)?.as_ref().ty.unwrap_or_default())
                }

                DescriptorKind::Class | DescriptorKind::TypeParameter => Ok(Ty::Unresolved),
            },

            Symbol::Package(_) => Ok(Ty::Unresolved),
        }
    }
}
