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
use compact_str::CompactString;
use lady_deirdre::analysis::TaskHandle;

use crate::{
    analysis::{ForeignMember, ForeignMemberKind, ResolveResult, StringEstimation},
    semantics::{
        binding::BindingDelta,
        DescriptorKind,
        DescriptorOrigin,
        DescriptorRef,
        DescriptorSeed,
        FqName,
        Reference,
        ResolutionScope,
        Resolver,
        ScopeLayer,
        Symbol,
        Ty,
    },
    syntax::{ElementRef, SyntaxKind},
};

impl<'s, H: TaskHandle> Resolver<'s, H> {
    // Walks the scope layers in order. The filter receives the candidates of
    // each layer, and the first layer with non-empty filtered candidates
    // wins.
    pub(crate) fn lookup(
        &self,
        scope: &ResolutionScope,
        name: &str,
        mut filter: impl FnMut(Vec<Symbol>) -> ResolveResult<Vec<Symbol>>,
    ) -> ResolveResult<Vec<Symbol>> {
        for layer in scope.layers() {
            let candidates = self.layer_candidates(layer, name)?;

            if candidates.is_empty() {
                continue;
            }

            let accepted = filter(candidates)?;

            if !accepted.is_empty() {
                return Ok(accepted);
            }
        }

        Ok(Vec::new())
    }

    fn layer_candidates(&self, layer: &ScopeLayer, name: &str) -> ResolveResult<Vec<Symbol>> {
        match layer {
            ScopeLayer::Locals(entries) => Ok(entries
                .iter()
                .rev()
                .find(|(entry, _)| *entry == name)
                .map(|(_, symbol)| vec![symbol.clone()])
                .unwrap_or_default()),

            ScopeLayer::Parameters(owner) => {
                let parameters = self.contents(*owner)?.as_ref().parameters.clone();

                Ok(self.named(parameters, name))
            }

            ScopeLayer::TypeParameters(owner) => {
                let parameters = self.contents(*owner)?.as_ref().type_parameters.clone();

                Ok(self.named(parameters, name))
            }

            ScopeLayer::ConstructorParameters(class) => {
                let Some(constructor) = self.contents(*class)?.as_ref().primary_constructor else {
                    return Ok(Vec::new());
                };

                let parameters = self.contents(constructor)?.as_ref().parameters.clone();

                Ok(self.named(parameters, name))
            }

            ScopeLayer::Receiver(class) => match name == "this" {
                true => Ok(vec![Symbol::Descriptor(*class)]),
                false => Ok(Vec::new()),
            },

            ScopeLayer::Members(class) => self.members_named(*class, name),

            ScopeLayer::Package(package) => self.package_members(package, name),

            ScopeLayer::ExplicitImports(root) => {
                let imports = self.file_imports(root)?;

                Ok(imports
                    .as_ref()
                    .explicit
                    .iter()
                    .filter(|import| import.alias == name)
                    .flat_map(|import| import.symbols.iter().cloned())
                    .collect())
            }

            ScopeLayer::StarImports(root) => {
                let imports = self.file_imports(root)?;
                let mut result = Vec::new();

                for package in &imports.as_ref().star {
                    result.append(&mut self.package_members(package, name)?);
                }

                Ok(result)
            }

            ScopeLayer::DefaultImports => {
                let mut result = Vec::new();

                for package in &self.config().default_imports {
                    result.append(&mut self.package_members(&FqName::parse(package), name)?);
                }

                Ok(result)
            }

            ScopeLayer::RootPackages => {
                let package = FqName::root().child(name);

                match self.session.packages.contains(&package) {
                    true => Ok(vec![Symbol::Package(package)]),
                    false => Ok(Vec::new()),
                }
            }
        }
    }

    fn named(&self, descriptors: Vec<DescriptorRef>, name: &str) -> Vec<Symbol> {
        descriptors
            .into_iter()
            .filter(|descriptor| self.descriptor(*descriptor).as_ref().name() == name)
            .map(Symbol::Descriptor)
            .collect()
    }

    // Members declared by the class, or inherited from the nearest
    // supertypes that declare the name.
    pub(crate) fn members_named(
        &self,
        class: DescriptorRef,
        name: &str,
    ) -> ResolveResult<Vec<Symbol>> {
        let mut visited = AHashSet::new();

        self.members_in_hierarchy(class, name, &mut visited)
    }

    fn members_in_hierarchy(
        &self,
        class: DescriptorRef,
        name: &str,
        visited: &mut AHashSet<DescriptorRef>,
    ) -> ResolveResult<Vec<Symbol>> {
        if !visited.insert(class) {
            return Ok(Vec::new());
        }

        let declared = self.declared_members(class, name)?;

        if !declared.is_empty() {
            return Ok(declared);
        }

        let supertypes = self.contents(class)?.as_ref().supertypes.clone();
        let mut result = Vec::new();

        for supertype in supertypes {
            let Ty::Class(supertype) = supertype else {
                continue;
            };

            result.append(&mut self.members_in_hierarchy(supertype, name, visited)?);
        }

        Ok(result)
    }

    fn declared_members(&self, class: DescriptorRef, name: &str) -> ResolveResult<Vec<Symbol>> {
        let lazy = self.descriptor(class);

        match lazy.as_ref().origin() {
            DescriptorOrigin::Source(element) => Ok(self
                .class_body_declarations(element)
                .filter(|member| {
                    member.deref(self.tree()).map(|member| member.text()) == Some(name)
                })
                .filter_map(|member| self.descriptor_for(&member))
                .map(Symbol::Descriptor)
                .collect()),

            DescriptorOrigin::ForeignClass(fq_name) => {
                let Some(foreign) = self.session.collaborators.loader.class(fq_name) else {
                    return Ok(Vec::new());
                };

                let mut result = Vec::new();

                for (index, member) in foreign.members.iter().enumerate() {
                    if member.name != name {
                        continue;
                    }

                    let descriptor = self.foreign_member(fq_name, class, index, member)?;

                    result.push(Symbol::Descriptor(descriptor));
                }

                Ok(result)
            }

            _ => Ok(Vec::new()),
        }
    }

    fn class_body_declarations(
        &self,
        class: &ElementRef,
    ) -> impl Iterator<Item = ElementRef> + 's {
        let tree = self.tree();

        class
            .deref(tree)
            .and_then(|class| class.child_of(tree, SyntaxKind::ClassBody))
            .and_then(|body| body.deref(tree))
            .map(|body| body.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |member| match member.kind(tree) {
                Some(SyntaxKind::Class | SyntaxKind::Function | SyntaxKind::Property) => true,
                _ => false,
            })
    }

    fn foreign_member(
        &self,
        class_name: &FqName,
        class: DescriptorRef,
        index: usize,
        member: &ForeignMember,
    ) -> ResolveResult<DescriptorRef> {
        let kind = match member.kind {
            ForeignMemberKind::Function => DescriptorKind::Function,
            ForeignMemberKind::Property => DescriptorKind::Property,
        };

        let descriptor = self.session.collaborators.storage.create_lazy(DescriptorSeed {
            origin: DescriptorOrigin::ForeignMember {
                class: class_name.clone(),
                index,
            },
            kind,
            name: member.name.clone(),
            container: Some(class),
        });

        let _ = self.force(descriptor)?;

        Ok(descriptor)
    }

    // Top-level declarations of the package in all files, and the foreign
    // class of the package with the specified name.
    pub(crate) fn package_members(
        &self,
        package: &FqName,
        name: &str,
    ) -> ResolveResult<Vec<Symbol>> {
        let tree = self.tree();
        let mut result = Vec::new();

        for file in self.session.packages.files(package) {
            let Some(file) = file.deref(tree) else {
                continue;
            };

            for declaration in &file.children {
                let Some(element) = declaration.deref(tree) else {
                    continue;
                };

                match element.kind {
                    SyntaxKind::Class | SyntaxKind::Function | SyntaxKind::Property => (),
                    _ => continue,
                }

                if element.text() != name {
                    continue;
                }

                if let Some(descriptor) = self.descriptor_for(declaration) {
                    result.push(Symbol::Descriptor(descriptor));
                }
            }
        }

        if let Some(descriptor) = self.foreign_class(&package.child(name))? {
            result.push(Symbol::Descriptor(descriptor));
        }

        Ok(result)
    }

    // Symbols denoted by `receiver.name` where the receiver is a package or
    // a class.
    pub(crate) fn qualified_member(
        &self,
        receiver: &Symbol,
        name: &str,
    ) -> ResolveResult<Vec<Symbol>> {
        match receiver {
            Symbol::Package(package) => {
                let mut result = self.package_members(package, name)?;
                let nested = package.child(name);

                if self.session.packages.contains(&nested) {
                    result.push(Symbol::Package(nested));
                }

                Ok(result)
            }

            Symbol::Descriptor(descriptor) => match self.kind_of(*descriptor) {
                DescriptorKind::Class => self.members_named(*descriptor, name),
                _ => Ok(Vec::new()),
            },

            Symbol::Local { .. } => Ok(Vec::new()),
        }
    }

    #[inline(always)]
    pub(crate) fn is_type_symbol(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Descriptor(descriptor) => match self.kind_of(*descriptor) {
                DescriptorKind::Class | DescriptorKind::TypeParameter => true,
                _ => false,
            },

            _ => false,
        }
    }

    // Resolves a possibly qualified type name and records the reference on
    // the type reference element.
    pub(crate) fn resolve_type_ref(
        &self,
        type_ref: &ElementRef,
        scope: &ResolutionScope,
        delta: &mut BindingDelta,
    ) -> ResolveResult<Ty> {
        let text = match type_ref.deref(self.tree()) {
            Some(element) => element.text(),
            None => return Ok(Ty::Unresolved),
        };

        let mut segments = text.split('.');

        let Some(first) = segments.next() else {
            return Ok(Ty::Unresolved);
        };

        let mut last_name = first;
        let mut segments = segments.peekable();

        let mut symbols = match segments.peek().is_some() {
            true => self.lookup(scope, first, |candidates| {
                Ok(candidates
                    .into_iter()
                    .filter(|symbol| match symbol {
                        Symbol::Package(_) => true,
                        other => self.is_type_symbol(other),
                    })
                    .collect())
            })?,

            false => self.lookup(scope, first, |candidates| {
                Ok(candidates
                    .into_iter()
                    .filter(|symbol| self.is_type_symbol(symbol))
                    .collect())
            })?,
        };

        while let Some(segment) = segments.next() {
            last_name = segment;

            let [receiver] = symbols.as_slice() else {
                symbols = Vec::new();
                break;
            };

            let is_last = segments.peek().is_none();

            symbols = self
                .qualified_member(receiver, segment)?
                .into_iter()
                .filter(|symbol| match symbol {
                    Symbol::Package(_) => !is_last,
                    other => self.is_type_symbol(other),
                })
                .collect();
        }

        let reference = self.reference_of(symbols, scope, last_name)?;

        let ty = match reference.descriptor() {
            Some(descriptor) => match self.kind_of(descriptor) {
                DescriptorKind::Class => Ty::Class(descriptor),
                DescriptorKind::TypeParameter => Ty::Parameter(descriptor),
                _ => Ty::Unresolved,
            },

            None => Ty::Unresolved,
        };

        delta.record_reference(*type_ref, reference);

        Ok(ty)
    }

    // Turns lookup candidates into a reference: exactly one symbol resolves,
    // several are ambiguous, none is an unresolved reference with suggestions.
    pub(crate) fn reference_of(
        &self,
        mut symbols: Vec<Symbol>,
        scope: &ResolutionScope,
        name: &str,
    ) -> ResolveResult<Reference> {
        symbols.sort();
        symbols.dedup();

        match symbols.len() {
            0 => Ok(Reference::Unresolved {
                name: name.into(),
                suggestions: self.suggestions(scope, name)?,
            }),

            1 => Ok(Reference::Resolved(symbols.remove(0))),

            _ => Ok(Reference::Ambiguous(symbols)),
        }
    }

    // Names visible in the scope that are close to the missing name, the
    // closest first.
    pub(crate) fn suggestions(
        &self,
        scope: &ResolutionScope,
        name: &str,
    ) -> ResolveResult<Vec<CompactString>> {
        let limit = self.config().suggestions;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let threshold = self.config().suggestion_threshold;

        let mut ranked = self
            .visible_names(scope)?
            .into_iter()
            .filter(|candidate| *candidate != name)
            .map(|candidate| (candidate.estimate(name), candidate))
            .filter(|(closeness, _)| closeness.reaches(threshold))
            .collect::<Vec<_>>();

        ranked.sort_by(|(a_closeness, a_name), (b_closeness, b_name)| {
            b_closeness.cmp(a_closeness).then_with(|| a_name.cmp(b_name))
        });

        ranked.dedup_by(|(_, a), (_, b)| a == b);
        ranked.truncate(limit);

        Ok(ranked.into_iter().map(|(_, candidate)| candidate).collect())
    }

    fn visible_names(&self, scope: &ResolutionScope) -> ResolveResult<Vec<CompactString>> {
        let mut names = Vec::new();

        for layer in scope.layers() {
            match layer {
                ScopeLayer::Locals(entries) => {
                    names.extend(entries.iter().map(|(name, _)| name.clone()))
                }

                ScopeLayer::Parameters(owner) => {
                    let parameters = self.contents(*owner)?.as_ref().parameters.clone();

                    names.extend(self.names_of(parameters));
                }

                ScopeLayer::TypeParameters(owner) => {
                    let parameters = self.contents(*owner)?.as_ref().type_parameters.clone();

                    names.extend(self.names_of(parameters));
                }

                ScopeLayer::ConstructorParameters(class) => {
                    if let Some(constructor) = self.contents(*class)?.as_ref().primary_constructor
                    {
                        let parameters = self.contents(constructor)?.as_ref().parameters.clone();

                        names.extend(self.names_of(parameters));
                    }
                }

                ScopeLayer::Receiver(_) => names.push("this".into()),

                ScopeLayer::Members(class) => {
                    let mut visited = AHashSet::new();

                    self.member_names(*class, &mut visited, &mut names)?;
                }

                ScopeLayer::Package(package) => self.package_names(package, &mut names),

                ScopeLayer::ExplicitImports(root) => {
                    let imports = self.file_imports(root)?;

                    names.extend(
                        imports
                            .as_ref()
                            .explicit
                            .iter()
                            .map(|import| import.alias.clone()),
                    );
                }

                ScopeLayer::StarImports(root) => {
                    let imports = self.file_imports(root)?;

                    for package in &imports.as_ref().star {
                        self.package_names(package, &mut names);
                    }
                }

                ScopeLayer::DefaultImports => {
                    for package in &self.config().default_imports {
                        self.package_names(&FqName::parse(package), &mut names);
                    }
                }

                ScopeLayer::RootPackages => {
                    names.extend(self.session.packages.root_names());
                }
            }
        }

        Ok(names)
    }

    fn names_of(&self, descriptors: Vec<DescriptorRef>) -> impl Iterator<Item = CompactString> + '_ {
        descriptors
            .into_iter()
            .map(|descriptor| CompactString::from(self.descriptor(descriptor).as_ref().name()))
    }

    fn member_names(
        &self,
        class: DescriptorRef,
        visited: &mut AHashSet<DescriptorRef>,
        names: &mut Vec<CompactString>,
    ) -> ResolveResult<()> {
        if !visited.insert(class) {
            return Ok(());
        }

        let lazy = self.descriptor(class);

        match lazy.as_ref().origin() {
            DescriptorOrigin::Source(element) => {
                let tree = self.tree();

                names.extend(
                    self.class_body_declarations(element)
                        .filter_map(|member| member.deref(tree)?.text.clone()),
                );
            }

            DescriptorOrigin::ForeignClass(fq_name) => {
                if let Some(foreign) = self.session.collaborators.loader.class(fq_name) {
                    names.extend(foreign.members.into_iter().map(|member| member.name));
                }
            }

            _ => (),
        }

        let supertypes = self.contents(class)?.as_ref().supertypes.clone();

        for supertype in supertypes {
            if let Ty::Class(supertype) = supertype {
                self.member_names(supertype, visited, names)?;
            }
        }

        Ok(())
    }

    fn package_names(&self, package: &FqName, names: &mut Vec<CompactString>) {
        let tree = self.tree();

        for file in self.session.packages.files(package) {
            let Some(file) = file.deref(tree) else {
                continue;
            };

            for declaration in &file.children {
                let Some(element) = declaration.deref(tree) else {
                    continue;
                };

                if let SyntaxKind::Class | SyntaxKind::Function | SyntaxKind::Property =
                    element.kind
                {
                    names.extend(element.text.clone());
                }
            }
        }

        names.extend(self.session.collaborators.loader.classes(package));
    }
}
