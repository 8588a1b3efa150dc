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

use crate::{
    analysis::{ForeignMemberKind, ResolveResult, BUILTINS_PACKAGE},
    report::system_panic,
    semantics::{
        binding::BindingDelta,
        body::BodyResolver,
        filter::StatementFilter,
        AnnotationDescriptor,
        DescriptorContents,
        DescriptorKind,
        DescriptorOrigin,
        DescriptorRef,
        DescriptorSeed,
        FlowFacts,
        FqName,
        LazyDescriptor,
        Reference,
        ResolutionScope,
        Resolver,
        Symbol,
        Ty,
    },
    syntax::{ElementRef, SyntaxKind},
};

// Computes descriptor contents from the declaration syntax or from the
// foreign symbol tables. Signature-level facts go to the returned delta,
// which the caller commits to the session-wide binding.
impl<'s, H: TaskHandle> Resolver<'s, H> {
    pub(super) fn compute_contents(&self, lazy: &LazyDescriptor) -> ResolveResult<BindingDelta> {
        let mut delta = BindingDelta::new();

        match lazy.origin() {
            DescriptorOrigin::Source(element) => {
                delta.record_descriptor(*element, lazy.reference());

                match lazy.kind() {
                    DescriptorKind::Class => self.compute_class(lazy, element, &mut delta)?,

                    DescriptorKind::Function => {
                        self.compute_function(lazy, element, &mut delta)?
                    }

                    DescriptorKind::Property => {
                        self.compute_property(lazy, element, &mut delta)?
                    }

                    DescriptorKind::Parameter => {
                        self.compute_parameter(lazy, element, &mut delta)?
                    }

                    DescriptorKind::TypeParameter => {
                        self.compute_type_parameter(lazy, element, &mut delta)?
                    }

                    DescriptorKind::Constructor => {
                        self.compute_secondary_constructor(lazy, element, &mut delta)?
                    }
                }
            }

            DescriptorOrigin::PrimaryConstructor(class) => {
                self.compute_primary_constructor(lazy, class, &mut delta)?
            }

            DescriptorOrigin::ForeignClass(name) => self.compute_foreign_class(lazy, name)?,

            DescriptorOrigin::ForeignMember { class, index } => {
                self.compute_foreign_member(lazy, class, *index)?
            }

            DescriptorOrigin::ForeignParameter {
                class,
                member,
                index,
            } => self.compute_foreign_parameter(lazy, class, *member, *index),
        }

        Ok(delta)
    }

    fn compute_class(
        &self,
        lazy: &LazyDescriptor,
        class: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(element) = class.deref(tree) else {
            system_panic!("Missing class {class}.");
        };

        let mut contents = DescriptorContents::default();

        contents.type_parameters = self.type_parameters_of(class);
        contents.primary_constructor = Some(self.primary_constructor(class));

        if let Some(body) = element.child_of(tree, SyntaxKind::ClassBody) {
            if let Some(body) = body.deref(tree) {
                contents.secondary_constructors = body
                    .children_of(tree, SyntaxKind::SecondaryConstructor)
                    .filter_map(|constructor| self.descriptor_for(&constructor))
                    .collect();
            }
        }

        lazy.publish(contents.clone());

        let header_scope = self.class_header_scope(class);

        if let Some(delegation) = element.child_of(tree, SyntaxKind::DelegationList) {
            for type_ref in self.supertype_refs(&delegation) {
                let ty = self.resolve_type_ref(&type_ref, &header_scope, delta)?;

                contents.supertypes.push(ty);
                lazy.publish(contents.clone());
            }
        }

        if contents.supertypes.is_empty() {
            let any = self.builtins()?.any;

            if any.is_resolved() {
                contents.supertypes.push(any);
            }
        }

        lazy.publish(contents.clone());

        contents.annotations = self.resolve_annotations(class, &self.outer_scope(class), delta)?;

        lazy.publish(contents);

        Ok(())
    }

    fn compute_primary_constructor(
        &self,
        lazy: &LazyDescriptor,
        class: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(element) = class.deref(tree) else {
            system_panic!("Missing class {class}.");
        };

        let mut contents = DescriptorContents::default();

        contents.ty = Some(Ty::Class(self.require_descriptor(class)));

        let constructor = element.child_of(tree, SyntaxKind::PrimaryConstructor);

        if let Some(constructor) = &constructor {
            delta.record_descriptor(*constructor, lazy.reference());

            if let Some(parameters) = constructor
                .deref(tree)
                .and_then(|constructor| {
                    constructor.child_of(tree, SyntaxKind::PrimaryConstructorParameterList)
                })
            {
                contents.parameters = self.parameters_in(&parameters);
            }
        }

        lazy.publish(contents.clone());

        if let Some(constructor) = &constructor {
            contents.annotations =
                self.resolve_annotations(constructor, &self.outer_scope(class), delta)?;
        }

        lazy.publish(contents);

        Ok(())
    }

    fn compute_secondary_constructor(
        &self,
        lazy: &LazyDescriptor,
        constructor: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(class) = tree.parent_of_kind(constructor, SyntaxKind::Class) else {
            system_panic!("Constructor {constructor} outside of class.");
        };

        let mut contents = DescriptorContents::default();

        contents.ty = Some(Ty::Class(self.require_descriptor(&class)));
        contents.parameters = self.parameter_list_of(constructor);

        lazy.publish(contents.clone());

        contents.annotations =
            self.resolve_annotations(constructor, &self.outer_scope(constructor), delta)?;

        lazy.publish(contents);

        Ok(())
    }

    fn compute_function(
        &self,
        lazy: &LazyDescriptor,
        function: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(element) = function.deref(tree) else {
            system_panic!("Missing function {function}.");
        };

        let mut contents = DescriptorContents::default();

        contents.type_parameters = self.type_parameters_of(function);
        contents.parameters = self.parameter_list_of(function);

        lazy.publish(contents.clone());

        let ty = match element.child_of(tree, SyntaxKind::TypeRef) {
            Some(type_ref) => {
                self.resolve_type_ref(&type_ref, &self.function_header_scope(function), delta)?
            }

            None => match element.child_of(tree, SyntaxKind::Block) {
                Some(_) => self.builtins()?.unit,

                None => match element.expression_child(tree) {
                    Some(body) => {
                        self.infer_type(&body, &self.function_body_scope(function), delta)?
                    }

                    None => self.builtins()?.unit,
                },
            },
        };

        contents.ty = Some(ty);

        lazy.publish(contents.clone());

        contents.annotations =
            self.resolve_annotations(function, &self.outer_scope(function), delta)?;

        lazy.publish(contents);

        Ok(())
    }

    fn compute_property(
        &self,
        lazy: &LazyDescriptor,
        property: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(element) = property.deref(tree) else {
            system_panic!("Missing property {property}.");
        };

        let mut contents = DescriptorContents::default();

        let ty = match element.child_of(tree, SyntaxKind::TypeRef) {
            Some(type_ref) => {
                self.resolve_type_ref(&type_ref, &self.outer_scope(property), delta)?
            }

            None => {
                let inferred_from = element.expression_child(tree).or_else(|| {
                    element
                        .child_of(tree, SyntaxKind::PropertyDelegate)
                        .and_then(|delegate| delegate.deref(tree)?.expression_child(tree))
                });

                match inferred_from {
                    Some(expression) => {
                        self.infer_type(&expression, &self.property_scope(property), delta)?
                    }

                    None => Ty::Unresolved,
                }
            }
        };

        contents.ty = Some(ty);

        lazy.publish(contents.clone());

        contents.annotations =
            self.resolve_annotations(property, &self.outer_scope(property), delta)?;

        lazy.publish(contents);

        Ok(())
    }

    fn compute_parameter(
        &self,
        lazy: &LazyDescriptor,
        parameter: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(element) = parameter.deref(tree) else {
            system_panic!("Missing parameter {parameter}.");
        };

        let mut contents = DescriptorContents::default();

        let outer = self.outer_scope(parameter);

        let ty = match element.child_of(tree, SyntaxKind::TypeRef) {
            Some(type_ref) => self.resolve_type_ref(&type_ref, &outer, delta)?,

            None => match tree.parent_of_kind(parameter, SyntaxKind::Accessor) {
                Some(accessor) => {
                    let property = accessor.parent(tree);

                    match self.descriptor_for(&property) {
                        Some(property) => self.contents(property)?.as_ref().ty.unwrap_or_default(),
                        None => Ty::Unresolved,
                    }
                }

                None => Ty::Unresolved,
            },
        };

        contents.ty = Some(ty);

        lazy.publish(contents.clone());

        contents.annotations = self.resolve_annotations(parameter, &outer, delta)?;

        lazy.publish(contents);

        Ok(())
    }

    fn compute_type_parameter(
        &self,
        lazy: &LazyDescriptor,
        parameter: &ElementRef,
        delta: &mut BindingDelta,
    ) -> ResolveResult<()> {
        let tree = self.tree();

        let Some(element) = parameter.deref(tree) else {
            system_panic!("Missing type parameter {parameter}.");
        };

        let mut contents = DescriptorContents::default();

        let outer = self.outer_scope(parameter);

        if let Some(bound) = element.child_of(tree, SyntaxKind::TypeRef) {
            contents.bounds.push(self.resolve_type_ref(&bound, &outer, delta)?);
            lazy.publish(contents.clone());
        }

        let owner = tree.ancestor(parameter, |kind| match kind {
            SyntaxKind::Class | SyntaxKind::Function => true,
            _ => false,
        });

        let constraints = owner
            .and_then(|owner| owner.deref(tree)?.child_of(tree, SyntaxKind::TypeConstraintList))
            .and_then(|list| list.deref(tree))
            .map(|list| list.children_of(tree, SyntaxKind::TypeConstraint).collect::<Vec<_>>())
            .unwrap_or_default();

        for constraint in constraints {
            let Some(constraint_element) = constraint.deref(tree) else {
                continue;
            };

            let Some(subject) = constraint_element.child_of(tree, SyntaxKind::NameRef) else {
                continue;
            };

            if subject.deref(tree).map(|subject| subject.text()) != Some(lazy.name()) {
                continue;
            }

            delta.record_reference(
                subject,
                Reference::Resolved(Symbol::Descriptor(lazy.reference())),
            );

            if let Some(bound) = constraint_element.child_of(tree, SyntaxKind::TypeRef) {
                contents.bounds.push(self.resolve_type_ref(&bound, &outer, delta)?);
                lazy.publish(contents.clone());
            }
        }

        if contents.bounds.is_empty() {
            let any = self.builtins()?.any;

            if any.is_resolved() {
                contents.bounds.push(any);
            }
        }

        lazy.publish(contents);

        Ok(())
    }

    fn compute_foreign_class(&self, lazy: &LazyDescriptor, name: &FqName) -> ResolveResult<()> {
        let Some(class) = self.session.collaborators.loader.class(name) else {
            system_panic!("Foreign class {name} disappeared from the loader.");
        };

        let mut contents = DescriptorContents::default();

        contents.supertypes = class
            .supertypes
            .iter()
            .map(|supertype| self.foreign_type(supertype))
            .collect();

        if contents.supertypes.is_empty() && !self.is_root_class(name) {
            let any = self.builtins()?.any;

            if any.is_resolved() {
                contents.supertypes.push(any);
            }
        }

        contents.annotations = class
            .annotations
            .iter()
            .map(|annotation| AnnotationDescriptor {
                entry: None,
                ty: self.foreign_type(annotation),
                arguments: Vec::new(),
            })
            .collect();

        lazy.publish(contents);

        Ok(())
    }

    fn compute_foreign_member(
        &self,
        lazy: &LazyDescriptor,
        class: &FqName,
        index: usize,
    ) -> ResolveResult<()> {
        let Some(member) = self
            .session
            .collaborators
            .loader
            .class(class)
            .and_then(|class| class.members.into_iter().nth(index))
        else {
            system_panic!("Foreign member {class}#{index} disappeared from the loader.");
        };

        let mut contents = DescriptorContents::default();

        contents.ty = Some(self.foreign_type(&member.ty));

        if let ForeignMemberKind::Function = member.kind {
            let storage = &self.session.collaborators.storage;

            contents.parameters = member
                .parameters
                .iter()
                .enumerate()
                .map(|(parameter, (name, _))| {
                    storage.create_lazy(DescriptorSeed {
                        origin: DescriptorOrigin::ForeignParameter {
                            class: class.clone(),
                            member: index,
                            index: parameter,
                        },
                        kind: DescriptorKind::Parameter,
                        name: name.clone(),
                        container: Some(lazy.reference()),
                    })
                })
                .collect();
        }

        lazy.publish(contents);

        Ok(())
    }

    fn compute_foreign_parameter(
        &self,
        lazy: &LazyDescriptor,
        class: &FqName,
        member: usize,
        index: usize,
    ) {
        let ty = self
            .session
            .collaborators
            .loader
            .class(class)
            .and_then(|class| class.members.into_iter().nth(member))
            .and_then(|member| member.parameters.into_iter().nth(index))
            .map(|(_, ty)| self.foreign_type(&ty))
            .unwrap_or_default();

        lazy.publish(DescriptorContents {
            ty: Some(ty),
            ..DescriptorContents::default()
        });
    }

    fn is_root_class(&self, name: &FqName) -> bool {
        name == &FqName::parse(BUILTINS_PACKAGE).child("Any")
    }

    fn type_parameters_of(&self, owner: &ElementRef) -> Vec<DescriptorRef> {
        let tree = self.tree();

        owner
            .deref(tree)
            .and_then(|owner| owner.child_of(tree, SyntaxKind::TypeParameterList))
            .and_then(|list| list.deref(tree))
            .map(|list| {
                list.children_of(tree, SyntaxKind::TypeParameter)
                    .filter_map(|parameter| self.descriptor_for(&parameter))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parameter_list_of(&self, owner: &ElementRef) -> Vec<DescriptorRef> {
        let tree = self.tree();

        owner
            .deref(tree)
            .and_then(|owner| owner.child_of(tree, SyntaxKind::ParameterList))
            .map(|list| self.parameters_in(&list))
            .unwrap_or_default()
    }

    fn parameters_in(&self, list: &ElementRef) -> Vec<DescriptorRef> {
        let tree = self.tree();

        list.deref(tree)
            .map(|list| {
                list.children_of(tree, SyntaxKind::Parameter)
                    .filter_map(|parameter| self.descriptor_for(&parameter))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn supertype_refs(&self, delegation: &ElementRef) -> Vec<ElementRef> {
        let tree = self.tree();

        let Some(delegation) = delegation.deref(tree) else {
            return Vec::new();
        };

        delegation
            .children
            .iter()
            .filter_map(|entry| match entry.kind(tree)? {
                SyntaxKind::TypeRef => Some(*entry),
                SyntaxKind::SuperTypeCall => entry.deref(tree)?.child_of(tree, SyntaxKind::TypeRef),
                _ => None,
            })
            .collect()
    }

    // Resolves annotation entries attached directly to the element.
    pub(crate) fn resolve_annotations(
        &self,
        owner: &ElementRef,
        scope: &ResolutionScope,
        delta: &mut BindingDelta,
    ) -> ResolveResult<Vec<AnnotationDescriptor>> {
        let tree = self.tree();

        let Some(owner) = owner.deref(tree) else {
            return Ok(Vec::new());
        };

        let entries = owner
            .children_of(tree, SyntaxKind::AnnotationEntry)
            .collect::<Vec<_>>();

        self.resolve_annotation_set(&entries, scope, delta)
    }

    pub(crate) fn resolve_annotation_set(
        &self,
        entries: &[ElementRef],
        scope: &ResolutionScope,
        delta: &mut BindingDelta,
    ) -> ResolveResult<Vec<AnnotationDescriptor>> {
        let tree = self.tree();
        let mut result = Vec::with_capacity(entries.len());

        for entry in entries {
            let Some(element) = entry.deref(tree) else {
                continue;
            };

            let ty = match element.child_of(tree, SyntaxKind::TypeRef) {
                Some(type_ref) => self.resolve_type_ref(&type_ref, scope, delta)?,
                None => Ty::Unresolved,
            };

            let mut arguments = Vec::new();

            if let Some(args) = element.child_of(tree, SyntaxKind::ValueArgs) {
                let filter = StatementFilter::full();
                let mut body = BodyResolver::new(self, &filter);

                let args = args
                    .deref(tree)
                    .map(|args| args.children.clone())
                    .unwrap_or_default();

                for argument in args {
                    let evaluated = body.resolve_expression(&argument, scope, &FlowFacts::new())?;

                    arguments.push(evaluated.ty);
                }

                delta.merge(body.finish());
            }

            let annotation = AnnotationDescriptor {
                entry: Some(*entry),
                ty,
                arguments,
            };

            delta.record_annotation(*entry, annotation.clone());

            result.push(annotation);
        }

        Ok(result)
    }

    fn infer_type(
        &self,
        expression: &ElementRef,
        scope: &ResolutionScope,
        delta: &mut BindingDelta,
    ) -> ResolveResult<Ty> {
        let filter = StatementFilter::full();
        let mut body = BodyResolver::new(self, &filter);

        let evaluated = body.resolve_expression(expression, scope, &FlowFacts::new())?;

        delta.merge(body.finish());

        Ok(evaluated.ty)
    }
}
