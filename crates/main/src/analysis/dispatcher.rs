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
    analysis::{classifier::log_unit, stitcher::ScopeStitcher, Declaration, ResolveResult},
    report::system_panic,
    semantics::{
        BindingDelta,
        BodyResolveMode,
        BodyResolver,
        DependencyForcer,
        DescriptorKind,
        DescriptorRef,
        FlowFacts,
        FqName,
        Reference,
        ResolutionScope,
        Resolver,
        SemanticBinding,
        StatementFilter,
        Symbol,
        Ty,
    },
    syntax::{ElementRef, SyntaxKind},
};

// Runs the resolution strategy of a unit and packs the produced facts into
// a binding overlay.
pub(crate) struct ResolutionDispatcher<'r, 's, H: TaskHandle> {
    resolver: &'r Resolver<'s, H>,
}

impl<'r, 's, H: TaskHandle> ResolutionDispatcher<'r, 's, H> {
    #[inline(always)]
    pub(crate) fn new(resolver: &'r Resolver<'s, H>) -> Self {
        Self { resolver }
    }

    pub(crate) fn resolve(
        &self,
        unit: &Declaration,
        target: &ElementRef,
        mode: BodyResolveMode,
    ) -> ResolveResult<SemanticBinding> {
        log_unit!(self.resolver.session, unit, mode);

        self.resolver.checkpoint()?;

        let filter = StatementFilter::new(self.resolver.tree(), mode, target);

        let delta = match unit {
            Declaration::Function(function) => self.resolve_function(function, &filter)?,
            Declaration::Property(property) => self.resolve_property(property, &filter)?,
            Declaration::Class(class) => self.resolve_class(class, &filter)?,

            Declaration::PrimaryConstructorParameterList(list) => {
                let Some(class) = self.resolver.tree().parent_of_kind(list, SyntaxKind::Class)
                else {
                    system_panic!("Primary constructor {list} outside of class.");
                };

                self.resolve_class(&class, &filter)?
            }

            Declaration::ClassInitializer(initializer) => {
                self.resolve_class_initializer(initializer, &filter)?
            }

            Declaration::SecondaryConstructor(constructor) => {
                self.resolve_secondary_constructor(constructor, &filter)?
            }

            Declaration::DelegationList(list) => self.resolve_delegation_list(list, &filter)?,
            Declaration::ImportDirective(directive) => self.resolve_imports(directive)?,
            Declaration::AnnotationEntry(entry) => self.resolve_annotation_entry(entry)?,

            Declaration::TypeParameter(element) | Declaration::TypeConstraint(element) => {
                self.resolve_type_parameters(element)?
            }

            Declaration::PackageDirective(element) => self.resolve_package_directive(element),

            Declaration::CodeFragment(fragment) => {
                self.resolve_code_fragment(fragment, mode, &filter)?
            }
        };

        let binding = SemanticBinding::new(self.resolver.session.global.clone(), delta);

        self.resolver
            .session
            .collaborators
            .flow_checker
            .check_declaration(unit, &binding);

        Ok(binding)
    }

    fn resolve_function(
        &self,
        function: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();
        let descriptor = self.force_declaration(function)?;

        let Some(element) = function.deref(tree) else {
            system_panic!("Missing function {function}.");
        };

        let scope = self.resolver.function_body_scope(function);
        let mut body = BodyResolver::new(self.resolver, filter);

        if let Some(parameters) = element.child_of(tree, SyntaxKind::ParameterList) {
            self.resolve_default_values(&parameters, &scope, &mut body)?;
        }

        if let Some(block) = element.expression_child(tree) {
            self.resolver.checkpoint()?;

            let _ = body.resolve_body(&block, &scope, &FlowFacts::new())?;
        }

        let mut delta = body.finish();

        delta.record_descriptor(*function, descriptor);

        Ok(delta)
    }

    fn resolve_property(
        &self,
        property: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();
        let descriptor = self.force_declaration(property)?;

        let Some(element) = property.deref(tree) else {
            system_panic!("Missing property {property}.");
        };

        let scope = self.resolver.property_scope(property);
        let mut body = BodyResolver::new(self.resolver, filter);

        if let Some(initializer) = element.expression_child(tree) {
            let _ = body.resolve_expression(&initializer, &scope, &FlowFacts::new())?;
        }

        if let Some(delegate) = element.child_of(tree, SyntaxKind::PropertyDelegate) {
            let expression = delegate
                .deref(tree)
                .and_then(|delegate| delegate.expression_child(tree));

            if let Some(expression) = expression {
                let _ = body.resolve_expression(&expression, &scope, &FlowFacts::new())?;
            }
        }

        for accessor in element.children_of(tree, SyntaxKind::Accessor) {
            self.resolver.checkpoint()?;

            let Some(accessor_body) = accessor
                .deref(tree)
                .and_then(|accessor| accessor.expression_child(tree))
            else {
                continue;
            };

            let scope = self.resolver.accessor_scope(&accessor);

            let _ = body.resolve_body(&accessor_body, &scope, &FlowFacts::new())?;
        }

        let mut delta = body.finish();

        delta.record_descriptor(*property, descriptor);

        Ok(delta)
    }

    fn resolve_class(
        &self,
        class: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();
        let descriptor = self.force_declaration(class)?;

        let Some(element) = class.deref(tree) else {
            system_panic!("Missing class {class}.");
        };

        let Some(constructor) = self.resolver.contents(descriptor)?.as_ref().primary_constructor
        else {
            system_panic!("Class {class} without primary constructor.");
        };

        let _ = self.resolver.force(constructor)?;

        let mut body = BodyResolver::new(self.resolver, filter);

        let parameters = element
            .child_of(tree, SyntaxKind::PrimaryConstructor)
            .and_then(|constructor| constructor.deref(tree))
            .and_then(|constructor| {
                constructor.child_of(tree, SyntaxKind::PrimaryConstructorParameterList)
            });

        if let Some(parameters) = parameters {
            let scope = self.resolver.class_header_scope(class);

            self.resolve_default_values(&parameters, &scope, &mut body)?;
        }

        let mut delta = body.finish();

        if let Some(delegation) = element.child_of(tree, SyntaxKind::DelegationList) {
            delta.merge(self.resolve_delegation_calls(class, &delegation, filter)?);
        }

        delta.record_descriptor(*class, descriptor);

        Ok(delta)
    }

    fn resolve_delegation_list(
        &self,
        list: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let Some(class) = self.resolver.tree().parent_of_kind(list, SyntaxKind::Class) else {
            system_panic!("Delegation list {list} outside of class.");
        };

        let _ = self.force_declaration(&class)?;

        self.resolve_delegation_calls(&class, list, filter)
    }

    // Forces the supertypes, and resolves the super constructor calls of the
    // delegation list against the primary constructor scope.
    fn resolve_delegation_calls(
        &self,
        class: &ElementRef,
        list: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();
        let descriptor = self.resolver.require_descriptor(class);

        let supertypes = self.resolver.contents(descriptor)?.as_ref().supertypes.clone();

        DependencyForcer::new(self.resolver).force_types(&supertypes)?;

        let header_scope = self.resolver.class_header_scope(class);
        let arguments_scope = self.resolver.class_initializer_scope(class);

        let mut delta = BindingDelta::new();

        let Some(list_element) = list.deref(tree) else {
            return Ok(delta);
        };

        for call in list_element.children_of(tree, SyntaxKind::SuperTypeCall) {
            self.resolver.checkpoint()?;

            let Some(call_element) = call.deref(tree) else {
                continue;
            };

            let supertype = match call_element.child_of(tree, SyntaxKind::TypeRef) {
                Some(type_ref) => {
                    self.resolver
                        .resolve_type_ref(&type_ref, &header_scope, &mut delta)?
                }

                None => Ty::Unresolved,
            };

            let mut body = BodyResolver::new(self.resolver, filter);
            let mut facts = FlowFacts::new();
            let mut arity = 0;

            if let Some(arguments) = call_element.child_of(tree, SyntaxKind::ValueArgs) {
                let arguments = arguments
                    .deref(tree)
                    .map(|arguments| arguments.children.clone())
                    .unwrap_or_default();

                for argument in &arguments {
                    facts = body.resolve_expression(argument, &arguments_scope, &facts)?.facts;
                    arity += 1;
                }
            }

            delta.merge(body.finish());

            let constructors = match supertype {
                Ty::Class(supertype) => {
                    let contents = self.resolver.contents(supertype)?;

                    contents
                        .as_ref()
                        .primary_constructor
                        .iter()
                        .chain(contents.as_ref().secondary_constructors.iter())
                        .copied()
                        .collect::<Vec<_>>()
                }

                _ => Vec::new(),
            };

            let mut matching = Vec::new();

            for constructor in constructors {
                if self.resolver.contents(constructor)?.as_ref().parameters.len() == arity {
                    matching.push(Symbol::Descriptor(constructor));
                }
            }

            let reference =
                self.resolver
                    .reference_of(matching, &ResolutionScope::empty(), "<init>")?;

            delta.record_delegation_call(call, reference);
        }

        Ok(delta)
    }

    fn resolve_class_initializer(
        &self,
        initializer: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();

        let Some(class) = tree.parent_of_kind(initializer, SyntaxKind::Class) else {
            system_panic!("Initializer {initializer} outside of class.");
        };

        let _ = self.force_declaration(&class)?;

        let mut body = BodyResolver::new(self.resolver, filter);

        let block = initializer
            .deref(tree)
            .and_then(|initializer| initializer.child_of(tree, SyntaxKind::Block));

        if let Some(block) = block {
            let scope = self.resolver.class_initializer_scope(&class);

            let _ = body.resolve_block(&block, &scope, &FlowFacts::new())?;
        }

        Ok(body.finish())
    }

    fn resolve_secondary_constructor(
        &self,
        constructor: &ElementRef,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();
        let descriptor = self.force_declaration(constructor)?;

        let Some(element) = constructor.deref(tree) else {
            system_panic!("Missing constructor {constructor}.");
        };

        let scope = self.resolver.constructor_body_scope(constructor);
        let mut body = BodyResolver::new(self.resolver, filter);

        if let Some(parameters) = element.child_of(tree, SyntaxKind::ParameterList) {
            self.resolve_default_values(&parameters, &scope, &mut body)?;
        }

        if let Some(block) = element.child_of(tree, SyntaxKind::Block) {
            let _ = body.resolve_block(&block, &scope, &FlowFacts::new())?;
        }

        let mut delta = body.finish();

        delta.record_descriptor(*constructor, descriptor);

        Ok(delta)
    }

    // All imports of the file or the fragment are resolved together.
    fn resolve_imports(&self, directive: &ElementRef) -> ResolveResult<BindingDelta> {
        let root = self.resolver.tree().root_of(directive);
        let imports = self.resolver.file_imports(&root)?;

        Ok(imports.as_ref().delta.clone())
    }

    fn resolve_annotation_entry(&self, entry: &ElementRef) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();
        let owner = entry.parent(tree);

        let Some(owner_element) = owner.deref(tree) else {
            system_panic!("Annotation entry {entry} without owner.");
        };

        let mut delta = BindingDelta::new();

        match owner_element.kind {
            SyntaxKind::LocalVariable => {
                let scope = self.local_variable_scope(&owner)?;

                let _ = self.resolver.resolve_annotations(&owner, &scope, &mut delta)?;
            }

            kind if kind.is_declaration() => {
                let _ = self.force_declaration(&owner)?;

                let scope = self.resolver.outer_scope(&owner);

                let _ = self.resolver.resolve_annotations(&owner, &scope, &mut delta)?;
            }

            SyntaxKind::PrimaryConstructor => {
                let class = owner_element.parent;

                let _ = self.resolver.force(self.resolver.primary_constructor(&class))?;

                let scope = self.resolver.outer_scope(&class);

                let _ = self.resolver.resolve_annotations(&owner, &scope, &mut delta)?;
            }

            SyntaxKind::ClassBody => {
                let scope = self.resolver.class_member_scope(&owner_element.parent);

                let _ = self.resolver.resolve_annotations(&owner, &scope, &mut delta)?;
            }

            _ => {
                let scope = self.resolver.file_scope(&tree.root_of(&owner));

                let _ = self.resolver.resolve_annotations(&owner, &scope, &mut delta)?;
            }
        }

        Ok(delta)
    }

    // The scope a local variable is declared in: the enclosing body's scope
    // with the parameters and the preceding locals.
    fn local_variable_scope(&self, variable: &ElementRef) -> ResolveResult<ResolutionScope> {
        let binding = self.resolver.session.resolve_with(
            self.resolver,
            variable,
            BodyResolveMode::PartialForContext,
        )?;

        match binding.resolution_scope(variable) {
            Some(scope) => Ok(scope),
            None => Ok(self.resolver.file_scope(&self.resolver.tree().root_of(variable))),
        }
    }

    // Forces the type parameters of the owner with their bounds. Constraints
    // with subjects that do not name a type parameter are resolved here.
    fn resolve_type_parameters(&self, element: &ElementRef) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();

        let Some(owner) = tree.ancestor(element, |kind| match kind {
            SyntaxKind::Class | SyntaxKind::Function => true,
            _ => false,
        }) else {
            system_panic!("Type parameter {element} without owner.");
        };

        let descriptor = self.force_declaration(&owner)?;

        let type_parameters = self.resolver.contents(descriptor)?.as_ref().type_parameters.clone();

        let forcer = DependencyForcer::new(self.resolver);

        for type_parameter in &type_parameters {
            let _ = forcer.force_all(*type_parameter)?;
        }

        let mut delta = BindingDelta::new();

        let constraints = owner
            .deref(tree)
            .and_then(|owner| owner.child_of(tree, SyntaxKind::TypeConstraintList))
            .and_then(|list| list.deref(tree))
            .map(|list| list.children_of(tree, SyntaxKind::TypeConstraint).collect::<Vec<_>>())
            .unwrap_or_default();

        let scope = match self.resolver.kind_of(descriptor) {
            DescriptorKind::Class => self.resolver.class_header_scope(&owner),
            _ => self.resolver.function_header_scope(&owner),
        };

        for constraint in constraints {
            let Some(constraint_element) = constraint.deref(tree) else {
                continue;
            };

            let Some(subject) = constraint_element.child_of(tree, SyntaxKind::NameRef) else {
                continue;
            };

            let name = subject.deref(tree).map(|subject| subject.text()).unwrap_or_default();

            let matches = type_parameters
                .iter()
                .any(|parameter| self.resolver.descriptor(*parameter).as_ref().name() == name);

            if matches {
                continue;
            }

            let reference = self.resolver.reference_of(Vec::new(), &scope, name)?;

            delta.record_reference(subject, reference);

            if let Some(bound) = constraint_element.child_of(tree, SyntaxKind::TypeRef) {
                let _ = self.resolver.resolve_type_ref(&bound, &scope, &mut delta)?;
            }
        }

        Ok(delta)
    }

    // Records the qualifier chain up to the element: every segment refers to
    // a package, and is resolved in its qualifier's package scope.
    fn resolve_package_directive(&self, element: &ElementRef) -> BindingDelta {
        let tree = self.resolver.tree();
        let mut delta = BindingDelta::new();

        let directive = match element.kind(tree) {
            Some(SyntaxKind::PackageDirective) => *element,

            _ => match tree.parent_of_kind(element, SyntaxKind::PackageDirective) {
                Some(directive) => directive,
                None => return delta,
            },
        };

        let Some(directive_element) = directive.deref(tree) else {
            return delta;
        };

        let mut package = FqName::root();

        for segment in directive_element.children_of(tree, SyntaxKind::NameRef) {
            let qualifier = Symbol::Package(package.clone());

            let name = segment.deref(tree).map(|segment| segment.text()).unwrap_or_default();

            package = package.child(name);

            delta.record_scope(segment, &self.resolver.qualifier_scope(&qualifier));
            delta.record_reference(segment, Reference::Resolved(Symbol::Package(package.clone())));

            if &segment == element {
                break;
            }
        }

        delta
    }

    fn resolve_code_fragment(
        &self,
        fragment: &ElementRef,
        mode: BodyResolveMode,
        filter: &StatementFilter,
    ) -> ResolveResult<BindingDelta> {
        let tree = self.resolver.tree();

        let Some(stitched) = ScopeStitcher::new(self.resolver).stitch(fragment, mode)? else {
            return Ok(BindingDelta::new());
        };

        let mut delta = self.resolver.file_imports(fragment)?.as_ref().delta.clone();

        let expression = fragment
            .deref(tree)
            .and_then(|fragment| fragment.expression_child(tree));

        if let Some(expression) = expression {
            let mut body = BodyResolver::new(self.resolver, filter);

            let _ = body.resolve_expression(&expression, &stitched.scope, &stitched.facts)?;

            delta.merge(body.finish());
        }

        Ok(delta)
    }

    fn resolve_default_values(
        &self,
        parameters: &ElementRef,
        scope: &ResolutionScope,
        body: &mut BodyResolver<'_, 's, H>,
    ) -> ResolveResult<()> {
        let tree = self.resolver.tree();

        let Some(parameters) = parameters.deref(tree) else {
            return Ok(());
        };

        for parameter in parameters.children_of(tree, SyntaxKind::Parameter) {
            let Some(value) = parameter
                .deref(tree)
                .and_then(|parameter| parameter.expression_child(tree))
            else {
                continue;
            };

            let _ = body.resolve_expression(&value, scope, &FlowFacts::new())?;
        }

        Ok(())
    }

    #[inline(always)]
    fn force_declaration(&self, declaration: &ElementRef) -> ResolveResult<DescriptorRef> {
        let descriptor = self.resolver.require_descriptor(declaration);

        let _ = self.resolver.force(descriptor)?;

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use lady_deirdre::analysis::{TaskHandle, TriggerHandle};

    use crate::{
        analysis::{
            Collaborators,
            Declaration,
            FlowChecker,
            ResolveConfig,
            ResolveError,
            ResolveSession,
        },
        semantics::{
            BodyResolveMode,
            FqName,
            Reference,
            ResolutionScope,
            ScopeLayer,
            SemanticBinding,
            Symbol,
        },
        syntax::{
            fixtures::{classifier_tree, five_statements},
            SyntaxKind,
            TreeBuilder,
        },
    };

    struct CountingChecker(Arc<AtomicUsize>);

    impl FlowChecker for CountingChecker {
        fn check_declaration(&self, _unit: &Declaration, _binding: &SemanticBinding) {
            let _ = self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_package_directive() {
        let fixture = classifier_tree();
        let segment = fixture.package_segment;

        let session = ResolveSession::new(fixture.tree, ResolveConfig::new(), Collaborators::new());

        let binding = session
            .resolve_to_element(&segment, BodyResolveMode::Full, &TriggerHandle::new())
            .unwrap();

        assert_eq!(
            binding.reference(&segment),
            Some(Reference::Resolved(Symbol::Package(FqName::parse("app")))),
        );

        assert_eq!(
            binding.resolution_scope(&segment),
            Some(ResolutionScope::new(vec![ScopeLayer::RootPackages])),
        );
    }

    #[test]
    fn test_class_header() {
        let fixture = classifier_tree();
        let argument = fixture.super_call_argument;
        let annotation_name = fixture.annotation_name;

        let session = ResolveSession::new(fixture.tree, ResolveConfig::new(), Collaborators::new());
        let handle = TriggerHandle::new();

        let binding = session
            .resolve_to_element(&fixture.constructor_parameter, BodyResolveMode::Full, &handle)
            .unwrap();

        assert!(binding.expression_type(&argument).unwrap().is_resolved());

        let call = session.tree().ancestor(&argument, |kind| kind == SyntaxKind::SuperTypeCall);

        assert!(matches!(
            binding.delegation_call(&call.unwrap()),
            Some(Reference::Unresolved { .. }),
        ));

        let binding = session
            .resolve_to_element(&annotation_name, BodyResolveMode::Full, &handle)
            .unwrap();

        let Some(Reference::Unresolved { name, .. }) = binding.reference(&annotation_name) else {
            panic!("Unresolved reference expected.");
        };

        assert_eq!(name, "Deprecated");
    }

    #[test]
    fn test_name_suggestions() {
        let mut builder = TreeBuilder::new();

        builder.start(SyntaxKind::File);
        builder.start_named(SyntaxKind::Function, "main");
        builder.empty_leaf(SyntaxKind::ParameterList);
        builder.start(SyntaxKind::Block);
        builder.start_named(SyntaxKind::LocalVariable, "count");
        builder.leaf(SyntaxKind::IntLiteral, "1");
        builder.finish();
        let typo = builder.leaf(SyntaxKind::NameRef, "conut");
        builder.finish();
        builder.finish();
        builder.finish();

        let session = ResolveSession::new(builder.build(), ResolveConfig::new(), Collaborators::new());

        let binding = session
            .resolve_to_element(&typo, BodyResolveMode::PartialForCompletion, &TriggerHandle::new())
            .unwrap();

        let Some(Reference::Unresolved { name, suggestions }) = binding.reference(&typo) else {
            panic!("Unresolved reference expected.");
        };

        assert_eq!(name, "conut");
        assert_eq!(suggestions.first().map(|name| name.as_str()), Some("count"));
    }

    #[test]
    fn test_local_annotation_scope() {
        let mut builder = TreeBuilder::new();

        builder.start(SyntaxKind::File);
        builder.start_named(SyntaxKind::Function, "f");
        builder.start(SyntaxKind::ParameterList);
        let parameter = builder.start_named(SyntaxKind::Parameter, "x");
        builder.leaf(SyntaxKind::TypeRef, "Int");
        builder.finish();
        builder.finish();
        builder.start(SyntaxKind::Block);
        let z_declaration = builder.start_named(SyntaxKind::LocalVariable, "z");
        builder.leaf(SyntaxKind::IntLiteral, "1");
        builder.finish();
        builder.start_named(SyntaxKind::LocalVariable, "y");
        builder.start(SyntaxKind::AnnotationEntry);
        builder.leaf(SyntaxKind::TypeRef, "Tag");
        builder.start(SyntaxKind::ValueArgs);
        let x_use = builder.leaf(SyntaxKind::NameRef, "x");
        let z_use = builder.leaf(SyntaxKind::NameRef, "z");
        builder.finish();
        builder.finish();
        builder.leaf(SyntaxKind::IntLiteral, "2");
        builder.finish();
        builder.finish();
        builder.finish();
        builder.finish();

        let session = ResolveSession::new(builder.build(), ResolveConfig::new(), Collaborators::new());
        let handle = TriggerHandle::new();

        let binding = session
            .resolve_to_element(&x_use, BodyResolveMode::Full, &handle)
            .unwrap();

        let parameter = session
            .resolve_to_descriptor(&parameter, &handle)
            .unwrap()
            .expect("Missing parameter descriptor.");

        assert_eq!(
            binding.reference(&x_use),
            Some(Reference::Resolved(Symbol::Descriptor(parameter))),
        );

        let Some(Reference::Resolved(Symbol::Local { declaration, .. })) =
            binding.reference(&z_use)
        else {
            panic!("Local variable reference expected.");
        };

        assert_eq!(declaration, z_declaration);
    }

    #[test]
    fn test_ambiguous_call() {
        let mut builder = TreeBuilder::new();

        builder.start(SyntaxKind::File);

        let mut overloads = Vec::new();

        for _ in 0..2 {
            overloads.push(builder.start_named(SyntaxKind::Function, "g"));
            builder.empty_leaf(SyntaxKind::ParameterList);
            builder.empty_leaf(SyntaxKind::Block);
            builder.finish();
        }

        builder.start_named(SyntaxKind::Function, "main");
        builder.empty_leaf(SyntaxKind::ParameterList);
        builder.start(SyntaxKind::Block);
        builder.start(SyntaxKind::Call);
        let callee = builder.leaf(SyntaxKind::NameRef, "g");
        builder.empty_leaf(SyntaxKind::ValueArgs);
        builder.finish();
        builder.finish();
        builder.finish();

        builder.finish();

        let session = ResolveSession::new(builder.build(), ResolveConfig::new(), Collaborators::new());
        let handle = TriggerHandle::new();

        let binding = session
            .resolve_to_element(&callee, BodyResolveMode::Full, &handle)
            .unwrap();

        let Some(Reference::Ambiguous(candidates)) = binding.reference(&callee) else {
            panic!("Ambiguous reference expected.");
        };

        let mut expected = overloads
            .iter()
            .map(|overload| {
                Symbol::Descriptor(
                    session
                        .resolve_to_descriptor(overload, &handle)
                        .unwrap()
                        .expect("Missing function descriptor."),
                )
            })
            .collect::<Vec<_>>();

        expected.sort();

        assert_eq!(candidates, expected);
    }

    #[test]
    fn test_flow_checker_calls() {
        let fixture = five_statements();
        let target = fixture.statements[2];
        let calls = Arc::new(AtomicUsize::new(0));

        let mut collaborators = Collaborators::new();

        collaborators.flow_checker = Box::new(CountingChecker(calls.clone()));

        let mut config = ResolveConfig::new();

        config.cache_full_bindings = false;

        let session = ResolveSession::new(fixture.tree, config, collaborators);

        let cancelled = TriggerHandle::new();

        cancelled.trigger();

        assert_eq!(
            session.element_additional_resolve(&target, &cancelled).unwrap_err(),
            ResolveError::Interrupted(session.id),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let handle = TriggerHandle::new();

        let _ = session.element_additional_resolve(&target, &handle).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let _ = session
            .resolve_to_element(&target, BodyResolveMode::PartialForContext, &handle)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
