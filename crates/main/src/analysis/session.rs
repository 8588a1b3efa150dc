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

use std::{
    fmt::{Debug, Display, Formatter},
    sync::Mutex,
    thread::ThreadId,
};

use ahash::{AHashMap, RandomState};
use lady_deirdre::{
    analysis::TaskHandle,
    arena::{Id, Identifiable},
    sync::{Shared, Table},
};
use log::trace;

use crate::{
    analysis::{
        dispatcher::ResolutionDispatcher,
        Collaborators,
        ElementClassifier,
        ResolveConfig,
        ResolveError,
        ResolveResult,
    },
    semantics::{
        BodyResolveMode,
        DependencyForcer,
        DescriptorContents,
        DescriptorRef,
        FileImports,
        ForceState,
        GlobalBinding,
        LazyDescriptor,
        PackageIndex,
        Resolver,
        SemanticBinding,
        RESOLVE_LOG,
    },
    syntax::{ElementRef, SyntaxTree},
};

/// An on-demand semantic resolution session over a single [SyntaxTree].
///
/// The session answers queries about the elements of the tree: what a name
/// refers to, which names are visible at an element, what type an
/// expression has, and which flow facts hold at a statement. Each query
/// resolves the smallest enclosing unit (a declaration, an import directive,
/// a code fragment, etc.) that determines the requested facts, and returns a
/// [SemanticBinding] with the results.
///
/// Declarations are turned into [descriptors](LazyDescriptor) lazily. A
/// descriptor is computed ("forced") at most once per session, and the
/// signature-level facts produced by forcing become visible to all
/// subsequent queries.
///
/// ## Concurrency
///
/// The session is `Send + Sync`. Queries may run from multiple threads
/// simultaneously. If two threads need the same descriptor, one of them
/// computes it and the other one waits. Dependency cycles, including the
/// cycles that span several threads, are broken by returning a partially
/// computed view of the descriptor on the cycle.
///
/// ## Cancellation
///
/// Every query function accepts a [TaskHandle]. When the handle is
/// triggered, the query returns [ResolveError::Interrupted] as soon as
/// possible. An interrupted query does not leave any traces in the session's
/// caches.
///
/// ```rust
/// use ad_astra_resolve::{
///     analysis::{Collaborators, ResolveConfig, ResolveSession},
///     lady_deirdre::analysis::TriggerHandle,
///     semantics::BodyResolveMode,
///     syntax::{SyntaxKind, TreeBuilder},
/// };
///
/// let mut builder = TreeBuilder::new();
///
/// builder.start(SyntaxKind::File);
/// builder.start_named(SyntaxKind::Function, "answer");
/// builder.empty_leaf(SyntaxKind::ParameterList);
/// let body = builder.leaf(SyntaxKind::IntLiteral, "42");
/// builder.finish();
/// builder.finish();
///
/// let session = ResolveSession::new(
///     builder.build(),
///     ResolveConfig::new(),
///     Collaborators::new(),
/// );
///
/// let handle = TriggerHandle::new();
///
/// let binding = session
///     .resolve_to_element(&body, BodyResolveMode::Full, &handle)
///     .unwrap();
///
/// assert!(binding.expression_type(&body).unwrap().is_resolved());
/// ```
pub struct ResolveSession {
    pub(crate) id: Id,
    pub(crate) tree: Shared<SyntaxTree>,
    pub(crate) config: ResolveConfig,
    pub(crate) collaborators: Collaborators,
    pub(crate) global: Shared<GlobalBinding>,
    pub(crate) waits: Mutex<AHashMap<ThreadId, DescriptorRef>>,
    pub(crate) imports: Table<ElementRef, Shared<FileImports>, RandomState>,
    pub(crate) packages: PackageIndex,
}

impl Debug for ResolveSession {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResolveSession")
            .field("id", &self.id)
            .field("tree", self.tree.as_ref())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Display for ResolveSession {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("ResolveSession({})", self.id))
    }
}

impl Identifiable for ResolveSession {
    #[inline(always)]
    fn id(&self) -> Id {
        self.id
    }
}

impl ResolveSession {
    /// Creates a session over the `tree`.
    ///
    /// The constructor scans the tree's package directives and the packages
    /// of the foreign symbol loader, but does not resolve anything.
    pub fn new(tree: SyntaxTree, config: ResolveConfig, collaborators: Collaborators) -> Self {
        let packages = PackageIndex::new(&tree, collaborators.loader.as_ref());

        Self {
            id: Id::new(),
            tree: Shared::new(tree),
            config,
            collaborators,
            global: Shared::new(GlobalBinding::new()),
            waits: Mutex::new(AHashMap::new()),
            imports: Table::new(),
            packages,
        }
    }

    /// Returns the syntax tree of this session.
    #[inline(always)]
    pub fn tree(&self) -> &SyntaxTree {
        self.tree.as_ref()
    }

    /// Returns the configuration this session was created with.
    #[inline(always)]
    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolves the unit of the `element` in the
    /// [Full](BodyResolveMode::Full) mode.
    ///
    /// If the [ResolveConfig::cache_full_bindings] option is enabled, the
    /// resulting binding is memoized per unit: subsequent calls for any
    /// element of the same unit return the same binding without re-analysis.
    #[inline(always)]
    pub fn element_additional_resolve(
        &self,
        element: &ElementRef,
        handle: &impl TaskHandle,
    ) -> ResolveResult<SemanticBinding> {
        self.resolve_to_element(element, BodyResolveMode::Full, handle)
    }

    /// Resolves the unit of the `element` in the specified `mode`.
    ///
    /// Partial modes analyze only the part of the unit that determines the
    /// facts at the `element`. If a Full binding of the unit has been
    /// memoized already, the function returns it regardless of the mode.
    ///
    /// If the element does not belong to any unit (for example, it is a file
    /// root), the function forces the nearest enclosing declaration, if any,
    /// and returns a binding with the session-wide facts only.
    ///
    /// Returns a [Cursor](ResolveError::Cursor) error if the element is nil
    /// or belongs to another tree.
    pub fn resolve_to_element(
        &self,
        element: &ElementRef,
        mode: BodyResolveMode,
        handle: &impl TaskHandle,
    ) -> ResolveResult<SemanticBinding> {
        let resolver = Resolver::new(self, handle);

        self.resolve_with(&resolver, element, mode)
    }

    /// Returns the descriptor of the declaration `element` with all of its
    /// parts forced: annotations, type parameters, parameters, constructors,
    /// supertypes and the declared type.
    ///
    /// Returns None if the element is not a declaration that has a
    /// descriptor (for example, a local variable or an expression).
    pub fn resolve_to_descriptor(
        &self,
        element: &ElementRef,
        handle: &impl TaskHandle,
    ) -> ResolveResult<Option<DescriptorRef>> {
        self.check_cursor(element)?;

        let resolver = Resolver::new(self, handle);

        let Some(descriptor) = resolver.descriptor_for(element) else {
            return Ok(None);
        };

        let _ = DependencyForcer::new(&resolver).force_all(descriptor)?;

        Ok(Some(descriptor))
    }

    /// Returns the descriptor by reference.
    #[inline(always)]
    pub fn descriptor(&self, descriptor: DescriptorRef) -> Option<Shared<LazyDescriptor>> {
        self.collaborators.storage.get(descriptor)
    }

    /// Returns the current snapshot of the descriptor contents without
    /// forcing the descriptor.
    ///
    /// The snapshot of an [Unforced](ForceState::Unforced) descriptor is
    /// empty.
    #[inline(always)]
    pub fn contents(&self, descriptor: DescriptorRef) -> Option<Shared<DescriptorContents>> {
        Some(self.descriptor(descriptor)?.as_ref().contents())
    }

    #[inline(always)]
    pub fn force_state(&self, descriptor: DescriptorRef) -> Option<ForceState> {
        Some(self.descriptor(descriptor)?.as_ref().state())
    }

    pub(crate) fn resolve_with<H: TaskHandle>(
        &self,
        resolver: &Resolver<'_, H>,
        element: &ElementRef,
        mode: BodyResolveMode,
    ) -> ResolveResult<SemanticBinding> {
        self.check_cursor(element)?;

        let Some(unit) = ElementClassifier::new(self.tree()).try_classify(element) else {
            return self.resolve_signature(resolver, element);
        };

        let key = unit.element();
        let storage = &self.collaborators.storage;

        if self.config.cache_full_bindings {
            if let Some(binding) = storage.cached_binding(&key) {
                trace!(
                    target: RESOLVE_LOG,
                    "[{}] {unit} served from the full binding cache.",
                    self.id,
                );

                return Ok(binding);
            }
        }

        let binding = ResolutionDispatcher::new(resolver).resolve(&unit, element, mode)?;

        if mode != BodyResolveMode::Full || !self.config.cache_full_bindings {
            return Ok(binding);
        }

        storage.put_binding(key, binding.clone());

        // Another thread could store its binding first.
        match storage.cached_binding(&key) {
            Some(stored) => Ok(stored),
            None => Ok(binding),
        }
    }

    fn resolve_signature<H: TaskHandle>(
        &self,
        resolver: &Resolver<'_, H>,
        element: &ElementRef,
    ) -> ResolveResult<SemanticBinding> {
        let tree = self.tree();
        let mut current = *element;

        while !current.is_nil() {
            if let Some(descriptor) = resolver.descriptor_for(&current) {
                let _ = resolver.force(descriptor)?;
                break;
            }

            current = current.parent(tree);
        }

        Ok(SemanticBinding::global_view(self.global.clone()))
    }

    #[inline(always)]
    fn check_cursor(&self, element: &ElementRef) -> ResolveResult<()> {
        match self.tree().contains(element) {
            true => Ok(()),
            false => Err(ResolveError::Cursor(self.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use lady_deirdre::analysis::{TaskHandle, TriggerHandle};

    use crate::{
        analysis::{
            Collaborators,
            ForeignClass,
            ForeignLibrary,
            ResolveConfig,
            ResolveError,
            ResolveSession,
        },
        semantics::{BodyResolveMode, ForceState, FqName, Reference, Symbol, Ty},
        syntax::{
            fixtures::{block_fragment, five_statements, mutual_supertypes, three_imports},
            SyntaxTree,
        },
    };

    fn session(tree: SyntaxTree) -> ResolveSession {
        ResolveSession::new(tree, ResolveConfig::new(), Collaborators::new())
    }

    #[test]
    fn test_resolve_idempotence() {
        let fixture = five_statements();
        let target = fixture.statements[2];

        let mut config = ResolveConfig::new();

        config.cache_full_bindings = false;

        let first_session =
            ResolveSession::new(fixture.tree.clone(), config.clone(), Collaborators::new());
        let second_session = ResolveSession::new(fixture.tree, config, Collaborators::new());
        let handle = TriggerHandle::new();

        let first = first_session.element_additional_resolve(&target, &handle).unwrap();
        let repeated = first_session.element_additional_resolve(&target, &handle).unwrap();
        let second = second_session.element_additional_resolve(&target, &handle).unwrap();

        let mut keys = first.keys();

        keys.sort();

        assert!(!keys.is_empty());

        for other in [&repeated, &second] {
            let mut other_keys = other.keys();

            other_keys.sort();

            assert_eq!(keys, other_keys);

            for key in &keys {
                assert_eq!(
                    first.get(key.category, &key.element),
                    other.get(key.category, &key.element),
                );

                assert_eq!(first.entries_at(&key.element), other.entries_at(&key.element));
            }
        }
    }

    #[test]
    fn test_partial_within_full() {
        let fixture = five_statements();
        let target = fixture.statements[2];
        let session = session(fixture.tree);
        let handle = TriggerHandle::new();

        let partial = session
            .resolve_to_element(&target, BodyResolveMode::PartialForContext, &handle)
            .unwrap();

        assert!(partial.entries_at(&fixture.statements[3]).is_empty());
        assert!(partial.entries_at(&fixture.statements[4]).is_empty());
        assert!(partial.expression_type(&target).is_some());

        let Some(Reference::Resolved(Symbol::Local { declaration, .. })) =
            partial.reference(&fixture.a_use)
        else {
            panic!("Local variable reference expected.");
        };

        assert_eq!(declaration, fixture.statements[0]);

        let full = session.element_additional_resolve(&target, &handle).unwrap();

        assert!(full.flow_facts(&fixture.statements[4]).is_some());
        assert!(full.len() > partial.len());

        for key in partial.keys() {
            assert_eq!(
                partial.get(key.category, &key.element),
                full.get(key.category, &key.element),
            );
        }

        let cached = session
            .resolve_to_element(&target, BodyResolveMode::PartialForCompletion, &handle)
            .unwrap();

        assert_eq!(cached.len(), full.len());
    }

    #[test]
    fn test_partial_entries_at_target() {
        let fixture = five_statements();

        let targets = [
            fixture.body,
            fixture.a_use,
            fixture.statements[1],
            fixture.statements[2],
            fixture.statements[3],
            fixture.function,
        ];

        let mut config = ResolveConfig::new();

        config.cache_full_bindings = false;

        let session = ResolveSession::new(fixture.tree, config, Collaborators::new());
        let handle = TriggerHandle::new();

        for target in &targets {
            let full = session
                .resolve_to_element(target, BodyResolveMode::Full, &handle)
                .unwrap();

            let expected = full.entries_at(target);

            assert!(!expected.is_empty());

            for mode in [
                BodyResolveMode::PartialForContext,
                BodyResolveMode::PartialForCompletion,
            ] {
                let partial = session.resolve_to_element(target, mode, &handle).unwrap();

                assert_eq!(partial.entries_at(target), expected, "{mode:?} at {target}");
            }
        }
    }

    #[test]
    fn test_force_monotonicity() {
        let fixture = five_statements();
        let session = session(fixture.tree);
        let handle = TriggerHandle::new();

        let function = session
            .resolve_to_descriptor(&fixture.function, &handle)
            .unwrap()
            .expect("Missing function descriptor.");

        assert_eq!(session.force_state(function), Some(ForceState::Forced));

        let contents = session.contents(function).unwrap();

        assert_eq!(contents.as_ref().parameters.len(), 1);

        let parameter = session
            .resolve_to_descriptor(&fixture.parameter, &handle)
            .unwrap()
            .expect("Missing parameter descriptor.");

        assert_eq!(contents.as_ref().parameters[0], parameter);

        let _ = session
            .element_additional_resolve(&fixture.statements[4], &handle)
            .unwrap();

        assert_eq!(session.force_state(function), Some(ForceState::Forced));
        assert_eq!(session.contents(function).unwrap().as_ref(), contents.as_ref());

        assert_eq!(
            session.resolve_to_descriptor(&fixture.body, &handle).unwrap(),
            None,
        );
    }

    #[test]
    fn test_cycle_safety() {
        let fixture = mutual_supertypes();
        let session = session(fixture.tree);
        let handle = TriggerHandle::new();

        let binding = session
            .element_additional_resolve(&fixture.class_a, &handle)
            .unwrap();

        let a = binding
            .declared_descriptor(&fixture.class_a)
            .expect("Missing class descriptor.");

        let b = session
            .resolve_to_descriptor(&fixture.class_b, &handle)
            .unwrap()
            .expect("Missing class descriptor.");

        assert_eq!(session.force_state(a), Some(ForceState::Forced));
        assert_eq!(session.force_state(b), Some(ForceState::Forced));
        assert_eq!(session.contents(a).unwrap().as_ref().supertypes, vec![Ty::Class(b)]);
        assert_eq!(session.contents(b).unwrap().as_ref().supertypes, vec![Ty::Class(a)]);
    }

    #[test]
    fn test_concurrent_cycle_safety() {
        for _ in 0..8 {
            let fixture = mutual_supertypes();
            let session = session(fixture.tree);

            let results = thread::scope(|scope| {
                let first = scope.spawn(|| {
                    session.resolve_to_descriptor(&fixture.class_a, &TriggerHandle::new())
                });

                let second = scope.spawn(|| {
                    session.resolve_to_descriptor(&fixture.class_b, &TriggerHandle::new())
                });

                [
                    first.join().expect("Thread failure."),
                    second.join().expect("Thread failure."),
                ]
            });

            for result in results {
                let descriptor = result.unwrap().expect("Missing class descriptor.");

                assert_eq!(session.force_state(descriptor), Some(ForceState::Forced));
                assert_eq!(session.contents(descriptor).unwrap().as_ref().supertypes.len(), 1);
            }
        }
    }

    #[test]
    fn test_concurrent_forcing() {
        let fixture = five_statements();
        let session = session(fixture.tree);

        let descriptors = thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        session
                            .resolve_to_descriptor(&fixture.function, &TriggerHandle::new())
                            .unwrap()
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| handle.join().expect("Thread failure."))
                .collect::<Vec<_>>()
        });

        assert!(descriptors.windows(2).all(|pair| pair[0] == pair[1]));

        let function = descriptors[0].expect("Missing function descriptor.");

        assert_eq!(session.force_state(function), Some(ForceState::Forced));
    }

    #[test]
    fn test_code_fragment() {
        let fixture = block_fragment();
        let session = session(fixture.tree);
        let handle = TriggerHandle::new();

        let context = session
            .element_additional_resolve(&fixture.reassigned, &handle)
            .unwrap();

        let int = context.expression_type(&fixture.a_initializer).unwrap();
        let string = context.expression_type(&fixture.reassigned).unwrap();

        assert!(int.is_resolved());
        assert!(string.is_resolved());
        assert_ne!(int, string);

        let binding = session
            .resolve_to_element(&fixture.a_use, BodyResolveMode::Full, &handle)
            .unwrap();

        let Some(Reference::Resolved(Symbol::Local { declaration, ty })) =
            binding.reference(&fixture.a_use)
        else {
            panic!("Local variable reference expected.");
        };

        assert_eq!(declaration, fixture.a_declaration);
        assert!(ty.is_resolved());
        assert_ne!(ty, string);

        // The facts after the last statement of the context block apply.
        assert_eq!(binding.expression_type(&fixture.a_use), Some(string));

        let Some(Reference::Resolved(Symbol::Local { declaration, .. })) =
            binding.reference(&fixture.b_use)
        else {
            panic!("Local variable reference expected.");
        };

        assert_eq!(declaration, fixture.b_declaration);
        assert_eq!(binding.expression_type(&fixture.b_use), Some(int));
        assert_eq!(binding.expression_type(&fixture.sum), Some(string));

        let fragment_binding = session
            .resolve_to_element(&fixture.fragment, BodyResolveMode::Full, &handle)
            .unwrap();

        assert_eq!(fragment_binding.len(), binding.len());
    }

    #[test]
    fn test_three_imports() {
        let fixture = three_imports();

        let mut library = ForeignLibrary::builtins();

        library
            .add_class(ForeignClass::new("lib.Vector"))
            .add_class(ForeignClass::new("lib.Matrix"));

        let session = ResolveSession::new(
            fixture.tree,
            ResolveConfig::new(),
            Collaborators::with_loader(library),
        );

        let handle = TriggerHandle::new();

        let binding = session
            .resolve_to_element(&fixture.imports[1], BodyResolveMode::Full, &handle)
            .unwrap();

        for import in &fixture.imports {
            let target = binding.import_target(import).expect("Missing import target.");

            assert!(target.is_resolved());
        }

        assert_eq!(
            binding.import_target(&fixture.imports[2]),
            Some(Reference::Resolved(Symbol::Package(FqName::parse("lib")))),
        );

        let binding = session
            .resolve_to_element(&fixture.parameter_type, BodyResolveMode::Full, &handle)
            .unwrap();

        assert!(binding.reference(&fixture.parameter_type).unwrap().is_resolved());
        assert!(binding.reference(&fixture.return_type).unwrap().is_resolved());
    }

    #[test]
    fn test_interrupted_resolution() {
        let fixture = five_statements();
        let target = fixture.statements[2];
        let session = session(fixture.tree);

        let cancelled = TriggerHandle::new();

        cancelled.trigger();

        assert_eq!(
            session
                .element_additional_resolve(&target, &cancelled)
                .unwrap_err(),
            ResolveError::Interrupted(session.id),
        );

        assert!(session
            .collaborators
            .storage
            .cached_binding(&fixture.function)
            .is_none());

        let binding = session
            .element_additional_resolve(&target, &TriggerHandle::new())
            .unwrap();

        assert!(binding.expression_type(&target).is_some());
    }

    #[test]
    fn test_invalid_cursor() {
        let fixture = five_statements();
        let other = block_fragment();
        let session = session(fixture.tree);

        assert_eq!(
            session
                .resolve_to_element(&other.a_use, BodyResolveMode::Full, &TriggerHandle::new())
                .unwrap_err(),
            ResolveError::Cursor(session.id),
        );
    }
}
