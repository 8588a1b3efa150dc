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

use ahash::{AHashMap, RandomState};
use compact_str::CompactString;
use lady_deirdre::sync::{Shared, Table};
use log::debug;

use crate::{
    report::debug_unreachable,
    semantics::{
        AnnotationDescriptor,
        DescriptorRef,
        FlowFacts,
        FqName,
        ResolutionScope,
        Ty,
        RESOLVE_LOG,
    },
    syntax::ElementRef,
};

/// A kind of semantic fact recorded in the [SemanticBinding].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum Category {
    /// A symbol referred to by a name, a type reference or a callee.
    ReferenceTarget,

    /// The scope in which the element has been resolved.
    ResolutionScope,

    /// The scope visible right after the statement, including the statement's
    /// own declarations.
    AccumulatedScope,

    /// A type of the expression.
    ExpressionType,

    /// Flow facts known right after the element has been evaluated.
    FlowFacts,

    /// A descriptor of the declaration.
    DeclaredDescriptor,

    /// A declared or inferred type of the local variable.
    VariableType,

    /// A resolved annotation entry.
    Annotation,

    /// A constructor called by the supertype call.
    DelegationCall,

    /// Symbols imported by the import directive.
    ImportTarget,
}

impl Display for Category {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, formatter)
    }
}

/// A symbol a name resolves to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// A class, a member, a parameter or a type parameter.
    Descriptor(DescriptorRef),

    /// A local variable declared in a block.
    Local {
        /// The [LocalVariable](crate::syntax::SyntaxKind::LocalVariable)
        /// element.
        declaration: ElementRef,

        /// The declared type, or the type of the initializer.
        ty: Ty,
    },

    /// A package.
    Package(FqName),
}

/// A result of resolving a reference.
///
/// Missing and ambiguous references are legitimate outcomes of the analysis
/// and are recorded as markers rather than reported as errors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    /// The reference denotes exactly one symbol.
    Resolved(Symbol),

    /// The reference matches several symbols equally well.
    Ambiguous(Vec<Symbol>),

    /// Nothing matches the reference.
    Unresolved {
        /// The name that has not been found.
        name: CompactString,

        /// Similar names visible from the reference site, the closest first.
        suggestions: Vec<CompactString>,
    },
}

impl Reference {
    /// Returns the resolved symbol.
    #[inline(always)]
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Resolved(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Returns the resolved descriptor.
    #[inline(always)]
    pub fn descriptor(&self) -> Option<DescriptorRef> {
        match self {
            Self::Resolved(Symbol::Descriptor(descriptor)) => Some(*descriptor),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A value of a [SemanticBinding] entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingValue {
    Reference(Reference),
    Scope(ResolutionScope),
    Type(Ty),
    Flow(FlowFacts),
    Descriptor(DescriptorRef),
    Annotation(AnnotationDescriptor),
}

/// A key of a [SemanticBinding] entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingKey {
    pub category: Category,
    pub element: ElementRef,
}

// Entries produced by one resolution step. Steps return deltas to their
// callers, and the callers merge them.
#[derive(Clone, Default)]
pub(crate) struct BindingDelta {
    entries: AHashMap<BindingKey, BindingValue>,
}

impl BindingDelta {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub(crate) fn get(&self, category: Category, element: &ElementRef) -> Option<&BindingValue> {
        self.entries.get(&BindingKey {
            category,
            element: *element,
        })
    }

    // Keeps the first value written for the key.
    pub(crate) fn record(&mut self, category: Category, element: ElementRef, value: BindingValue) {
        let key = BindingKey { category, element };

        match self.entries.get(&key) {
            None => {
                let _ = self.entries.insert(key, value);
            }

            Some(previous) if previous == &value => (),

            Some(_) => {
                debug!(
                    target: RESOLVE_LOG,
                    "[{element}] Conflicting {category} entry ignored.",
                );
            }
        }
    }

    pub(crate) fn merge(&mut self, other: BindingDelta) {
        for (key, value) in other.entries {
            self.record(key.category, key.element, value);
        }
    }

    #[inline(always)]
    pub(crate) fn record_reference(&mut self, element: ElementRef, reference: Reference) {
        self.record(
            Category::ReferenceTarget,
            element,
            BindingValue::Reference(reference),
        );
    }

    #[inline(always)]
    pub(crate) fn record_scope(&mut self, element: ElementRef, scope: &ResolutionScope) {
        self.record(
            Category::ResolutionScope,
            element,
            BindingValue::Scope(scope.clone()),
        );
    }

    #[inline(always)]
    pub(crate) fn record_accumulated_scope(&mut self, element: ElementRef, scope: &ResolutionScope) {
        self.record(
            Category::AccumulatedScope,
            element,
            BindingValue::Scope(scope.clone()),
        );
    }

    #[inline(always)]
    pub(crate) fn record_type(&mut self, element: ElementRef, ty: Ty) {
        self.record(Category::ExpressionType, element, BindingValue::Type(ty));
    }

    #[inline(always)]
    pub(crate) fn record_flow(&mut self, element: ElementRef, facts: &FlowFacts) {
        self.record(
            Category::FlowFacts,
            element,
            BindingValue::Flow(facts.clone()),
        );
    }

    #[inline(always)]
    pub(crate) fn record_descriptor(&mut self, element: ElementRef, descriptor: DescriptorRef) {
        self.record(
            Category::DeclaredDescriptor,
            element,
            BindingValue::Descriptor(descriptor),
        );
    }

    #[inline(always)]
    pub(crate) fn record_variable_type(&mut self, element: ElementRef, ty: Ty) {
        self.record(Category::VariableType, element, BindingValue::Type(ty));
    }

    #[inline(always)]
    pub(crate) fn record_annotation(&mut self, element: ElementRef, annotation: AnnotationDescriptor) {
        self.record(
            Category::Annotation,
            element,
            BindingValue::Annotation(annotation),
        );
    }

    #[inline(always)]
    pub(crate) fn record_delegation_call(&mut self, element: ElementRef, reference: Reference) {
        self.record(
            Category::DelegationCall,
            element,
            BindingValue::Reference(reference),
        );
    }

    #[inline(always)]
    pub(crate) fn record_import(&mut self, element: ElementRef, reference: Reference) {
        self.record(
            Category::ImportTarget,
            element,
            BindingValue::Reference(reference),
        );
    }
}

// Session-wide facts produced by forcing descriptors. Shared by all
// resolution calls of the session, written only by the forcing machinery.
pub(crate) struct GlobalBinding {
    table: Table<BindingKey, BindingValue, RandomState>,
}

impl GlobalBinding {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        Self {
            table: Table::new(),
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &BindingKey) -> Option<BindingValue> {
        let value = self.table.get(key)?;

        Some(BindingValue::clone(&value))
    }

    pub(crate) fn commit(&self, delta: BindingDelta) {
        for (key, value) in delta.entries {
            let shard_index = self.table.shard_index_of(&key);

            let shard = match self.table.shards().get(shard_index) {
                Some(shard) => shard,

                // Safety: shard_index_of always returns a valid shard index.
                None => unsafe { debug_unreachable!("Shard index out of bounds.") },
            };

            let mut guard = shard.write().unwrap_or_else(|poison| poison.into_inner());

            let _ = guard.entry(key).or_insert(value);
        }
    }
}

/// A result of a resolution call: semantic facts keyed by a
/// [Category] and a syntax element.
///
/// The binding is an overlay: it contains the entries produced by the call
/// that created it, and falls back to the session-wide facts established
/// while forcing declarations. The overlay is immutable once returned and is
/// cheap to clone.
///
/// Every key has at most one value. Partial resolution modes may omit entries
/// for the elements that are far from the requested target, but never produce
/// different values.
#[derive(Clone)]
pub struct SemanticBinding {
    global: Shared<GlobalBinding>,
    own: Shared<AHashMap<BindingKey, BindingValue>>,
}

impl Debug for SemanticBinding {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let mut keys = self.keys();

        keys.sort();

        formatter
            .debug_struct("SemanticBinding")
            .field("own", &keys)
            .finish_non_exhaustive()
    }
}

impl SemanticBinding {
    pub(crate) fn new(global: Shared<GlobalBinding>, delta: BindingDelta) -> Self {
        Self {
            global,
            own: Shared::new(delta.entries),
        }
    }

    pub(crate) fn global_view(global: Shared<GlobalBinding>) -> Self {
        Self::new(global, BindingDelta::new())
    }

    /// Returns the value of the entry, looking into the session-wide facts if
    /// the overlay does not have one.
    pub fn get(&self, category: Category, element: &ElementRef) -> Option<BindingValue> {
        let key = BindingKey {
            category,
            element: *element,
        };

        if let Some(value) = self.own.as_ref().get(&key) {
            return Some(value.clone());
        }

        self.global.as_ref().get(&key)
    }

    /// Returns true if the entry exists in the overlay or in the
    /// session-wide facts.
    #[inline(always)]
    pub fn contains(&self, category: Category, element: &ElementRef) -> bool {
        self.get(category, element).is_some()
    }

    /// Returns the keys of the overlay's own entries in unspecified order.
    pub fn keys(&self) -> Vec<BindingKey> {
        self.own.as_ref().keys().copied().collect()
    }

    /// Returns the number of the overlay's own entries.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.own.as_ref().len()
    }

    /// Returns true if the overlay has no own entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.own.as_ref().is_empty()
    }

    /// Returns all entries of the element sorted by category, including the
    /// session-wide ones.
    pub fn entries_at(&self, element: &ElementRef) -> Vec<(Category, BindingValue)> {
        const CATEGORIES: [Category; 10] = [
            Category::ReferenceTarget,
            Category::ResolutionScope,
            Category::AccumulatedScope,
            Category::ExpressionType,
            Category::FlowFacts,
            Category::DeclaredDescriptor,
            Category::VariableType,
            Category::Annotation,
            Category::DelegationCall,
            Category::ImportTarget,
        ];

        CATEGORIES
            .iter()
            .filter_map(|category| Some((*category, self.get(*category, element)?)))
            .collect()
    }

    pub fn reference(&self, element: &ElementRef) -> Option<Reference> {
        match self.get(Category::ReferenceTarget, element)? {
            BindingValue::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn resolution_scope(&self, element: &ElementRef) -> Option<ResolutionScope> {
        match self.get(Category::ResolutionScope, element)? {
            BindingValue::Scope(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn accumulated_scope(&self, element: &ElementRef) -> Option<ResolutionScope> {
        match self.get(Category::AccumulatedScope, element)? {
            BindingValue::Scope(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn expression_type(&self, element: &ElementRef) -> Option<Ty> {
        match self.get(Category::ExpressionType, element)? {
            BindingValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn flow_facts(&self, element: &ElementRef) -> Option<FlowFacts> {
        match self.get(Category::FlowFacts, element)? {
            BindingValue::Flow(facts) => Some(facts),
            _ => None,
        }
    }

    pub fn declared_descriptor(&self, element: &ElementRef) -> Option<DescriptorRef> {
        match self.get(Category::DeclaredDescriptor, element)? {
            BindingValue::Descriptor(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn variable_type(&self, element: &ElementRef) -> Option<Ty> {
        match self.get(Category::VariableType, element)? {
            BindingValue::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn annotation(&self, element: &ElementRef) -> Option<AnnotationDescriptor> {
        match self.get(Category::Annotation, element)? {
            BindingValue::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn delegation_call(&self, element: &ElementRef) -> Option<Reference> {
        match self.get(Category::DelegationCall, element)? {
            BindingValue::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn import_target(&self, element: &ElementRef) -> Option<Reference> {
        match self.get(Category::ImportTarget, element)? {
            BindingValue::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use lady_deirdre::{arena::Id, sync::Shared};

    use crate::{
        semantics::{
            binding::{BindingDelta, GlobalBinding},
            BindingValue,
            Category,
            Reference,
            SemanticBinding,
            Ty,
        },
        syntax::ElementRef,
    };

    fn element(index: usize, id: Id) -> ElementRef {
        ElementRef { id, index }
    }

    #[test]
    fn test_binding_write_once() {
        let id = Id::new();
        let mut delta = BindingDelta::new();

        delta.record_type(element(1, id), Ty::Unresolved);
        delta.record(
            Category::ExpressionType,
            element(1, id),
            BindingValue::Reference(Reference::Ambiguous(Vec::new())),
        );

        assert_eq!(delta.len(), 1);
        assert_eq!(
            delta.get(Category::ExpressionType, &element(1, id)),
            Some(&BindingValue::Type(Ty::Unresolved)),
        );
    }

    #[test]
    fn test_binding_overlay() {
        let id = Id::new();
        let global = Shared::new(GlobalBinding::new());

        let mut signature = BindingDelta::new();
        signature.record_reference(
            element(1, id),
            Reference::Unresolved {
                name: "Foo".into(),
                suggestions: Vec::new(),
            },
        );
        global.as_ref().commit(signature);

        let mut body = BindingDelta::new();
        body.record_type(element(2, id), Ty::Unresolved);

        let binding = SemanticBinding::new(global.clone(), body);

        assert_eq!(binding.len(), 1);
        assert!(binding.contains(Category::ReferenceTarget, &element(1, id)));
        assert!(binding.contains(Category::ExpressionType, &element(2, id)));
        assert!(!binding.contains(Category::ExpressionType, &element(1, id)));
        assert_eq!(binding.entries_at(&element(1, id)).len(), 1);

        let other = SemanticBinding::global_view(global);

        assert!(other.is_empty());
        assert!(other.reference(&element(1, id)).is_some());
        assert!(other.expression_type(&element(2, id)).is_none());
    }
}
