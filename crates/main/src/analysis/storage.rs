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
    fmt::{Debug, Formatter},
    sync::RwLock,
};

use ahash::RandomState;
use lady_deirdre::sync::{Shared, Table};

use crate::{
    analysis::StorageManager,
    report::debug_unreachable,
    semantics::{DescriptorOrigin, DescriptorRef, DescriptorSeed, LazyDescriptor, SemanticBinding},
    syntax::ElementRef,
};

/// The default [StorageManager] that keeps everything in memory for the
/// lifetime of the session.
pub struct MemoryStorage {
    arena: RwLock<Vec<Shared<LazyDescriptor>>>,
    origins: Table<DescriptorOrigin, DescriptorRef, RandomState>,
    bindings: Table<ElementRef, SemanticBinding, RandomState>,
}

impl Debug for MemoryStorage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("MemoryStorage")
            .field("descriptors", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryStorage {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager for MemoryStorage {
    fn create_lazy(&self, seed: DescriptorSeed) -> DescriptorRef {
        let shard_index = self.origins.shard_index_of(&seed.origin);

        let shard = match self.origins.shards().get(shard_index) {
            Some(shard) => shard,

            // Safety: shard_index_of always returns a valid shard index.
            None => unsafe { debug_unreachable!("Shard index out of bounds.") },
        };

        let mut origins = shard.write().unwrap_or_else(|poison| poison.into_inner());

        if let Some(existing) = origins.get(&seed.origin) {
            return *existing;
        }

        let mut arena = self.arena.write().unwrap_or_else(|poison| poison.into_inner());

        let reference = DescriptorRef::new(arena.len());
        let origin = seed.origin.clone();

        arena.push(Shared::new(LazyDescriptor::new(reference, seed)));

        let _ = origins.insert(origin, reference);

        reference
    }

    #[inline(always)]
    fn get(&self, descriptor: DescriptorRef) -> Option<Shared<LazyDescriptor>> {
        let arena = self.arena.read().unwrap_or_else(|poison| poison.into_inner());

        arena.get(descriptor.index()).cloned()
    }

    #[inline(always)]
    fn find(&self, origin: &DescriptorOrigin) -> Option<DescriptorRef> {
        Some(*self.origins.get(origin)?)
    }

    #[inline(always)]
    fn cached_binding(&self, unit: &ElementRef) -> Option<SemanticBinding> {
        Some(SemanticBinding::clone(&*self.bindings.get(unit)?))
    }

    fn put_binding(&self, unit: ElementRef, binding: SemanticBinding) {
        let shard_index = self.bindings.shard_index_of(&unit);

        let shard = match self.bindings.shards().get(shard_index) {
            Some(shard) => shard,

            // Safety: shard_index_of always returns a valid shard index.
            None => unsafe { debug_unreachable!("Shard index out of bounds.") },
        };

        let mut bindings = shard.write().unwrap_or_else(|poison| poison.into_inner());

        let _ = bindings.entry(unit).or_insert(binding);
    }
}

impl MemoryStorage {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Vec::new()),
            origins: Table::new(),
            bindings: Table::new(),
        }
    }

    /// Returns the number of descriptors in the arena.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.arena
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use lady_deirdre::arena::Id;

    use crate::{
        analysis::{MemoryStorage, StorageManager},
        semantics::{DescriptorKind, DescriptorOrigin, DescriptorSeed},
        syntax::ElementRef,
    };

    fn seed(index: usize, id: Id) -> DescriptorSeed {
        DescriptorSeed {
            origin: DescriptorOrigin::Source(ElementRef { id, index }),
            kind: DescriptorKind::Function,
            name: "foo".into(),
            container: None,
        }
    }

    #[test]
    fn test_storage_dedup() {
        let id = Id::new();
        let storage = MemoryStorage::new();

        let references = thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| scope.spawn(|| storage.create_lazy(seed(1, id))))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| handle.join().expect("Thread failure."))
                .collect::<Vec<_>>()
        });

        assert!(references.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(storage.len(), 1);

        let other = storage.create_lazy(seed(2, id));

        assert_ne!(other, references[0]);
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.find(&seed(2, id).origin), Some(other));

        let descriptor = storage.get(other).expect("Missing descriptor.");

        assert_eq!(descriptor.as_ref().reference(), other);
        assert_eq!(descriptor.as_ref().name(), "foo");
    }
}
