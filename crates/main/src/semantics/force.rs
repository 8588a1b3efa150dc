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

use std::thread::{self, ThreadId};

use ahash::AHashMap;
use lady_deirdre::analysis::TaskHandle;
use log::{debug, trace};

use crate::{
    analysis::{ResolveError, ResolveResult},
    semantics::{
        binding::BindingDelta,
        descriptor::Acquire,
        DescriptorContents,
        DescriptorRef,
        ForceOutcome,
        ForceState,
        LazyDescriptor,
        Resolver,
        Ty,
        FORCE_LOG,
    },
};

impl<'s, H: TaskHandle> Resolver<'s, H> {
    // Brings the descriptor into the Forced state.
    //
    // Returns Partial if the descriptor is already being forced by this
    // thread, or by another thread that (transitively) waits for this one.
    pub(crate) fn force(&self, descriptor: DescriptorRef) -> ResolveResult<ForceOutcome> {
        let lazy = self.descriptor(descriptor);
        let lazy = lazy.as_ref();

        loop {
            match lazy.acquire() {
                Acquire::Forced => return Ok(ForceOutcome::Complete),

                Acquire::Reentrant => {
                    trace!(
                        target: FORCE_LOG,
                        "[{}] Cyclic dependency on {:?} {:?}. Partial view returned.",
                        self.session.id,
                        lazy.kind(),
                        lazy.name(),
                    );

                    return Ok(ForceOutcome::Partial);
                }

                Acquire::Busy(owner) => {
                    if !self.wait_for(descriptor, lazy, owner)? {
                        return Ok(ForceOutcome::Partial);
                    }
                }

                Acquire::Acquired => break,
            }
        }

        match self.force_acquired(lazy) {
            Ok(delta) => {
                self.session.global.as_ref().commit(delta);
                lazy.complete();

                Ok(ForceOutcome::Complete)
            }

            Err(error) => {
                lazy.rollback();

                Err(error)
            }
        }
    }

    fn force_acquired(&self, lazy: &LazyDescriptor) -> ResolveResult<BindingDelta> {
        self.checkpoint()?;

        trace!(
            target: FORCE_LOG,
            "[{}] Forcing {:?} {:?}.",
            self.session.id,
            lazy.kind(),
            lazy.name(),
        );

        let delta = self.compute_contents(lazy)?;

        DependencyForcer::new(self).force_parts(lazy.contents().as_ref())?;

        Ok(delta)
    }

    // Returns false if waiting would close a cycle of threads waiting for each
    // other.
    fn wait_for(
        &self,
        descriptor: DescriptorRef,
        lazy: &LazyDescriptor,
        owner: ThreadId,
    ) -> ResolveResult<bool> {
        let current = thread::current().id();

        {
            let mut waits = self
                .session
                .waits
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());

            if self.closes_wait_cycle(&waits, current, owner) {
                debug!(
                    target: FORCE_LOG,
                    "[{}] Cross-thread dependency cycle on {:?} {:?}. Partial view returned.",
                    self.session.id,
                    lazy.kind(),
                    lazy.name(),
                );

                return Ok(false);
            }

            let _ = waits.insert(current, descriptor);
        }

        let interval = self.config().wait_interval;

        let result = loop {
            if self.handle.is_triggered() {
                break Err(ResolveError::Interrupted(self.session.id));
            }

            match lazy.wait(interval) {
                ForceState::Forcing => continue,
                _ => break Ok(true),
            }
        };

        let _ = self
            .session
            .waits
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .remove(&current);

        result
    }

    fn closes_wait_cycle(
        &self,
        waits: &AHashMap<ThreadId, DescriptorRef>,
        current: ThreadId,
        owner: ThreadId,
    ) -> bool {
        let mut next = Some(owner);

        for _ in 0..=waits.len() {
            let Some(thread) = next else {
                return false;
            };

            if thread == current {
                return true;
            }

            let Some(blocked_on) = waits.get(&thread) else {
                return false;
            };

            next = self.descriptor(*blocked_on).as_ref().owner();
        }

        false
    }
}

/// Walks the substructure of a descriptor and forces every lazy part it owns
/// or refers to: annotation classes, type parameters and their bounds, value
/// parameters, constructors, supertypes and the declared type.
pub(crate) struct DependencyForcer<'r, 's, H: TaskHandle> {
    resolver: &'r Resolver<'s, H>,
}

impl<'r, 's, H: TaskHandle> DependencyForcer<'r, 's, H> {
    #[inline(always)]
    pub(crate) fn new(resolver: &'r Resolver<'s, H>) -> Self {
        Self { resolver }
    }

    // Forces the descriptor with all of its parts.
    #[inline(always)]
    pub(crate) fn force_all(&self, descriptor: DescriptorRef) -> ResolveResult<ForceOutcome> {
        self.resolver.force(descriptor)
    }

    pub(crate) fn force_parts(&self, contents: &DescriptorContents) -> ResolveResult<()> {
        for annotation in &contents.annotations {
            self.force_type(&annotation.ty)?;
        }

        for descriptor in contents
            .type_parameters
            .iter()
            .chain(contents.parameters.iter())
            .chain(contents.primary_constructor.iter())
            .chain(contents.secondary_constructors.iter())
        {
            let _ = self.resolver.force(*descriptor)?;
        }

        for ty in contents
            .supertypes
            .iter()
            .chain(contents.bounds.iter())
            .chain(contents.ty.iter())
        {
            self.force_type(ty)?;
        }

        Ok(())
    }

    pub(crate) fn force_types<'a>(&self, types: impl IntoIterator<Item = &'a Ty>) -> ResolveResult<()> {
        for ty in types {
            self.force_type(ty)?;
        }

        Ok(())
    }

    #[inline(always)]
    fn force_type(&self, ty: &Ty) -> ResolveResult<()> {
        if let Some(descriptor) = ty.descriptor() {
            let _ = self.resolver.force(descriptor)?;
        }

        Ok(())
    }
}
