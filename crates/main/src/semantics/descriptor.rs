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
    sync::{Condvar, Mutex, MutexGuard, RwLock},
    thread::{self, ThreadId},
    time::Duration,
};

use compact_str::CompactString;
use lady_deirdre::sync::Shared;

use crate::{
    semantics::{FqName, Ty},
    syntax::ElementRef,
};

/// A reference to a [LazyDescriptor] in the session's descriptor arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorRef(pub(crate) usize);

impl DescriptorRef {
    /// Creates a reference to the descriptor stored under the `index` of the
    /// [StorageManager](crate::analysis::StorageManager) arena.
    #[inline(always)]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the index of the descriptor in the arena.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A kind of symbol described by a [LazyDescriptor].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DescriptorKind {
    Class,
    Constructor,
    Function,
    Property,
    Parameter,
    TypeParameter,
}

/// The place where a descriptor comes from.
///
/// Origins are the identity of descriptors: the session never creates two
/// descriptors with equal origins.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorOrigin {
    /// A declaration of the syntax tree.
    Source(ElementRef),

    /// The primary constructor of the class declaration.
    PrimaryConstructor(ElementRef),

    /// A class provided by the [ForeignSymbolLoader](crate::analysis::ForeignSymbolLoader).
    ForeignClass(FqName),

    /// A member of a foreign class.
    ForeignMember { class: FqName, index: usize },

    /// A parameter of a foreign class member function.
    ForeignParameter {
        class: FqName,
        member: usize,
        index: usize,
    },
}

impl DescriptorOrigin {
    /// Returns the syntax element of a source descriptor.
    #[inline(always)]
    pub fn source(&self) -> Option<ElementRef> {
        match self {
            Self::Source(element_ref) => Some(*element_ref),
            Self::PrimaryConstructor(element_ref) => Some(*element_ref),
            _ => None,
        }
    }

    /// Returns true if the descriptor is defined outside of the syntax tree.
    #[inline(always)]
    pub fn is_foreign(&self) -> bool {
        self.source().is_none()
    }
}

/// An initial description of a descriptor to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSeed {
    pub origin: DescriptorOrigin,
    pub kind: DescriptorKind,
    pub name: CompactString,
    pub container: Option<DescriptorRef>,
}

/// A resolved annotation attached to a declaration or to a file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationDescriptor {
    /// The annotation syntax, or None for foreign annotations.
    pub entry: Option<ElementRef>,

    /// The annotation class.
    pub ty: Ty,

    /// Types of the annotation arguments.
    pub arguments: Vec<Ty>,
}

/// Contents of a [LazyDescriptor] computed by forcing.
///
/// Each kind of descriptor uses a subset of the fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorContents {
    pub annotations: Vec<AnnotationDescriptor>,
    pub type_parameters: Vec<DescriptorRef>,
    pub parameters: Vec<DescriptorRef>,
    pub supertypes: Vec<Ty>,
    pub bounds: Vec<Ty>,

    /// A type of the property or the parameter, a return type of the
    /// function, or a constructed class of the constructor.
    pub ty: Option<Ty>,

    pub primary_constructor: Option<DescriptorRef>,
    pub secondary_constructors: Vec<DescriptorRef>,
}

/// A state of the [LazyDescriptor] contents computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForceState {
    Unforced,
    Forcing,
    Forced,
}

/// A result of forcing the descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceOutcome {
    /// The descriptor is Forced.
    Complete,

    /// The descriptor is being forced further up the stack (a dependency
    /// cycle). Its contents are a partial snapshot.
    Partial,
}

pub(crate) enum Acquire {
    Forced,
    Reentrant,
    Busy(ThreadId),
    Acquired,
}

struct ForceSlot {
    state: ForceState,
    owner: Option<ThreadId>,
}

/// A symbol whose contents are computed on first demand.
///
/// Descriptors are created in the [Unforced](ForceState::Unforced) state the
/// first time a name is looked up in a scope. The contents are computed at
/// most once by forcing. While forcing, the thread that owns the computation
/// publishes partial snapshots of the contents, so a re-entrant reader on the
/// same thread observes the parts that are already known.
///
/// The state transitions are guarded by a per-descriptor mutex. Other threads
/// that need the contents wait on the descriptor's condition variable until
/// the owner finishes.
pub struct LazyDescriptor {
    reference: DescriptorRef,
    seed: DescriptorSeed,
    slot: Mutex<ForceSlot>,
    ready: Condvar,
    contents: RwLock<Shared<DescriptorContents>>,
}

impl Debug for LazyDescriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("LazyDescriptor")
            .field("reference", &self.reference)
            .field("kind", &self.seed.kind)
            .field("name", &self.seed.name)
            .field("origin", &self.seed.origin)
            .field("state", &self.state())
            .finish()
    }
}

impl LazyDescriptor {
    /// Creates an [Unforced](ForceState::Unforced) descriptor. Called by the
    /// [StorageManager](crate::analysis::StorageManager) implementations.
    pub fn new(reference: DescriptorRef, seed: DescriptorSeed) -> Self {
        Self {
            reference,
            seed,
            slot: Mutex::new(ForceSlot {
                state: ForceState::Unforced,
                owner: None,
            }),
            ready: Condvar::new(),
            contents: RwLock::new(Shared::new(DescriptorContents::default())),
        }
    }

    #[inline(always)]
    pub fn reference(&self) -> DescriptorRef {
        self.reference
    }

    #[inline(always)]
    pub fn kind(&self) -> DescriptorKind {
        self.seed.kind
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        self.seed.name.as_str()
    }

    #[inline(always)]
    pub fn origin(&self) -> &DescriptorOrigin {
        &self.seed.origin
    }

    /// Returns the descriptor of the declaration that owns this one.
    #[inline(always)]
    pub fn container(&self) -> Option<DescriptorRef> {
        self.seed.container
    }

    #[inline(always)]
    pub fn state(&self) -> ForceState {
        self.lock_slot().state
    }

    /// Returns the current snapshot of the contents.
    ///
    /// The snapshot is complete if the descriptor is
    /// [Forced](ForceState::Forced). Once forced, every call returns the same
    /// shared instance.
    #[inline(always)]
    pub fn contents(&self) -> Shared<DescriptorContents> {
        self.contents
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub(crate) fn owner(&self) -> Option<ThreadId> {
        let slot = self.lock_slot();

        match slot.state {
            ForceState::Forcing => slot.owner,
            _ => None,
        }
    }

    pub(crate) fn acquire(&self) -> Acquire {
        let current = thread::current().id();
        let mut slot = self.lock_slot();

        match slot.state {
            ForceState::Forced => Acquire::Forced,

            ForceState::Forcing => match slot.owner {
                Some(owner) if owner == current => Acquire::Reentrant,
                Some(owner) => Acquire::Busy(owner),
                None => Acquire::Reentrant,
            },

            ForceState::Unforced => {
                slot.state = ForceState::Forcing;
                slot.owner = Some(current);
                Acquire::Acquired
            }
        }
    }

    pub(crate) fn publish(&self, contents: DescriptorContents) {
        let mut guard = self
            .contents
            .write()
            .unwrap_or_else(|poison| poison.into_inner());

        *guard = Shared::new(contents);
    }

    pub(crate) fn complete(&self) {
        let mut slot = self.lock_slot();

        slot.state = ForceState::Forced;
        slot.owner = None;

        self.ready.notify_all();
    }

    pub(crate) fn rollback(&self) {
        let mut slot = self.lock_slot();

        self.publish(DescriptorContents::default());

        slot.state = ForceState::Unforced;
        slot.owner = None;

        self.ready.notify_all();
    }

    // Blocks while another thread forces the descriptor, at most for the
    // specified interval.
    pub(crate) fn wait(&self, interval: Duration) -> ForceState {
        let slot = self.lock_slot();

        if slot.state != ForceState::Forcing {
            return slot.state;
        }

        let (slot, _) = self
            .ready
            .wait_timeout_while(slot, interval, |slot| slot.state == ForceState::Forcing)
            .unwrap_or_else(|poison| poison.into_inner());

        slot.state
    }

    #[inline(always)]
    fn lock_slot(&self) -> MutexGuard<ForceSlot> {
        self.slot.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use crate::semantics::{
        descriptor::Acquire,
        DescriptorContents,
        DescriptorKind,
        DescriptorOrigin,
        DescriptorRef,
        DescriptorSeed,
        ForceState,
        FqName,
        LazyDescriptor,
    };

    fn descriptor() -> LazyDescriptor {
        LazyDescriptor::new(
            DescriptorRef(0),
            DescriptorSeed {
                origin: DescriptorOrigin::ForeignClass(FqName::parse("test.Foo")),
                kind: DescriptorKind::Class,
                name: "Foo".into(),
                container: None,
            },
        )
    }

    #[test]
    fn test_descriptor_states() {
        let descriptor = descriptor();

        assert_eq!(descriptor.state(), ForceState::Unforced);
        assert!(matches!(descriptor.acquire(), Acquire::Acquired));
        assert_eq!(descriptor.state(), ForceState::Forcing);
        assert!(matches!(descriptor.acquire(), Acquire::Reentrant));

        descriptor.publish(DescriptorContents {
            supertypes: vec![Default::default()],
            ..DescriptorContents::default()
        });

        descriptor.complete();

        assert_eq!(descriptor.state(), ForceState::Forced);
        assert!(matches!(descriptor.acquire(), Acquire::Forced));
        assert_eq!(descriptor.contents().as_ref().supertypes.len(), 1);
        assert!(descriptor.owner().is_none());
    }

    #[test]
    fn test_descriptor_rollback() {
        let descriptor = descriptor();

        assert!(matches!(descriptor.acquire(), Acquire::Acquired));

        descriptor.publish(DescriptorContents {
            ty: Some(Default::default()),
            ..DescriptorContents::default()
        });

        descriptor.rollback();

        assert_eq!(descriptor.state(), ForceState::Unforced);
        assert_eq!(descriptor.contents().as_ref(), &DescriptorContents::default());
        assert!(matches!(descriptor.acquire(), Acquire::Acquired));
    }

    #[test]
    fn test_descriptor_rendezvous() {
        let descriptor = Arc::new(descriptor());

        assert!(matches!(descriptor.acquire(), Acquire::Acquired));

        let waiter = {
            let descriptor = descriptor.clone();

            thread::spawn(move || {
                let Acquire::Busy(_) = descriptor.acquire() else {
                    panic!("Descriptor should be busy.");
                };

                loop {
                    if descriptor.wait(Duration::from_millis(10)) == ForceState::Forced {
                        break;
                    }
                }

                descriptor.contents().as_ref().ty
            })
        };

        thread::sleep(Duration::from_millis(20));

        descriptor.publish(DescriptorContents {
            ty: Some(Default::default()),
            ..DescriptorContents::default()
        });

        descriptor.complete();

        assert_eq!(waiter.join().unwrap(), Some(Default::default()));
    }
}
