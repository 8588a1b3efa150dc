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

use std::collections::{BTreeMap, BTreeSet};

use crate::{semantics::Ty, syntax::ElementRef};

/// Control-flow-sensitive facts about local values.
///
/// Variables are identified by their declaring elements: local variable
/// declarations and value parameters.
///
/// Facts are immutable values. Each statement of a block produces a new set of
/// facts from the facts that precede it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlowFacts {
    types: BTreeMap<ElementRef, Ty>,
    initialized: BTreeSet<ElementRef>,
}

impl FlowFacts {
    /// Returns an empty set of facts.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the type the variable is known to have at this point, if it
    /// differs from the declared type.
    #[inline(always)]
    pub fn known_type(&self, variable: &ElementRef) -> Option<Ty> {
        self.types.get(variable).copied()
    }

    /// Returns true if a value has been assigned to the variable on every
    /// path leading to this point.
    #[inline(always)]
    pub fn is_initialized(&self, variable: &ElementRef) -> bool {
        self.initialized.contains(variable)
    }

    /// Returns the variables with known types in a deterministic order.
    #[inline(always)]
    pub fn variables(&self) -> impl Iterator<Item = (&ElementRef, &Ty)> + '_ {
        self.types.iter()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.initialized.is_empty()
    }

    /// Returns the facts after a value of type `ty` has been stored into the
    /// variable.
    pub fn assign(&self, variable: ElementRef, ty: Ty) -> Self {
        let mut result = self.clone();

        let _ = result.initialized.insert(variable);

        match ty.is_resolved() {
            true => {
                let _ = result.types.insert(variable, ty);
            }

            false => {
                let _ = result.types.remove(&variable);
            }
        }

        result
    }

    /// Returns the facts in which the variable is known to have type `ty`
    /// (a smart cast).
    pub fn narrow(&self, variable: ElementRef, ty: Ty) -> Self {
        if !ty.is_resolved() {
            return self.clone();
        }

        let mut result = self.clone();

        let _ = result.types.insert(variable, ty);

        result
    }

    /// Returns the facts that hold after two control-flow branches join.
    ///
    /// A variable keeps its known type only if both branches agree on it. A
    /// variable is initialized only if both branches initialize it.
    pub fn join(&self, other: &Self) -> Self {
        let types = self
            .types
            .iter()
            .filter(|(variable, ty)| other.types.get(variable) == Some(ty))
            .map(|(variable, ty)| (*variable, *ty))
            .collect();

        let initialized = self
            .initialized
            .intersection(&other.initialized)
            .copied()
            .collect();

        Self { types, initialized }
    }
}

#[cfg(test)]
mod tests {
    use lady_deirdre::arena::Id;

    use crate::{
        semantics::{DescriptorRef, FlowFacts, Ty},
        syntax::ElementRef,
    };

    #[test]
    fn test_flow_join() {
        let id = Id::new();
        let a = ElementRef { id, index: 1 };
        let b = ElementRef { id, index: 2 };

        let int = Ty::Class(DescriptorRef(1));
        let string = Ty::Class(DescriptorRef(2));

        let before = FlowFacts::new().assign(a, int);
        let then_branch = before.assign(b, string);
        let else_branch = before.assign(a, string).assign(b, string);

        let joined = then_branch.join(&else_branch);

        assert_eq!(joined.known_type(&a), None);
        assert_eq!(joined.known_type(&b), Some(string));
        assert!(joined.is_initialized(&a));
        assert!(joined.is_initialized(&b));

        let narrowed = before.narrow(a, string);

        assert_eq!(narrowed.known_type(&a), Some(string));
        assert_eq!(before.known_type(&a), Some(int));
        assert_eq!(before.assign(a, Ty::Unresolved).known_type(&a), None);
    }
}
