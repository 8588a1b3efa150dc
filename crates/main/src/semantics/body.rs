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
    analysis::{ResolveResult, TypeQuery},
    semantics::{
        binding::BindingDelta,
        filter::StatementFilter,
        DescriptorKind,
        FlowFacts,
        Reference,
        ResolutionScope,
        Resolver,
        ScopeLayer,
        Symbol,
        Ty,
    },
    syntax::{ElementRef, SyntaxKind},
};

// A result of the expression or statement analysis.
pub(crate) struct Evaluated {
    pub(crate) ty: Ty,

    // Facts after the evaluation.
    pub(crate) facts: FlowFacts,

    // Facts after the evaluation, if the value is `true`.
    pub(crate) narrowed: FlowFacts,

    // A symbol the expression denotes, if the expression is a name.
    pub(crate) symbol: Option<Symbol>,

    // The analysis of some nested elements has been skipped.
    pub(crate) truncated: bool,
}

impl Evaluated {
    #[inline(always)]
    fn truncated(facts: &FlowFacts) -> Self {
        Self {
            ty: Ty::Unresolved,
            facts: facts.clone(),
            narrowed: facts.clone(),
            symbol: None,
            truncated: true,
        }
    }

    #[inline(always)]
    fn plain(ty: Ty, facts: FlowFacts, truncated: bool) -> Self {
        Self {
            ty,
            narrowed: facts.clone(),
            facts,
            symbol: None,
            truncated,
        }
    }
}

// Resolves statements and expressions of a declaration body, threading the
// scope and the flow facts through the statements.
//
// Elements whose analysis has been truncated by the statement filter do not
// record types, flow facts and accumulated scopes.
pub(crate) struct BodyResolver<'r, 's, H: TaskHandle> {
    resolver: &'r Resolver<'s, H>,
    filter: &'r StatementFilter,
    delta: BindingDelta,
}

impl<'r, 's, H: TaskHandle> BodyResolver<'r, 's, H> {
    #[inline(always)]
    pub(crate) fn new(resolver: &'r Resolver<'s, H>, filter: &'r StatementFilter) -> Self {
        Self {
            resolver,
            filter,
            delta: BindingDelta::new(),
        }
    }

    #[inline(always)]
    pub(crate) fn finish(self) -> BindingDelta {
        self.delta
    }

    // Resolves the declaration body: a block or a single expression.
    pub(crate) fn resolve_body(
        &mut self,
        body: &ElementRef,
        scope: &ResolutionScope,
        facts: &FlowFacts,
    ) -> ResolveResult<Evaluated> {
        match body.kind(self.resolver.tree()) {
            Some(SyntaxKind::Block) => self.resolve_block(body, scope, facts),
            _ => self.resolve_expression(body, scope, facts),
        }
    }

    pub(crate) fn resolve_block(
        &mut self,
        block: &ElementRef,
        scope: &ResolutionScope,
        facts: &FlowFacts,
    ) -> ResolveResult<Evaluated> {
        let tree = self.resolver.tree();

        if self.filter.skips(tree, block) {
            return Ok(Evaluated::truncated(facts));
        }

        self.delta.record_scope(*block, scope);

        let (statements, cut) = self.filter.statements(tree, block);

        let mut truncated = cut;
        let mut scope = scope.clone();
        let mut facts = facts.clone();
        let mut ty = None;

        for statement in &statements {
            self.resolver.checkpoint()?;

            if self.filter.skips(tree, statement) {
                truncated = true;
                break;
            }

            let (next_scope, evaluated) = self.resolve_statement(statement, &scope, &facts)?;

            truncated = truncated || evaluated.truncated;
            scope = next_scope;
            facts = evaluated.facts;
            ty = Some(evaluated.ty);
        }

        let ty = match ty {
            Some(ty) => ty,
            None => self.resolver.builtins()?.unit,
        };

        if !truncated {
            self.delta.record_type(*block, ty);
            self.delta.record_flow(*block, &facts);
        }

        Ok(Evaluated::plain(ty, facts, truncated))
    }

    // Returns the scope visible after the statement together with the
    // statement's evaluation.
    fn resolve_statement(
        &mut self,
        statement: &ElementRef,
        scope: &ResolutionScope,
        facts: &FlowFacts,
    ) -> ResolveResult<(ResolutionScope, Evaluated)> {
        let tree = self.resolver.tree();

        let Some(element) = statement.deref(tree) else {
            return Ok((scope.clone(), Evaluated::plain(Ty::Unresolved, facts.clone(), false)));
        };

        let (next_scope, evaluated) = match element.kind {
            SyntaxKind::LocalVariable => {
                self.delta.record_scope(*statement, scope);

                let declared = match element.child_of(tree, SyntaxKind::TypeRef) {
                    Some(type_ref) => {
                        Some(self.resolver.resolve_type_ref(&type_ref, scope, &mut self.delta)?)
                    }

                    None => None,
                };

                let (initializer_ty, facts, truncated) = match element.expression_child(tree) {
                    Some(initializer) => {
                        let initializer = self.resolve_expression(&initializer, scope, facts)?;

                        let facts = initializer.facts.assign(*statement, initializer.ty);

                        (initializer.ty, facts, initializer.truncated)
                    }

                    None => (Ty::Unresolved, facts.clone(), false),
                };

                let ty = declared.unwrap_or(initializer_ty);

                let next_scope = scope.with(ScopeLayer::Locals(vec![(
                    element.text.clone().unwrap_or_default(),
                    Symbol::Local {
                        declaration: *statement,
                        ty,
                    },
                )]));

                if !truncated {
                    self.delta.record_variable_type(*statement, ty);
                }

                let unit = self.resolver.builtins()?.unit;

                (next_scope, Evaluated::plain(unit, facts, truncated))
            }

            SyntaxKind::Assignment => {
                self.delta.record_scope(*statement, scope);

                let mut operands = element.children.iter();

                let target = match operands.next() {
                    Some(target) => self.resolve_expression(target, scope, facts)?,
                    None => Evaluated::plain(Ty::Unresolved, facts.clone(), false),
                };

                let value = match operands.next() {
                    Some(value) => self.resolve_expression(value, scope, &target.facts)?,
                    None => Evaluated::truncated(&target.facts),
                };

                let key = target
                    .symbol
                    .as_ref()
                    .and_then(|symbol| self.resolver.variable_key(symbol));

                let facts = match key {
                    Some(key) => value.facts.assign(key, value.ty),
                    None => value.facts,
                };

                let unit = self.resolver.builtins()?.unit;

                (
                    scope.clone(),
                    Evaluated::plain(unit, facts, target.truncated || value.truncated),
                )
            }

            SyntaxKind::Return => {
                self.delta.record_scope(*statement, scope);

                let (facts, truncated) = match element.expression_child(tree) {
                    Some(value) => {
                        let value = self.resolve_expression(&value, scope, facts)?;

                        (value.facts, value.truncated)
                    }

                    None => (facts.clone(), false),
                };

                let nothing = self.resolver.builtins()?.nothing;

                (scope.clone(), Evaluated::plain(nothing, facts, truncated))
            }

            kind if kind.is_expression() => {
                let evaluated = self.resolve_expression(statement, scope, facts)?;

                (scope.clone(), evaluated)
            }

            _ => {
                return Ok((scope.clone(), Evaluated::plain(Ty::Unresolved, facts.clone(), false)));
            }
        };

        if !evaluated.truncated {
            self.delta.record_accumulated_scope(*statement, &next_scope);
            self.delta.record_flow(*statement, &evaluated.facts);
        }

        Ok((next_scope, evaluated))
    }

    pub(crate) fn resolve_expression(
        &mut self,
        expression: &ElementRef,
        scope: &ResolutionScope,
        facts: &FlowFacts,
    ) -> ResolveResult<Evaluated> {
        let tree = self.resolver.tree();

        if self.filter.skips(tree, expression) {
            return Ok(Evaluated::truncated(facts));
        }

        let Some(element) = expression.deref(tree) else {
            return Ok(Evaluated::plain(Ty::Unresolved, facts.clone(), false));
        };

        if element.kind == SyntaxKind::Block {
            return self.resolve_block(expression, scope, facts);
        }

        self.delta.record_scope(*expression, scope);

        let evaluated = match element.kind {
            SyntaxKind::IntLiteral | SyntaxKind::StringLiteral | SyntaxKind::BoolLiteral => {
                let ty = self.type_of(element.kind, element.text(), &[], Ty::Unresolved)?;

                Evaluated::plain(ty, facts.clone(), false)
            }

            SyntaxKind::NameRef | SyntaxKind::This => {
                let name = match element.kind {
                    SyntaxKind::This => "this",
                    _ => element.text(),
                };

                let symbols = self.resolver.lookup(scope, name, |candidates| Ok(candidates))?;

                self.finish_reference(expression, element.kind, symbols, scope, name, facts)?
            }

            SyntaxKind::Call => self.resolve_call(expression, scope, facts)?,

            SyntaxKind::DotQualified => self.resolve_dot_qualified(expression, scope, facts)?,

            SyntaxKind::Binary => {
                let mut operands = element.children.iter();

                let left = match operands.next() {
                    Some(left) => self.resolve_expression(left, scope, facts)?,
                    None => Evaluated::truncated(facts),
                };

                let logical_and = element.text() == "&&";

                let right_facts = match logical_and {
                    true => &left.narrowed,
                    false => &left.facts,
                };

                let right = match operands.next() {
                    Some(right) => self.resolve_expression(right, scope, right_facts)?,
                    None => Evaluated::truncated(right_facts),
                };

                let ty = self.type_of(
                    SyntaxKind::Binary,
                    element.text(),
                    &[left.ty, right.ty],
                    Ty::Unresolved,
                )?;

                let (facts, narrowed) = match logical_and {
                    true => (left.facts.join(&right.facts), right.narrowed),

                    false => match element.text() {
                        "||" => {
                            let facts = left.facts.join(&right.facts);

                            (facts.clone(), facts)
                        }

                        _ => (right.facts.clone(), right.facts),
                    },
                };

                Evaluated {
                    ty,
                    facts,
                    narrowed,
                    symbol: None,
                    truncated: left.truncated || right.truncated,
                }
            }

            SyntaxKind::IsCheck => {
                let subject = match element.expression_child(tree) {
                    Some(subject) => self.resolve_expression(&subject, scope, facts)?,
                    None => Evaluated::truncated(facts),
                };

                let checked = match element.child_of(tree, SyntaxKind::TypeRef) {
                    Some(type_ref) => {
                        self.resolver.resolve_type_ref(&type_ref, scope, &mut self.delta)?
                    }

                    None => Ty::Unresolved,
                };

                let key = subject
                    .symbol
                    .as_ref()
                    .and_then(|symbol| self.resolver.variable_key(symbol));

                let narrowed = match key {
                    Some(key) => subject.facts.narrow(key, checked),
                    None => subject.facts.clone(),
                };

                let ty = self.type_of(SyntaxKind::IsCheck, "is", &[subject.ty, checked], Ty::Unresolved)?;

                Evaluated {
                    ty,
                    facts: subject.facts,
                    narrowed,
                    symbol: None,
                    truncated: subject.truncated,
                }
            }

            SyntaxKind::If => {
                let mut branches = element.children.iter();

                let condition = match branches.next() {
                    Some(condition) => self.resolve_expression(condition, scope, facts)?,
                    None => Evaluated::truncated(facts),
                };

                let then_branch = match branches.next() {
                    Some(branch) => self.resolve_expression(branch, scope, &condition.narrowed)?,
                    None => Evaluated::truncated(&condition.narrowed),
                };

                let else_branch = match branches.next() {
                    Some(branch) => self.resolve_expression(branch, scope, &condition.facts)?,
                    None => {
                        let unit = self.resolver.builtins()?.unit;

                        Evaluated::plain(unit, condition.facts.clone(), false)
                    }
                };

                let ty = self.type_of(
                    SyntaxKind::If,
                    "if",
                    &[then_branch.ty, else_branch.ty],
                    Ty::Unresolved,
                )?;

                Evaluated::plain(
                    ty,
                    then_branch.facts.join(&else_branch.facts),
                    condition.truncated || then_branch.truncated || else_branch.truncated,
                )
            }

            _ => Evaluated::plain(Ty::Unresolved, facts.clone(), false),
        };

        if !evaluated.truncated {
            self.delta.record_type(*expression, evaluated.ty);
            self.delta.record_flow(*expression, &evaluated.facts);
        }

        Ok(evaluated)
    }

    fn resolve_call(
        &mut self,
        call: &ElementRef,
        scope: &ResolutionScope,
        facts: &FlowFacts,
    ) -> ResolveResult<Evaluated> {
        let tree = self.resolver.tree();

        let Some(element) = call.deref(tree) else {
            return Ok(Evaluated::truncated(facts));
        };

        let mut facts = facts.clone();
        let mut truncated = false;
        let mut arity = 0;

        if let Some(arguments) = element.child_of(tree, SyntaxKind::ValueArgs) {
            if let Some(arguments) = arguments.deref(tree) {
                for argument in &arguments.children {
                    let evaluated = self.resolve_expression(argument, scope, &facts)?;

                    facts = evaluated.facts;
                    truncated = truncated || evaluated.truncated;
                    arity += 1;
                }
            }
        }

        let Some(callee) = element.child_of(tree, SyntaxKind::NameRef) else {
            return Ok(Evaluated::plain(Ty::Unresolved, facts, truncated));
        };

        if self.filter.skips(tree, &callee) {
            return Ok(Evaluated::truncated(&facts));
        }

        self.delta.record_scope(callee, scope);

        let name = callee.deref(tree).map(|callee| callee.text()).unwrap_or_default();

        let resolver = self.resolver;

        let symbols = resolver.lookup(scope, name, |candidates| {
            let mut accepted = Vec::new();

            for candidate in candidates {
                let Symbol::Descriptor(descriptor) = candidate else {
                    continue;
                };

                match resolver.kind_of(descriptor) {
                    DescriptorKind::Function => {
                        if resolver.contents(descriptor)?.as_ref().parameters.len() == arity {
                            accepted.push(Symbol::Descriptor(descriptor));
                        }
                    }

                    DescriptorKind::Class => {
                        let contents = resolver.contents(descriptor)?;

                        let constructors = contents
                            .as_ref()
                            .primary_constructor
                            .iter()
                            .chain(contents.as_ref().secondary_constructors.iter())
                            .copied()
                            .collect::<Vec<_>>();

                        for constructor in constructors {
                            if resolver.contents(constructor)?.as_ref().parameters.len() == arity {
                                accepted.push(Symbol::Descriptor(constructor));
                            }
                        }
                    }

                    _ => (),
                }
            }

            Ok(accepted)
        })?;

        let reference = resolver.reference_of(symbols, scope, name)?;

        let symbol_type = match reference.descriptor() {
            Some(descriptor) => resolver.contents(descriptor)?.as_ref().ty.unwrap_or_default(),
            None => Ty::Unresolved,
        };

        self.delta.record_reference(callee, reference);

        let ty = self.type_of(SyntaxKind::Call, name, &[], symbol_type)?;

        Ok(Evaluated::plain(ty, facts, truncated))
    }

    fn resolve_dot_qualified(
        &mut self,
        expression: &ElementRef,
        scope: &ResolutionScope,
        facts: &FlowFacts,
    ) -> ResolveResult<Evaluated> {
        let tree = self.resolver.tree();

        let Some(element) = expression.deref(tree) else {
            return Ok(Evaluated::truncated(facts));
        };

        let mut parts = element.children.iter();

        let receiver = match parts.next() {
            Some(receiver) => self.resolve_expression(receiver, scope, facts)?,
            None => return Ok(Evaluated::truncated(facts)),
        };

        let Some(selector) = parts.next() else {
            return Ok(Evaluated::truncated(&receiver.facts));
        };

        let selector_scope = self.selector_scope(&receiver)?;

        let selected = self.resolve_expression(selector, &selector_scope, &receiver.facts)?;

        Ok(Evaluated {
            truncated: receiver.truncated || selected.truncated,
            ..selected
        })
    }

    // Members of the receiver: package members for packages, class members
    // for classes and for values of class types.
    fn selector_scope(&self, receiver: &Evaluated) -> ResolveResult<ResolutionScope> {
        match &receiver.symbol {
            Some(symbol @ Symbol::Package(_)) => {
                return Ok(self.resolver.qualifier_scope(symbol));
            }

            Some(symbol @ Symbol::Descriptor(descriptor))
                if self.resolver.kind_of(*descriptor) == DescriptorKind::Class
                    && receiver.ty == Ty::Unresolved =>
            {
                return Ok(self.resolver.qualifier_scope(symbol));
            }

            _ => (),
        }

        let class = match receiver.ty {
            Ty::Class(class) => Some(class),

            Ty::Parameter(parameter) => self
                .resolver
                .contents(parameter)?
                .as_ref()
                .bounds
                .iter()
                .find_map(|bound| match bound {
                    Ty::Class(class) => Some(*class),
                    _ => None,
                }),

            Ty::Unresolved => None,
        };

        match class {
            Some(class) => Ok(ResolutionScope::new(vec![ScopeLayer::Members(class)])),
            None => Ok(ResolutionScope::empty()),
        }
    }

    fn finish_reference(
        &mut self,
        element: &ElementRef,
        kind: SyntaxKind,
        symbols: Vec<Symbol>,
        scope: &ResolutionScope,
        name: &str,
        facts: &FlowFacts,
    ) -> ResolveResult<Evaluated> {
        let reference = self.resolver.reference_of(symbols, scope, name)?;

        let (symbol, symbol_type) = match &reference {
            Reference::Resolved(symbol) => {
                let ty = match (kind, symbol) {
                    (SyntaxKind::This, Symbol::Descriptor(class)) => Ty::Class(*class),
                    _ => self.resolver.value_type(symbol, facts)?,
                };

                (Some(symbol.clone()), ty)
            }

            _ => (None, Ty::Unresolved),
        };

        self.delta.record_reference(*element, reference);

        let ty = self.type_of(kind, name, &[], symbol_type)?;

        Ok(Evaluated {
            ty,
            facts: facts.clone(),
            narrowed: facts.clone(),
            symbol,
            truncated: false,
        })
    }

    #[inline(always)]
    fn type_of(
        &self,
        kind: SyntaxKind,
        text: &str,
        operands: &[Ty],
        symbol_type: Ty,
    ) -> ResolveResult<Ty> {
        let builtins = self.resolver.builtins()?;

        Ok(self
            .resolver
            .session
            .collaborators
            .typer
            .expression_type(&TypeQuery {
                kind,
                text,
                operands,
                symbol_type,
                builtins: &builtins,
            }))
    }
}
