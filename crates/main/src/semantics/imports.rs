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

use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use lady_deirdre::{analysis::TaskHandle, sync::Shared};
use log::trace;

use crate::{
    analysis::{ForeignSymbolLoader, ResolveResult},
    report::debug_unreachable,
    semantics::{
        binding::BindingDelta,
        FqName,
        Reference,
        ResolutionScope,
        Resolver,
        ScopeLayer,
        Symbol,
        RESOLVE_LOG,
    },
    syntax::{ElementRef, SyntaxKind, SyntaxTree},
};

// A non-star import: the symbols bound to the alias.
pub(crate) struct ExplicitImport {
    pub(crate) alias: CompactString,
    pub(crate) symbols: Vec<Symbol>,
}

// Resolved imports of a file or a code fragment.
pub(crate) struct FileImports {
    pub(crate) explicit: Vec<ExplicitImport>,
    pub(crate) star: Vec<FqName>,
    pub(crate) delta: BindingDelta,
}

// Files grouped by their packages, and all package names known to the
// session, including the packages of the foreign symbols.
pub(crate) struct PackageIndex {
    files: AHashMap<FqName, Vec<ElementRef>>,
    known: AHashSet<FqName>,
}

impl PackageIndex {
    pub(crate) fn new(tree: &SyntaxTree, loader: &dyn ForeignSymbolLoader) -> Self {
        let mut files = AHashMap::<FqName, Vec<ElementRef>>::new();
        let mut known = AHashSet::new();

        for file in tree.files() {
            let package = FqName::from_segments(tree.package_segments(&file));

            Self::register(&mut known, &package);

            files.entry(package).or_default().push(file);
        }

        for package in loader.packages() {
            Self::register(&mut known, &package);
        }

        Self { files, known }
    }

    #[inline(always)]
    pub(crate) fn files(&self, package: &FqName) -> &[ElementRef] {
        match self.files.get(package) {
            Some(files) => files.as_slice(),
            None => &[],
        }
    }

    #[inline(always)]
    pub(crate) fn contains(&self, package: &FqName) -> bool {
        self.known.contains(package)
    }

    pub(crate) fn root_names(&self) -> impl Iterator<Item = CompactString> + '_ {
        self.known
            .iter()
            .filter(|package| package.segments().len() == 1)
            .map(|package| CompactString::from(package.last()))
    }

    fn register(known: &mut AHashSet<FqName>, package: &FqName) {
        for length in 1..=package.segments().len() {
            let _ = known.insert(package.prefix(length));
        }
    }
}

impl<'s, H: TaskHandle> Resolver<'s, H> {
    // Returns the resolved imports of the root, resolving all of them on
    // first request.
    pub(crate) fn file_imports(&self, root: &ElementRef) -> ResolveResult<Shared<FileImports>> {
        if let Some(imports) = self.session.imports.get(root) {
            return Ok(Shared::clone(&imports));
        }

        let imports = Shared::new(self.resolve_imports(root)?);

        let shard_index = self.session.imports.shard_index_of(root);

        let shard = match self.session.imports.shards().get(shard_index) {
            Some(shard) => shard,

            // Safety: shard_index_of always returns a valid shard index.
            None => unsafe { debug_unreachable!("Shard index out of bounds.") },
        };

        let mut guard = shard.write().unwrap_or_else(|poison| poison.into_inner());

        Ok(guard.entry(*root).or_insert(imports).clone())
    }

    fn resolve_imports(&self, root: &ElementRef) -> ResolveResult<FileImports> {
        let tree = self.tree();

        let mut imports = FileImports {
            explicit: Vec::new(),
            star: Vec::new(),
            delta: BindingDelta::new(),
        };

        let Some(root_element) = root.deref(tree) else {
            return Ok(imports);
        };

        for directive in root_element.children_of(tree, SyntaxKind::ImportDirective) {
            self.checkpoint()?;

            let Some(element) = directive.deref(tree) else {
                continue;
            };

            let segments = element
                .children_of(tree, SyntaxKind::NameRef)
                .collect::<Vec<_>>();

            let is_star = element.child_of(tree, SyntaxKind::Star).is_some();

            let Some(symbols) = self.resolve_import_path(&segments, is_star, &mut imports.delta)?
            else {
                continue;
            };

            match is_star {
                true => {
                    let Some(Symbol::Package(package)) = symbols.first() else {
                        continue;
                    };

                    imports.star.push(package.clone());
                }

                false => {
                    let alias = match &element.text {
                        Some(alias) => alias.clone(),

                        None => match segments.last().and_then(|last| last.deref(tree)) {
                            Some(last) => CompactString::from(last.text()),
                            None => continue,
                        },
                    };

                    imports.explicit.push(ExplicitImport {
                        alias,
                        symbols: symbols.clone(),
                    });
                }
            }

            let reference = match symbols.len() {
                1 => Reference::Resolved(symbols[0].clone()),
                _ => Reference::Ambiguous(symbols),
            };

            imports.delta.record_import(directive, reference);
        }

        trace!(
            target: RESOLVE_LOG,
            "[{root}] {} explicit and {} star imports resolved.",
            imports.explicit.len(),
            imports.star.len(),
        );

        Ok(imports)
    }

    // Resolves the qualified import path segment by segment, recording the
    // reference of every segment. Returns None if the path cannot be
    // resolved.
    fn resolve_import_path(
        &self,
        segments: &[ElementRef],
        is_star: bool,
        delta: &mut BindingDelta,
    ) -> ResolveResult<Option<Vec<Symbol>>> {
        let tree = self.tree();

        let mut receiver = Symbol::Package(FqName::root());
        let mut symbols = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            let name = match segment.deref(tree) {
                Some(segment) => segment.text(),
                None => return Ok(None),
            };

            let is_last = index + 1 == segments.len();

            symbols = self.qualified_member(&receiver, name)?;

            // Packages are only resolved where a package is expected.
            if !is_last || is_star {
                let package = symbols
                    .iter()
                    .find(|symbol| matches!(symbol, Symbol::Package(_)));

                if let Some(package) = package {
                    symbols = vec![package.clone()];
                }
            } else {
                symbols.retain(|symbol| !matches!(symbol, Symbol::Package(_)));
            }

            let reference = self.reference_of(
                symbols.clone(),
                &self.qualifier_scope(&receiver),
                name,
            )?;

            let resolved = reference.symbol().cloned();

            delta.record_reference(*segment, reference);

            if is_last {
                break;
            }

            match resolved {
                Some(next) => receiver = next,
                None => return Ok(None),
            }
        }

        match symbols.is_empty() {
            true => Ok(None),
            false => Ok(Some(symbols)),
        }
    }

    // The scope in which the names qualified by the receiver are looked up.
    pub(crate) fn qualifier_scope(&self, receiver: &Symbol) -> ResolutionScope {
        match receiver {
            Symbol::Package(package) if package.is_root() => {
                ResolutionScope::new(vec![ScopeLayer::RootPackages])
            }

            Symbol::Package(package) => {
                ResolutionScope::new(vec![ScopeLayer::Package(package.clone())])
            }

            Symbol::Descriptor(descriptor) => {
                ResolutionScope::new(vec![ScopeLayer::Members(*descriptor)])
            }

            Symbol::Local { .. } => ResolutionScope::empty(),
        }
    }
}
