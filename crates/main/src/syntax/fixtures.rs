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

// Small syntax trees shared by the unit tests. Each fixture lowers a short
// program through the TreeBuilder and keeps references to the elements the
// tests inspect.

use crate::syntax::{ElementRef, SyntaxKind, SyntaxTree, TreeBuilder};

// fun compute(x: Int) {
//     var a = 1
//     var b = "s"
//     a + x
//     var c = a
//     b = "t"
// }
pub(crate) struct FiveStatements {
    pub(crate) tree: SyntaxTree,
    pub(crate) function: ElementRef,
    pub(crate) parameter: ElementRef,
    pub(crate) body: ElementRef,
    pub(crate) statements: Vec<ElementRef>,
    pub(crate) a_use: ElementRef,
}

pub(crate) fn five_statements() -> FiveStatements {
    let mut builder = TreeBuilder::new();
    let mut statements = Vec::new();

    builder.start(SyntaxKind::File);

    let function = builder.start_named(SyntaxKind::Function, "compute");

    builder.start(SyntaxKind::ParameterList);
    let parameter = builder.start_named(SyntaxKind::Parameter, "x");
    builder.leaf(SyntaxKind::TypeRef, "Int");
    builder.finish();
    builder.finish();

    let body = builder.start(SyntaxKind::Block);

    statements.push(builder.start_named(SyntaxKind::LocalVariable, "a"));
    builder.leaf(SyntaxKind::IntLiteral, "1");
    builder.finish();

    statements.push(builder.start_named(SyntaxKind::LocalVariable, "b"));
    builder.leaf(SyntaxKind::StringLiteral, "s");
    builder.finish();

    statements.push(builder.start_named(SyntaxKind::Binary, "+"));
    let a_use = builder.leaf(SyntaxKind::NameRef, "a");
    builder.leaf(SyntaxKind::NameRef, "x");
    builder.finish();

    statements.push(builder.start_named(SyntaxKind::LocalVariable, "c"));
    builder.leaf(SyntaxKind::NameRef, "a");
    builder.finish();

    statements.push(builder.start(SyntaxKind::Assignment));
    builder.leaf(SyntaxKind::NameRef, "b");
    builder.leaf(SyntaxKind::StringLiteral, "t");
    builder.finish();

    builder.finish();
    builder.finish();
    builder.finish();

    FiveStatements {
        tree: builder.build(),
        function,
        parameter,
        body,
        statements,
        a_use,
    }
}

// package app.core
//
// @Deprecated
// fun <T : Any> run() { run }
//
// class Point(x: Int) : Base(1)
//
// Fragment in the context of Point: x
pub(crate) struct ClassifierTree {
    pub(crate) tree: SyntaxTree,
    pub(crate) file: ElementRef,
    pub(crate) package_segment: ElementRef,
    pub(crate) function: ElementRef,
    pub(crate) annotation: ElementRef,
    pub(crate) annotation_name: ElementRef,
    pub(crate) type_parameter: ElementRef,
    pub(crate) type_parameter_bound: ElementRef,
    pub(crate) body_name: ElementRef,
    pub(crate) class: ElementRef,
    pub(crate) constructor_parameter: ElementRef,
    pub(crate) delegation_list: ElementRef,
    pub(crate) super_call_argument: ElementRef,
    pub(crate) fragment: ElementRef,
    pub(crate) fragment_name: ElementRef,
}

pub(crate) fn classifier_tree() -> ClassifierTree {
    let mut builder = TreeBuilder::new();

    let file = builder.start(SyntaxKind::File);

    builder.start(SyntaxKind::PackageDirective);
    let package_segment = builder.leaf(SyntaxKind::NameRef, "app");
    builder.leaf(SyntaxKind::NameRef, "core");
    builder.finish();

    let function = builder.start_named(SyntaxKind::Function, "run");

    let annotation = builder.start(SyntaxKind::AnnotationEntry);
    let annotation_name = builder.leaf(SyntaxKind::TypeRef, "Deprecated");
    builder.finish();

    builder.start(SyntaxKind::TypeParameterList);
    let type_parameter = builder.start_named(SyntaxKind::TypeParameter, "T");
    let type_parameter_bound = builder.leaf(SyntaxKind::TypeRef, "Any");
    builder.finish();
    builder.finish();

    builder.empty_leaf(SyntaxKind::ParameterList);

    builder.start(SyntaxKind::Block);
    let body_name = builder.leaf(SyntaxKind::NameRef, "run");
    builder.finish();

    builder.finish();

    let class = builder.start_named(SyntaxKind::Class, "Point");

    builder.start(SyntaxKind::PrimaryConstructor);
    builder.start(SyntaxKind::PrimaryConstructorParameterList);
    let constructor_parameter = builder.start_named(SyntaxKind::Parameter, "x");
    builder.leaf(SyntaxKind::TypeRef, "Int");
    builder.finish();
    builder.finish();
    builder.finish();

    let delegation_list = builder.start(SyntaxKind::DelegationList);
    builder.start(SyntaxKind::SuperTypeCall);
    builder.leaf(SyntaxKind::TypeRef, "Base");
    builder.start(SyntaxKind::ValueArgs);
    let super_call_argument = builder.leaf(SyntaxKind::IntLiteral, "1");
    builder.finish();
    builder.finish();
    builder.finish();

    builder.finish();
    builder.finish();

    let fragment = builder.start(SyntaxKind::CodeFragment);
    let fragment_name = builder.leaf(SyntaxKind::NameRef, "x");
    builder.finish();

    builder.set_context(fragment, class);

    ClassifierTree {
        tree: builder.build(),
        file,
        package_segment,
        function,
        annotation,
        annotation_name,
        type_parameter,
        type_parameter_bound,
        body_name,
        class,
        constructor_parameter,
        delegation_list,
        super_call_argument,
        fragment,
        fragment_name,
    }
}

// fun main() {
//     var a: Any = 1
//     var b = 2
//     a = "s"
// }
//
// Fragment in the context of the main body: a + b
pub(crate) struct BlockFragment {
    pub(crate) tree: SyntaxTree,
    pub(crate) a_declaration: ElementRef,
    pub(crate) a_initializer: ElementRef,
    pub(crate) b_declaration: ElementRef,
    pub(crate) reassigned: ElementRef,
    pub(crate) fragment: ElementRef,
    pub(crate) sum: ElementRef,
    pub(crate) a_use: ElementRef,
    pub(crate) b_use: ElementRef,
}

pub(crate) fn block_fragment() -> BlockFragment {
    let mut builder = TreeBuilder::new();

    builder.start(SyntaxKind::File);
    builder.start_named(SyntaxKind::Function, "main");
    builder.empty_leaf(SyntaxKind::ParameterList);

    let block = builder.start(SyntaxKind::Block);

    let a_declaration = builder.start_named(SyntaxKind::LocalVariable, "a");
    builder.leaf(SyntaxKind::TypeRef, "Any");
    let a_initializer = builder.leaf(SyntaxKind::IntLiteral, "1");
    builder.finish();

    let b_declaration = builder.start_named(SyntaxKind::LocalVariable, "b");
    builder.leaf(SyntaxKind::IntLiteral, "2");
    builder.finish();

    builder.start(SyntaxKind::Assignment);
    builder.leaf(SyntaxKind::NameRef, "a");
    let reassigned = builder.leaf(SyntaxKind::StringLiteral, "s");
    builder.finish();

    builder.finish();
    builder.finish();
    builder.finish();

    let fragment = builder.start(SyntaxKind::CodeFragment);
    let sum = builder.start_named(SyntaxKind::Binary, "+");
    let a_use = builder.leaf(SyntaxKind::NameRef, "a");
    let b_use = builder.leaf(SyntaxKind::NameRef, "b");
    builder.finish();
    builder.finish();

    builder.set_context(fragment, block);

    BlockFragment {
        tree: builder.build(),
        a_declaration,
        a_initializer,
        b_declaration,
        reassigned,
        fragment,
        sum,
        a_use,
        b_use,
    }
}

// package app
//
// import lib.Vector
// import builtins.String as Text
// import lib.*
//
// fun scale(v: Vector): Matrix
pub(crate) struct ThreeImports {
    pub(crate) tree: SyntaxTree,
    pub(crate) imports: Vec<ElementRef>,
    pub(crate) parameter_type: ElementRef,
    pub(crate) return_type: ElementRef,
}

pub(crate) fn three_imports() -> ThreeImports {
    let mut builder = TreeBuilder::new();
    let mut imports = Vec::new();

    builder.start(SyntaxKind::File);

    builder.start(SyntaxKind::PackageDirective);
    builder.leaf(SyntaxKind::NameRef, "app");
    builder.finish();

    imports.push(builder.start(SyntaxKind::ImportDirective));
    builder.leaf(SyntaxKind::NameRef, "lib");
    builder.leaf(SyntaxKind::NameRef, "Vector");
    builder.finish();

    imports.push(builder.start_named(SyntaxKind::ImportDirective, "Text"));
    builder.leaf(SyntaxKind::NameRef, "builtins");
    builder.leaf(SyntaxKind::NameRef, "String");
    builder.finish();

    imports.push(builder.start(SyntaxKind::ImportDirective));
    builder.leaf(SyntaxKind::NameRef, "lib");
    builder.empty_leaf(SyntaxKind::Star);
    builder.finish();

    builder.start_named(SyntaxKind::Function, "scale");
    builder.start(SyntaxKind::ParameterList);
    builder.start_named(SyntaxKind::Parameter, "v");
    let parameter_type = builder.leaf(SyntaxKind::TypeRef, "Vector");
    builder.finish();
    builder.finish();
    let return_type = builder.leaf(SyntaxKind::TypeRef, "Matrix");
    builder.finish();

    builder.finish();

    ThreeImports {
        tree: builder.build(),
        imports,
        parameter_type,
        return_type,
    }
}

// class A : B
// class B : A
pub(crate) struct MutualSupertypes {
    pub(crate) tree: SyntaxTree,
    pub(crate) class_a: ElementRef,
    pub(crate) class_b: ElementRef,
}

pub(crate) fn mutual_supertypes() -> MutualSupertypes {
    let mut builder = TreeBuilder::new();

    builder.start(SyntaxKind::File);

    let class_a = builder.start_named(SyntaxKind::Class, "A");
    builder.start(SyntaxKind::DelegationList);
    builder.leaf(SyntaxKind::TypeRef, "B");
    builder.finish();
    builder.finish();

    let class_b = builder.start_named(SyntaxKind::Class, "B");
    builder.start(SyntaxKind::DelegationList);
    builder.leaf(SyntaxKind::TypeRef, "A");
    builder.finish();
    builder.finish();

    builder.finish();

    MutualSupertypes {
        tree: builder.build(),
        class_a,
        class_b,
    }
}
