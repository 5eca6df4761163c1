mod common;

use class_scanner::bindings::BindingRegistry;
use class_scanner::classfile::AnnotationValue;
use class_scanner::classpath::ClasspathResolver;
use class_scanner::error::ScanError;
use class_scanner::filter::{AllOf, AnnotatedWith, KindIs, NamePrefix};
use class_scanner::model::{Package, Type, TypeKind};
use class_scanner::project::Projector;
use class_scanner::visit::{CollectingVisitor, Walker};

use common::{
    ACC_ABSTRACT, ACC_ANNOTATION, ACC_INTERFACE, ACC_PUBLIC, ACC_STATIC, ClassFileBuilder,
    temp_dir, write_class, write_jar,
};

const MARKED: &str = "Lorg/example/Marked;";
const CONVERT: &str = "Lorg/example/Convert;";

fn resolver(paths: &[std::path::PathBuf]) -> ClasspathResolver {
    ClasspathResolver::from_paths(paths.to_vec()).unwrap()
}

#[test]
fn inspect_reads_structure_from_real_bytes() {
    let root = temp_dir("cs-inspect");
    let bytes = ClassFileBuilder::new("org/example/Widget")
        .implements("java/io/Serializable")
        .annotate_values(MARKED, &[("value", "hello")])
        .field("title", "Ljava/lang/String;")
        .method("run", "(Ljava/lang/String;)V")
        .build();
    write_class(&root, "org/example/Widget", &bytes);

    let resolver = resolver(&[root.clone()]);
    let ty = Type::of(&resolver, "org.example.Widget").unwrap();

    assert_eq!(ty.kind, TypeKind::Class);
    assert_eq!(ty.package_name(), "org.example");
    assert_eq!(ty.superclass_name(), Some("java.lang.Object"));
    assert!(ty.implements("java.io.Serializable"));

    let fields = ty.fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name(), "title");
    assert_eq!(fields[0].type_name().display(), "java.lang.String");

    let methods = ty.methods();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name, "run");
    assert_eq!(methods[0].parameters().len(), 1);
    assert_eq!(methods[0].return_type().display(), "void");

    // No declared constructor: exactly one synthesized zero-argument one.
    let ctors = ty.constructors();
    assert_eq!(ctors.len(), 1);
    assert!(ctors[0].synthesized);

    let annotation = ty.annotation("org.example.Marked").unwrap();
    assert_eq!(
        annotation.value("value"),
        Some(&AnnotationValue::Str("hello".to_string()))
    );
    assert!(ty.annotation("org.example.Absent").is_none());

    let resolved = ty.resolve(&resolver).unwrap();
    assert!(resolved.origin.ends_with("org/example/Widget.class"));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn declared_constructor_suppresses_synthesis_from_real_bytes() {
    let root = temp_dir("cs-ctor");
    let bytes = ClassFileBuilder::new("org/example/Widget")
        .method_flags("<init>", "(I)V", ACC_PUBLIC)
        .build();
    write_class(&root, "org/example/Widget", &bytes);

    let resolver = resolver(&[root.clone()]);
    let ty = Type::of(&resolver, "org.example.Widget").unwrap();
    let ctors = ty.constructors();
    assert_eq!(ctors.len(), 1);
    assert!(!ctors[0].synthesized);
    assert_eq!(ctors[0].parameters().len(), 1);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn first_root_shadows_later_roots() {
    let root_a = temp_dir("cs-shadow-a");
    let root_b = temp_dir("cs-shadow-b");
    write_class(
        &root_a,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget")
            .field("fromA", "I")
            .build(),
    );
    write_class(
        &root_b,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget")
            .field("fromB", "I")
            .build(),
    );

    let ab = resolver(&[root_a.clone(), root_b.clone()]);
    let ty = Type::of(&ab, "org.example.Widget").unwrap();
    assert_eq!(ty.fields()[0].name(), "fromA");

    let ba = resolver(&[root_b.clone(), root_a.clone()]);
    let ty = Type::of(&ba, "org.example.Widget").unwrap();
    assert_eq!(ty.fields()[0].name(), "fromB");

    let _ = std::fs::remove_dir_all(&root_a);
    let _ = std::fs::remove_dir_all(&root_b);
}

#[test]
fn jar_roots_serve_classes() {
    let root = temp_dir("cs-jar");
    let bytes = ClassFileBuilder::new("org/example/Widget")
        .field("title", "Ljava/lang/String;")
        .build();
    let marker = ClassFileBuilder::new("org/example/package-info")
        .flags(ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION)
        .build();
    let jar = root.join("widgets.jar");
    write_jar(
        &jar,
        &[
            ("org/example/Widget.class", bytes),
            ("org/example/package-info.class", marker),
        ],
    );

    let resolver = resolver(&[jar.clone()]);
    let ty = Type::of(&resolver, "org.example.Widget").unwrap();
    assert_eq!(ty.fields().len(), 1);

    let resolved = ty.resolve(&resolver).unwrap();
    assert!(resolved.origin.contains("!/org/example/Widget.class"));

    // The package-info marker never counts as a discoverable class.
    let listed = resolver.list_classes().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "org.example.Widget");

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn walk_visits_in_contract_order() {
    let root = temp_dir("cs-walk");
    write_class(
        &root,
        "org/example/Marker",
        &ClassFileBuilder::new("org/example/Marker")
            .flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .build(),
    );
    write_class(
        &root,
        "org/example/Widget$Inner",
        &ClassFileBuilder::new("org/example/Widget$Inner")
            .implements("org/example/Marker")
            .inner_class(
                "org/example/Widget$Inner",
                Some("org/example/Widget"),
                Some("Inner"),
                0,
            )
            .build(),
    );
    write_class(
        &root,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget")
            .implements("org/example/Marker")
            .annotate(MARKED)
            .field("title", "Ljava/lang/String;")
            .method("run", "(Ljava/lang/String;)V")
            .method_flags("<clinit>", "()V", ACC_STATIC)
            .inner_class(
                "org/example/Widget$Inner",
                Some("org/example/Widget"),
                Some("Inner"),
                0,
            )
            .inner_class("org/example/Widget$1", None, None, 0)
            .build(),
    );

    let resolver = resolver(&[root.clone()]);
    let ty = Type::of(&resolver, "org.example.Widget").unwrap();

    // The anonymous entry never surfaces as a nested class.
    let nested = ty.nested_classes(&resolver).unwrap();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].kind, TypeKind::Inner);

    let mut visitor = CollectingVisitor::default();
    Walker::new(&resolver).walk_type(&ty, &mut visitor).unwrap();

    // Interfaces, nested classes, fields, constructors, methods, static
    // initializers, annotations; Marker is visited once even though the
    // nested class implements it too.
    assert_eq!(
        visitor.lines,
        vec![
            "class org.example.Widget",
            "interface org.example.Marker",
            "inner-class org.example.Widget$Inner",
            "constructor org.example.Widget$Inner#<init>",
            "field org.example.Widget#title",
            "constructor org.example.Widget#<init>",
            "method org.example.Widget#run",
            "parameter org.example.Widget[0]: java.lang.String",
            "static-initializer org.example.Widget#<clinit>",
            "annotation @org.example.Marked on org.example.Widget",
        ]
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn roundtrip_name_skew_is_a_structural_mismatch() {
    let root_a = temp_dir("cs-skew-a");
    let root_b = temp_dir("cs-skew-b");
    write_class(
        &root_a,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget").build(),
    );
    // A stale resource at Widget's path on the second root declares a
    // different fully-qualified name.
    write_class(
        &root_b,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Other").build(),
    );

    let clean = resolver(&[root_a.clone()]);
    let ty = Type::of(&clean, "org.example.Widget").unwrap();
    assert!(ty.resolve(&clean).is_ok());

    let skewed = resolver(&[root_b.clone()]);
    let err = ty.resolve(&skewed).unwrap_err();
    assert!(matches!(err, ScanError::StructuralMismatch { .. }));

    let _ = std::fs::remove_dir_all(&root_a);
    let _ = std::fs::remove_dir_all(&root_b);
}

#[test]
fn declared_annotation_absent_from_live_view_is_a_structural_mismatch() {
    let root_a = temp_dir("cs-mismatch-a");
    let root_b = temp_dir("cs-mismatch-b");
    write_class(
        &root_a,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget")
            .annotate(MARKED)
            .build(),
    );
    write_class(
        &root_b,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget").build(),
    );

    let with = resolver(&[root_a.clone()]);
    let ty = Type::of(&with, "org.example.Widget").unwrap();
    let annotation = ty.annotation("org.example.Marked").unwrap();

    // Against the same classpath the live view agrees.
    let live = annotation.actual(&with).unwrap();
    assert_eq!(live.type_name, "org.example.Marked");

    // Against a classpath whose Widget lost the annotation it does not.
    let without = resolver(&[root_b.clone()]);
    let err = annotation.actual(&without).unwrap_err();
    assert!(matches!(err, ScanError::StructuralMismatch { .. }));

    let _ = std::fs::remove_dir_all(&root_a);
    let _ = std::fs::remove_dir_all(&root_b);
}

#[test]
fn primitive_and_array_names_resolve_to_stand_ins() {
    let root = temp_dir("cs-primitive");
    write_class(
        &root,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget").build(),
    );
    let resolver = resolver(&[root.clone()]);

    let int_ty = Type::of(&resolver, "int").unwrap();
    assert_eq!(int_ty.kind, TypeKind::Primitive);
    assert_eq!(int_ty.name, "java.lang.Integer");

    let array_ty = Type::of(&resolver, "org.example.Widget[]").unwrap();
    assert_eq!(array_ty.kind, TypeKind::Array);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn parameter_annotations_attach_by_position() {
    let root = temp_dir("cs-params");
    write_class(
        &root,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget")
            .method_param_annotated("tag", "(Ljava/lang/String;I)V", 2, CONVERT)
            .build(),
    );

    let resolver = resolver(&[root.clone()]);
    let ty = Type::of(&resolver, "org.example.Widget").unwrap();
    let method = &ty.methods()[0];
    let params = method.parameters();
    assert_eq!(params.len(), 2);
    assert!(params[0].annotation("org.example.Convert").is_some());
    assert!(params[1].annotation("org.example.Convert").is_none());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn projector_filters_after_parsing() {
    let root = temp_dir("cs-project");
    write_class(
        &root,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget").annotate(MARKED).build(),
    );
    write_class(
        &root,
        "org/example/Marker",
        &ClassFileBuilder::new("org/example/Marker")
            .flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .build(),
    );
    write_class(
        &root,
        "org/other/Thing",
        &ClassFileBuilder::new("org/other/Thing").build(),
    );

    let resolver = resolver(&[root.clone()]);
    let projector = Projector::new(&resolver);

    let by_prefix = projector
        .collect(&NamePrefix("org.example".to_string()))
        .unwrap();
    let names: Vec<&str> = by_prefix.iter().map(|p| p.ty.name.as_str()).collect();
    assert_eq!(names, vec!["org.example.Marker", "org.example.Widget"]);
    assert_eq!(by_prefix[0].content_hash.len(), 64);

    let annotated = projector
        .collect(&AnnotatedWith("org.example.Marked".to_string()))
        .unwrap();
    assert_eq!(annotated.len(), 1);
    assert_eq!(annotated[0].ty.name, "org.example.Widget");

    let interfaces = projector.collect(&KindIs(TypeKind::Interface)).unwrap();
    assert_eq!(interfaces.len(), 1);

    let everything = projector.collect(&AllOf::new()).unwrap();
    assert_eq!(everything.len(), 3);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn malformed_class_file_aborts_the_projection() {
    let root = temp_dir("cs-malformed");
    write_class(&root, "bad/Oops", b"this is not a class file");

    let resolver = resolver(&[root.clone()]);
    let err = Projector::new(&resolver).collect(&AllOf::new()).unwrap_err();
    assert!(matches!(err, ScanError::Malformed { .. }));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn bindings_discovered_across_the_classpath() {
    let root = temp_dir("cs-bindings");
    write_class(
        &root,
        "org/example/DateConverter",
        &ClassFileBuilder::new("org/example/DateConverter")
            .method_annotated("toMillis", "(Ljava/util/Date;)J", CONVERT)
            .method("helper", "(I)I")
            .build(),
    );

    let resolver = resolver(&[root.clone()]);
    let registry = BindingRegistry::new("org.example.Convert");
    for projection in Projector::new(&resolver).collect(&AllOf::new()).unwrap() {
        registry.register_from(&projection.ty);
    }

    assert_eq!(registry.bindings().len(), 1);
    let binding = registry.lookup("java.util.Date", "long").unwrap();
    assert_eq!(binding.owner, "org.example.DateConverter");
    assert_eq!(binding.method, "toMillis");
    assert!(registry.lookup("int", "int").is_none());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn package_annotations_come_from_the_package_info_marker() {
    let root = temp_dir("cs-package");
    write_class(
        &root,
        "org/example/package-info",
        &ClassFileBuilder::new("org/example/package-info")
            .flags(ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION)
            .annotate(MARKED)
            .build(),
    );
    write_class(
        &root,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget").build(),
    );

    let resolver = resolver(&[root.clone()]);

    let annotated = Package::new("org.example").annotations(&resolver).unwrap();
    assert_eq!(annotated.len(), 1);
    assert_eq!(annotated[0].type_name, "org.example.Marked");

    // No marker means no annotations, not an error.
    let bare = Package::new("org.other").annotations(&resolver).unwrap();
    assert!(bare.is_empty());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn package_lists_immediate_members_and_walks_them() {
    let root = temp_dir("cs-package-walk");
    write_class(
        &root,
        "org/example/Widget",
        &ClassFileBuilder::new("org/example/Widget").build(),
    );
    write_class(
        &root,
        "org/example/sub/Deep",
        &ClassFileBuilder::new("org/example/sub/Deep").build(),
    );
    write_class(
        &root,
        "org/example/package-info",
        &ClassFileBuilder::new("org/example/package-info")
            .flags(ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION)
            .annotate(MARKED)
            .build(),
    );

    let resolver = resolver(&[root.clone()]);
    let package = Package::new("org.example");

    // Immediate members only: no nested packages, no package-info marker.
    let members = package.classes(&resolver).unwrap();
    assert_eq!(members, vec!["org.example.Widget"]);

    let mut visitor = CollectingVisitor::default();
    Walker::new(&resolver)
        .walk_package(&package, &mut visitor)
        .unwrap();
    assert_eq!(visitor.lines[0], "package org.example");
    assert!(visitor.lines.contains(&"class org.example.Widget".to_string()));
    assert!(!visitor.lines.iter().any(|line| line.contains("Deep")));

    let _ = std::fs::remove_dir_all(&root);
}
