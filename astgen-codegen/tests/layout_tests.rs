//! Tests for layouts of the emitted records

use astgen_codegen::layout::find_field;
use astgen_codegen::{declarations_unit, EmitOptions, LayoutEngine, TargetModel};
use astgen_schema::{builtin_registry, registry_from_tables};

#[test]
fn test_variants_start_with_their_base_record() {
    let registry = builtin_registry().unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    for (family, variant) in registry.variants() {
        let base = engine.record_layout(family.base_name()).unwrap();
        let layout = engine.record_layout(&variant.name).unwrap();

        let first = layout.first_member().unwrap();
        assert_eq!(first.name, "self", "{}", variant.name);
        assert_eq!(first.offset, 0, "{}", variant.name);

        // The embedded member must be laid out exactly like the base record
        let embedded = engine.record_layout(first.field_type.type_name()).unwrap();
        assert_eq!(embedded.fields, base.fields, "{}", variant.name);
        assert_eq!(first.size, base.size, "{}", variant.name);
        assert_eq!(first.align, base.align, "{}", variant.name);

        // Every base member lies inside the embedded prefix
        for member in &base.fields {
            assert!(
                member.offset + member.size <= first.size,
                "{}.{}",
                variant.name,
                member.name
            );
        }

        // Variant members never overlap the base prefix
        for member in &layout.fields[1..] {
            assert!(member.offset >= base.size, "{}.{}", variant.name, member.name);
        }
        assert!(layout.size >= base.size);
    }
}

#[test]
fn test_prefix_of_base_with_extras() {
    let registry = registry_from_tables(&[(
        "expr",
        &["Expr : Node self, Token name, int flag", "Pair : char tag, Expr* left"] as &[&str],
    )])
    .unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    // Node 0..24, Token 24..48, int 48..52, padded to 56
    let base = engine.record_layout("Expr").unwrap();
    assert_eq!(find_field(&base, "name").unwrap().offset, 24);
    assert_eq!(find_field(&base, "flag").unwrap().offset, 48);
    assert_eq!(find_field(&base, "flag").unwrap().size, 4);
    assert_eq!(base.size, 56);

    let pair = engine.record_layout("Pair").unwrap();
    let embedded = find_field(&pair, "self").unwrap();
    assert_eq!((embedded.offset, embedded.size), (0, 56));
    assert_eq!(find_field(&pair, "tag").unwrap().offset, 56);
    assert_eq!(find_field(&pair, "left").unwrap().offset, 64);
    assert_eq!(pair.size, 72);
}

#[test]
fn test_node_header_layout() {
    let registry = builtin_registry().unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    let node = engine.record_layout("Node").unwrap();
    assert_eq!(find_field(&node, "type").unwrap().offset, 0);
    assert_eq!(find_field(&node, "lineno").unwrap().offset, 4);
    assert_eq!(find_field(&node, "isMarked").unwrap().offset, 8);
    assert_eq!(find_field(&node, "next").unwrap().offset, 16);
    assert_eq!(node.size, 24);

    // Every base record embeds the header at offset 0
    for family in registry.families() {
        let base = engine.record_layout(family.base_name()).unwrap();
        let header = find_field(&base, "self").unwrap();
        assert_eq!(header.offset, 0);
        assert_eq!(header.size, node.size);
    }
}

#[test]
fn test_base_with_extra_fields() {
    let registry = builtin_registry().unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    // Parameter: Node self (24), Token name (24), TypeNode* type (8)
    let parameter = engine.record_layout("Parameter").unwrap();
    assert_eq!(parameter.size, 56);

    let keyword = engine.record_layout("Keyword").unwrap();
    let default = find_field(&keyword, "default_").unwrap();
    assert_eq!(default.offset, 56);
    assert_eq!(keyword.size, 64);
}

#[test]
fn test_empty_variant_is_exactly_its_base() {
    let registry = registry_from_tables(&[(
        "stmt",
        &["Stmt : Node self", "Pass : "] as &[&str],
    )])
    .unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    let base = engine.record_layout("Stmt").unwrap();
    let pass = engine.record_layout("Pass").unwrap();
    assert_eq!(pass.fields.len(), 1);
    assert_eq!(pass.size, base.size);
}

#[test]
fn test_container_layout() {
    let registry = builtin_registry().unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let model = TargetModel::lp64();
    let mut engine = LayoutEngine::new(&unit, &model);

    let array = engine.record_layout("StmtArray").unwrap();
    assert_eq!(find_field(&array, "count").unwrap().offset, 0);
    assert_eq!(find_field(&array, "capacity").unwrap().offset, 4);
    assert_eq!(find_field(&array, "stmts").unwrap().offset, 8);
    assert_eq!(array.size, 16);
}
