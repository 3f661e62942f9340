//! Discriminator & Struct Emitter
//!
//! Builds the declarations unit: prelude enums, the global `NodeType`
//! discriminator, the shared node header, each family's base record and
//! container with its operation prototypes, and finally one record per
//! variant whose first member embeds the family base by value.

use crate::c_model::{CEnum, CFunction, CItem, CRecord, CUnit, RecordKind};
use crate::operations::{container_operations, MIN_CAPACITY};
use crate::EmitOptions;
use astgen_schema::{
    Family, Field, Registry, TypeSpec, Variant, DISCRIMINATOR_TYPE, HEADER_MEMBER,
    NODE_HEADER_TYPE,
};
use log::{debug, trace};

/// The discriminator enum, one entry per variant in registry order
pub fn discriminator_enum(registry: &Registry) -> CEnum {
    CEnum {
        name: DISCRIMINATOR_TYPE.to_string(),
        members: registry
            .discriminators()
            .iter()
            .map(|d| d.name.clone())
            .collect(),
    }
}

/// Shared prefix of every node: tag, source line, mark bit and the collector's link
pub fn node_header_record() -> CRecord {
    CRecord::new(
        NODE_HEADER_TYPE,
        RecordKind::TaggedTypedef,
        vec![
            Field::new(TypeSpec::value(DISCRIMINATOR_TYPE), "type"),
            Field::new(TypeSpec::value("int"), "lineno"),
            Field::new(TypeSpec::value("bool"), "isMarked"),
            Field::new(
                TypeSpec::pointer(&format!("struct {}", NODE_HEADER_TYPE)),
                "next",
            ),
        ],
    )
}

/// `Node* allocateNode(size_t size, NodeType type);`, implemented by the interpreter
pub fn allocate_node_prototype() -> CFunction {
    CFunction {
        return_type: TypeSpec::pointer(NODE_HEADER_TYPE),
        name: "allocateNode".to_string(),
        params: vec![
            Field::new(TypeSpec::value("size_t"), "size"),
            Field::new(TypeSpec::value(DISCRIMINATOR_TYPE), "type"),
        ],
        body: Vec::new(),
    }
}

pub fn base_record(family: &Family) -> CRecord {
    CRecord::new(family.base_name(), RecordKind::Typedef, family.base.fields.clone())
}

pub fn container_record(family: &Family) -> CRecord {
    let buffer = TypeSpec::new(family.base_name(), 2);
    CRecord::new(
        &family.container_type(),
        RecordKind::Typedef,
        vec![
            Field::new(TypeSpec::value("int"), "count"),
            Field::new(TypeSpec::value("int"), "capacity"),
            Field::new(buffer, &family.container_member()),
        ],
    )
}

/// Variant record: the family base embedded first, then the declared fields in order
pub fn variant_record(family: &Family, variant: &Variant) -> CRecord {
    let mut members = Vec::with_capacity(variant.fields.len() + 1);
    members.push(Field::new(TypeSpec::value(family.base_name()), HEADER_MEMBER));
    members.extend(variant.fields.iter().cloned());
    CRecord::new(&variant.name, RecordKind::Struct, members)
}

/// Build the complete declarations unit
pub fn declarations_unit(registry: &Registry, options: &EmitOptions) -> CUnit {
    let mut unit = CUnit::new();

    unit.push(CItem::Directives(vec![
        format!("#ifndef {}", options.guard),
        format!("#define {}", options.guard),
    ]));
    if !options.includes.is_empty() {
        unit.push(CItem::Directives(
            options
                .includes
                .iter()
                .map(|include| format!("#include \"{}\"", include))
                .collect(),
        ));
    }

    for prelude in registry.enums() {
        unit.push(CItem::Enum(CEnum {
            name: prelude.name.clone(),
            members: prelude.members.clone(),
        }));
    }

    unit.push(CItem::Directives(vec![
        "#define ALLOCATE_NODE(type, nodeType) (type*) allocateNode(sizeof(type), nodeType)"
            .to_string(),
    ]));
    unit.push(CItem::Directives(vec![
        "#ifndef GROW_CAPACITY".to_string(),
        format!(
            "#define GROW_CAPACITY(capacity) ((capacity) < {min} ? {min} : (capacity) * 2)",
            min = MIN_CAPACITY
        ),
        "#endif".to_string(),
    ]));

    let discriminators = discriminator_enum(registry);
    debug!("Emitting {} discriminator(s)", discriminators.members.len());
    unit.push(CItem::Enum(discriminators));
    unit.push(CItem::Record(node_header_record()));
    unit.push(CItem::Prototypes(vec![allocate_node_prototype()]));

    for family in registry.families() {
        debug!(
            "Emitting family {}: base {}, container {}",
            family.group,
            family.base_name(),
            family.container_type()
        );
        unit.push(CItem::Record(base_record(family)));
        unit.push(CItem::Record(container_record(family)));
        unit.push(CItem::Prototypes(container_operations(family).into_vec()));
    }

    for (family, variant) in registry.variants() {
        trace!("Emitting struct {} ({} field(s))", variant.name, variant.fields.len());
        unit.push(CItem::Record(variant_record(family, variant)));
    }

    unit.push(CItem::Directives(vec![format!("#endif // {}", options.guard)]));
    unit
}
