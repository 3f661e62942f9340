//! Container-Type Emitter
//!
//! Emits, per family, the three operations over its growable array:
//! `init<T>Array`, `write<T>Array` and `free<T>Array`. Growth goes through
//! the interpreter's `GROW_CAPACITY` / `GROW_ARRAY` macros, so capacity
//! doubles from a minimum of [`MIN_CAPACITY`]. Releasing a container frees
//! the slot buffer only, never the nodes it points at.

use crate::c_model::{CFunction, CItem, CStmt, CUnit};
use crate::EmitOptions;
use astgen_schema::{Family, Field, Registry, TypeSpec};
use log::debug;

/// Capacity of the first buffer allocated by `write<T>Array`
pub const MIN_CAPACITY: usize = 8;

/// The three operations of one family container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerOps {
    pub init: CFunction,
    pub write: CFunction,
    pub free: CFunction,
}

impl ContainerOps {
    pub fn into_vec(self) -> Vec<CFunction> {
        vec![self.init, self.write, self.free]
    }
}

/// Build the container operations for a family
pub fn container_operations(family: &Family) -> ContainerOps {
    let container = family.container_type();
    let array = format!("{}Array", family.group);
    let buffer = format!("{}->{}", array, family.container_member());
    let element = family.element_type();

    let array_param = Field::new(TypeSpec::pointer(&container), &array);
    let void = TypeSpec::value("void");

    let init = CFunction {
        return_type: void.clone(),
        name: format!("init{}", container),
        params: vec![array_param.clone()],
        body: vec![
            CStmt::Line(format!("{}->count = 0;", array)),
            CStmt::Line(format!("{}->capacity = 0;", array)),
            CStmt::Line(format!("{} = NULL;", buffer)),
        ],
    };

    let write = CFunction {
        return_type: void.clone(),
        name: format!("write{}", container),
        params: vec![
            array_param.clone(),
            Field::new(element.clone(), &family.group),
        ],
        body: vec![
            CStmt::If {
                condition: format!("{a}->capacity < {a}->count + 1", a = array),
                body: vec![
                    CStmt::Line(format!("int oldCapacity = {}->capacity;", array)),
                    CStmt::Line(format!(
                        "{}->capacity = GROW_CAPACITY(oldCapacity);",
                        array
                    )),
                    CStmt::Line(format!(
                        "{b} = GROW_ARRAY({e}, {b}, oldCapacity, {a}->capacity);",
                        a = array,
                        b = buffer,
                        e = element
                    )),
                ],
            },
            CStmt::Blank,
            CStmt::Line(format!("{}[{}->count] = {};", buffer, array, family.group)),
            CStmt::Line(format!("{}->count++;", array)),
        ],
    };

    let free = CFunction {
        return_type: void,
        name: format!("free{}", container),
        params: vec![array_param],
        body: vec![
            CStmt::Line(format!(
                "FREE_ARRAY({e}, {b}, {a}->capacity);",
                a = array,
                b = buffer,
                e = element
            )),
            CStmt::Line(format!("init{}({});", container, array)),
        ],
    };

    ContainerOps { init, write, free }
}

/// Build the operations unit: the header include, then every family's definitions
pub fn operations_unit(registry: &Registry, options: &EmitOptions) -> CUnit {
    let mut unit = CUnit::new();
    unit.push(CItem::Directives(vec![format!(
        "#include \"{}\"",
        options.header_name
    )]));

    for family in registry.families() {
        debug!("Emitting container operations for {}", family.container_type());
        for function in container_operations(family).into_vec() {
            unit.push(CItem::Definition(function));
        }
    }

    unit
}
