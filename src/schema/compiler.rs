//! Two-pass schema compiler
//!
//! Pass 1 resolves every declaration's table name and id column so that
//! cross-type references can be rendered. Pass 2 builds each type's
//! definition. A failure is recorded against its entity and never stops
//! sibling entities from compiling; a definition that references a type
//! which did not compile is itself rejected.

use std::collections::{HashMap, HashSet};

use chrono::format::{Item, StrftimeItems};

use crate::schema::MappingError;
use crate::schema::constraint::{ConstraintBuilder, ReferenceTarget};
use crate::schema::declaration::{
    ColumnDeclaration, DateRepresentation, EntityDeclaration, FieldDeclaration,
};
use crate::schema::definition::{TypeDefinition, TypeDefinitionBuilder};
use crate::schema::index::IndexBuilder;
use crate::schema::naming;
use crate::schema::property::{DEFAULT_DATE_FORMAT, PropertyBuilder};
use crate::schema::trigger::TriggerBuilder;
use crate::schema::types::{ConflictPolicy, ConstraintKind, ScalarKind, TypeShape};

/// Outcome of compiling a set of declarations.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Successfully compiled definitions, in declaration order
    pub definitions: Vec<TypeDefinition>,
    /// One error per failed entity
    pub errors: Vec<MappingError>,
}

impl CompileReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Pass 1 metadata for a type.
#[derive(Debug, Clone)]
struct TypeHeader {
    table_name: String,
    id_column: String,
}

/// Compile every declaration.
pub fn compile(declarations: &[EntityDeclaration]) -> CompileReport {
    let mut report = CompileReport::default();

    // Pass 1: headers
    let mut headers: HashMap<&str, TypeHeader> = HashMap::new();
    let mut tables: HashMap<String, &str> = HashMap::new();
    let mut accepted = Vec::new();
    for declaration in declarations {
        let name = declaration.name.as_str();
        let header = match read_header(declaration) {
            Ok(header) => header,
            Err(e) => {
                report.errors.push(e.with_entity(name));
                continue;
            }
        };
        if headers.contains_key(name) {
            report
                .errors
                .push(MappingError::new("duplicate entity declaration").with_entity(name));
            continue;
        }
        if let Some(owner) = tables.get(&header.table_name.to_uppercase()) {
            report.errors.push(
                MappingError::new(format!(
                    "table {} is already mapped by {}",
                    header.table_name, owner
                ))
                .with_entity(name),
            );
            continue;
        }
        tables.insert(header.table_name.to_uppercase(), name);
        headers.insert(name, header);
        accepted.push(declaration);
    }
    tracing::debug!("Resolved {} type header(s)", headers.len());

    // Pass 2: definitions
    let mut compiled: Vec<(TypeDefinition, Vec<String>)> = Vec::new();
    for declaration in accepted {
        match compile_entity(declaration, &headers) {
            Ok(result) => compiled.push(result),
            Err(e) => report.errors.push(e.with_entity(&declaration.name)),
        }
    }

    // Reject definitions referencing types that failed, until nothing changes.
    loop {
        let names: HashSet<String> = compiled
            .iter()
            .map(|(d, _)| d.type_name().to_string())
            .collect();
        let (kept, dropped): (Vec<_>, Vec<_>) = compiled
            .into_iter()
            .partition(|(_, refs)| refs.iter().all(|r| names.contains(r)));
        compiled = kept;
        if dropped.is_empty() {
            break;
        }
        for (definition, refs) in dropped {
            let missing = refs
                .iter()
                .find(|r| !names.contains(*r))
                .map(String::as_str)
                .unwrap_or_default();
            report.errors.push(
                MappingError::new(format!("references type {} which failed to compile", missing))
                    .with_entity(definition.type_name()),
            );
        }
    }

    for error in &report.errors {
        tracing::warn!("{}", error);
    }
    report.definitions = compiled.into_iter().map(|(d, _)| d).collect();
    report
}

fn read_header(declaration: &EntityDeclaration) -> Result<TypeHeader, MappingError> {
    if declaration.name.trim().is_empty() {
        return Err(MappingError::new("entity name must not be empty"));
    }
    let table_name = naming::table_name(&declaration.name, declaration.table.name.as_deref())?;

    let mut ids = declaration.fields.iter().filter(|f| f.id.is_some());
    let id_field = ids
        .next()
        .ok_or_else(|| MappingError::new("no id field declared"))?;
    if let Some(second) = ids.next() {
        return Err(MappingError::new(format!(
            "multiple id fields: {} and {}",
            id_field.name, second.name
        ))
        .with_field(&second.name));
    }
    let id_column = id_column_name(id_field)?;

    Ok(TypeHeader {
        table_name,
        id_column,
    })
}

fn id_column_name(field: &FieldDeclaration) -> Result<String, MappingError> {
    let explicit = field.id.as_ref().and_then(|id| id.name.as_deref());
    naming::column_name(&field.name, Some(explicit.unwrap_or(naming::DEFAULT_ID_COLUMN)))
        .map_err(|e| e.with_field(&field.name))
}

fn compile_entity(
    declaration: &EntityDeclaration,
    headers: &HashMap<&str, TypeHeader>,
) -> Result<(TypeDefinition, Vec<String>), MappingError> {
    let header = headers
        .get(declaration.name.as_str())
        .ok_or_else(|| MappingError::new("missing type header"))?;
    let table = &declaration.table;

    let mut builder = TypeDefinitionBuilder::new(&declaration.name, &header.table_name)
        .temporary(table.temporary);
    let mut references = Vec::new();

    for field in &declaration.fields {
        if !field.is_persisted() {
            tracing::trace!("Skipping transient field {}.{}", declaration.name, field.name);
            continue;
        }
        builder = compile_field(builder, field, headers, &mut references)
            .map_err(|e| e.with_field(&field.name))?;
    }

    for unique in &table.uniques {
        let name = unique
            .name
            .as_deref()
            .ok_or_else(|| MappingError::new("table UNIQUE constraint requires a name"))?;
        let columns: Vec<String> = unique.columns.iter().map(|c| builder.resolve_column(c)).collect();
        let constraint = ConstraintBuilder::table(ConstraintKind::Unique, name)
            .columns(columns)
            .conflict(unique.on_conflict)
            .build()?;
        builder = builder.constraint(constraint)?;
    }

    for check in &table.checks {
        let name = check
            .name
            .as_deref()
            .ok_or_else(|| MappingError::new("table CHECK constraint requires a name"))?;
        let constraint = ConstraintBuilder::table(ConstraintKind::Check, name)
            .expression(&check.expression)
            .build()?;
        builder = builder.constraint(constraint)?;
    }

    for index in &table.indexes {
        let columns: Vec<String> = index.columns.iter().map(|c| builder.resolve_column(c)).collect();
        let definition = IndexBuilder::new(&header.table_name)
            .name(index.name.as_deref())
            .unique(index.unique)
            .columns(columns)
            .where_clause(index.where_clause.as_deref())
            .build()?;
        builder = builder.index(definition)?;
    }

    for trigger in &table.triggers {
        // triggers on a temporary table must live in the temp schema
        let definition = TriggerBuilder::new(&trigger.name, &header.table_name)
            .temporary(trigger.temporary || table.temporary)
            .event(trigger.event)
            .for_each_row(trigger.for_each_row)
            .when(trigger.when.as_deref())
            .statements(trigger.statements.iter().cloned())
            .build()?;
        builder = builder.trigger(definition)?;
    }

    let definition = builder.build()?;
    tracing::debug!(
        "Compiled {} -> {} ({} column(s))",
        definition.type_name(),
        definition.table_name(),
        definition.query_columns().len()
    );
    Ok((definition, references))
}

fn compile_field(
    builder: TypeDefinitionBuilder,
    field: &FieldDeclaration,
    headers: &HashMap<&str, TypeHeader>,
    references: &mut Vec<String>,
) -> Result<TypeDefinitionBuilder, MappingError> {
    if field.id.is_some() && field.version.is_some() {
        return Err(MappingError::new("a field cannot be both id and version"));
    }
    let shape = TypeShape::parse(&field.ty)?;

    if let Some(id) = &field.id {
        if !matches!(shape, TypeShape::Scalar { kind: ScalarKind::Long, .. }) {
            return Err(MappingError::new(format!(
                "id field must be i64, found {}",
                field.ty
            )));
        }
        let primary_key = ConstraintBuilder::column(ConstraintKind::PrimaryKey)
            .sort(id.sort)
            .conflict(id.on_conflict)
            .autoincrement(id.autoincrement)
            .build()?;
        let property = PropertyBuilder::new(&field.name, id_column_name(field)?, ScalarKind::Long)
            .unbound()
            .constraint(primary_key)?
            .build()?;
        return builder.id(property);
    }

    if let Some(version) = &field.version {
        let kind = match shape {
            TypeShape::Scalar {
                kind: kind @ (ScalarKind::Int | ScalarKind::Long),
                ..
            } => kind,
            _ => {
                return Err(MappingError::new(format!(
                    "version field must be i32 or i64, found {}",
                    field.ty
                )));
            }
        };
        let column = naming::column_name(
            &field.name,
            Some(version.name.as_deref().unwrap_or(naming::DEFAULT_VERSION_COLUMN)),
        )?;
        let property = PropertyBuilder::new(&field.name, column, kind)
            .unbound()
            .constraint(
                ConstraintBuilder::column(ConstraintKind::Default)
                    .expression("0")
                    .build()?,
            )?
            .constraint(
                ConstraintBuilder::column(ConstraintKind::NotNull)
                    .conflict(ConflictPolicy::Rollback)
                    .build()?,
            )?
            .build()?;
        return builder.version(property);
    }

    let column_decl = field.column.clone().unwrap_or_default();
    let column = naming::column_name(&field.name, column_decl.name.as_deref())?;

    let mut target = None;
    let kind = match &shape {
        TypeShape::Scalar { kind, .. } => {
            if column_decl.date != DateRepresentation::Long {
                return Err(MappingError::new(
                    "date representation only applies to DateTime fields",
                ));
            }
            if field.reference.is_some() && *kind != ScalarKind::Long {
                return Err(MappingError::new("a reference field must be i64 or an entity type"));
            }
            *kind
        }
        TypeShape::Date { .. } => match column_decl.date {
            DateRepresentation::Long => ScalarKind::DateLong,
            DateRepresentation::String => ScalarKind::DateString,
        },
        TypeShape::Entity { name, .. } => {
            if field.reference.is_none() && !headers.contains_key(name.as_str()) {
                return Err(MappingError::new(format!("unsupported field type '{}'", field.ty)));
            }
            let reference = field.reference.as_ref().ok_or_else(|| {
                MappingError::new(format!(
                    "field of entity type {} requires a reference declaration",
                    name
                ))
            })?;
            if reference.entity != *name {
                return Err(MappingError::new(format!(
                    "reference target {} does not match field type {}",
                    reference.entity, name
                )));
            }
            target = Some(name.clone());
            ScalarKind::Long
        }
    };
    if target.is_none() {
        target = field.reference.as_ref().map(|r| r.entity.clone());
    }

    let mut property = PropertyBuilder::new(&field.name, &column, kind)
        .insertable(column_decl.insertable)
        .updatable(column_decl.updatable);
    if kind == ScalarKind::DateString {
        let format = column_decl
            .date_format
            .clone()
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
        validate_date_format(&format)?;
        property = property.date_format(format);
    }

    property = attach_constraints(property, field, &column_decl)?;

    if let Some(target_name) = &target {
        let header = headers.get(target_name.as_str()).ok_or_else(|| {
            MappingError::new(format!("references unknown type {}", target_name))
        })?;
        let reference = field.reference.as_ref().ok_or_else(|| {
            MappingError::new(format!("missing reference declaration for {}", target_name))
        })?;
        let constraint = ConstraintBuilder::column(ConstraintKind::References)
            .reference(ReferenceTarget {
                table: header.table_name.clone(),
                column: header.id_column.clone(),
                on_update: reference.on_update,
                on_delete: reference.on_delete,
            })
            .build()?;
        property = property.constraint(constraint)?;
        references.push(target_name.clone());
    }

    let mut builder = builder.property(property.build()?)?;

    let index = match (&field.index, column_decl.indexed) {
        (Some(explicit), _) => Some(
            IndexBuilder::new(builder.table_name())
                .name(explicit.name.as_deref())
                .unique(explicit.unique)
                .where_clause(explicit.where_clause.as_deref()),
        ),
        (None, true) => Some(IndexBuilder::new(builder.table_name())),
        (None, false) => None,
    };
    if let Some(index) = index {
        let index = index.columns([column.clone()]).build()?;
        builder = builder.index(index)?;
    }
    Ok(builder)
}

/// Inline constraints in rendering order: DEFAULT, COLLATE, UNIQUE, NOT NULL, CHECK.
/// An explicit declaration wins over the column shorthand of the same kind.
fn attach_constraints(
    mut property: PropertyBuilder,
    field: &FieldDeclaration,
    column: &ColumnDeclaration,
) -> Result<PropertyBuilder, MappingError> {
    if let Some(default) = &column.default {
        property = property.constraint(
            ConstraintBuilder::column(ConstraintKind::Default)
                .expression(default)
                .build()?,
        )?;
    }

    if let Some(collate) = &column.collate {
        property = property.constraint(
            ConstraintBuilder::column(ConstraintKind::Collate)
                .expression(collate)
                .build()?,
        )?;
    }

    let unique = match (&field.unique, column.unique) {
        (Some(explicit), _) => Some(explicit.on_conflict),
        (None, true) => Some(ConflictPolicy::default()),
        (None, false) => None,
    };
    if let Some(policy) = unique {
        property = property.constraint(
            ConstraintBuilder::column(ConstraintKind::Unique)
                .conflict(policy)
                .build()?,
        )?;
    }

    let not_null = match (&field.not_null, column.not_null) {
        (Some(explicit), _) => Some(explicit.on_conflict),
        (None, true) => Some(ConflictPolicy::default()),
        (None, false) => None,
    };
    if let Some(policy) = not_null {
        property = property.constraint(
            ConstraintBuilder::column(ConstraintKind::NotNull)
                .conflict(policy)
                .build()?,
        )?;
    }

    let check = field
        .check
        .as_ref()
        .map(|c| c.expression.as_str())
        .or(column.check.as_deref());
    if let Some(expression) = check {
        property = property.constraint(
            ConstraintBuilder::column(ConstraintKind::Check)
                .expression(expression)
                .build()?,
        )?;
    }

    Ok(property)
}

fn validate_date_format(format: &str) -> Result<(), MappingError> {
    if format.trim().is_empty() {
        return Err(MappingError::new("date format must not be empty"));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(MappingError::new(format!("invalid date format '{}'", format)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::declaration::{
        CheckDeclaration, IdDeclaration, IndexDeclaration, NotNullDeclaration,
        ReferenceDeclaration, TriggerDeclaration, UniqueDeclaration,
    };
    use crate::schema::types::{ReferenceAction, SortOrder, TriggerEvent};

    fn person() -> EntityDeclaration {
        EntityDeclaration::new("Person")
            .table_name("people")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String").with_column(ColumnDeclaration::default().not_null()))
            .field(FieldDeclaration::column("age", "Option<i32>"))
            .field(FieldDeclaration::version("version"))
    }

    fn compile_one(declaration: EntityDeclaration) -> Result<TypeDefinition, MappingError> {
        let mut report = compile(&[declaration]);
        match report.errors.pop() {
            Some(e) => Err(e),
            None => Ok(report.definitions.remove(0)),
        }
    }

    #[test]
    fn test_compiles_person() {
        let definition = compile_one(person()).unwrap();
        assert_eq!(definition.table_name(), "PEOPLE");
        assert_eq!(
            definition.create_table(),
            "CREATE TABLE PEOPLE (_ID INTEGER PRIMARY KEY ON CONFLICT ROLLBACK AUTOINCREMENT, \
             NAME TEXT NOT NULL ON CONFLICT ROLLBACK, AGE INTEGER, \
             _VERSION INTEGER DEFAULT 0 NOT NULL ON CONFLICT ROLLBACK)"
        );
        assert_eq!(definition.version().unwrap().column_name(), "_VERSION");
        assert!(!definition.version().unwrap().is_bindable());
    }

    #[test]
    fn test_missing_id_fails() {
        let declaration = EntityDeclaration::new("NoId").field(FieldDeclaration::column("name", "String"));
        let error = compile_one(declaration).unwrap_err();
        assert_eq!(error.entity.as_deref(), Some("NoId"));
        assert!(error.message.contains("no id"));
    }

    #[test]
    fn test_mistyped_id_fails() {
        let mut id = FieldDeclaration::id("id");
        id.ty = "String".to_string();
        let error = compile_one(EntityDeclaration::new("Bad").field(id)).unwrap_err();
        assert_eq!(error.field.as_deref(), Some("id"));
    }

    #[test]
    fn test_failure_does_not_abort_siblings() {
        let broken = EntityDeclaration::new("Broken")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("data", "HashMap<String,String>"));
        let tag = EntityDeclaration::new("Tag")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("label", "String"));
        let report = compile(&[broken, tag]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].entity.as_deref(), Some("Broken"));
        assert_eq!(report.errors[0].field.as_deref(), Some("data"));
        assert_eq!(report.definitions.len(), 1);
        assert_eq!(report.definitions[0].type_name(), "Tag");
    }

    #[test]
    fn test_duplicate_column_names_fail() {
        let declaration = EntityDeclaration::new("Dup")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String"))
            .field(FieldDeclaration::column("other", "String").with_column(ColumnDeclaration::named("NAME")));
        assert!(compile_one(declaration).unwrap_err().message.contains("duplicate column"));
    }

    #[test]
    fn test_duplicate_table_names_fail() {
        let a = EntityDeclaration::new("A").table_name("shared").field(FieldDeclaration::id("id"));
        let b = EntityDeclaration::new("B").table_name("SHARED").field(FieldDeclaration::id("id"));
        let report = compile(&[a, b]);
        assert_eq!(report.definitions.len(), 1);
        assert_eq!(report.errors[0].entity.as_deref(), Some("B"));
    }

    #[test]
    fn test_explicit_constraint_wins_over_shorthand() {
        let declaration = EntityDeclaration::new("Account")
            .field(FieldDeclaration::id("id"))
            .field(
                FieldDeclaration::column("email", "String")
                    .with_column(ColumnDeclaration::default().not_null().unique().check("EMAIL <> ''"))
                    .not_null(NotNullDeclaration { on_conflict: ConflictPolicy::Abort })
                    .unique(UniqueDeclaration::default().on_conflict(ConflictPolicy::Replace))
                    .check(CheckDeclaration::new("length(EMAIL) > 3")),
            );
        let definition = compile_one(declaration).unwrap();
        let email = definition.property("email").unwrap();
        assert_eq!(
            email.statement(),
            "EMAIL TEXT UNIQUE ON CONFLICT REPLACE NOT NULL ON CONFLICT ABORT CHECK (length(EMAIL) > 3)"
        );
        assert_eq!(email.constraints().len(), 3);
    }

    #[test]
    fn test_shorthand_index_and_table_metadata() {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id").with_id(IdDeclaration {
                sort: Some(SortOrder::Desc),
                autoincrement: false,
                ..IdDeclaration::default()
            }))
            .field(FieldDeclaration::column("name", "String").with_column(ColumnDeclaration::default().indexed()))
            .field(FieldDeclaration::column("age", "i32"))
            .unique(UniqueDeclaration::table("name_age", ["name", "age"]))
            .check(CheckDeclaration::named("adult", "AGE >= 18"))
            .index(IndexDeclaration::on(["AGE", "NAME"]).where_clause("AGE > 0"))
            .trigger(
                TriggerDeclaration::new("clamp", TriggerEvent::AfterInsert, ["UPDATE Person SET AGE = 0 WHERE AGE < 0"])
                    .for_each_row()
                    .when("NEW.AGE < 0"),
            );
        let definition = compile_one(declaration).unwrap();
        assert_eq!(
            definition.create_table(),
            "CREATE TABLE Person (_ID INTEGER PRIMARY KEY DESC ON CONFLICT ROLLBACK, NAME TEXT, AGE INTEGER, \
             CONSTRAINT UNI_NAME_AGE UNIQUE (NAME, AGE) ON CONFLICT ROLLBACK, \
             CONSTRAINT CHK_ADULT CHECK (AGE >= 18))"
        );
        let index_names: Vec<_> = definition.indexes().iter().map(|i| i.name()).collect();
        assert_eq!(index_names, vec!["IDX_PERSON_NAME", "IDX_PERSON_AGE_NAME"]);
        assert_eq!(
            definition.indexes()[1].statement(),
            "CREATE INDEX IDX_PERSON_AGE_NAME ON Person (AGE, NAME) WHERE AGE > 0"
        );
        assert_eq!(
            definition.triggers()[0].statement(),
            "CREATE TRIGGER TRI_CLAMP AFTER INSERT ON Person FOR EACH ROW WHEN (NEW.AGE < 0) \
             BEGIN UPDATE Person SET AGE = 0 WHERE AGE < 0; END"
        );
    }

    #[test]
    fn test_table_unique_maps_field_to_column() {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String").with_column(ColumnDeclaration::named("full_name")))
            .unique(UniqueDeclaration::table("u_name", ["name"]))
            .index(IndexDeclaration::on(["name DESC"]));
        let definition = compile_one(declaration).unwrap();
        assert_eq!(
            definition.create_table(),
            "CREATE TABLE Person (_ID INTEGER PRIMARY KEY ON CONFLICT ROLLBACK AUTOINCREMENT, FULL_NAME TEXT, \
             CONSTRAINT UNI_U_NAME UNIQUE (FULL_NAME) ON CONFLICT ROLLBACK)"
        );
        assert_eq!(
            definition.indexes()[0].statement(),
            "CREATE INDEX IDX_PERSON_FULL_NAME ON Person (FULL_NAME DESC)"
        );
    }

    #[test]
    fn test_table_unique_with_unknown_column_fails() {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String").with_column(ColumnDeclaration::named("full_name")))
            .unique(UniqueDeclaration::table("u_ghost", ["ghost"]));
        let error = compile_one(declaration).unwrap_err();
        assert_eq!(error.entity.as_deref(), Some("Person"));
        assert!(error.message.contains("unknown column ghost"), "{}", error.message);
    }

    #[test]
    fn test_index_names_are_case_insensitive() {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String"))
            .field(FieldDeclaration::column("age", "i32"))
            .index(IndexDeclaration::on(["NAME"]).named("idx_a"))
            .index(IndexDeclaration::on(["AGE"]).named("IDX_A"));
        let error = compile_one(declaration).unwrap_err();
        assert!(error.message.contains("duplicate index IDX_A"), "{}", error.message);
    }

    #[test]
    fn test_explicit_index_colliding_with_shorthand_fails() {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("name", "String").with_column(ColumnDeclaration::default().indexed()))
            .index(IndexDeclaration::on(["NAME"]));
        let error = compile_one(declaration).unwrap_err();
        assert!(error.message.contains("duplicate index IDX_PERSON_NAME"), "{}", error.message);
    }

    #[test]
    fn test_trigger_names_are_case_insensitive() {
        let declaration = EntityDeclaration::new("Person")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("age", "i32"))
            .trigger(TriggerDeclaration::new(
                "clamp",
                TriggerEvent::AfterInsert,
                ["UPDATE Person SET AGE = 0 WHERE AGE < 0"],
            ))
            .trigger(TriggerDeclaration::new(
                "CLAMP",
                TriggerEvent::AfterUpdate,
                ["UPDATE Person SET AGE = 0 WHERE AGE < 0"],
            ));
        let error = compile_one(declaration).unwrap_err();
        assert!(error.message.contains("duplicate trigger TRI_CLAMP"), "{}", error.message);
    }

    #[test]
    fn test_unknown_scalar_spelling_is_unsupported_type() {
        let declaration = EntityDeclaration::new("Counter")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("hits", "u32"));
        let error = compile_one(declaration).unwrap_err();
        assert_eq!(error.field.as_deref(), Some("hits"));
        assert!(error.message.contains("unsupported field type 'u32'"), "{}", error.message);
    }

    #[test]
    fn test_references_resolve_through_headers() {
        let owner = EntityDeclaration::new("Owner").field(FieldDeclaration::id("id").with_id(IdDeclaration {
            name: Some("owner_id".to_string()),
            ..IdDeclaration::default()
        }));
        let pet = EntityDeclaration::new("Pet")
            .field(FieldDeclaration::id("id"))
            .field(
                FieldDeclaration::column("owner", "Owner")
                    .reference(ReferenceDeclaration::to("Owner").on_delete(ReferenceAction::Cascade)),
            );
        // referencing type declared first still resolves
        let report = compile(&[pet, owner]);
        assert!(report.is_ok(), "{:?}", report.errors);
        let pet = &report.definitions[0];
        assert_eq!(
            pet.property("owner").unwrap().statement(),
            "OWNER INTEGER REFERENCES Owner (OWNER_ID) ON DELETE CASCADE"
        );
        assert_eq!(pet.property("owner").unwrap().kind(), ScalarKind::Long);
    }

    #[test]
    fn test_unknown_or_failed_reference_is_hard_error() {
        let pet = EntityDeclaration::new("Pet")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("owner", "i64").reference(ReferenceDeclaration::to("Ghost")));
        let error = compile_one(pet).unwrap_err();
        assert!(error.message.contains("unknown type Ghost"));

        let owner = EntityDeclaration::new("Owner")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("bad", "Vec<String>"));
        let pet = EntityDeclaration::new("Pet")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("owner", "Owner").reference(ReferenceDeclaration::to("Owner")));
        let report = compile(&[owner, pet]);
        assert!(report.definitions.is_empty());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[1].message.contains("failed to compile"));
    }

    #[test]
    fn test_entity_field_requires_reference() {
        let owner = EntityDeclaration::new("Owner").field(FieldDeclaration::id("id"));
        let pet = EntityDeclaration::new("Pet")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("owner", "Owner"));
        let report = compile(&[owner, pet]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("requires a reference"));
    }

    #[test]
    fn test_date_representations() {
        let declaration = EntityDeclaration::new("Event")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("at", "DateTime<Utc>"))
            .field(
                FieldDeclaration::column("day", "Option<DateTime>")
                    .with_column(ColumnDeclaration::default().date_as_string(Some("%Y-%m-%d %H:%M:%S"))),
            )
            .field(
                FieldDeclaration::column("stamp", "DateTime")
                    .with_column(ColumnDeclaration::default().date_as_string(None)),
            );
        let definition = compile_one(declaration).unwrap();
        assert_eq!(definition.property("at").unwrap().kind(), ScalarKind::DateLong);
        assert_eq!(definition.property("at").unwrap().statement(), "AT NUMERIC");
        assert_eq!(definition.property("day").unwrap().date_format(), Some("%Y-%m-%d %H:%M:%S"));
        assert_eq!(definition.property("stamp").unwrap().date_format(), Some(DEFAULT_DATE_FORMAT));

        let bad = EntityDeclaration::new("Bad")
            .field(FieldDeclaration::id("id"))
            .field(
                FieldDeclaration::column("at", "DateTime")
                    .with_column(ColumnDeclaration::default().date_as_string(Some("  "))),
            );
        assert!(compile_one(bad).is_err());
    }

    #[test]
    fn test_transient_fields_are_skipped() {
        let declaration = EntityDeclaration::new("Tag")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::transient("scratch", "HashMap<String,String>"));
        let definition = compile_one(declaration).unwrap();
        assert_eq!(definition.query_columns(), vec!["_ID"]);
    }

    #[test]
    fn test_invalid_identifier_fails() {
        let declaration = EntityDeclaration::new("Tag")
            .field(FieldDeclaration::id("id"))
            .field(FieldDeclaration::column("label", "String").with_column(ColumnDeclaration::named("label; DROP")));
        assert!(compile_one(declaration).is_err());
    }
}
