use crate::{OutputMode, emit_success};
use anyhow::Context;
use std::path::Path;
use tablemap::config::{self, TablemapConfig};
use tablemap::schema::{CompileReport, EntityDeclaration, SchemaFile, compile};
use tablemap::ui::{self, EntityRow, output};
use tablemap::{Database, Registry};

pub fn load_schema(path: &Path) -> anyhow::Result<Vec<EntityDeclaration>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read schema file {}", path.display()))?;
    let file = SchemaFile::parse(&contents)
        .with_context(|| format!("invalid schema file {}", path.display()))?;
    tracing::debug!("Loaded {} declaration(s) from {}", file.entities.len(), path.display());
    Ok(file.entities)
}

fn report_rows(declarations: &[EntityDeclaration], report: &CompileReport) -> Vec<EntityRow> {
    declarations
        .iter()
        .map(|declaration| {
            let name = declaration.name.as_str();
            match report.definitions.iter().find(|d| d.type_name() == name) {
                Some(definition) => {
                    EntityRow::ok(name, definition.table_name(), definition.query_columns().len())
                }
                None => {
                    let message = report
                        .errors
                        .iter()
                        .filter(|e| e.entity.as_deref() == Some(name))
                        .map(|e| e.message.clone())
                        .collect::<Vec<_>>()
                        .join("; ");
                    EntityRow::failed(name, &message)
                }
            }
        })
        .collect()
}

/// Compile every declaration and report per entity. Returns false if any failed.
pub fn run_check(schema: &Path, output_mode: OutputMode) -> anyhow::Result<bool> {
    let declarations = load_schema(schema)?;
    let report = compile(&declarations);
    let rows = report_rows(&declarations, &report);
    let failed = rows.iter().filter(|r| !r.is_ok()).count();

    if output_mode.is_human() {
        ui::heading(&format!("Checking {}", schema.display()));
        println!("{}", ui::entity_table(&rows));
        if failed == 0 {
            ui::success(&format!("{} declaration(s) compiled", rows.len()));
        } else {
            ui::failure(&format!("{} of {} declaration(s) failed", failed, rows.len()));
        }
    } else {
        let data = serde_json::json!({
            "ok": failed == 0,
            "entities": rows,
        });
        emit_success("check", data)?;
    }
    Ok(failed == 0)
}

pub fn run_ddl(schema: &Path, output_mode: OutputMode) -> anyhow::Result<()> {
    let declarations = load_schema(schema)?;
    let report = compile(&declarations);
    for error in &report.errors {
        tracing::warn!("Skipping {}", error);
    }

    if output_mode.is_human() {
        for definition in &report.definitions {
            ui::definition(definition);
        }
        if !report.errors.is_empty() {
            ui::caution(&format!(
                "{} declaration(s) skipped, run `tablemap check` for details",
                report.errors.len()
            ));
        }
    } else {
        let entities: Vec<_> = report
            .definitions
            .iter()
            .map(|d| {
                serde_json::json!({
                    "entity": d.type_name(),
                    "table": d.table_name(),
                    "fingerprint": d.fingerprint(),
                    "ddl": d.ddl(),
                })
            })
            .collect();
        let errors: Vec<_> = report.errors.iter().map(ToString::to_string).collect();
        emit_success("ddl", serde_json::json!({ "entities": entities, "errors": errors }))?;
    }
    Ok(())
}

pub fn run_apply(schema: &Path, database: &Path, output_mode: OutputMode) -> anyhow::Result<()> {
    let declarations = load_schema(schema)?;
    let registry = Registry::builder().declare_all(declarations).build()?;

    config::ensure_db_dir(database)?;
    let db = Database::open(database)?;
    db.create_schema(&registry)
        .with_context(|| format!("cannot create tables in {}", database.display()))?;

    let tables: Vec<&str> = registry.definitions().map(|d| d.table_name()).collect();
    if output_mode.is_human() {
        ui::field(output::DATABASE, "Database", &database.display().to_string());
        for table in &tables {
            ui::table_created(table);
        }
        ui::success(&format!("{} table(s) created", tables.len()));
    } else {
        let data = serde_json::json!({
            "database": database.display().to_string(),
            "tables": tables,
        });
        emit_success("apply", data)?;
    }
    Ok(())
}

pub fn run_init(path: &Path, force: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let starter = TablemapConfig::starter();
    config::write_config(path, &starter, force)?;

    if output_mode.is_human() {
        ui::banner("Tablemap", &format!("Version {}", env!("CARGO_PKG_VERSION")));
        ui::field(output::KEY, "Config", &path.display().to_string());
        ui::note("Next", "declare entities in schema.toml, then run `tablemap check`");
    } else {
        let data = serde_json::json!({
            "config": path.display().to_string(),
            "settings": starter,
        });
        emit_success("init", data)?;
    }
    Ok(())
}
