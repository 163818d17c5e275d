use crate::schema::TypeDefinition;
use crate::ui::theme::{Tone, paint};

pub const OK: &str = "✅";
pub const FAILED: &str = "❌";
pub const CAUTION: &str = "⚠️";
pub const NOTE: &str = "ℹ️";
pub const TABLE: &str = "📋";
pub const DATABASE: &str = "🗄️";
pub const KEY: &str = "🔑";
pub const SPARKLE: &str = "✨";

pub fn heading(text: &str) {
    println!("{} {}", TABLE, paint(Tone::Heading, text));
}

/// Title line followed by a faint subtitle.
pub fn banner(title: &str, subtitle: &str) {
    println!();
    println!("{} {}", SPARKLE, paint(Tone::Heading, title));
    println!("{}", paint(Tone::Faint, subtitle));
    println!();
}

pub fn success(message: &str) {
    println!("{} {}", OK, paint(Tone::Ok, message));
}

pub fn failure(message: &str) {
    eprintln!("{} {}", FAILED, paint(Tone::Failed, message));
}

pub fn caution(message: &str) {
    eprintln!("{} {}", CAUTION, paint(Tone::Caution, message));
}

pub fn note(label: &str, value: &str) {
    println!("{} {}: {}", paint(Tone::Note, NOTE), paint(Tone::Faint, label), value);
}

pub fn field(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, paint(Tone::Faint, label), value);
}

/// Type name, table, fingerprint, then the DDL script.
pub fn definition(definition: &TypeDefinition) {
    println!();
    println!(
        "━{} → {}━",
        paint(Tone::Heading, definition.type_name()),
        definition.table_name()
    );
    field(KEY, "fingerprint", &paint(Tone::Faint, &definition.fingerprint()));
    println!("{}", paint(Tone::Sql, &definition.ddl()));
}

pub fn table_created(table: &str) {
    println!("  {} {}", paint(Tone::Faint, table), paint(Tone::Ok, "created"));
}
