//! Schema builder - converts MySQL DDL into a DatabaseDef

use sqlparser::ast::{
    self, AlterTableOperation, ColumnOption, CreateIndex, Expr, ObjectName, Statement,
    TableConstraint, Value,
};
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use tracing::{debug, trace};

use crate::dialect::SqlDialect;
use crate::error::{Diagnostic, DiagnosticKind, Severity, Span};
use crate::schema::{
    ColumnDef, DatabaseDef, ForeignKeyDef, IndexDef, IndexKind, ReferentialAction, TableDef,
};
use crate::types::DeclaredType;

/// Builder for constructing a DatabaseDef from SQL schema definitions
pub struct SchemaBuilder {
    dialect: SqlDialect,
    database: DatabaseDef,
    diagnostics: Vec<Diagnostic>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::with_dialect(SqlDialect::default())
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            database: DatabaseDef::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Name of the resulting database; `CREATE DATABASE` fills it otherwise
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.database.name = name.into();
        self
    }

    /// Parse SQL schema definitions into the database
    pub fn parse(&mut self, sql: &str) -> Result<(), Vec<Diagnostic>> {
        let dialect = self.dialect.parser_dialect();

        // Try parsing the entire SQL first (fast path)
        match Parser::parse_sql(dialect.as_ref(), sql) {
            Ok(statements) => {
                for stmt in &statements {
                    self.process_statement(stmt);
                }
            }
            Err(err) => {
                debug!(error = %err, "falling back to per-statement parsing");
                self.parse_statements_individually(sql);
            }
        }

        if self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
        {
            Err(std::mem::take(&mut self.diagnostics))
        } else {
            Ok(())
        }
    }

    /// Parse SQL statements individually, skipping those that fail to parse.
    /// Dump files often carry statements the parser does not know; the rest
    /// of the file is still read.
    fn parse_statements_individually(&mut self, sql: &str) {
        let dialect = self.dialect.parser_dialect();
        let mut parsed = 0usize;
        let mut skipped = Vec::new();

        for raw_stmt in split_sql_statements(sql) {
            let trimmed = raw_stmt.trim();
            if trimmed.is_empty() {
                continue;
            }

            match Parser::parse_sql(dialect.as_ref(), trimmed) {
                Ok(stmts) => {
                    parsed += 1;
                    for stmt in &stmts {
                        self.process_statement(stmt);
                    }
                }
                Err(err) => {
                    trace!(error = %err, "skipping statement");
                    let mut diag = Diagnostic::warning(
                        DiagnosticKind::ParseError,
                        format!("Skipped statement that could not be parsed: {}", err),
                    );
                    if let Some(span) = Span::locate(sql, trimmed) {
                        diag = diag.with_span(span);
                    }
                    skipped.push(diag);
                }
            }
        }

        if parsed == 0 && !skipped.is_empty() {
            for diag in &mut skipped {
                diag.severity = Severity::Error;
            }
        }
        self.diagnostics.extend(skipped);
    }

    /// Process a single SQL statement
    fn process_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::CreateTable(create) => {
                self.process_create_table(create);
            }
            Statement::CreateIndex(index) => {
                self.process_create_index(index);
            }
            Statement::AlterTable {
                name, operations, ..
            } => {
                self.process_alter_table(name, operations);
            }
            Statement::CreateDatabase { db_name, .. } if self.database.name.is_empty() => {
                self.database.name = object_name(db_name);
            }
            _ => {}
        }
    }

    /// Process CREATE TABLE statement
    fn process_create_table(&mut self, create: &ast::CreateTable) {
        let mut table = TableDef::new(object_name(&create.name));

        table.engine = create.engine.as_ref().map(|engine| engine.name.clone());
        table.charset = create.default_charset.clone();
        table.collation = create.collation.clone();

        for column in &create.columns {
            add_column(&mut table, column, &mut self.diagnostics);
        }

        for constraint in &create.constraints {
            add_constraint(&mut table, constraint, &mut self.diagnostics);
        }

        debug!(
            table = %table.name,
            columns = table.columns.len(),
            indexes = table.indexes.len(),
            foreign_keys = table.foreign_keys.len(),
            "created table"
        );
        self.database.add_table(table);
    }

    /// Process CREATE [UNIQUE] INDEX statement
    fn process_create_index(&mut self, index: &CreateIndex) {
        let table_name = object_name(&index.table_name);
        let Some(table) = self.database.get_table_mut(&table_name) else {
            self.diagnostics.push(table_not_found("CREATE INDEX", &table_name));
            return;
        };

        let fields: Vec<String> = index
            .columns
            .iter()
            .map(|column| expr_column(&column.expr))
            .collect();
        let kind = if index.unique {
            IndexKind::Unique
        } else {
            IndexKind::Key
        };
        let index = IndexDef::new(kind, fields, index.name.as_ref().map(object_name));
        check_fields(table, &index.fields, &mut self.diagnostics);
        debug!(table = %table.name, index = %index.name, "created index");
        table.add_index(index);
    }

    /// Process ALTER TABLE statement
    fn process_alter_table(&mut self, name: &ObjectName, operations: &[AlterTableOperation]) {
        let table_name = object_name(name);
        let Some(table) = self.database.get_table_mut(&table_name) else {
            self.diagnostics.push(table_not_found("ALTER TABLE", &table_name));
            return;
        };

        for operation in operations {
            match operation {
                AlterTableOperation::AddColumn { column_def, .. } => {
                    add_column(table, column_def, &mut self.diagnostics);
                }
                AlterTableOperation::DropColumn { column_name, .. } => {
                    drop_column(table, &column_name.value);
                }
                AlterTableOperation::AddConstraint(constraint) => {
                    add_constraint(table, constraint, &mut self.diagnostics);
                }
                _ => {
                    // Other ALTER TABLE operations - not yet supported
                }
            }
        }
    }

    /// Drain the warnings collected so far, leaving the schema in place
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Consume the builder and return the database
    pub fn build(self) -> (DatabaseDef, Vec<Diagnostic>) {
        (self.database, self.diagnostics)
    }

    /// Get a reference to the database built so far
    pub fn database(&self) -> &DatabaseDef {
        &self.database
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn table_not_found(statement: &str, table: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::TableNotFound,
        format!(
            "{} references table '{}' which was not found in schema",
            statement, table
        ),
    )
    .with_help("Ensure the CREATE TABLE statement appears first")
}

/// Convert a column definition, together with the indexes and foreign keys
/// its inline options declare
fn add_column(table: &mut TableDef, column: &ast::ColumnDef, diagnostics: &mut Vec<Diagnostic>) {
    let name = column.name.value.clone();
    let declared = match DeclaredType::from_ast(&column.data_type) {
        Ok(declared) => declared,
        Err(err) => {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnknownType,
                    format!("Column '{}.{}' was skipped: {}", table.name, name, err),
                )
                .with_help("Only MySQL column types are supported"),
            );
            return;
        }
    };

    let mut col = ColumnDef::from_declared(&name, declared);
    col.collation = column.collation.as_ref().map(object_name);

    for option in &column.options {
        match &option.option {
            ColumnOption::Null => col.nullable = true,
            ColumnOption::NotNull => col.nullable = false,
            ColumnOption::Default(expr) => apply_default(&mut col, expr),
            ColumnOption::Comment(comment) => col.comment = Some(comment.clone()),
            ColumnOption::CharacterSet(charset) => col.charset = Some(charset.to_string()),
            ColumnOption::Unique { is_primary, .. } => {
                if *is_primary {
                    col.nullable = false;
                    table.add_index(IndexDef::primary([name.clone()]));
                } else {
                    table.add_index(IndexDef::unique([name.clone()], None));
                }
            }
            ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                on_delete,
                on_update,
                ..
            } => {
                let fk_name = option
                    .name
                    .as_ref()
                    .map(|n| n.value.clone())
                    .unwrap_or_else(|| next_foreign_key_name(table));
                let target_field = referred_columns
                    .first()
                    .map(|c| c.value.clone())
                    .unwrap_or_default();
                let fk = ForeignKeyDef {
                    on_delete: on_delete.as_ref().map(referential_action),
                    on_update: on_update.as_ref().map(referential_action),
                    ..ForeignKeyDef::new(fk_name, &name, object_name(foreign_table), target_field)
                };
                table.add_foreign_key(fk);
            }
            ColumnOption::OnUpdate(expr) => col.on_update_timestamp = is_current_timestamp(expr),
            ColumnOption::DialectSpecific(tokens) => {
                let auto_increment = tokens.iter().any(
                    |token| matches!(token, Token::Word(word) if word.keyword == Keyword::AUTO_INCREMENT),
                );
                if auto_increment {
                    col.autoincrement = true;
                }
            }
            _ => {}
        }
    }

    table.add_column(col);
}

/// Drop a column and its place in any index; indexes left empty go too
fn drop_column(table: &mut TableDef, column: &str) {
    table.columns.shift_remove(column);
    for index in &mut table.indexes {
        index.fields.retain(|field| field != column);
    }
    table.indexes.retain(|index| !index.fields.is_empty());
}

fn add_constraint(
    table: &mut TableDef,
    constraint: &TableConstraint,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match constraint {
        TableConstraint::PrimaryKey { columns, .. } => {
            let fields = idents(columns);
            check_fields(table, &fields, diagnostics);
            for field in &fields {
                if let Some(col) = table.get_column_mut(field) {
                    col.nullable = false;
                }
            }
            table.add_index(IndexDef::primary(fields));
        }
        TableConstraint::Unique {
            columns,
            name,
            index_name,
            ..
        } => {
            let fields = idents(columns);
            check_fields(table, &fields, diagnostics);
            let name = index_name.as_ref().or(name.as_ref()).map(|n| n.value.clone());
            table.add_index(IndexDef::unique(fields, name));
        }
        TableConstraint::Index { columns, name, .. } => {
            let fields = idents(columns);
            check_fields(table, &fields, diagnostics);
            table.add_index(IndexDef::key(fields, name.as_ref().map(|n| n.value.clone())));
        }
        TableConstraint::FulltextOrSpatial {
            fulltext,
            opt_index_name,
            columns,
            ..
        } => {
            let fields = idents(columns);
            check_fields(table, &fields, diagnostics);
            let kind = if *fulltext {
                IndexKind::Fulltext
            } else {
                IndexKind::Spatial
            };
            let name = opt_index_name.as_ref().map(|n| n.value.clone());
            table.add_index(IndexDef::new(kind, fields, name));
        }
        TableConstraint::ForeignKey {
            name,
            columns,
            foreign_table,
            referred_columns,
            on_delete,
            on_update,
            ..
        } => {
            let fields = idents(columns);
            check_fields(table, &fields, diagnostics);
            let name = name
                .as_ref()
                .map(|n| n.value.clone())
                .unwrap_or_else(|| next_foreign_key_name(table));
            let fk = ForeignKeyDef {
                on_delete: on_delete.as_ref().map(referential_action),
                on_update: on_update.as_ref().map(referential_action),
                ..ForeignKeyDef::new(
                    name,
                    fields.first().cloned().unwrap_or_default(),
                    object_name(foreign_table),
                    referred_columns
                        .first()
                        .map(|c| c.value.clone())
                        .unwrap_or_default(),
                )
            };
            table.add_foreign_key(fk);
        }
        _ => {}
    }
}

/// Warn about index or constraint fields the table does not have
fn check_fields(table: &TableDef, fields: &[String], diagnostics: &mut Vec<Diagnostic>) {
    for field in fields {
        if table.get_column(field).is_none() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::ColumnNotFound,
                format!(
                    "Column '{}' referenced by a key of table '{}' was not found",
                    field, table.name
                ),
            ));
        }
    }
}

/// Name MySQL gives an unnamed foreign key: `<table>_ibfk_<n>`
fn next_foreign_key_name(table: &TableDef) -> String {
    let mut n = table.foreign_keys.len() + 1;
    loop {
        let name = format!("{}_ibfk_{}", table.name, n);
        if table.get_foreign_key(&name).is_none() {
            return name;
        }
        n += 1;
    }
}

fn referential_action(action: &ast::ReferentialAction) -> ReferentialAction {
    match action {
        ast::ReferentialAction::Restrict => ReferentialAction::Restrict,
        ast::ReferentialAction::Cascade => ReferentialAction::Cascade,
        ast::ReferentialAction::SetNull => ReferentialAction::SetNull,
        ast::ReferentialAction::NoAction => ReferentialAction::NoAction,
        ast::ReferentialAction::SetDefault => ReferentialAction::SetDefault,
    }
}

fn apply_default(col: &mut ColumnDef, expr: &Expr) {
    match expr {
        Expr::Value(Value::Null) => col.default = None,
        Expr::Value(Value::SingleQuotedString(s)) | Expr::Value(Value::DoubleQuotedString(s)) => {
            col.default = Some(s.clone());
        }
        other if is_current_timestamp(other) => col.default_timestamp = true,
        other => col.default = Some(other.to_string()),
    }
}

/// `CURRENT_TIMESTAMP`, `NOW()` or `LOCALTIMESTAMP`, with or without precision
fn is_current_timestamp(expr: &Expr) -> bool {
    let name = match expr {
        Expr::Function(function) => object_name(&function.name),
        Expr::Identifier(ident) => ident.value.clone(),
        _ => return false,
    };
    matches!(
        name.to_ascii_uppercase().as_str(),
        "CURRENT_TIMESTAMP" | "NOW" | "LOCALTIMESTAMP"
    )
}

/// Unqualified object name
fn object_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
}

fn idents(columns: &[ast::Ident]) -> Vec<String> {
    columns.iter().map(|c| c.value.clone()).collect()
}

/// Column named by an index expression; prefix lengths such as `name(10)`
/// keep only the column
fn expr_column(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(idents) => idents
            .last()
            .map(|ident| ident.value.clone())
            .unwrap_or_default(),
        other => {
            let text = other.to_string();
            match text.find('(') {
                Some(open) => text[..open].trim().trim_matches('`').to_string(),
                None => text,
            }
        }
    }
}

/// Split SQL text into individual statements by semicolons,
/// respecting quoted strings, quoted identifiers and comments.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                // Skip quoted text; backslash and doubled quotes escape
                i += 1;
                while i < len {
                    if bytes[i] == b'\\' && quote != b'`' {
                        i += 2;
                    } else if bytes[i] == quote {
                        i += 1;
                        if i < len && bytes[i] == quote {
                            i += 1;
                        } else {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                // Skip line comment
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'#' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                // Skip block comment
                i += 2;
                while i + 1 < len {
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                let stmt = &sql[start..i];
                if !stmt.trim().is_empty() {
                    statements.push(stmt);
                }
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    // Handle last statement (without trailing semicolon)
    if start < len {
        let last = &sql[start..];
        if !last.trim().is_empty() {
            statements.push(last);
        }
    }

    statements
}
