//! Schema catalog - database, table, column, index and foreign key definitions

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{Capabilities, DeclaredType, SqlType};

/// Name of the implicit primary key index
pub const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// Database definition - holds all tables of one schema snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDef {
    pub name: String,
    #[serde(default)]
    pub default_engine: Option<String>,
    #[serde(default)]
    pub default_charset: Option<String>,
    #[serde(default)]
    pub default_collation: Option<String>,
    /// Table name -> TableDef
    #[serde(default)]
    pub tables: IndexMap<String, TableDef>,
}

impl DatabaseDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_default_engine(mut self, engine: impl Into<String>) -> Self {
        self.default_engine = Some(engine.into());
        self
    }

    pub fn with_default_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = Some(charset.into());
        self
    }

    pub fn with_default_collation(mut self, collation: impl Into<String>) -> Self {
        self.default_collation = Some(collation.into());
        self
    }

    pub fn with_table(mut self, table: TableDef) -> Self {
        self.add_table(table);
        self
    }

    /// Add a table, replacing any table of the same name
    pub fn add_table(&mut self, table: TableDef) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut TableDef> {
        self.tables.get_mut(name)
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    /// Column name -> ColumnDef, in declaration order
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Foreign key name -> ForeignKeyDef
    #[serde(default)]
    pub foreign_keys: IndexMap<String, ForeignKeyDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: None,
            charset: None,
            collation: None,
            columns: IndexMap::new(),
            indexes: Vec::new(),
            foreign_keys: IndexMap::new(),
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.add_column(column);
        self
    }

    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.add_index(index);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyDef) -> Self {
        self.add_foreign_key(foreign_key);
        self
    }

    /// Add a column, replacing any column of the same name in place
    pub fn add_column(&mut self, column: ColumnDef) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Add an index, replacing any index of the same name in place
    pub fn add_index(&mut self, index: IndexDef) {
        match self.indexes.iter_mut().find(|i| i.name == index.name) {
            Some(existing) => *existing = index,
            None => self.indexes.push(index),
        }
    }

    pub fn add_foreign_key(&mut self, foreign_key: ForeignKeyDef) {
        self.foreign_keys
            .insert(foreign_key.name.clone(), foreign_key);
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.get(name)
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut ColumnDef> {
        self.columns.get_mut(name)
    }

    /// Get an index by name
    pub fn get_index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Get a foreign key by name
    pub fn get_foreign_key(&self, name: &str) -> Option<&ForeignKeyDef> {
        self.foreign_keys.get(name)
    }

    /// The primary key index, if declared
    pub fn primary_key(&self) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.kind == IndexKind::Primary)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }
}

/// Read of an optional column attribute.
///
/// `Unsupported` means the column's kind does not carry the attribute at all,
/// which is distinct from a supported attribute holding an empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<T> {
    Unsupported,
    Supported(T),
}

impl<T> Capability<T> {
    fn when(supported: bool, value: T) -> Self {
        if supported {
            Capability::Supported(value)
        } else {
            Capability::Unsupported
        }
    }

    pub fn supported(self) -> Option<T> {
        match self {
            Capability::Supported(value) => Some(value),
            Capability::Unsupported => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Capability::Supported(value) => Capability::Supported(f(value)),
            Capability::Unsupported => Capability::Unsupported,
        }
    }
}

fn yes() -> bool {
    true
}

/// Column definition.
///
/// Attribute fields are stored regardless of kind; the accessors below only
/// expose the ones the column's [`SqlType`] supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: SqlType,
    #[serde(default = "yes")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub autoincrement: bool,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default)]
    pub zerofill: bool,
    #[serde(default)]
    pub default_timestamp: bool,
    #[serde(default)]
    pub on_update_timestamp: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            default: None,
            comment: None,
            autoincrement: false,
            binary: false,
            charset: None,
            collation: None,
            size: None,
            precision: None,
            scale: None,
            unsigned: false,
            zerofill: false,
            default_timestamp: false,
            on_update_timestamp: false,
            options: Vec::new(),
        }
    }

    /// Build a column from a parsed type declaration
    pub fn from_declared(name: impl Into<String>, declared: DeclaredType) -> Self {
        Self {
            size: declared.size,
            precision: declared.precision,
            scale: declared.scale,
            unsigned: declared.unsigned,
            zerofill: declared.zerofill,
            options: declared.options,
            ..Self::new(name, declared.sql_type)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn zerofill(mut self) -> Self {
        self.zerofill = true;
        self
    }

    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    pub fn default_timestamp(mut self) -> Self {
        self.default_timestamp = true;
        self
    }

    pub fn on_update_timestamp(mut self) -> Self {
        self.on_update_timestamp = true;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.data_type.capabilities()
    }

    /// The declared type, including size, precision and modifiers
    pub fn declared_type(&self) -> DeclaredType {
        let caps = self.capabilities();
        DeclaredType {
            sql_type: self.data_type,
            size: self.size.filter(|_| caps.size),
            precision: self.precision.filter(|_| caps.precision),
            scale: self.scale.filter(|_| caps.precision),
            options: if caps.options {
                self.options.clone()
            } else {
                Vec::new()
            },
            unsigned: self.unsigned && caps.unsigned,
            zerofill: self.zerofill && caps.zerofill,
        }
    }

    pub fn autoincrement(&self) -> Capability<bool> {
        Capability::when(self.capabilities().autoincrement, self.autoincrement)
    }

    pub fn is_binary(&self) -> Capability<bool> {
        Capability::when(self.capabilities().binary, self.binary)
    }

    pub fn charset(&self) -> Capability<Option<&str>> {
        Capability::when(self.capabilities().charset, self.charset.as_deref())
    }

    pub fn collation(&self) -> Capability<Option<&str>> {
        Capability::when(self.capabilities().collate, self.collation.as_deref())
    }

    pub fn size(&self) -> Capability<Option<u32>> {
        Capability::when(self.capabilities().size, self.size)
    }

    pub fn precision(&self) -> Capability<Option<u32>> {
        Capability::when(self.capabilities().precision, self.precision)
    }

    pub fn scale(&self) -> Capability<Option<u32>> {
        Capability::when(self.capabilities().precision, self.scale)
    }

    pub fn is_unsigned(&self) -> Capability<bool> {
        Capability::when(self.capabilities().unsigned, self.unsigned)
    }

    pub fn is_zerofill(&self) -> Capability<bool> {
        Capability::when(self.capabilities().zerofill, self.zerofill)
    }

    pub fn is_default_timestamp(&self) -> Capability<bool> {
        Capability::when(self.capabilities().default_timestamp, self.default_timestamp)
    }

    pub fn is_on_update_timestamp(&self) -> Capability<bool> {
        Capability::when(
            self.capabilities().on_update_timestamp,
            self.on_update_timestamp,
        )
    }

    pub fn options(&self) -> Capability<&[String]> {
        Capability::when(self.capabilities().options, self.options.as_slice())
    }
}

/// Index kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Primary,
    Unique,
    Key,
    Fulltext,
    Spatial,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Primary => write!(f, "PRIMARY KEY"),
            IndexKind::Unique => write!(f, "UNIQUE KEY"),
            IndexKind::Key => write!(f, "KEY"),
            IndexKind::Fulltext => write!(f, "FULLTEXT KEY"),
            IndexKind::Spatial => write!(f, "SPATIAL KEY"),
        }
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub kind: IndexKind,
    pub fields: Vec<String>,
}

impl IndexDef {
    /// Create an index; without an explicit name it is named after its fields.
    ///
    /// Primary keys are always named `PRIMARY`.
    pub fn new<I, S>(kind: IndexKind, fields: I, name: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let name = match kind {
            IndexKind::Primary => PRIMARY_INDEX_NAME.to_string(),
            _ => name.unwrap_or_else(|| fields.join("_")),
        };
        Self { name, kind, fields }
    }

    pub fn primary<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IndexKind::Primary, fields, None)
    }

    pub fn unique<I, S>(fields: I, name: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IndexKind::Unique, fields, name)
    }

    pub fn key<I, S>(fields: I, name: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(IndexKind::Key, fields, name)
    }
}

/// Referential action of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

impl ReferentialAction {
    pub fn keyword(&self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub name: String,
    pub source_field: String,
    pub target_table: String,
    pub target_field: String,
    #[serde(default)]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default)]
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKeyDef {
    pub fn new(
        name: impl Into<String>,
        source_field: impl Into<String>,
        target_table: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_field: source_field.into(),
            target_table: target_table.into(),
            target_field: target_field.into(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Schema entities addressed by name within their parent
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for DatabaseDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TableDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ColumnDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for IndexDef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ForeignKeyDef {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_reads_follow_type() {
        let column = ColumnDef::new("flag", SqlType::Bool).with_size(1);
        assert_eq!(column.size(), Capability::Unsupported);
        assert_eq!(column.autoincrement(), Capability::Unsupported);

        let column = ColumnDef::new("flag", SqlType::TinyInt).with_size(1);
        assert_eq!(column.size(), Capability::Supported(Some(1)));
        assert_eq!(column.autoincrement(), Capability::Supported(false));
    }

    #[test]
    fn test_unsupported_differs_from_empty() {
        let text = ColumnDef::new("body", SqlType::Text);
        let json = ColumnDef::new("body", SqlType::Json);
        assert_eq!(text.charset(), Capability::Supported(None));
        assert_ne!(text.charset(), json.charset());
    }

    #[test]
    fn test_index_naming() {
        assert_eq!(IndexDef::primary(["id"]).name, PRIMARY_INDEX_NAME);
        assert_eq!(IndexDef::key(["a", "b"], None).name, "a_b");
        assert_eq!(
            IndexDef::unique(["email"], Some("uk_email".to_string())).name,
            "uk_email"
        );
    }

    #[test]
    fn test_table_lookups() {
        let table = TableDef::new("users")
            .with_column(ColumnDef::new("id", SqlType::Int).auto_increment())
            .with_index(IndexDef::primary(["id"]))
            .with_foreign_key(ForeignKeyDef::new("fk_org", "org_id", "orgs", "id"));

        assert!(table.get_column("id").is_some());
        assert!(table.get_column("missing").is_none());
        assert!(table.get_index(PRIMARY_INDEX_NAME).is_some());
        assert!(table.get_foreign_key("fk_org").is_some());
        assert_eq!(table.primary_key().map(|i| i.fields.clone()), Some(vec!["id".to_string()]));
    }

    #[test]
    fn test_add_index_replaces_same_name() {
        let mut table = TableDef::new("t");
        table.add_index(IndexDef::key(["a"], Some("idx".to_string())));
        table.add_index(IndexDef::unique(["b"], Some("idx".to_string())));
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].kind, IndexKind::Unique);
    }

    #[test]
    fn test_declared_type_drops_unsupported_attributes() {
        let column = ColumnDef::new("body", SqlType::Text).with_size(10).unsigned();
        assert_eq!(column.declared_type().to_string(), "text");

        let column = ColumnDef::new("id", SqlType::Int).with_size(11).unsigned();
        assert_eq!(column.declared_type().to_string(), "int(11) unsigned");
    }
}
