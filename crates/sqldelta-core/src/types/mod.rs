//! Column type system: declared kinds and the attributes each kind supports

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::ast::{CharacterLength, DataType, ExactNumberInfo};
use thiserror::Error;

/// Declared kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    // Numeric types
    Bit,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Decimal,
    Float,
    Double,

    // Boolean
    Bool,

    // Character types
    Char,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Enum,
    Set,

    // Binary types
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,

    // Date/Time types
    Date,
    DateTime,
    Timestamp,
    Time,
    Year,

    // JSON
    Json,
}

impl SqlType {
    /// Attributes a column of this kind carries
    pub fn capabilities(&self) -> Capabilities {
        use SqlType::*;
        match self {
            TinyInt | SmallInt | MediumInt | Int | BigInt => Capabilities::INTEGER,
            Decimal | Float | Double => Capabilities::FRACTIONAL,
            Char | VarChar => Capabilities::CHARACTER,
            TinyText | Text | MediumText | LongText => Capabilities::TEXT,
            Enum | Set => Capabilities::CHOICE,
            Bit | Binary | VarBinary => Capabilities::SIZED,
            DateTime | Timestamp => Capabilities::MOMENT,
            Bool | TinyBlob | Blob | MediumBlob | LongBlob | Date | Time | Year | Json => {
                Capabilities::NONE
            }
        }
    }

    /// Lowercase SQL keyword for this type
    pub fn keyword(&self) -> &'static str {
        match self {
            SqlType::Bit => "bit",
            SqlType::TinyInt => "tinyint",
            SqlType::SmallInt => "smallint",
            SqlType::MediumInt => "mediumint",
            SqlType::Int => "int",
            SqlType::BigInt => "bigint",
            SqlType::Decimal => "decimal",
            SqlType::Float => "float",
            SqlType::Double => "double",
            SqlType::Bool => "bool",
            SqlType::Char => "char",
            SqlType::VarChar => "varchar",
            SqlType::TinyText => "tinytext",
            SqlType::Text => "text",
            SqlType::MediumText => "mediumtext",
            SqlType::LongText => "longtext",
            SqlType::Enum => "enum",
            SqlType::Set => "set",
            SqlType::Binary => "binary",
            SqlType::VarBinary => "varbinary",
            SqlType::TinyBlob => "tinyblob",
            SqlType::Blob => "blob",
            SqlType::MediumBlob => "mediumblob",
            SqlType::LongBlob => "longblob",
            SqlType::Date => "date",
            SqlType::DateTime => "datetime",
            SqlType::Timestamp => "timestamp",
            SqlType::Time => "time",
            SqlType::Year => "year",
            SqlType::Json => "json",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for SqlType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let sql_type = match name.as_str() {
            "bit" => SqlType::Bit,
            "tinyint" | "int1" => SqlType::TinyInt,
            "smallint" | "int2" => SqlType::SmallInt,
            "mediumint" | "int3" | "middleint" => SqlType::MediumInt,
            "int" | "integer" | "int4" => SqlType::Int,
            "bigint" | "int8" => SqlType::BigInt,
            "decimal" | "dec" | "numeric" | "fixed" => SqlType::Decimal,
            "float" => SqlType::Float,
            "double" | "double precision" | "real" => SqlType::Double,
            "bool" | "boolean" => SqlType::Bool,
            "char" | "character" => SqlType::Char,
            "varchar" | "character varying" => SqlType::VarChar,
            "tinytext" => SqlType::TinyText,
            "text" => SqlType::Text,
            "mediumtext" => SqlType::MediumText,
            "longtext" => SqlType::LongText,
            "enum" => SqlType::Enum,
            "set" => SqlType::Set,
            "binary" => SqlType::Binary,
            "varbinary" => SqlType::VarBinary,
            "tinyblob" => SqlType::TinyBlob,
            "blob" => SqlType::Blob,
            "mediumblob" => SqlType::MediumBlob,
            "longblob" => SqlType::LongBlob,
            "date" => SqlType::Date,
            "datetime" => SqlType::DateTime,
            "timestamp" => SqlType::Timestamp,
            "time" => SqlType::Time,
            "year" => SqlType::Year,
            "json" => SqlType::Json,
            "" => return Err(TypeError::Empty),
            _ => return Err(TypeError::UnknownType(s.trim().to_string())),
        };
        Ok(sql_type)
    }
}

/// Optional attributes supported by a column kind.
///
/// `precision` covers both precision and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub autoincrement: bool,
    pub binary: bool,
    pub charset: bool,
    pub collate: bool,
    pub precision: bool,
    pub default_timestamp: bool,
    pub on_update_timestamp: bool,
    pub options: bool,
    pub size: bool,
    pub unsigned: bool,
    pub zerofill: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        autoincrement: false,
        binary: false,
        charset: false,
        collate: false,
        precision: false,
        default_timestamp: false,
        on_update_timestamp: false,
        options: false,
        size: false,
        unsigned: false,
        zerofill: false,
    };

    const INTEGER: Self = Self {
        autoincrement: true,
        size: true,
        unsigned: true,
        zerofill: true,
        ..Self::NONE
    };

    const FRACTIONAL: Self = Self {
        precision: true,
        unsigned: true,
        zerofill: true,
        ..Self::NONE
    };

    const CHARACTER: Self = Self {
        size: true,
        binary: true,
        charset: true,
        collate: true,
        ..Self::NONE
    };

    const TEXT: Self = Self {
        binary: true,
        charset: true,
        collate: true,
        ..Self::NONE
    };

    const CHOICE: Self = Self {
        options: true,
        charset: true,
        collate: true,
        ..Self::NONE
    };

    const SIZED: Self = Self {
        size: true,
        ..Self::NONE
    };

    const MOMENT: Self = Self {
        default_timestamp: true,
        on_update_timestamp: true,
        ..Self::NONE
    };
}

/// A parsed type declaration such as `int(11) unsigned` or `enum('a','b')`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub sql_type: SqlType,
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub options: Vec<String>,
    pub unsigned: bool,
    pub zerofill: bool,
}

impl DeclaredType {
    pub fn new(sql_type: SqlType) -> Self {
        Self {
            sql_type,
            size: None,
            precision: None,
            scale: None,
            options: Vec::new(),
            unsigned: false,
            zerofill: false,
        }
    }

    fn integer(sql_type: SqlType, length: &Option<u64>, unsigned: bool) -> Self {
        Self {
            size: length.and_then(|l| u32::try_from(l).ok()),
            unsigned,
            ..Self::new(sql_type)
        }
    }

    /// Convert from sqlparser's DataType.
    ///
    /// Kinds without a dedicated arm go through their rendered form.
    pub fn from_ast(data_type: &DataType) -> Result<Self, TypeError> {
        let declared = match data_type {
            DataType::TinyInt(len) => Self::integer(SqlType::TinyInt, len, false),
            DataType::UnsignedTinyInt(len) => Self::integer(SqlType::TinyInt, len, true),
            DataType::SmallInt(len) => Self::integer(SqlType::SmallInt, len, false),
            DataType::UnsignedSmallInt(len) => Self::integer(SqlType::SmallInt, len, true),
            DataType::MediumInt(len) => Self::integer(SqlType::MediumInt, len, false),
            DataType::UnsignedMediumInt(len) => Self::integer(SqlType::MediumInt, len, true),
            DataType::Int(len) | DataType::Integer(len) => Self::integer(SqlType::Int, len, false),
            DataType::UnsignedInt(len) | DataType::UnsignedInteger(len) => {
                Self::integer(SqlType::Int, len, true)
            }
            DataType::BigInt(len) => Self::integer(SqlType::BigInt, len, false),
            DataType::UnsignedBigInt(len) => Self::integer(SqlType::BigInt, len, true),

            DataType::Bool | DataType::Boolean => Self::new(SqlType::Bool),

            DataType::Decimal(info) | DataType::Numeric(info) => {
                let (precision, scale) = match info {
                    ExactNumberInfo::None => (None, None),
                    ExactNumberInfo::Precision(p) => (Some(*p), None),
                    ExactNumberInfo::PrecisionAndScale(p, s) => (Some(*p), Some(*s)),
                };
                Self {
                    precision: precision.and_then(|p| u32::try_from(p).ok()),
                    scale: scale.and_then(|s| u32::try_from(s).ok()),
                    ..Self::new(SqlType::Decimal)
                }
            }

            DataType::Char(info) | DataType::Character(info) => Self {
                size: extract_char_length(info.as_ref()),
                ..Self::new(SqlType::Char)
            },

            DataType::Varchar(info) | DataType::CharacterVarying(info) => Self {
                size: extract_char_length(info.as_ref()),
                ..Self::new(SqlType::VarChar)
            },

            other => other.to_string().parse()?,
        };
        Ok(declared)
    }
}

impl FromStr for DeclaredType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(TypeError::Empty);
        }

        let (head, arguments, tail) = match text.find('(') {
            Some(open) => {
                let close = find_closing_paren(text, open)
                    .ok_or_else(|| TypeError::Malformed(text.to_string()))?;
                (&text[..open], Some(&text[open + 1..close]), &text[close + 1..])
            }
            None => {
                // Modifiers trail the type name: "int unsigned", "double precision zerofill"
                let split = modifier_offset(text).unwrap_or(text.len());
                (&text[..split], None, &text[split..])
            }
        };

        let mut declared = DeclaredType::new(head.parse()?);

        for word in tail.split_whitespace() {
            match word.to_lowercase().as_str() {
                "unsigned" => declared.unsigned = true,
                "zerofill" => declared.zerofill = true,
                "signed" => {}
                _ => return Err(TypeError::Malformed(text.to_string())),
            }
        }

        if let Some(arguments) = arguments {
            declared.apply_arguments(arguments)?;
        }

        Ok(declared)
    }
}

impl DeclaredType {
    fn apply_arguments(&mut self, arguments: &str) -> Result<(), TypeError> {
        let capabilities = self.sql_type.capabilities();
        if capabilities.options {
            self.options = parse_quoted_list(arguments)
                .ok_or_else(|| self.invalid_argument(arguments))?;
        } else if capabilities.precision {
            let mut parts = arguments.split(',');
            self.precision = parts.next().map(|p| self.number(p)).transpose()?;
            self.scale = parts.next().map(|s| self.number(s)).transpose()?;
            if parts.next().is_some() {
                return Err(self.invalid_argument(arguments));
            }
        } else if capabilities.size {
            self.size = Some(self.number(arguments)?);
        }
        // Fractional-second precision and display widths of other kinds are not tracked
        Ok(())
    }

    fn number(&self, argument: &str) -> Result<u32, TypeError> {
        argument
            .trim()
            .parse()
            .map_err(|_| self.invalid_argument(argument))
    }

    fn invalid_argument(&self, argument: &str) -> TypeError {
        TypeError::InvalidArgument {
            sql_type: self.sql_type,
            argument: argument.trim().to_string(),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type)?;
        if !self.options.is_empty() {
            let quoted: Vec<String> = self
                .options
                .iter()
                .map(|o| format!("'{}'", o.replace('\'', "''")))
                .collect();
            write!(f, "({})", quoted.join(","))?;
        } else {
            match (self.size, self.precision, self.scale) {
                (Some(size), _, _) => write!(f, "({size})")?,
                (None, Some(p), Some(s)) => write!(f, "({p},{s})")?,
                (None, Some(p), None) => write!(f, "({p})")?,
                _ => {}
            }
        }
        if self.unsigned {
            write!(f, " unsigned")?;
        }
        if self.zerofill {
            write!(f, " zerofill")?;
        }
        Ok(())
    }
}

/// Errors raised while reading a type declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("empty type declaration")]
    Empty,

    #[error("unknown column type '{0}'")]
    UnknownType(String),

    #[error("malformed type declaration '{0}'")]
    Malformed(String),

    #[error("invalid argument '{argument}' for type {sql_type}")]
    InvalidArgument { sql_type: SqlType, argument: String },
}

/// Byte offset of the first trailing modifier keyword, if any
fn modifier_offset(text: &str) -> Option<usize> {
    let mut offset = 0;
    for word in text.split_inclusive(char::is_whitespace) {
        if matches!(
            word.trim().to_ascii_lowercase().as_str(),
            "unsigned" | "signed" | "zerofill"
        ) {
            return Some(offset);
        }
        offset += word.len();
    }
    None
}

/// Extract character length from CharacterLength if present
fn extract_char_length(info: Option<&CharacterLength>) -> Option<u32> {
    info.and_then(|i| match i {
        CharacterLength::IntegerLength { length, .. } => u32::try_from(*length).ok(),
        CharacterLength::Max => None,
    })
}

/// Index of the `)` matching the `(` at `open`, skipping quoted text
fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut chars = text[open..].char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' if in_quote => {
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                } else {
                    in_quote = false;
                }
            }
            '\'' => in_quote = true,
            '\\' if in_quote => {
                chars.next();
            }
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `'a', 'b', 'it''s'` into its unquoted values
fn parse_quoted_list(text: &str) -> Option<Vec<String>> {
    let mut values = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some('\'') => {}
            Some(_) => return None,
        }

        let mut value = String::new();
        loop {
            match chars.next()? {
                '\'' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    value.push('\'');
                }
                '\'' => break,
                '\\' => value.push(chars.next()?),
                c => value.push(c),
            }
        }
        values.push(value);

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return None,
        }
    }

    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_declaration() {
        let declared: DeclaredType = "INT(11) UNSIGNED ZEROFILL".parse().unwrap();
        assert_eq!(declared.sql_type, SqlType::Int);
        assert_eq!(declared.size, Some(11));
        assert!(declared.unsigned);
        assert!(declared.zerofill);
    }

    #[test]
    fn test_parse_modifiers_without_arguments() {
        let declared: DeclaredType = "bigint unsigned".parse().unwrap();
        assert_eq!(declared.sql_type, SqlType::BigInt);
        assert_eq!(declared.size, None);
        assert!(declared.unsigned);

        let declared: DeclaredType = "double precision".parse().unwrap();
        assert_eq!(declared.sql_type, SqlType::Double);
    }

    #[test]
    fn test_parse_enum_options() {
        let declared: DeclaredType = "ENUM('a', 'b, c', 'it''s')".parse().unwrap();
        assert_eq!(declared.sql_type, SqlType::Enum);
        assert_eq!(declared.options, vec!["a", "b, c", "it's"]);
    }

    #[test]
    fn test_parse_decimal_precision() {
        let declared: DeclaredType = "decimal(10,2)".parse().unwrap();
        assert_eq!(declared.precision, Some(10));
        assert_eq!(declared.scale, Some(2));

        let declared: DeclaredType = "float(7)".parse().unwrap();
        assert_eq!(declared.precision, Some(7));
        assert_eq!(declared.scale, None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<DeclaredType>(), Err(TypeError::Empty));
        assert!(matches!(
            "geometry".parse::<DeclaredType>(),
            Err(TypeError::UnknownType(_))
        ));
        assert!(matches!(
            "varchar(abc)".parse::<DeclaredType>(),
            Err(TypeError::InvalidArgument { .. })
        ));
        assert!(matches!(
            "varchar(10".parse::<DeclaredType>(),
            Err(TypeError::Malformed(_))
        ));
    }

    #[test]
    fn test_display_round_trips_declaration() {
        let declared: DeclaredType = "tinyint(1) unsigned".parse().unwrap();
        assert_eq!(declared.to_string(), "tinyint(1) unsigned");
    }

    #[test]
    fn test_from_ast() {
        let declared = DeclaredType::from_ast(&DataType::UnsignedInt(Some(11))).unwrap();
        assert_eq!(declared.sql_type, SqlType::Int);
        assert_eq!(declared.size, Some(11));
        assert!(declared.unsigned);

        let declared = DeclaredType::from_ast(&DataType::Boolean).unwrap();
        assert_eq!(declared.sql_type, SqlType::Bool);
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(SqlType::Bool.capabilities(), Capabilities::NONE);
        assert!(SqlType::TinyInt.capabilities().autoincrement);
        assert!(SqlType::Enum.capabilities().options);
        assert!(!SqlType::Text.capabilities().size);
        assert!(SqlType::Timestamp.capabilities().on_update_timestamp);
    }
}
