use serde::{Deserialize, Serialize};

/// Column metadata read from `information_schema.columns`.
///
/// Lives only for the duration of one introspection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Catalog type name (e.g. `character varying`, `ARRAY`, `USER-DEFINED`).
    pub data_type: String,
    /// Underlying type name, used for arrays and user-defined types.
    pub udt_name: Option<String>,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub is_nullable: bool,
}

impl ColumnDescriptor {
    /// Create a descriptor with only a name and a base type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            udt_name: None,
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            is_nullable,
        }
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.character_max_length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: i32, scale: Option<i32>) -> Self {
        self.numeric_precision = Some(precision);
        self.numeric_scale = scale;
        self
    }

    pub fn with_udt_name(mut self, udt_name: impl Into<String>) -> Self {
        self.udt_name = Some(udt_name.into());
        self
    }

    /// Composite type string for display: `type(len)`, `type(p,s)`, `type(p)`
    /// or the bare base type.
    pub fn full_type(&self) -> String {
        match (
            self.character_max_length,
            self.numeric_precision,
            self.numeric_scale,
        ) {
            (Some(len), _, _) => format!("{}({len})", self.data_type),
            (None, Some(precision), Some(scale)) => {
                format!("{}({precision},{scale})", self.data_type)
            }
            (None, Some(precision), None) => format!("{}({precision})", self.data_type),
            _ => self.data_type.clone(),
        }
    }

    /// Type text usable inside a `CREATE TABLE` column definition.
    ///
    /// Integer and float columns also report a precision in the catalog, so
    /// only `numeric` carries its precision into the DDL.
    pub fn ddl_type(&self) -> String {
        match self.data_type.as_str() {
            "ARRAY" => match self.udt_name.as_deref() {
                Some(udt) => format!("{}[]", udt.trim_start_matches('_')),
                None => self.data_type.clone(),
            },
            "USER-DEFINED" => self
                .udt_name
                .clone()
                .unwrap_or_else(|| self.data_type.clone()),
            _ => {
                if let Some(len) = self.character_max_length {
                    return format!("{}({len})", self.data_type);
                }
                match (self.data_type.as_str(), self.numeric_precision) {
                    ("numeric", Some(precision)) => match self.numeric_scale {
                        Some(scale) => format!("numeric({precision},{scale})"),
                        None => format!("numeric({precision})"),
                    },
                    _ => self.data_type.clone(),
                }
            }
        }
    }

    /// `name type[(len)] [NOT NULL]`
    pub fn column_definition(&self) -> String {
        if self.is_nullable {
            format!("{} {}", self.name, self.ddl_type())
        } else {
            format!("{} {} NOT NULL", self.name, self.ddl_type())
        }
    }
}
