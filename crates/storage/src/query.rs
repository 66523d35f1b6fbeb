//! Parameterized query construction for tiles and stats.
//!
//! A request is turned into an ordered list of typed [`Predicate`]s which is
//! then folded into one AND-combined WHERE clause plus the matching list of
//! bound parameters. Request values never appear in the SQL text; only the
//! operator-configured [`DatasetSchema`] and [`TileEncoding`] do, and both are
//! validated before a builder can be created.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tile_common::{FilterSet, TileAddress};

/// SRID of the Web Mercator grid that `ST_TileEnvelope` produces.
pub const WEB_MERCATOR_SRID: i32 = 3857;

/// Alias of the clipped geometry inside the tile query.
const MVT_GEOM_ALIAS: &str = "mvt_geom";

/// Names of the footprint table and its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    /// Table name, optionally schema-qualified (`public.buildings`).
    pub table: String,
    pub geometry_column: String,
    /// Coarse label (e.g. `residential`).
    pub category_column: String,
    /// Fine label (e.g. `house`).
    pub subcategory_column: String,
    pub height_column: String,
    /// SRID the geometry column is stored in.
    pub srid: i32,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            table: "buildings".to_string(),
            geometry_column: "geom".to_string(),
            category_column: "subtype".to_string(),
            subcategory_column: "class".to_string(),
            height_column: "height".to_string(),
            srid: 4326,
        }
    }
}

impl DatasetSchema {
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_table_name(&self.table)?;
        for (field, value) in [
            ("geometry_column", &self.geometry_column),
            ("category_column", &self.category_column),
            ("subcategory_column", &self.subcategory_column),
            ("height_column", &self.height_column),
        ] {
            if !is_identifier(value) {
                return Err(SchemaError::InvalidIdentifier {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.srid <= 0 {
            return Err(SchemaError::InvalidSrid(self.srid));
        }
        Ok(())
    }

    fn table_sql(&self) -> String {
        self.table
            .split('.')
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Vector tile encoding options passed to `ST_AsMVT`/`ST_AsMVTGeom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileEncoding {
    /// Source-layer name clients style against.
    pub layer_name: String,
    /// Tile extent in tile-space units.
    pub extent: u32,
    /// Clip buffer in tile-space units.
    pub buffer: u32,
}

impl Default for TileEncoding {
    fn default() -> Self {
        Self {
            layer_name: "layer".to_string(),
            extent: 4096,
            buffer: 64,
        }
    }
}

impl TileEncoding {
    pub fn validate(&self) -> Result<(), SchemaError> {
        let valid_name = !self.layer_name.is_empty()
            && self
                .layer_name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid_name {
            return Err(SchemaError::InvalidLayerName(self.layer_name.clone()));
        }
        if self.extent == 0 || self.extent > i32::MAX as u32 {
            return Err(SchemaError::InvalidExtent(self.extent));
        }
        if self.buffer > i32::MAX as u32 {
            return Err(SchemaError::InvalidBuffer(self.buffer));
        }
        Ok(())
    }
}

/// Invalid operator configuration for the query builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Invalid {field} '{value}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("Invalid layer name '{0}': expected [A-Za-z0-9_-]+")]
    InvalidLayerName(String),

    #[error("Invalid tile extent {0}")]
    InvalidExtent(u32),

    #[error("Invalid tile buffer {0}")]
    InvalidBuffer(u32),

    #[error("Invalid SRID {0}")]
    InvalidSrid(i32),
}

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Int(i64),
    Text(String),
}

/// One fragment of the combined WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Geometry intersects the envelope of this tile.
    TileEnvelope(TileAddress),
    CategoryEquals(String),
    SubcategoryEquals(String),
}

impl Predicate {
    /// Values this predicate binds, in placeholder order.
    pub fn params(&self) -> Vec<QueryParam> {
        match self {
            Predicate::TileEnvelope(address) => vec![
                QueryParam::Int(i64::from(address.zoom)),
                QueryParam::Int(i64::from(address.column)),
                QueryParam::Int(i64::from(address.row)),
            ],
            Predicate::CategoryEquals(value) | Predicate::SubcategoryEquals(value) => {
                vec![QueryParam::Text(value.clone())]
            }
        }
    }

    /// SQL for this predicate with placeholders starting at `$first`.
    fn render(&self, schema: &DatasetSchema, first: usize) -> String {
        match self {
            Predicate::TileEnvelope(_) => format!(
                "ST_Intersects({}, {})",
                quote_ident(&schema.geometry_column),
                envelope_in_srid(first, schema.srid)
            ),
            Predicate::CategoryEquals(_) => {
                format!("{} = ${}", quote_ident(&schema.category_column), first)
            }
            Predicate::SubcategoryEquals(_) => {
                format!("{} = ${}", quote_ident(&schema.subcategory_column), first)
            }
        }
    }
}

/// What a built query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A single `bytea` column holding the encoded tile.
    Tile,
    /// `count BIGINT, avg_height DOUBLE PRECISION`.
    Stats,
}

/// SQL text plus its ordered bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    kind: QueryKind,
    sql: String,
    params: Vec<QueryParam>,
    predicates: Vec<Predicate>,
}

impl BuiltQuery {
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    /// The typed fragments the WHERE clause was folded from.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

/// Builds tile and stats queries for one dataset.
///
/// Pure and deterministic: the same inputs always give the same SQL and the
/// same parameters, and nothing is executed here.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    schema: DatasetSchema,
    encoding: TileEncoding,
}

impl QueryBuilder {
    pub fn new(schema: DatasetSchema, encoding: TileEncoding) -> Result<Self, SchemaError> {
        schema.validate()?;
        encoding.validate()?;
        Ok(Self { schema, encoding })
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn encoding(&self) -> &TileEncoding {
        &self.encoding
    }

    /// Predicates for a tile request: the envelope first, then attributes.
    pub fn tile_predicates(address: &TileAddress, filters: &FilterSet) -> Vec<Predicate> {
        let mut predicates = vec![Predicate::TileEnvelope(*address)];
        predicates.extend(Self::attribute_predicates(filters));
        predicates
    }

    /// Category before subcategory, each only when present.
    pub fn attribute_predicates(filters: &FilterSet) -> Vec<Predicate> {
        let mut predicates = Vec::with_capacity(2);
        if let Some(category) = filters.category() {
            predicates.push(Predicate::CategoryEquals(category.to_string()));
        }
        if let Some(subcategory) = filters.subcategory() {
            predicates.push(Predicate::SubcategoryEquals(subcategory.to_string()));
        }
        predicates
    }

    /// Query returning the encoded tile for `address` under `filters`.
    ///
    /// Parameters are always `(zoom, column, row)` followed by the attribute
    /// values in category, subcategory order.
    pub fn tile_query(&self, address: &TileAddress, filters: &FilterSet) -> BuiltQuery {
        let predicates = Self::tile_predicates(address, filters);
        let (where_clause, params) = self.fold(&predicates);

        let schema = &self.schema;
        let encoding = &self.encoding;
        let geometry = quote_ident(&schema.geometry_column);
        let mercator_geometry = if schema.srid == WEB_MERCATOR_SRID {
            geometry
        } else {
            format!("ST_Transform({}, {})", geometry, WEB_MERCATOR_SRID)
        };

        let sql = format!(
            "WITH features AS (\
             SELECT ST_AsMVTGeom({geom}, {envelope}, {extent}, {buffer}, true) AS {alias}, \
             {category}, {subcategory}, {height} \
             FROM {table} \
             WHERE {where_clause}\
             ) \
             SELECT ST_AsMVT(features.*, '{layer}', {extent}, '{alias}') \
             FROM features WHERE {alias} IS NOT NULL",
            geom = mercator_geometry,
            envelope = tile_envelope(1),
            extent = encoding.extent,
            buffer = encoding.buffer,
            alias = MVT_GEOM_ALIAS,
            category = quote_ident(&schema.category_column),
            subcategory = quote_ident(&schema.subcategory_column),
            height = quote_ident(&schema.height_column),
            table = schema.table_sql(),
            layer = encoding.layer_name,
        );

        BuiltQuery {
            kind: QueryKind::Tile,
            sql,
            params,
            predicates,
        }
    }

    /// Query returning the row count and mean height under `filters`.
    ///
    /// With no filters the aggregate runs over the whole table.
    pub fn stats_query(&self, filters: &FilterSet) -> BuiltQuery {
        let predicates = Self::attribute_predicates(filters);
        let (where_clause, params) = self.fold(&predicates);

        let mut sql = format!(
            "SELECT COUNT(*)::BIGINT AS count, AVG({})::DOUBLE PRECISION AS avg_height FROM {}",
            quote_ident(&self.schema.height_column),
            self.schema.table_sql()
        );
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }

        BuiltQuery {
            kind: QueryKind::Stats,
            sql,
            params,
            predicates,
        }
    }

    /// AND-combine predicates, numbering placeholders from `$1`.
    fn fold(&self, predicates: &[Predicate]) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::with_capacity(predicates.len());
        let mut params = Vec::new();

        for predicate in predicates {
            clauses.push(predicate.render(&self.schema, params.len() + 1));
            params.extend(predicate.params());
        }

        (clauses.join(" AND "), params)
    }
}

/// `ST_TileEnvelope` over three consecutive placeholders starting at `$first`.
fn tile_envelope(first: usize) -> String {
    format!(
        "ST_TileEnvelope(${}::integer, ${}::integer, ${}::integer)",
        first,
        first + 1,
        first + 2
    )
}

fn envelope_in_srid(first: usize, srid: i32) -> String {
    if srid == WEB_MERCATOR_SRID {
        tile_envelope(first)
    } else {
        format!("ST_Transform({}, {})", tile_envelope(first), srid)
    }
}

fn is_identifier(value: &str) -> bool {
    let mut bytes = value.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn validate_table_name(table: &str) -> Result<(), SchemaError> {
    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| is_identifier(p)) {
        return Err(SchemaError::InvalidIdentifier {
            field: "table",
            value: table.to_string(),
        });
    }
    Ok(())
}

/// Quote an identifier that has already passed [`is_identifier`].
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident)
}
