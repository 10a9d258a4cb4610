//! Binary table extensions (`XTENSION = 'BINTABLE'`).

use super::header::{Header, HeaderValue};
use crate::error::ArchiveError;

/// Supported single-element column formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    /// `L`: one byte, `T` or `F`
    Logical,
    /// `B`: unsigned byte
    Byte,
    /// `I`: 16-bit integer
    Short,
    /// `J`: 32-bit integer
    Int,
    /// `K`: 64-bit integer
    Long,
    /// `E`: 32-bit float
    Float,
    /// `D`: 64-bit float
    Double,
}

impl ColumnFormat {
    /// Parses a `TFORMn` value; only a repeat count of one is supported.
    pub fn parse(tform: &str) -> Result<Self, ArchiveError> {
        let tform = tform.trim();
        let split = tform
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ArchiveError::schema(format!("invalid TFORM `{tform}`")))?;
        let (repeat, code) = tform.split_at(split);
        if !repeat.is_empty() && repeat != "1" {
            return Err(ArchiveError::schema(format!(
                "unsupported repeat count in TFORM `{tform}`"
            )));
        }
        let format = match code {
            "L" => ColumnFormat::Logical,
            "B" => ColumnFormat::Byte,
            "I" => ColumnFormat::Short,
            "J" => ColumnFormat::Int,
            "K" => ColumnFormat::Long,
            "E" => ColumnFormat::Float,
            "D" => ColumnFormat::Double,
            _ => {
                return Err(ArchiveError::schema(format!(
                    "unsupported column format `{tform}`"
                )));
            }
        };
        Ok(format)
    }

    pub fn code(self) -> &'static str {
        match self {
            ColumnFormat::Logical => "L",
            ColumnFormat::Byte => "B",
            ColumnFormat::Short => "I",
            ColumnFormat::Int => "J",
            ColumnFormat::Long => "K",
            ColumnFormat::Float => "E",
            ColumnFormat::Double => "D",
        }
    }

    pub fn width(self) -> usize {
        match self {
            ColumnFormat::Logical | ColumnFormat::Byte => 1,
            ColumnFormat::Short => 2,
            ColumnFormat::Int | ColumnFormat::Float => 4,
            ColumnFormat::Long | ColumnFormat::Double => 8,
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<Cell, ArchiveError> {
        let cell = match self {
            ColumnFormat::Logical => Cell::Flag(bytes[0] == b'T'),
            ColumnFormat::Byte => Cell::Number(bytes[0] as f64),
            ColumnFormat::Short => Cell::Number(i16::from_be_bytes(fixed(bytes)?) as f64),
            ColumnFormat::Int => Cell::Number(i32::from_be_bytes(fixed(bytes)?) as f64),
            ColumnFormat::Long => Cell::Number(i64::from_be_bytes(fixed(bytes)?) as f64),
            ColumnFormat::Float => Cell::Number(f32::from_be_bytes(fixed(bytes)?) as f64),
            ColumnFormat::Double => Cell::Number(f64::from_be_bytes(fixed(bytes)?)),
        };
        Ok(cell)
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], ArchiveError> {
    bytes
        .try_into()
        .map_err(|_| ArchiveError::schema("row shorter than its column layout"))
}

enum Cell {
    Flag(bool),
    Number(f64),
}

/// Values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Flags(Vec<bool>),
    Numbers(Vec<f64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Flags(v) => v.len(),
            ColumnData::Numbers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub format: ColumnFormat,
    pub unit: Option<String>,
    pub data: ColumnData,
}

impl TableColumn {
    /// A numeric column stored as 32-bit floats
    pub fn float(name: &str, unit: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            format: ColumnFormat::Float,
            unit: Some(unit.to_string()),
            data: ColumnData::Numbers(values),
        }
    }

    pub fn logical(name: &str, values: Vec<bool>) -> Self {
        Self {
            name: name.to_string(),
            format: ColumnFormat::Logical,
            unit: None,
            data: ColumnData::Flags(values),
        }
    }

    fn encode(&self, row: usize, out: &mut Vec<u8>) {
        match (&self.data, self.format) {
            (ColumnData::Flags(v), _) => out.push(if v[row] { b'T' } else { b'F' }),
            (ColumnData::Numbers(v), ColumnFormat::Double) => {
                out.extend_from_slice(&v[row].to_be_bytes())
            }
            (ColumnData::Numbers(v), _) => out.extend_from_slice(&(v[row] as f32).to_be_bytes()),
        }
    }
}

/// A decoded binary table with its extra header keywords.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinTable {
    pub columns: Vec<TableColumn>,
    /// Keywords beyond the table structure, e.g. `TIME`
    pub extra: Vec<(String, HeaderValue)>,
}

impl BinTable {
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn row_width(&self) -> usize {
        self.columns.iter().map(|c| c.format.width()).sum()
    }

    /// Header describing this table.
    pub fn header(&self) -> Header {
        let mut header = Header::new();
        header.set("XTENSION", HeaderValue::Text("BINTABLE".to_string()));
        header.set("BITPIX", HeaderValue::Integer(8));
        header.set("NAXIS", HeaderValue::Integer(2));
        header.set("NAXIS1", HeaderValue::Integer(self.row_width() as i64));
        header.set("NAXIS2", HeaderValue::Integer(self.rows() as i64));
        header.set("PCOUNT", HeaderValue::Integer(0));
        header.set("GCOUNT", HeaderValue::Integer(1));
        header.set("TFIELDS", HeaderValue::Integer(self.columns.len() as i64));
        for (i, column) in self.columns.iter().enumerate() {
            let n = i + 1;
            header.set(&format!("TTYPE{n}"), HeaderValue::Text(column.name.clone()));
            header.set(
                &format!("TFORM{n}"),
                HeaderValue::Text(column.format.code().to_string()),
            );
            if let Some(unit) = &column.unit {
                header.set(&format!("TUNIT{n}"), HeaderValue::Text(unit.clone()));
            }
        }
        for (keyword, value) in &self.extra {
            header.set(keyword, value.clone());
        }
        header
    }

    /// Row-major big-endian data without block padding.
    pub fn data_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        let rows = self.rows();
        if self.columns.iter().any(|c| c.data.len() != rows) {
            return Err(ArchiveError::schema("columns have different lengths"));
        }
        let mut out = Vec::with_capacity(rows * self.row_width());
        for row in 0..rows {
            for column in &self.columns {
                column.encode(row, &mut out);
            }
        }
        Ok(out)
    }

    /// Decodes the data unit described by `header`.
    pub fn decode(header: &Header, data: &[u8]) -> Result<BinTable, ArchiveError> {
        let fields = header.require_i64("TFIELDS")? as usize;
        let width = header.require_i64("NAXIS1")? as usize;
        let rows = header.require_i64("NAXIS2")? as usize;

        let mut layout = Vec::with_capacity(fields);
        let mut offset = 0;
        for n in 1..=fields {
            let name = header
                .get_str(&format!("TTYPE{n}"))
                .ok_or_else(|| ArchiveError::schema(format!("column {n} has no TTYPE")))?;
            let tform = header
                .get_str(&format!("TFORM{n}"))
                .ok_or_else(|| ArchiveError::schema(format!("column {name} has no TFORM")))?;
            let format = ColumnFormat::parse(tform)?;
            let unit = header
                .get_str(&format!("TUNIT{n}"))
                .map(str::to_string)
                .filter(|u| !u.is_empty());
            layout.push((name.to_string(), format, unit, offset));
            offset += format.width();
        }
        if offset > width || data.len() < width * rows {
            return Err(ArchiveError::schema(
                "table data is smaller than its declared layout",
            ));
        }

        let columns = layout
            .into_iter()
            .map(|(name, format, unit, offset)| {
                let cells = (0..rows).map(|row| {
                    let start = row * width + offset;
                    format.decode(&data[start..start + format.width()])
                });
                let data = match format {
                    ColumnFormat::Logical => ColumnData::Flags(
                        cells
                            .map(|cell| match cell? {
                                Cell::Flag(v) => Ok(v),
                                Cell::Number(v) => Ok(v != 0.0),
                            })
                            .collect::<Result<_, ArchiveError>>()?,
                    ),
                    _ => ColumnData::Numbers(
                        cells
                            .map(|cell| match cell? {
                                Cell::Number(v) => Ok(v),
                                Cell::Flag(v) => Ok(if v { 1.0 } else { 0.0 }),
                            })
                            .collect::<Result<_, ArchiveError>>()?,
                    ),
                };
                Ok(TableColumn {
                    name,
                    format,
                    unit,
                    data,
                })
            })
            .collect::<Result<Vec<_>, ArchiveError>>()?;

        Ok(BinTable {
            columns,
            extra: Vec::new(),
        })
    }
}
