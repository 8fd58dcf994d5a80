//! Delimited-text implementation of the policy repository.
//!
//! Layout: one header row `pos_x;pos_y;vel_x;vel_y;left;right;<action uid>...`
//! followed by one row per state. State columns are written at the
//! quantizer's precision and re-bucketed on load; values are written with
//! [`VALUE_PRECISION`] decimals. An action a state never registered is an
//! empty cell.

use std::{collections::BTreeSet, path::Path};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::warn;

use crate::{
    Result,
    agent::{Action, ActionValues, Quantizer, StateEntry, ValueTable, Vec2},
    error::Error,
    ports::PolicyRepository,
};

/// Field delimiter of policy files.
pub const DELIMITER: u8 = b';';

/// Decimal places written for action values.
pub const VALUE_PRECISION: usize = 6;

const STATE_COLUMNS: [&str; 6] = ["pos_x", "pos_y", "vel_x", "vel_y", "left", "right"];

/// CSV policy repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvPolicyRepository {
    quantizer: Quantizer,
}

impl CsvPolicyRepository {
    /// Create a repository that reads and writes keys with `quantizer`'s precision.
    pub fn new(quantizer: Quantizer) -> Self {
        Self { quantizer }
    }

    fn columns(table: &ValueTable) -> Vec<Action> {
        let used: BTreeSet<Action> = table
            .iter()
            .flat_map(|entry| entry.values.iter().map(|(action, _)| action))
            .collect();
        if used.is_empty() {
            Action::ALL.to_vec()
        } else {
            used.into_iter().collect()
        }
    }

    fn state_fields(&self, entry: &StateEntry) -> Vec<String> {
        let config = self.quantizer.config();
        let pos = config.position_precision as usize;
        let vel = config.velocity_precision as usize;
        let [px, py, vx, vy] = self.quantizer.decode(&entry.key);
        let (left, right) = entry.key.flippers();
        vec![
            format!("{px:.pos$}"),
            format!("{py:.pos$}"),
            format!("{vx:.vel$}"),
            format!("{vy:.vel$}"),
            u8::from(left).to_string(),
            u8::from(right).to_string(),
        ]
    }

    fn parse_header(headers: &StringRecord) -> Result<Vec<Action>> {
        for (position, column) in STATE_COLUMNS.iter().enumerate() {
            if headers.get(position).map(str::trim) != Some(*column) {
                return Err(Error::MissingPolicyColumn {
                    column: (*column).to_string(),
                });
            }
        }
        headers
            .iter()
            .skip(STATE_COLUMNS.len())
            .map(str::parse::<Action>)
            .collect()
    }

    fn parse_row(&self, record: &StringRecord, actions: &[Action], line: u64) -> Result<StateEntry> {
        let number = |position: usize| -> Result<f64> {
            let field = record.get(position).unwrap_or_default().trim();
            field.parse::<f64>().map_err(|_| Error::ParseValue {
                value: field.to_string(),
                expected: "a number".to_string(),
                line,
            })
        };
        let flag = |position: usize| -> Result<bool> {
            match record.get(position).unwrap_or_default().trim() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(Error::ParseValue {
                    value: other.to_string(),
                    expected: "a flipper flag (0 or 1)".to_string(),
                    line,
                }),
            }
        };

        let key = self
            .quantizer
            .quantize(Vec2::new(number(0)?, number(1)?), Vec2::new(number(2)?, number(3)?))
            .with_flippers(flag(4)?, flag(5)?);

        let mut values = ActionValues::new();
        for (offset, &action) in actions.iter().enumerate() {
            let position = STATE_COLUMNS.len() + offset;
            if record.get(position).is_some_and(|field| field.trim().is_empty()) {
                continue;
            }
            values.set(action, number(position)?);
        }
        Ok(StateEntry { key, values })
    }
}

impl PolicyRepository for CsvPolicyRepository {
    fn save(&self, table: &ValueTable, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_path(path)?;
        let actions = Self::columns(table);

        let mut header: Vec<String> = STATE_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        header.extend(actions.iter().map(|action| action.uid().to_string()));
        writer.write_record(&header)?;

        for entry in table.iter() {
            let mut row = self.state_fields(entry);
            for &action in &actions {
                row.push(
                    entry
                        .values
                        .iter()
                        .find(|(stored, _)| *stored == action)
                        .map(|(_, value)| format!("{value:.VALUE_PRECISION$}"))
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&row)?;
        }

        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush policy file {path:?}"),
            source,
        })?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<ValueTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let actions = Self::parse_header(&headers)?;

        let mut entries = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map_or(row as u64 + 2, |position| position.line());
            if record.len() != headers.len() {
                warn!(
                    path = %path.display(),
                    line,
                    expected = headers.len(),
                    got = record.len(),
                    "policy row width does not match header, aborting load"
                );
                return Err(Error::CorruptPolicyRow {
                    line,
                    expected: headers.len(),
                    got: record.len(),
                });
            }
            entries.push(self.parse_row(&record, &actions, line)?);
        }

        Ok(ValueTable::from(entries))
    }
}
