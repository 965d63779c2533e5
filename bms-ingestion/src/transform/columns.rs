use std::collections::HashSet;

use bms_client::domain::CanonicalColumn;

use super::coerce;
use crate::sources::RawCell;

/// "Column at `position` becomes `target`, if no column is named `target` yet
/// and the table is wide enough."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalRule {
    pub target: CanonicalColumn,
    pub position: usize,
}

impl PositionalRule {
    pub fn min_columns(&self) -> usize {
        self.position + 1
    }
}

/// Applied top to bottom. The `Date` rule runs last and may take over a
/// column an earlier rule (or the file itself) already named canonically;
/// that case is reported as a [`RenameCollision`].
pub const POSITIONAL_RULES: [PositionalRule; 3] = [
    PositionalRule {
        target: CanonicalColumn::ElectricityKwh,
        position: 1,
    },
    PositionalRule {
        target: CanonicalColumn::WaterLiters,
        position: 2,
    },
    PositionalRule {
        target: CanonicalColumn::Date,
        position: 0,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRename {
    pub rule: PositionalRule,
    pub previous: String,
}

/// A positional rename overwrote a label that was already canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameCollision {
    pub position: usize,
    pub target: CanonicalColumn,
    pub displaced: CanonicalColumn,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnResolution {
    /// Final labels, in source order.
    pub labels: Vec<String>,
    pub renames: Vec<AppliedRename>,
    pub collisions: Vec<RenameCollision>,
}

fn header_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty => String::new(),
        RawCell::Text(s) => s.clone(),
        RawCell::Int(i) => i.to_string(),
        RawCell::Float(f) => f.to_string(),
        RawCell::Bool(true) => "True".to_string(),
        RawCell::Bool(false) => "False".to_string(),
        RawCell::DateTime(dt) => coerce::format_datetime(*dt),
    }
}

/// Turn raw header cells into unique, trimmed labels.
///
/// Blank headers become `Unnamed: <index>`; repeated headers get `.1`, `.2`, …
/// suffixes in order of appearance.
pub fn clean_labels(headers: &[RawCell]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut labels = Vec::with_capacity(headers.len());

    for (idx, cell) in headers.iter().enumerate() {
        let raw = header_text(cell);
        let raw = raw.trim();
        let base = if raw.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            raw.to_string()
        };

        let mut label = base.clone();
        let mut n = 1;
        while used.contains(&label) {
            label = format!("{base}.{n}");
            n += 1;
        }
        used.insert(label.clone());
        labels.push(label);
    }

    labels
}

/// Apply [`POSITIONAL_RULES`] in order.
pub fn resolve_columns(labels: Vec<String>) -> ColumnResolution {
    let mut labels = labels;
    let mut renames = Vec::new();
    let mut collisions = Vec::new();

    for rule in POSITIONAL_RULES {
        let target = rule.target.label();
        let already_named = labels.iter().any(|l| l == target);

        match (already_named, labels.get_mut(rule.position)) {
            (true, _) | (false, None) => continue,
            (false, Some(slot)) => {
                let previous = std::mem::replace(slot, target.to_string());
                if let Some(displaced) = CanonicalColumn::from_label(&previous) {
                    tracing::warn!(
                        position = rule.position,
                        target = %rule.target,
                        displaced = %displaced,
                        "positional rename overwrote a canonical column"
                    );
                    collisions.push(RenameCollision {
                        position: rule.position,
                        target: rule.target,
                        displaced,
                    });
                }
                tracing::debug!(position = rule.position, from = %previous, to = target, "column renamed");
                renames.push(AppliedRename { rule, previous });
            }
        }
    }

    ColumnResolution {
        labels,
        renames,
        collisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn headers(names: &[&str]) -> Vec<RawCell> {
        names.iter().map(|s| RawCell::Text(s.to_string())).collect()
    }

    #[test]
    fn labels_are_trimmed_and_stringified() {
        let cleaned = clean_labels(&[
            RawCell::Text("  Date ".to_string()),
            RawCell::Int(2024),
            RawCell::Float(1.5),
        ]);
        assert_eq!(cleaned, labels(&["Date", "2024", "1.5"]));
    }

    #[test]
    fn blank_and_repeated_labels_are_made_unique() {
        let cleaned = clean_labels(&headers(&["x", "", "x", "x", " "]));
        assert_eq!(cleaned, labels(&["x", "Unnamed: 1", "x.1", "x.2", "Unnamed: 4"]));
    }

    #[test]
    fn labels_differing_only_by_whitespace_are_deduplicated() {
        let cleaned = clean_labels(&headers(&[" Date", "Date", "Date "]));
        assert_eq!(cleaned, labels(&["Date", "Date.1", "Date.2"]));
    }

    #[test]
    fn canonical_headers_are_left_alone() {
        let res = resolve_columns(labels(&["Date", "Electricity_kWh", "Water_Liters", "Zone"]));
        assert_eq!(res.labels, labels(&["Date", "Electricity_kWh", "Water_Liters", "Zone"]));
        assert!(res.renames.is_empty());
        assert!(res.collisions.is_empty());
    }

    #[test]
    fn three_unknown_columns_map_by_position() {
        let res = resolve_columns(labels(&["Timestamp", "Power", "Usage"]));
        assert_eq!(res.labels, labels(&["Date", "Electricity_kWh", "Water_Liters"]));
        let order: Vec<_> = res.renames.iter().map(|r| r.rule.target).collect();
        assert_eq!(
            order,
            vec![
                CanonicalColumn::ElectricityKwh,
                CanonicalColumn::WaterLiters,
                CanonicalColumn::Date
            ]
        );
        assert_eq!(res.renames[0].previous, "Power");
    }

    #[test]
    fn narrow_tables_fire_only_applicable_rules() {
        let res = resolve_columns(labels(&["Day", "Power"]));
        assert_eq!(res.labels, labels(&["Date", "Electricity_kWh"]));

        let res = resolve_columns(labels(&["Day"]));
        assert_eq!(res.labels, labels(&["Date"]));
        assert_eq!(res.renames.len(), 1);
    }

    #[test]
    fn date_rule_overwrites_canonical_first_column() {
        let res = resolve_columns(labels(&["Electricity_kWh", "Reading", "Usage"]));
        assert_eq!(res.labels, labels(&["Date", "Reading", "Water_Liters"]));
        assert_eq!(
            res.collisions,
            vec![RenameCollision {
                position: 0,
                target: CanonicalColumn::Date,
                displaced: CanonicalColumn::ElectricityKwh,
            }]
        );
    }

    #[test]
    fn earlier_rule_can_take_a_date_column() {
        // "Date" sits where Electricity_kWh is expected, so rule 1 renames it and
        // rule 3 then claims column 1.
        let res = resolve_columns(labels(&["Power", "Date", "Usage"]));
        assert_eq!(res.labels, labels(&["Date", "Electricity_kWh", "Water_Liters"]));
        assert_eq!(
            res.collisions,
            vec![RenameCollision {
                position: 1,
                target: CanonicalColumn::ElectricityKwh,
                displaced: CanonicalColumn::Date,
            }]
        );
    }

    #[test]
    fn rules_are_ordered_electricity_water_date() {
        let targets: Vec<_> = POSITIONAL_RULES.iter().map(|r| r.target).collect();
        assert_eq!(
            targets,
            vec![
                CanonicalColumn::ElectricityKwh,
                CanonicalColumn::WaterLiters,
                CanonicalColumn::Date
            ]
        );
        assert_eq!(POSITIONAL_RULES[1].min_columns(), 3);
    }
}
