use time::PrimitiveDateTime;

use super::dataset::Dataset;

/// Headline figures for a dataset, as shown on the overview page.
///
/// Totals skip missing values; an all-missing column totals to zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DatasetSummary {
    pub rows: usize,
    pub total_electricity_kwh: f64,
    pub total_water_liters: f64,
    pub missing_dates: usize,
    pub earliest_date: Option<PrimitiveDateTime>,
    pub latest_date: Option<PrimitiveDateTime>,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let total_electricity_kwh = dataset.iter().filter_map(|r| r.electricity_kwh).sum();
        let total_water_liters = dataset.iter().filter_map(|r| r.water_liters).sum();
        let missing_dates = dataset.iter().filter(|r| r.date.is_none()).count();

        let dates = || dataset.iter().filter_map(|r| r.date);

        Self {
            rows: dataset.len(),
            total_electricity_kwh,
            total_water_liters,
            missing_dates,
            earliest_date: dates().min(),
            latest_date: dates().max(),
        }
    }
}

impl From<&Dataset> for DatasetSummary {
    fn from(dataset: &Dataset) -> Self {
        Self::from_dataset(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalColumn, Column, TimeSeriesRecord};
    use time::macros::datetime;

    #[test]
    fn summary_skips_missing_values() {
        let columns = CanonicalColumn::ALL.into_iter().map(Column::Canonical).collect();
        let records = vec![
            TimeSeriesRecord::new(Some(datetime!(2024-01-02 0:00)), Some(300.0), Some(80.0)),
            TimeSeriesRecord::new(None, None, Some(20.5)),
            TimeSeriesRecord::new(Some(datetime!(2024-01-01 0:00)), Some(150.0), None),
        ];
        let ds = Dataset::new(columns, records).unwrap();

        let summary = DatasetSummary::from_dataset(&ds);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.total_electricity_kwh, 450.0);
        assert_eq!(summary.total_water_liters, 100.5);
        assert_eq!(summary.missing_dates, 1);
        assert_eq!(summary.earliest_date, Some(datetime!(2024-01-01 0:00)));
        assert_eq!(summary.latest_date, Some(datetime!(2024-01-02 0:00)));
    }

    #[test]
    fn summary_of_empty_dataset_is_zeroed() {
        let columns = CanonicalColumn::ALL.into_iter().map(Column::Canonical).collect();
        let ds = Dataset::new(columns, Vec::new()).unwrap();

        let summary = DatasetSummary::from(&ds);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.total_electricity_kwh, 0.0);
        assert!(summary.earliest_date.is_none());
    }
}
