//! Dataset row type.

use serde::{Deserialize, Serialize};

/// Number of columns a dataset row carries.
pub const RECORD_COLUMNS: usize = 7;

/// One observation from the dataset.
///
/// Every field is kept as the raw text found in the source file. Field order
/// mirrors the column order of the file and is also the order used when the
/// record is serialized back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub cumulative_test_positive: String,
    pub cumulative_test_performed: String,
    pub date: String,
    pub discharged: String,
    pub expired: String,
    pub region: String,
    pub admitted: String,
}

impl Record {
    /// Build a record from a row of exactly [`RECORD_COLUMNS`] fields.
    ///
    /// Returns `None` when the column count is wrong.
    pub fn from_columns(columns: Vec<String>) -> Option<Self> {
        let [cumulative_test_positive, cumulative_test_performed, date, discharged, expired, region, admitted]: [String; RECORD_COLUMNS] =
            columns.try_into().ok()?;

        Some(Self {
            cumulative_test_positive,
            cumulative_test_performed,
            date,
            discharged,
            expired,
            region,
            admitted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn builds_from_positional_columns() {
        let record = Record::from_columns(columns(&[
            "10", "200", "2020-04-01", "3", "1", "Lagos", "6",
        ]))
        .unwrap();

        assert_eq!(record.cumulative_test_positive, "10");
        assert_eq!(record.cumulative_test_performed, "200");
        assert_eq!(record.date, "2020-04-01");
        assert_eq!(record.discharged, "3");
        assert_eq!(record.expired, "1");
        assert_eq!(record.region, "Lagos");
        assert_eq!(record.admitted, "6");
    }

    #[test]
    fn rejects_wrong_column_count() {
        assert!(Record::from_columns(columns(&["1", "2", "3"])).is_none());
        assert!(Record::from_columns(columns(&["1", "2", "3", "4", "5", "6", "7", "8"])).is_none());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let record = Record::from_columns(columns(&[
            "10", "200", "2020-04-01", "3", "1", "Lagos", "6",
        ]))
        .unwrap();

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"cumulativeTestPositive":"10","cumulativeTestPerformed":"200","date":"2020-04-01","discharged":"3","expired":"1","region":"Lagos","admitted":"6"}"#
        );
    }
}
