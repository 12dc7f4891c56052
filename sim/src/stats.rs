//! Run statistics and the per-customer CSV report.

use serde::{Serialize, Serializer};
use std::io;
use std::time::Duration;

use crate::customer::CustomerId;
use crate::Result;

/// Aggregate statistics.
///
/// Averages are `None` until at least one customer has been served.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopStats {
    #[serde(serialize_with = "opt_secs")]
    pub avg_wait: Option<Duration>,
    #[serde(serialize_with = "opt_secs")]
    pub avg_service: Option<Duration>,
    pub served: usize,
    pub left: usize,
    pub waiting: usize,
    pub generated: usize,
}

impl ShopStats {
    /// Render the summary block printed at the end of a run
    pub fn report(&self) -> String {
        let secs = |d: Option<Duration>| match d {
            Some(d) => format!("{:.3} s", d.as_secs_f64()),
            None => "n/a".to_string(),
        };

        let mut out = String::new();
        out.push_str("=== Stats ===\n");
        out.push_str(&format!("Customers generated: {}\n", self.generated));
        out.push_str(&format!("Served: {}\n", self.served));
        out.push_str(&format!("Left (room full): {}\n", self.left));
        out.push_str(&format!("Still waiting: {}\n", self.waiting));
        out.push_str(&format!("Average wait: {}\n", secs(self.avg_wait)));
        out.push_str(&format!("Average service: {}\n", secs(self.avg_service)));
        out
    }
}

fn opt_secs<S: Serializer>(value: &Option<Duration>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

/// Terminal classification of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Served,
    Balked,
    Pending, // seated, or in the chair
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub outcome: Outcome,
    pub wait_secs: Option<f64>,
    pub service_secs: Option<f64>,
}

/// Write one CSV row per customer, with a header
pub fn write_csv<W: io::Write>(records: &[CustomerRecord], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for record in records {
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_output() {
        let records = vec![
            CustomerRecord {
                id: 1,
                outcome: Outcome::Served,
                wait_secs: Some(0.0),
                service_secs: Some(0.5),
            },
            CustomerRecord {
                id: 2,
                outcome: Outcome::Balked,
                wait_secs: None,
                service_secs: None,
            },
        ];

        let mut buf = Vec::new();
        write_csv(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,outcome,wait_secs,service_secs");
        assert_eq!(lines[1], "1,Served,0.0,0.5");
        assert_eq!(lines[2], "2,Balked,,");
    }

    #[test]
    fn test_stats_json_uses_seconds() {
        let stats = ShopStats {
            avg_wait: Some(Duration::from_millis(250)),
            avg_service: None,
            served: 1,
            left: 0,
            waiting: 0,
            generated: 1,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["avg_wait"], 0.25);
        assert!(json["avg_service"].is_null());
        assert_eq!(json["served"], 1);
    }

    #[test]
    fn test_report_without_data() {
        let stats = ShopStats {
            avg_wait: None,
            avg_service: None,
            served: 0,
            left: 3,
            waiting: 0,
            generated: 3,
        };

        let report = stats.report();
        assert!(report.contains("Left (room full): 3"));
        assert!(report.contains("Average wait: n/a"));
    }
}
