//! Plain-text run reports.

use crate::{FlowStats, StatsError, Summary};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// One block per flow, in flow-id order, followed by the run summary.
///
/// Built once by the aggregator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    flows: Vec<FlowStats>,
    summary: Summary,
}

impl Report {
    pub(crate) fn new(flows: Vec<FlowStats>, summary: Summary) -> Self {
        Self { flows, summary }
    }

    pub fn flows(&self) -> &[FlowStats] {
        &self.flows
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flow in &self.flows {
            write_flow(f, flow)?;
        }
        write!(
            f,
            "\n\n  Mean flow throughput: {:.6}\n  Mean flow delay: {:.6}\n",
            self.summary.mean_throughput_mbps, self.summary.mean_delay_ms
        )
    }
}

fn write_flow(f: &mut fmt::Formatter<'_>, flow: &FlowStats) -> fmt::Result {
    writeln!(
        f,
        "Flow {} ({}) proto {}",
        flow.flow, flow.tuple, flow.tuple.protocol
    )?;
    writeln!(f, "  Tx Packets: {}", flow.tx_packets)?;
    writeln!(f, "  Tx Bytes:   {}", flow.tx_bytes)?;
    writeln!(f, "  TxOffered:  {:.6} Mbps", flow.tx_offered_mbps)?;
    writeln!(f, "  Rx Bytes:   {}", flow.rx_bytes)?;
    if flow.received_any() {
        writeln!(f, "  Throughput: {:.6} Mbps", flow.throughput_mbps)?;
        writeln!(f, "  Mean delay:  {:.6} ms", flow.mean_delay_ms)?;
        writeln!(f, "  Mean jitter:  {:.6} ms", flow.mean_jitter_ms)?;
    } else {
        writeln!(f, "  Throughput:  0 Mbps")?;
        writeln!(f, "  Mean delay:  0 ms")?;
        writeln!(f, "  Mean jitter: 0 ms")?;
    }
    writeln!(f, "  Rx Packets: {}", flow.rx_packets)
}

/// An open report destination.
///
/// Opening happens before any statistics are computed, so an unwritable
/// path aborts the run's post-processing up front.
pub struct ReportWriter {
    path: PathBuf,
    file: BufWriter<File>,
}

impl ReportWriter {
    /// Create (or truncate) the report file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| StatsError::OpenReport {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the report and flush it to disk.
    pub fn write(mut self, report: &Report) -> Result<PathBuf, StatsError> {
        let result = write!(self.file, "{}", report).and_then(|_| self.file.flush());
        result.map_err(|source| StatsError::WriteReport {
            path: self.path.clone(),
            source,
        })?;

        info!(path = %self.path.display(), flows = report.flows().len(), "Report written");
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlowRecord, FlowStatsAggregator};
    use slicesim_types::{FiveTuple, FlowId, Protocol};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn tuple(protocol: Protocol) -> FiveTuple {
        FiveTuple {
            source_address: Ipv4Addr::new(1, 0, 0, 2),
            source_port: 49153,
            destination_address: Ipv4Addr::new(7, 0, 0, 2),
            destination_port: 1001,
            protocol,
        }
    }

    fn sample_report() -> Report {
        let delivered = FlowRecord {
            flow: FlowId(1),
            tuple: tuple(Protocol::Udp),
            tx_packets: 100,
            tx_bytes: 125_200,
            rx_packets: 100,
            rx_bytes: 125_200,
            delay_sum: Duration::from_millis(500),
            jitter_sum: Duration::ZERO,
            first_tx: Duration::from_millis(100),
            last_rx: Duration::from_millis(1100),
        };
        let stalled = FlowRecord {
            tx_packets: 10,
            tx_bytes: 12_520,
            ..FlowRecord::new(FlowId(2), tuple(Protocol::Tcp))
        };
        FlowStatsAggregator::new(Duration::from_secs(1)).aggregate(&[delivered, stalled])
    }

    #[test]
    fn test_render_format() {
        let expected = "\
Flow 1 (1.0.0.2:49153 -> 7.0.0.2:1001) proto UDP
  Tx Packets: 100
  Tx Bytes:   125200
  TxOffered:  1.001600 Mbps
  Rx Bytes:   125200
  Throughput: 1.001600 Mbps
  Mean delay:  5.000000 ms
  Mean jitter:  0.000000 ms
  Rx Packets: 100
Flow 2 (1.0.0.2:49153 -> 7.0.0.2:1001) proto TCP
  Tx Packets: 10
  Tx Bytes:   12520
  TxOffered:  0.100160 Mbps
  Rx Bytes:   0
  Throughput:  0 Mbps
  Mean delay:  0 ms
  Mean jitter: 0 ms
  Rx Packets: 0


  Mean flow throughput: 0.500800
  Mean flow delay: 2.500000
";
        assert_eq!(sample_report().to_string(), expected);
    }

    #[test]
    fn test_numeric_protocol_rendering() {
        let record = FlowRecord::new(FlowId(1), tuple(Protocol::from_number(132)));
        let report = FlowStatsAggregator::new(Duration::from_secs(1)).aggregate(&[record]);
        assert!(report.to_string().starts_with(
            "Flow 1 (1.0.0.2:49153 -> 7.0.0.2:1001) proto 132\n"
        ));
    }

    #[test]
    fn test_writer_persists_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run-1");

        let report = sample_report();
        let written = ReportWriter::create(&path).unwrap().write(&report).unwrap();

        assert_eq!(written, path);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, report.to_string());
    }

    #[test]
    fn test_writer_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run-1");
        std::fs::write(&path, "stale contents that are much longer than nothing").unwrap();

        let report = FlowStatsAggregator::new(Duration::from_secs(1)).aggregate(&[]);
        ReportWriter::create(&path).unwrap().write(&report).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "\n\n  Mean flow throughput: 0.000000\n  Mean flow delay: 0.000000\n"
        );
    }

    #[test]
    fn test_unopenable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("run-1");

        let err = ReportWriter::create(&path).err().unwrap();
        assert!(matches!(err, StatsError::OpenReport { .. }));
        assert_eq!(err.to_string(), format!("Can't open file {}", path.display()));
    }
}
