// Telemetry: energy samples and request completion delays
//
// Two row types, each with its own CSV layout. Rows are append-only; sinks
// are shared between the nodes of one installation through Rc<RefCell<_>>.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::marker::PhantomData;
use std::rc::Rc;

use log::{debug, error};

use crate::ndn_energy::EnergyState;
use crate::ndn_interface::{format_seconds, parse_seconds, AppId, SeqNo, SimTime};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum TelemetryError {
    Io(io::Error),
    /// Header line does not match the expected layout
    UnexpectedHeader { expected: &'static str, found: String },
    /// Data row that does not parse into its typed fields
    MalformedRow { row: String, reason: String },
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::Io(e) => write!(f, "telemetry i/o: {}", e),
            TelemetryError::UnexpectedHeader { expected, found } => {
                write!(f, "expected header '{}', found '{}'", expected, found)
            }
            TelemetryError::MalformedRow { row, reason } => {
                write!(f, "malformed row '{}': {}", row, reason)
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TelemetryError {
    fn from(e: io::Error) -> Self {
        TelemetryError::Io(e)
    }
}

fn malformed(row: &str, reason: impl Into<String>) -> TelemetryError {
    TelemetryError::MalformedRow {
        row: row.to_string(),
        reason: reason.into(),
    }
}

// ============================================================================
// Records
// ============================================================================

/// A row type with a fixed CSV layout
pub trait CsvRecord: Sized {
    const HEADER: &'static str;

    fn to_row(&self) -> String;

    fn parse_row(row: &str) -> Result<Self, TelemetryError>;
}

/// Periodic energy reading of one node
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySample {
    pub time: SimTime,
    pub node: String,
    pub hop_count: u32,
    /// Ah
    pub energy_remaining: f64,
    pub energy_percent: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DelayKind {
    /// Delay from the first transmission of the request
    FirstDelay,
    /// Delay from the last retransmission of the request
    LastDelay,
}

impl DelayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DelayKind::FirstDelay => "FirstDelay",
            DelayKind::LastDelay => "LastDelay",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "FirstDelay" => Some(DelayKind::FirstDelay),
            "LastDelay" => Some(DelayKind::LastDelay),
            _ => None,
        }
    }
}

/// One request completion seen by a consumer application
#[derive(Debug, Clone, PartialEq)]
pub struct DelayRecord {
    pub time: SimTime,
    pub node: String,
    pub app_id: AppId,
    pub seq_no: SeqNo,
    pub kind: DelayKind,
    /// Microseconds; written both as seconds and as microseconds
    pub delay: SimTime,
    pub retx_count: u32,
    pub hop_count: u32,
    pub power_level: u8,
}

fn field<T: std::str::FromStr>(row: &str, value: &str, name: &str) -> Result<T, TelemetryError> {
    value
        .parse()
        .map_err(|_| malformed(row, format!("bad {} '{}'", name, value)))
}

fn seconds_field(row: &str, value: &str, name: &str) -> Result<SimTime, TelemetryError> {
    parse_seconds(value).ok_or_else(|| malformed(row, format!("bad {} '{}'", name, value)))
}

fn split_fields<'a>(row: &'a str, expected: usize) -> Result<Vec<&'a str>, TelemetryError> {
    let fields: Vec<&str> = row.trim_end_matches(|c: char| c == '\r' || c == '\n').split(',').collect();
    if fields.len() != expected {
        return Err(malformed(
            row,
            format!("expected {} fields, found {}", expected, fields.len()),
        ));
    }
    Ok(fields)
}

impl CsvRecord for EnergySample {
    const HEADER: &'static str = "Time,Node,HopCount,EnergyRemaining,EnergyPercent";

    fn to_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            format_seconds(self.time),
            self.node,
            self.hop_count,
            self.energy_remaining,
            self.energy_percent
        )
    }

    fn parse_row(row: &str) -> Result<Self, TelemetryError> {
        let f = split_fields(row, 5)?;
        let energy_percent: u8 = field(row, f[4], "EnergyPercent")?;
        if energy_percent > 100 {
            return Err(malformed(row, "EnergyPercent above 100"));
        }
        Ok(Self {
            time: seconds_field(row, f[0], "Time")?,
            node: f[1].to_string(),
            hop_count: field(row, f[2], "HopCount")?,
            energy_remaining: field(row, f[3], "EnergyRemaining")?,
            energy_percent,
        })
    }
}

impl CsvRecord for DelayRecord {
    const HEADER: &'static str =
        "Time,Node,AppId,SeqNo,Type,DelayS,DelayUS,RetxCount,HopCount,PowerLevel";

    fn to_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            format_seconds(self.time),
            self.node,
            self.app_id,
            self.seq_no,
            self.kind.as_str(),
            format_seconds(self.delay),
            self.delay,
            self.retx_count,
            self.hop_count,
            self.power_level
        )
    }

    fn parse_row(row: &str) -> Result<Self, TelemetryError> {
        let f = split_fields(row, 10)?;
        let kind = DelayKind::parse(f[4]).ok_or_else(|| malformed(row, "unknown Type"))?;
        let delay_s = seconds_field(row, f[5], "DelayS")?;
        let delay_us: SimTime = field(row, f[6], "DelayUS")?;
        if delay_s != delay_us {
            return Err(malformed(row, "DelayS and DelayUS disagree"));
        }
        let power_level: u8 = field(row, f[9], "PowerLevel")?;
        if power_level > 100 {
            return Err(malformed(row, "PowerLevel above 100"));
        }
        Ok(Self {
            time: seconds_field(row, f[0], "Time")?,
            node: f[1].to_string(),
            app_id: field(row, f[2], "AppId")?,
            seq_no: field(row, f[3], "SeqNo")?,
            kind,
            delay: delay_us,
            retx_count: field(row, f[7], "RetxCount")?,
            hop_count: field(row, f[8], "HopCount")?,
            power_level,
        })
    }
}

/// Read a whole CSV stream written by a [`CsvSink`] back into records
pub fn read_csv<R: CsvRecord>(reader: impl BufRead) -> Result<Vec<R>, TelemetryError> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Ok(Vec::new()),
    };
    if header.trim_end() != R::HEADER {
        return Err(TelemetryError::UnexpectedHeader {
            expected: R::HEADER,
            found: header,
        });
    }

    let mut records = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(R::parse_row(&line)?);
    }
    Ok(records)
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for telemetry rows of one type
pub trait TelemetrySink<R> {
    fn append(&mut self, record: &R);

    fn flush(&mut self) {}
}

pub type SharedSink<R> = Rc<RefCell<dyn TelemetrySink<R>>>;

/// Sink that discards everything
pub struct NoOpSink;

impl<R> TelemetrySink<R> for NoOpSink {
    #[inline(always)]
    fn append(&mut self, _record: &R) {}
}

/// Keeps rows in memory
pub struct CollectorSink<R> {
    pub records: Vec<R>,
}

impl<R> CollectorSink<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R> Default for CollectorSink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> TelemetrySink<R> for CollectorSink<R> {
    fn append(&mut self, record: &R) {
        self.records.push(record.clone());
    }
}

/// CSV file (or stdout) sink
///
/// The destination is opened and truncated once, the header written, and the
/// handle held until the sink is closed or dropped. The first failed write
/// disables the sink; later rows are discarded.
pub struct CsvSink<R> {
    target: String,
    writer: Option<BufWriter<Box<dyn Write>>>,
    flush_each_row: bool,
    rows_written: usize,
    _record: PhantomData<R>,
}

impl<R: CsvRecord> CsvSink<R> {
    /// Open `path` for writing, `-` meaning stdout
    pub fn create(path: &str) -> Result<Self, TelemetryError> {
        let out: Box<dyn Write> = if path == "-" {
            Box::new(io::stdout())
        } else {
            Box::new(File::create(path)?)
        };
        Self::from_writer(path, out)
    }

    pub fn from_writer(target: &str, out: Box<dyn Write>) -> Result<Self, TelemetryError> {
        let mut writer = BufWriter::new(out);
        writeln!(writer, "{}", R::HEADER)?;
        writer.flush()?;

        Ok(Self {
            target: target.to_string(),
            writer: Some(writer),
            flush_each_row: true,
            rows_written: 0,
            _record: PhantomData,
        })
    }

    pub fn set_flush_each_row(&mut self, flush: bool) {
        self.flush_each_row = flush;
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and release the handle
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                error!("Failed to flush telemetry sink {}: {}", self.target, e);
            }
        }
    }

    fn write_row(&mut self, row: &str) -> io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", row)?;
            if self.flush_each_row {
                writer.flush()?;
            }
        }
        Ok(())
    }
}

impl<R: CsvRecord> TelemetrySink<R> for CsvSink<R> {
    fn append(&mut self, record: &R) {
        if self.writer.is_none() {
            return;
        }

        match self.write_row(&record.to_row()) {
            Ok(()) => self.rows_written += 1,
            Err(e) => {
                error!(
                    "File {} cannot be written ({}). Tracing disabled",
                    self.target, e
                );
                // drop the buffered bytes instead of retrying them on drop
                if let Some(writer) = self.writer.take() {
                    let _ = writer.into_parts();
                }
            }
        }
    }

    fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                error!("Failed to flush telemetry sink {}: {}", self.target, e);
            }
        }
    }
}

impl<R> Drop for CsvSink<R> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

// ============================================================================
// Recorders
// ============================================================================

/// Energy sampling keyed off request arrivals
///
/// There is no timer: a sample is taken only when a request happens to arrive
/// exactly on a multiple of the interval.
pub struct EnergySampler {
    interval: SimTime,
    sink: SharedSink<EnergySample>,
}

impl EnergySampler {
    pub fn new(interval: SimTime, sink: SharedSink<EnergySample>) -> Self {
        Self { interval, sink }
    }

    pub fn is_boundary(&self, now: SimTime) -> bool {
        self.interval > 0 && now % self.interval == 0
    }

    /// Returns whether a sample was appended
    pub fn on_request_arrival(
        &self,
        now: SimTime,
        node: &str,
        hop_count: u32,
        energy: &EnergyState,
    ) -> bool {
        if !self.is_boundary(now) {
            return false;
        }

        let sample = EnergySample {
            time: now,
            node: node.to_string(),
            hop_count,
            energy_remaining: energy.remaining_capacity(),
            energy_percent: energy.percent_remaining(),
        };
        debug!(
            "At {} node {} remaining capacity {} Ah ({}%)",
            format_seconds(now),
            node,
            sample.energy_remaining,
            sample.energy_percent
        );
        self.sink.borrow_mut().append(&sample);
        true
    }
}

/// Completion delay recorder attached to one node
///
/// The power level written with every row is the one captured when the
/// tracer was attached; call [`DelayTracer::refresh_energy_level`] to update it.
pub struct DelayTracer {
    node: String,
    energy_level: u8,
    sink: SharedSink<DelayRecord>,
}

impl DelayTracer {
    pub fn new(node: &str, energy: &EnergyState, sink: SharedSink<DelayRecord>) -> Self {
        Self {
            node: node.to_string(),
            energy_level: energy.percent_remaining(),
            sink,
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn energy_level(&self) -> u8 {
        self.energy_level
    }

    pub fn refresh_energy_level(&mut self, energy: &EnergyState) {
        self.energy_level = energy.percent_remaining();
    }

    pub fn on_first_completion(
        &self,
        now: SimTime,
        app_id: AppId,
        seq_no: SeqNo,
        delay: SimTime,
        retx_count: u32,
        hop_count: u32,
    ) {
        self.record(now, app_id, seq_no, DelayKind::FirstDelay, delay, retx_count, hop_count);
    }

    pub fn on_last_retransmitted_completion(
        &self,
        now: SimTime,
        app_id: AppId,
        seq_no: SeqNo,
        delay: SimTime,
        hop_count: u32,
    ) {
        self.record(now, app_id, seq_no, DelayKind::LastDelay, delay, 1, hop_count);
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        now: SimTime,
        app_id: AppId,
        seq_no: SeqNo,
        kind: DelayKind,
        delay: SimTime,
        retx_count: u32,
        hop_count: u32,
    ) {
        self.sink.borrow_mut().append(&DelayRecord {
            time: now,
            node: self.node.clone(),
            app_id,
            seq_no,
            kind,
            delay,
            retx_count,
            hop_count,
            power_level: self.energy_level,
        });
    }
}
