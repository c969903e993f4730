//! Line-oriented persistence of [`MetricResult`]s.
//!
//! Each metric gets `metrics/<name>/pre_compute/<key>` holding one JSON value per
//! pre-computation key and `metrics/<name>/graphlet_metrics` whose first line is
//! the number of values followed by one JSON value per line. The value file can
//! be read back one occurrence at a time.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::metric::{MetricResult, PreComputation, RawMetric};
use crate::store::layout::{METRICS_DIR, PARTIAL_SUFFIX};

pub const PRE_COMPUTE_DIR: &str = "pre_compute";
pub const GRAPHLET_METRICS_FILE: &str = "graphlet_metrics";

#[derive(Debug, Clone)]
pub struct MetricStore {
    root: PathBuf,
}

impl MetricStore {
    /// Store below `<result_dir>/metrics`.
    pub fn new(result_dir: &Path) -> Self {
        Self {
            root: result_dir.join(METRICS_DIR),
        }
    }

    pub fn metric_dir(&self, metric_name: &str) -> PathBuf {
        self.root.join(metric_name)
    }

    /// Write one metric into `metrics/<name>.partial` and rename it into place,
    /// replacing an earlier copy. A crash leaves at most a scratch directory.
    pub fn save(&self, result: &MetricResult) -> Result<()> {
        let dir = self.metric_dir(&result.metric_name);
        let scratch = self.scratch_dir(&result.metric_name);
        if scratch.exists() {
            fs::remove_dir_all(&scratch)
                .with_context(|| format!("remove stale scratch directory {:?}", scratch))?;
        }
        let pre_compute_dir = scratch.join(PRE_COMPUTE_DIR);
        fs::create_dir_all(&pre_compute_dir)
            .with_context(|| format!("create metric directory {:?}", pre_compute_dir))?;
        for (key, value) in &result.pre_compute {
            write_json(&pre_compute_dir.join(key), value).with_context(|| {
                format!("write pre-computation {key} of {}", result.metric_name)
            })?;
        }

        let path = scratch.join(GRAPHLET_METRICS_FILE);
        let file = File::create(&path).with_context(|| format!("create {:?}", path))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", result.graphlet_metrics.len())?;
        for value in &result.graphlet_metrics {
            serde_json::to_writer(&mut writer, value)
                .with_context(|| format!("serialize graphlet metric into {:?}", path))?;
            writer.write_all(b"\n")?;
        }
        writer.flush().with_context(|| format!("flush {:?}", path))?;
        drop(writer);

        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("replace stored metric {:?}", dir))?;
        }
        fs::rename(&scratch, &dir).with_context(|| format!("move {:?} to {:?}", scratch, dir))?;
        Ok(())
    }

    fn scratch_dir(&self, metric_name: &str) -> PathBuf {
        self.root.join(format!("{metric_name}{PARTIAL_SUFFIX}"))
    }

    pub fn load(&self, metric_name: &str) -> Result<MetricResult> {
        let pre_compute = self.load_pre_compute(metric_name)?;
        let graphlet_metrics = self
            .reader(metric_name)?
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("read graphlet metrics of {metric_name}"))?;
        Ok(MetricResult {
            metric_name: metric_name.to_string(),
            pre_compute,
            graphlet_metrics,
        })
    }

    pub fn load_pre_compute(&self, metric_name: &str) -> Result<PreComputation> {
        let dir = self.metric_dir(metric_name).join(PRE_COMPUTE_DIR);
        let mut entries = fs::read_dir(&dir)
            .with_context(|| format!("list pre-computations in {:?}", dir))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("list pre-computations in {:?}", dir))?;
        entries.sort();

        let mut pre_compute = PreComputation::new();
        for path in entries {
            let key = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("pre-computation path {:?} has no file name", path))?;
            pre_compute.insert(key, read_json(&path)?);
        }
        Ok(pre_compute)
    }

    /// Stream the raw values of one metric.
    pub fn reader(&self, metric_name: &str) -> Result<GraphletMetricReader<BufReader<File>>> {
        let path = self.metric_dir(metric_name).join(GRAPHLET_METRICS_FILE);
        let file = File::open(&path).with_context(|| format!("open {:?}", path))?;
        GraphletMetricReader::new(BufReader::new(file))
            .with_context(|| format!("read header of {:?}", path))
    }

    /// Names of the metrics with a stored value file, sorted.
    pub fn stored_metrics(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).with_context(|| format!("list {:?}", self.root))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            if entry.path().join(GRAPHLET_METRICS_FILE).is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Iterator over the values of a `graphlet_metrics` file.
///
/// Fails if the file holds fewer values than its header announces.
pub struct GraphletMetricReader<R> {
    lines: Lines<R>,
    expected: usize,
    read: usize,
}

impl<R: BufRead> GraphletMetricReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or_else(|| anyhow!("missing value count header"))??;
        let expected = header
            .trim()
            .parse::<usize>()
            .with_context(|| format!("value count header {header:?} is not a number"))?;
        Ok(Self {
            lines,
            expected,
            read: 0,
        })
    }

    /// Number of values announced by the header.
    pub fn expected(&self) -> usize {
        self.expected
    }
}

impl<R: BufRead> Iterator for GraphletMetricReader<R> {
    type Item = Result<RawMetric>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.read == self.expected {
            return None;
        }
        self.read += 1;
        let value = match self.lines.next() {
            Some(Ok(line)) => serde_json::from_str(&line)
                .with_context(|| format!("parse graphlet metric {}", self.read)),
            Some(Err(err)) => Err(err).with_context(|| format!("read graphlet metric {}", self.read)),
            None => Err(anyhow!(
                "expected {} graphlet metrics, file ends after {}",
                self.expected,
                self.read - 1
            )),
        };
        if value.is_err() {
            self.read = self.expected;
        }
        Some(value)
    }
}

fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let file = File::open(path).with_context(|| format!("open json file {:?}", path))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).with_context(|| format!("deserialize json file {:?}", path))
}

fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    let file = File::create(path).with_context(|| format!("create json file {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("serialize json file {:?}", path))?;
    writer.flush().with_context(|| format!("flush json file {:?}", path))
}
