use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{info, warn};
use rayon::prelude::*;

use crate::config::DetectionConfig;
use crate::graph::{EdgeListFormat, GraphInstance, GraphLoader, GraphWriter};
use crate::graphlet::decode_frequency_table;
use crate::metric::{EvaluatedMetrics, MetricRegistry};
use crate::pipeline::metric_pipeline::{MetricFailure, MetricPipeline, MetricStage};
use crate::randomization::{random_seed, EnsembleGenerator};
use crate::scanner::MotifScanner;
use crate::significance::{
    class_metrics, frequency_significance, memberwise_tests, pooled_tests, ClassMetrics,
    FrequencySignificance, FrequencyTable, MemberwiseTest, PooledTest,
};
use crate::store::layout::{FREQUENCY_FILE, OCCURRENCE_ARCHIVE};
use crate::store::{ensemble_dir, ensemble_edge_list, read_occurrences, GraphDirectory, MetricStore};

/// Everything the significance tests need from one graph.
#[derive(Debug, Clone)]
pub struct GraphAnalysis {
    /// Ensemble index, `None` for the original graph.
    pub index: Option<usize>,
    pub edge_list: PathBuf,
    pub result_dir: PathBuf,
    pub frequencies: FrequencyTable,
    pub occurrence_count: usize,
    pub class_metrics: ClassMetrics,
    pub failures: Vec<MetricFailure>,
    /// Loaded from an earlier complete run instead of scanned.
    pub reused: bool,
}

#[derive(Debug, Default, Clone)]
pub struct WorkflowStats {
    pub members: usize,
    pub reused_members: usize,
    pub occurrences: usize,
    pub metric_failures: usize,
}

#[derive(Debug)]
pub struct DetectionSummary {
    pub original: GraphAnalysis,
    /// Ensemble results ordered by member index.
    pub ensemble: Vec<GraphAnalysis>,
    pub frequency: Vec<FrequencySignificance>,
    pub pooled: Vec<PooledTest>,
    pub memberwise: Vec<MemberwiseTest>,
    pub stats: WorkflowStats,
    pub ensemble_duration: Duration,
    pub total_duration: Duration,
}

/// Original graph, null-model ensemble, scanning, metrics and significance.
pub struct DetectionWorkflow {
    config: DetectionConfig,
    pipeline: MetricPipeline,
    scanner: MotifScanner,
}

impl DetectionWorkflow {
    pub fn new(config: DetectionConfig, registry: MetricRegistry) -> Result<Self> {
        config.validate()?;
        let pipeline = MetricPipeline::new(registry, config.occurrence_chunk_size);
        let scanner = MotifScanner::new(&config.scanner_executable, config.directed);
        Ok(Self {
            config,
            pipeline,
            scanner,
        })
    }

    pub fn with_default_metrics(config: DetectionConfig) -> Result<Self> {
        Self::new(config, MetricRegistry::with_default_metrics()?)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn execute(&self, edge_list: &Path, out_dir: &Path) -> Result<DetectionSummary> {
        let total_start = Instant::now();
        let graph = GraphLoader::from_path(edge_list)?;
        info!(
            "Graph {}: nodes {}, edges {}",
            graph.name,
            graph.node_count(),
            graph.edge_count()
        );
        EnsembleGenerator::ensure_randomizable(&graph, self.config.random_graphs)?;

        fs::create_dir_all(ensemble_dir(out_dir))
            .with_context(|| format!("create output directory {:?}", out_dir))?;
        let file_name = edge_list
            .file_name()
            .with_context(|| format!("edge list path {:?} has no file name", edge_list))?;
        let original_edge_list = out_dir.join(file_name);
        let original_dir = GraphDirectory::new(&original_edge_list, self.config.graphlet_size);
        if !original_dir.is_complete() {
            GraphWriter::write_to_path(&graph, &original_edge_list, EdgeListFormat::SimpleWeight)
                .with_context(|| format!("export {} for the scanner", graph.name))?;
        }
        let original = self.analyze(&original_dir, None, || Ok(graph.clone()))?;

        let ensemble_start = Instant::now();
        let accumulator = self.run_ensemble(&graph, out_dir)?;
        let ensemble_duration = ensemble_start.elapsed();
        let mut stats = accumulator.stats;
        let mut ensemble = accumulator.members;
        ensemble.sort_by_key(|member| member.index);
        stats.occurrences += original.occurrence_count;
        stats.metric_failures += original.failures.len();

        let member_frequencies: Vec<FrequencyTable> = ensemble
            .iter()
            .map(|member| member.frequencies.clone())
            .collect();
        let member_metrics: Vec<ClassMetrics> = ensemble
            .iter()
            .map(|member| member.class_metrics.clone())
            .collect();
        let frequency = frequency_significance(&original.frequencies, &member_frequencies);
        let pooled = pooled_tests(&original.class_metrics, &member_metrics, self.config.alpha);
        let memberwise =
            memberwise_tests(&original.class_metrics, &member_metrics, self.config.alpha);

        Ok(DetectionSummary {
            original,
            ensemble,
            frequency,
            pooled,
            memberwise,
            stats,
            ensemble_duration,
            total_duration: total_start.elapsed(),
        })
    }

    fn run_ensemble(&self, graph: &GraphInstance, out_dir: &Path) -> Result<EnsembleAccumulator> {
        let base_seed = self.config.randomization.seed.unwrap_or_else(random_seed);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .context("build ensemble thread pool")?;

        pool.install(|| {
            (0..self.config.random_graphs)
                .into_par_iter()
                .map(|index| -> Result<GraphAnalysis> {
                    let edge_list = ensemble_edge_list(out_dir, index);
                    let directory = GraphDirectory::new(&edge_list, self.config.graphlet_size);
                    let mut generated = None;
                    if !directory.is_complete() || !edge_list.is_file() {
                        let member = EnsembleGenerator::member(
                            graph,
                            index,
                            base_seed,
                            &self.config.randomization,
                        );
                        GraphWriter::write_to_path(
                            &member.graph,
                            &edge_list,
                            EdgeListFormat::SimpleWeight,
                        )
                        .with_context(|| format!("write ensemble member {index}"))?;
                        directory.assure_integrity()?;
                        if directory.result_dir().exists() {
                            fs::remove_dir_all(directory.result_dir()).with_context(|| {
                                format!("discard result of replaced member {index}")
                            })?;
                        }
                        generated = Some(member.graph);
                    }
                    let analysis = self
                        .analyze(&directory, Some(index), || match &generated {
                            Some(graph) => Ok(graph.clone()),
                            None => GraphLoader::from_path(&edge_list),
                        })
                        .with_context(|| format!("analyze ensemble member {index}"))?;
                    info!(
                        "Ensemble member {} done: {} occurrences{}",
                        index,
                        analysis.occurrence_count,
                        if analysis.reused { " (reused)" } else { "" }
                    );
                    Ok(analysis)
                })
                .try_fold(
                    EnsembleAccumulator::default,
                    |mut acc, analysis| -> Result<EnsembleAccumulator> {
                        acc.consume(analysis?);
                        Ok(acc)
                    },
                )
                .try_reduce(EnsembleAccumulator::default, |left, right| {
                    Ok(left.combine(right))
                })
        })
    }

    /// Analyze one graph, reusing a published result when there is one.
    fn analyze<F>(
        &self,
        directory: &GraphDirectory,
        index: Option<usize>,
        graph: F,
    ) -> Result<GraphAnalysis>
    where
        F: Fn() -> Result<GraphInstance>,
    {
        if directory.is_complete() {
            return self.reuse(directory, index, graph);
        }
        directory.assure_integrity()?;
        let k = self.config.graphlet_size;
        let graph = graph()?;
        let work_dir = directory.begin()?;
        let scan = self.scanner.scan(
            directory.edge_list(),
            k,
            EdgeListFormat::SimpleWeight,
            &work_dir,
        )?;

        let raw_table = fs::read_to_string(&scan.frequency_table)
            .with_context(|| format!("read {:?}", scan.frequency_table))?;
        let frequencies = decode_frequency_table(&raw_table, k)
            .with_context(|| format!("decode {:?}", scan.frequency_table))?;
        let occurrences = read_occurrences(&scan.occurrence_archive)?;

        let report = self.pipeline.execute(&graph, &occurrences);
        let store = MetricStore::new(&work_dir);
        for outcome in &report.outcomes {
            store.save(&outcome.result)?;
        }
        let result_dir = directory.publish()?;

        Ok(GraphAnalysis {
            index,
            edge_list: directory.edge_list().to_path_buf(),
            result_dir,
            frequencies,
            occurrence_count: occurrences.len(),
            class_metrics: class_metrics(&occurrences, &report.evaluated()),
            failures: report.failures,
            reused: false,
        })
    }

    /// Load a published result; metrics registered since then, or whose stored
    /// copy cannot be read, are computed and added to it.
    fn reuse<F>(
        &self,
        directory: &GraphDirectory,
        index: Option<usize>,
        graph: F,
    ) -> Result<GraphAnalysis>
    where
        F: Fn() -> Result<GraphInstance>,
    {
        let result_dir = directory.complete_dir()?;
        let k = self.config.graphlet_size;
        let table_path = result_dir.join(FREQUENCY_FILE);
        let raw_table = fs::read_to_string(&table_path)
            .with_context(|| format!("read {:?}", table_path))?;
        let frequencies = decode_frequency_table(&raw_table, k)
            .with_context(|| format!("decode {:?}", table_path))?;
        let occurrences = read_occurrences(&result_dir.join(OCCURRENCE_ARCHIVE))?;

        let store = MetricStore::new(&result_dir);
        let stored = store.stored_metrics()?;
        let mut per_metric: IndexMap<String, EvaluatedMetrics> = IndexMap::new();
        let mut failures = Vec::new();
        let mut missing = MetricRegistry::new();
        for metric in self.pipeline.registry().iter() {
            if !stored.iter().any(|name| name == metric.name()) {
                missing.register(metric.clone())?;
                continue;
            }
            let result = match store.load(metric.name()) {
                Ok(result) => result,
                Err(error) => {
                    warn!(
                        "Stored metric {} of {:?} is unreadable, recomputing: {:#}",
                        metric.name(),
                        result_dir,
                        error
                    );
                    missing.register(metric.clone())?;
                    continue;
                }
            };
            match result.evaluate(metric) {
                Ok(values) => {
                    per_metric.insert(metric.name().to_string(), values);
                }
                Err(error) => {
                    warn!(
                        "Stored metric {} of {:?} failed: {}",
                        metric.name(),
                        result_dir,
                        error
                    );
                    failures.push(MetricFailure {
                        metric_name: metric.name().to_string(),
                        stage: MetricStage::PostProcessing,
                        error,
                    });
                }
            }
        }

        if !missing.is_empty() {
            let graph = graph()?;
            info!("Computing {:?} for {}", missing.names(), graph.name);
            let report = MetricPipeline::new(missing, self.config.occurrence_chunk_size)
                .execute(&graph, &occurrences);
            for outcome in report.outcomes {
                store.save(&outcome.result)?;
                per_metric.insert(outcome.result.metric_name, outcome.evaluated);
            }
            failures.extend(report.failures);
        }

        // Registry order, whichever path produced the values.
        let mut evaluated = EvaluatedMetrics::new();
        for metric in self.pipeline.registry().iter() {
            if let Some(values) = per_metric.shift_remove(metric.name()) {
                evaluated.extend(values);
            }
        }

        Ok(GraphAnalysis {
            index,
            edge_list: directory.edge_list().to_path_buf(),
            result_dir,
            frequencies,
            occurrence_count: occurrences.len(),
            class_metrics: class_metrics(&occurrences, &evaluated),
            failures,
            reused: true,
        })
    }
}

#[derive(Default)]
struct EnsembleAccumulator {
    members: Vec<GraphAnalysis>,
    stats: WorkflowStats,
}

impl EnsembleAccumulator {
    fn consume(&mut self, analysis: GraphAnalysis) {
        self.stats.members += 1;
        if analysis.reused {
            self.stats.reused_members += 1;
        }
        self.stats.occurrences += analysis.occurrence_count;
        self.stats.metric_failures += analysis.failures.len();
        self.members.push(analysis);
    }

    fn combine(mut self, other: Self) -> Self {
        self.members.extend(other.members);
        self.stats.members += other.stats.members;
        self.stats.reused_members += other.stats.reused_members;
        self.stats.occurrences += other.stats.occurrences;
        self.stats.metric_failures += other.stats.metric_failures;
        self
    }
}
