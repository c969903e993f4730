use std::env;
use std::path::PathBuf;

use anyhow::Result;
use log::info;

use pmotifs::{DetectionConfig, DetectionSummary, DetectionWorkflow};

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

struct Args {
    edge_list: PathBuf,
    out_dir: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let usage = "usage: pmotifs <edgelist> <output-dir> [config.json]";
    let edge_list = args.next().ok_or_else(|| anyhow::anyhow!(usage))?;
    let out_dir = args.next().ok_or_else(|| anyhow::anyhow!(usage))?;
    let config = args.next().map(PathBuf::from);
    if let Some(extra) = args.next() {
        anyhow::bail!("Unexpected extra argument: {extra}");
    }
    Ok(Args {
        edge_list: PathBuf::from(edge_list),
        out_dir: PathBuf::from(out_dir),
        config,
    })
}

fn main() -> Result<()> {
    init_logging();
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => DetectionConfig::from_path(path)?,
        None => DetectionConfig::default(),
    };
    info!(
        "Detecting size-{} graphlets in {:?} against {} random graphs",
        config.graphlet_size, args.edge_list, config.random_graphs
    );

    let workflow = DetectionWorkflow::with_default_metrics(config)?;
    let summary = workflow.execute(&args.edge_list, &args.out_dir)?;
    report(&summary);
    Ok(())
}

fn report(summary: &DetectionSummary) {
    info!(
        "Original: {} occurrences; ensemble: {} members ({} reused), {} occurrences",
        summary.original.occurrence_count,
        summary.stats.members,
        summary.stats.reused_members,
        summary.stats.occurrences - summary.original.occurrence_count
    );
    if summary.stats.metric_failures > 0 {
        info!("{} metric failures, see warnings above", summary.stats.metric_failures);
    }

    for entry in &summary.frequency {
        info!(
            "Frequency {:<24} original {:>8}, z-score {:.3}",
            entry.graphlet_class.display_name(),
            entry.original,
            entry.z_score
        );
    }
    for test in &summary.pooled {
        let p_value = test
            .outcome
            .map(|outcome| format!("{:.3e}", outcome.p_value))
            .unwrap_or_else(|| "untestable".to_string());
        info!(
            "Positional {:<24} {:<38} p {}{}",
            test.graphlet_class.display_name(),
            test.metric,
            p_value,
            if test.significant { " *" } else { "" }
        );
    }
    for test in &summary.memberwise {
        info!(
            "Per member  {:<24} {:<38} {}/{} below {:.2e}",
            test.graphlet_class.display_name(),
            test.metric,
            test.significant_members,
            test.tested_members,
            test.threshold
        );
    }
    info!(
        "Ensemble duration {:?}, total {:?}",
        summary.ensemble_duration, summary.total_duration
    );
}
