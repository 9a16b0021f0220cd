use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::builder::SimulatorBuilder;
use crate::config::SimulationConfig;
use crate::error::StrideError;
use crate::execution_stats::{
    log_execution_statistics, print_execution_statistics, ExecutionProfilingCollector,
};
use crate::infector::LogMode;
use crate::log::{
    close_contact_log_file, info, set_contact_log_file, set_log_level, LevelFilter,
};
#[cfg(feature = "progress_bar")]
use crate::progress::{init_day_progress_bar, update_day_progress};
use crate::report::{CasesRow, ReportWriter, SummaryRow, CASES_FILE, SUMMARY_FILE};
use crate::simulator::Simulator;
use clap::{Args, Command, FromArgMatches as _};

pub const CONTACT_LOG_FILE: &str = "contacts.txt";

/// Command line arguments of the stride runner
#[derive(Args, Debug, Clone, Default)]
pub struct BaseArgs {
    /// Path of the JSON run configuration
    #[arg(short, long)]
    pub config: PathBuf,

    /// Random seed, overrides the configuration
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Number of worker threads, overrides the configuration
    #[arg(short = 'w', long)]
    pub num_workers: Option<usize>,

    /// Directory for the case and summary reports
    #[arg(short, long, default_value = "")]
    pub output_dir: String,

    /// Enables logging at this level (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// File for contact and transmission records. Defaults to contacts.txt in the output
    /// directory when a log mode is configured
    #[arg(long)]
    pub contact_log: Option<PathBuf>,

    /// Hides the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Prints execution statistics when the run is complete
    #[arg(long)]
    pub timeit: bool,
}

fn create_stride_cli() -> Command {
    let cli = Command::new("stride");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs a simulation.
///
/// # Errors
/// Returns an error if argument parsing, configuration, population loading or report
/// writing fails
pub fn run_with_args() -> Result<Simulator, Box<dyn std::error::Error>> {
    let matches = create_stride_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(&args)?)
}

fn load_config(args: &BaseArgs) -> Result<SimulationConfig, StrideError> {
    let mut config = SimulationConfig::from_file(&args.config)?;
    if let Some(seed) = args.random_seed {
        config.rng_seed = seed;
    }
    if let Some(num_workers) = args.num_workers {
        config.num_workers = num_workers;
    }
    config.validate()?;
    Ok(config)
}

pub(crate) fn run_with_args_internal(args: &BaseArgs) -> Result<Simulator, StrideError> {
    if let Some(level) = &args.log_level {
        let level = LevelFilter::from_str(level)
            .map_err(|_| StrideError::ConfigError(format!("unknown log level '{level}'")))?;
        set_log_level(level);
    }
    let mut collector = ExecutionProfilingCollector::new();

    let config = load_config(args)?;
    let output_dir = Path::new(&args.output_dir);
    if config.log_mode != LogMode::None {
        let contact_log = args
            .contact_log
            .clone()
            .unwrap_or_else(|| output_dir.join(CONTACT_LOG_FILE));
        if let Some(parent) = contact_log.parent() {
            std::fs::create_dir_all(parent)?;
        }
        set_contact_log_file(&contact_log)?;
        info!("Writing {} records to {}", config.log_mode, contact_log.display());
    }

    let mut simulator = SimulatorBuilder::new(config.clone()).build()?;
    let mut cases = ReportWriter::new(&output_dir.join(CASES_FILE))?;

    #[cfg(feature = "progress_bar")]
    let show_progress = !args.no_progress && config.num_days > 0;
    #[cfg(feature = "progress_bar")]
    if show_progress {
        init_day_progress_bar(config.num_days as usize);
    }

    for day in 0..config.num_days {
        simulator.time_step();
        cases.send(&CasesRow::new(day, simulator.population().health_counts()))?;
        collector.refresh();
        #[cfg(feature = "progress_bar")]
        if show_progress {
            update_day_progress(day as usize + 1);
        }
    }

    let statistics = collector.compute_final_statistics(
        simulator.population().len(),
        config.num_days as usize,
        simulator.num_workers(),
    );
    let mut summary = ReportWriter::new(&output_dir.join(SUMMARY_FILE))?;
    summary.send(&SummaryRow {
        rng_seed: config.rng_seed,
        num_days: config.num_days,
        num_workers: config.num_workers,
        population: simulator.population().len(),
        r0: config.r0,
        transmission_rate: simulator.infector().transmission_rate(),
        seeding_rate: config.seeding_rate,
        immunity_rate: config.immunity_rate,
        total_cases: simulator.population().infected_count(),
        run_time_ms: u64::try_from(statistics.wall_time.as_millis()).unwrap_or(u64::MAX),
    })?;

    if config.log_mode != LogMode::None {
        close_contact_log_file();
    }

    log_execution_statistics(&statistics);
    if args.timeit {
        print_execution_statistics(&statistics);
    }
    Ok(simulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CasesRow;
    use tempfile::tempdir;

    fn args(output_dir: &Path) -> BaseArgs {
        BaseArgs {
            config: PathBuf::from("tests/data/run_config.json"),
            output_dir: output_dir.to_string_lossy().into_owned(),
            no_progress: true,
            ..BaseArgs::default()
        }
    }

    fn read_cases(output_dir: &Path) -> Vec<CasesRow> {
        let mut reader = csv::Reader::from_path(output_dir.join(CASES_FILE)).unwrap();
        reader.deserialize().map(Result::unwrap).collect()
    }

    #[test]
    fn run_writes_reports() {
        let dir = tempdir().unwrap();
        let simulator = run_with_args_internal(&args(dir.path())).unwrap();
        assert_eq!(simulator.calendar().simulation_day(), 20);

        let cases = read_cases(dir.path());
        assert_eq!(cases.len(), 20);
        assert_eq!(cases[0].day, 0);
        assert!(cases.windows(2).all(|pair| pair[0].infected <= pair[1].infected));
        assert!(dir.path().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn seed_and_workers_override_config() {
        let dir = tempdir().unwrap();
        let args = BaseArgs {
            random_seed: Some(99),
            num_workers: Some(3),
            ..args(dir.path())
        };
        let simulator = run_with_args_internal(&args).unwrap();
        assert_eq!(simulator.num_workers(), 3);
    }

    #[test]
    fn same_arguments_same_cases() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        run_with_args_internal(&args(first.path())).unwrap();
        run_with_args_internal(&args(second.path())).unwrap();
        assert_eq!(read_cases(first.path()), read_cases(second.path()));
    }

    #[test]
    fn unknown_log_level() {
        let dir = tempdir().unwrap();
        let args = BaseArgs {
            log_level: Some("loud".to_string()),
            ..args(dir.path())
        };
        assert!(matches!(
            run_with_args_internal(&args),
            Err(StrideError::ConfigError(_))
        ));
    }

    #[test]
    fn invalid_worker_count() {
        let dir = tempdir().unwrap();
        let args = BaseArgs {
            num_workers: Some(0),
            ..args(dir.path())
        };
        assert!(matches!(
            run_with_args_internal(&args),
            Err(StrideError::ConfigError(_))
        ));
    }

    #[test]
    fn cli_runs_the_configured_simulation() {
        let dir = tempdir().unwrap();
        assert_cmd::Command::cargo_bin("stride")
            .unwrap()
            .args(["--config", "tests/data/run_config.json", "--no-progress", "--output-dir"])
            .arg(dir.path())
            .assert()
            .success();
        assert_eq!(read_cases(dir.path()).len(), 20);
    }
}
