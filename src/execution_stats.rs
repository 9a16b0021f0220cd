// Loss of precision is allowable in this module's use cases.
#![allow(clippy::cast_precision_loss)]

use std::time::{Duration, Instant};

use bytesize::ByteSize;
use humantime::format_duration;
use log::{debug, error, info};
use serde_derive::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// How frequently the max memory used value is updated.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Final statistics of a run. Per person and per day statistics are zero when the population
/// or the number of days is zero.
#[derive(Serialize, Debug)]
pub struct ExecutionStatistics {
    pub max_memory_usage: u64,
    pub cpu_time: Duration,
    pub wall_time: Duration,

    pub population: usize,
    pub num_days: usize,
    pub num_workers: usize,
    pub wall_time_per_day: Duration,
    pub cpu_time_per_person: Duration,
    pub memory_per_person: u64,
}

pub struct ExecutionProfilingCollector {
    /// Start of the run, for the elapsed wall time
    start_time: Instant,
    last_refresh: Instant,
    /// CPU-milliseconds the process had used when the run started
    start_cpu_time: u64,
    /// Peak resident memory of the process, polled during the run
    max_memory_usage: u64,
    system: System,
    /// `None` where `sysinfo` cannot see the current process
    process_id: Option<Pid>,
}

impl Default for ExecutionProfilingCollector {
    fn default() -> Self {
        ExecutionProfilingCollector::new()
    }
}

impl ExecutionProfilingCollector {
    pub fn new() -> ExecutionProfilingCollector {
        let process_id = sysinfo::get_current_pid().ok();
        let now = Instant::now();

        let mut collector = ExecutionProfilingCollector {
            start_time: now,
            last_refresh: now,
            start_cpu_time: 0,
            max_memory_usage: 0,
            system: System::new(),
            process_id,
        };
        if let Some(process_id) = process_id {
            debug!("Process ID: {}", process_id);
            collector.update_system_info(ProcessRefreshKind::nothing().with_cpu().with_memory());
            if let Some(process) = collector.system.process(process_id) {
                collector.max_memory_usage = process.memory();
                collector.start_cpu_time = process.accumulated_cpu_time();
            }
        }

        collector
    }

    /// Polls memory usage if at least `REFRESH_INTERVAL` has passed since the previous poll.
    /// Cheap enough to call after every simulated day.
    #[inline]
    pub fn refresh(&mut self) {
        if self.last_refresh.elapsed() >= REFRESH_INTERVAL {
            self.poll_memory();
            self.last_refresh = Instant::now();
        }
    }

    fn poll_memory(&mut self) {
        if let Some(pid) = self.process_id {
            self.update_system_info(ProcessRefreshKind::nothing().with_memory());
            if let Some(process) = self.system.process(pid) {
                self.max_memory_usage = self.max_memory_usage.max(process.memory());
            }
        }
    }

    /// CPU-milliseconds used by the process since the collector was created.
    pub fn cpu_time(&mut self) -> u64 {
        let Some(process_id) = self.process_id else {
            return 0;
        };
        self.update_system_info(ProcessRefreshKind::nothing().with_cpu());
        self.system
            .process(process_id)
            .map_or(0, |process| {
                process
                    .accumulated_cpu_time()
                    .saturating_sub(self.start_cpu_time)
            })
    }

    #[inline]
    fn update_system_info(&mut self, process_refresh_kind: ProcessRefreshKind) {
        if let Some(pid) = self.process_id {
            if self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                process_refresh_kind,
            ) < 1
            {
                error!("could not refresh process statistics");
            }
        }
    }

    pub fn compute_final_statistics(
        &mut self,
        population: usize,
        num_days: usize,
        num_workers: usize,
    ) -> ExecutionStatistics {
        self.poll_memory();
        let cpu_time_millis = self.cpu_time();
        let cpu_time = Duration::from_millis(cpu_time_millis);
        let wall_time = self.start_time.elapsed();

        let wall_time_per_day = if num_days > 0 {
            wall_time / u32::try_from(num_days).unwrap_or(u32::MAX)
        } else {
            Duration::ZERO
        };
        let cpu_time_per_person = if population > 0 {
            Duration::from_secs_f64(cpu_time_millis as f64 / population as f64 / 1000.0)
        } else {
            Duration::ZERO
        };
        let memory_per_person = if population > 0 {
            self.max_memory_usage / population as u64
        } else {
            0
        };

        ExecutionStatistics {
            max_memory_usage: self.max_memory_usage,
            cpu_time,
            wall_time,
            population,
            num_days,
            num_workers,
            wall_time_per_day,
            cpu_time_per_person,
            memory_per_person,
        }
    }
}

/// Prints execution statistics to the console.
pub fn print_execution_statistics(summary: &ExecutionStatistics) {
    println!("━━━━ Execution Summary ━━━━");
    if summary.max_memory_usage == 0 {
        println!("Memory and CPU statistics are not available on your platform.");
    } else {
        println!(
            "{:<25}{}",
            "Max memory usage:",
            ByteSize::b(summary.max_memory_usage)
        );
        println!("{:<25}{}", "CPU time:", format_duration(summary.cpu_time));
    }
    println!("{:<25}{}", "Wall time:", format_duration(summary.wall_time));
    println!("{:<25}{}", "Workers:", summary.num_workers);

    if summary.num_days > 0 {
        println!("{:<25}{}", "Days:", summary.num_days);
        println!(
            "{:<25}{}",
            "Wall time per day:",
            format_duration(summary.wall_time_per_day)
        );
    }
    if summary.population > 0 {
        println!("{:<25}{}", "Population:", summary.population);
        if summary.max_memory_usage > 0 {
            println!(
                "{:<25}{}",
                "Memory per person:",
                ByteSize::b(summary.memory_per_person)
            );
            println!(
                "{:<25}{}",
                "CPU time per person:",
                format_duration(summary.cpu_time_per_person)
            );
        }
    }
}

/// Logs execution statistics at `info` level.
pub fn log_execution_statistics(stats: &ExecutionStatistics) {
    info!("Execution complete.");
    if stats.max_memory_usage == 0 {
        info!("Memory and CPU statistics are not available on your platform.");
    } else {
        info!("Max memory usage: {}", ByteSize::b(stats.max_memory_usage));
        info!("CPU time: {}", format_duration(stats.cpu_time));
    }
    info!(
        "Wall time: {} on {} workers",
        format_duration(stats.wall_time),
        stats.num_workers
    );
    if stats.num_days > 0 {
        info!(
            "{} days, {} per day",
            stats.num_days,
            format_duration(stats.wall_time_per_day)
        );
    }
    if stats.population > 0 && stats.max_memory_usage > 0 {
        info!(
            "Population {}: {} and {} CPU time per person",
            stats.population,
            ByteSize::b(stats.memory_per_person),
            format_duration(stats.cpu_time_per_person)
        );
    }
}
