use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileQueueErrorsConfig, FileQueuePolicy, FileVariableConfig};
use super::models::{AppConfig, VariableRange};
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use std::path::{Path, PathBuf};
use xbit::core::observables::{Observable, ObservableSet};
use xbit::engine::config::{
    EarlyStopConfig, QueueErrorPolicy, RecordMode, ScanConfigBuilder,
};
use xbit::engine::error::EngineError;
use xbit::engine::scan_type::ScanType;

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_file(&args.config)?;
    let base_dir = args
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    let setup = file_config.setup.take().unwrap_or_default();

    let name = args
        .name
        .clone()
        .or(setup.name)
        .unwrap_or_else(|| defaults.name.clone());
    let scan_type: ScanType = setup
        .scan_type
        .as_deref()
        .unwrap_or(defaults.scan_type.as_str())
        .parse()
        .map_err(EngineError::from)?;
    let cores = args.cores.or(setup.cores).unwrap_or(defaults.cores);
    let points_per_iteration = args.points.or(setup.points).unwrap_or(defaults.points);
    let iterations = args
        .iterations
        .or(setup.iterations)
        .unwrap_or(defaults.iterations);
    let record_mode = if args.short {
        RecordMode::Compact
    } else {
        setup.record.unwrap_or(defaults.record_mode)
    };

    if points_per_iteration == 0 || iterations == 0 {
        return Err(CliError::Argument(
            "`points` and `iterations` must both be at least 1".to_string(),
        ));
    }

    let early_stop = setup
        .early_stop
        .and_then(|e| e.threshold)
        .map(|threshold| EarlyStopConfig { threshold });
    let queue_error_policy = merge_queue_policy(setup.queue_errors, &defaults)?;

    let temp_root = args
        .temp_dir
        .clone()
        .or(setup.temp_dir)
        .unwrap_or_else(|| defaults.temp_root.clone());
    let output_root = args
        .output_dir
        .clone()
        .or(setup.output_dir)
        .unwrap_or_else(|| defaults.output_root.clone());

    let primary = file_config.primary.take().ok_or_else(|| {
        CliError::Config("A `[primary]` tool section is required.".to_string())
    })?;
    let input_template = file_config
        .input
        .take()
        .map(|i| resolve_relative(&base_dir, &i.template))
        .ok_or_else(|| {
            CliError::Config("An `[input]` section with a `template` is required.".to_string())
        })?;

    let variables = file_config
        .variables
        .into_iter()
        .map(|v| to_variable_range(v, &defaults))
        .collect::<Result<Vec<_>>>()?;
    if variables.is_empty() {
        return Err(CliError::Config(
            "At least one `[[variables]]` entry is required.".to_string(),
        ));
    }

    let observables: ObservableSet = file_config
        .observables
        .into_iter()
        .map(Observable::from)
        .collect();

    let scan = ScanConfigBuilder::new()
        .name(name.clone())
        .scan_type(scan_type)
        .cores(cores)
        .record_mode(record_mode)
        .early_stop(early_stop)
        .queue_error_policy(queue_error_policy)
        .temp_dir(temp_root.join(&name))
        .output_dir(output_root.join(&name))
        .primary(primary.into())
        .observables(observables)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        scan,
        secondary_tools: file_config.tools.into_iter().map(Into::into).collect(),
        input_template,
        variables,
        points_per_iteration,
        iterations,
        seed: args.seed.or(setup.seed),
        points_file: args.points_file.clone(),
        clean: args.clean,
    })
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn to_variable_range(v: FileVariableConfig, defaults: &DefaultsConfig) -> Result<VariableRange> {
    let [min, max] = v.range;
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(CliError::Config(format!(
            "Variable '{}' has an invalid range [{}, {}].",
            v.name, min, max
        )));
    }
    let steps = v.steps.unwrap_or(defaults.grid_steps);
    if steps == 0 {
        return Err(CliError::Config(format!(
            "Variable '{}' needs at least one grid step.",
            v.name
        )));
    }
    Ok(VariableRange {
        name: v.name,
        min,
        max,
        steps,
    })
}

fn merge_queue_policy(
    file_val: Option<FileQueueErrorsConfig>,
    defaults: &DefaultsConfig,
) -> Result<QueueErrorPolicy> {
    let file_val = file_val.unwrap_or_default();
    match (file_val.policy, file_val.max_attempts) {
        (None | Some(FileQueuePolicy::Abort), None) => Ok(QueueErrorPolicy::Abort),
        (Some(FileQueuePolicy::Abort), Some(_)) => Err(CliError::Config(
            "`max-attempts` only applies to the `retry` queue error policy".to_string(),
        )),
        (None | Some(FileQueuePolicy::Retry), Some(max_attempts)) => {
            Ok(QueueErrorPolicy::Retry { max_attempts })
        }
        (Some(FileQueuePolicy::Retry), None) => Ok(QueueErrorPolicy::Retry {
            max_attempts: defaults.retry_attempts,
        }),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let setup = config.setup.get_or_insert_with(Default::default);

        match key {
            "setup.name" => setup.name = Some(value_str.to_string()),
            "setup.type" => setup.scan_type = Some(value_str.to_string()),
            "setup.cores" => setup.cores = Some(parse_value(key, value_str, "integer")?),
            "setup.points" => setup.points = Some(parse_value(key, value_str, "integer")?),
            "setup.iterations" => {
                setup.iterations = Some(parse_value(key, value_str, "integer")?)
            }
            "setup.seed" => setup.seed = Some(parse_value(key, value_str, "integer")?),
            "setup.record" => {
                setup.record = Some(match value_str {
                    "compact" => RecordMode::Compact,
                    "full" => RecordMode::Full,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid record mode for {}: {} (expected 'compact' or 'full')",
                            key, value_str
                        )));
                    }
                })
            }
            "setup.early-stop.threshold" => {
                setup
                    .early_stop
                    .get_or_insert_with(Default::default)
                    .threshold = Some(parse_value(key, value_str, "float")?);
            }
            "setup.queue-errors.policy" => {
                setup
                    .queue_errors
                    .get_or_insert_with(Default::default)
                    .policy = Some(match value_str {
                    "abort" => FileQueuePolicy::Abort,
                    "retry" => FileQueuePolicy::Retry,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid queue error policy for {}: {} (expected 'abort' or 'retry')",
                            key, value_str
                        )));
                    }
                });
            }
            "setup.queue-errors.max-attempts" => {
                setup
                    .queue_errors
                    .get_or_insert_with(Default::default)
                    .max_attempts = Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const SCAN_FILE: &str = r#"
        [setup]
        name = "demo"
        type = "Random"
        cores = 2
        points = 50

        [primary]
        name = "SPheno"
        path = "/opt/spheno/bin"
        binary = "SPheno"
        input = "LesHouches.in"
        output = "SPheno.spc"

        [[tools]]
        name = "HiggsBounds"
        path = "/opt/hb"
        binary = "HiggsBounds"

        [[observables]]
        name = "mh"
        block = "MASS"
        key = 25
        mean = 125.0
        variance = 4.0

        [[variables]]
        name = "m0"
        range = [100.0, 1000.0]

        [[variables]]
        name = "tanb"
        range = [2.0, 50.0]
        steps = 5

        [input]
        template = "LesHouches.in.template"
    "#;

    fn scan_file(content: &str) -> (TempDir, RunArgs) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.toml");
        fs::write(&path, content).unwrap();
        let args = RunArgs {
            config: path,
            ..Default::default()
        };
        (dir, args)
    }

    #[test]
    fn build_config_reads_file_and_applies_defaults() {
        let (dir, args) = scan_file(SCAN_FILE);

        let app = build_config(&args).expect("build ok");

        assert_eq!(app.scan.name, "demo");
        assert_eq!(app.scan.scan_type, ScanType::Random);
        assert_eq!(app.scan.cores, 2);
        assert_eq!(app.scan.record_mode, RecordMode::Full);
        assert_eq!(app.scan.queue_error_policy, QueueErrorPolicy::Abort);
        assert_eq!(app.scan.temp_dir, PathBuf::from("Temp/demo"));
        assert_eq!(app.scan.output_dir, PathBuf::from("Output/demo"));
        assert!(app.scan.early_stop.is_none());
        assert_eq!(app.scan.observables.len(), 1);
        assert_eq!(app.points_per_iteration, 50);
        assert_eq!(app.iterations, 1);
        assert_eq!(app.secondary_tools[0].name, "HiggsBounds");
        assert_eq!(app.input_template, dir.path().join("LesHouches.in.template"));
        assert_eq!(app.variables[0].steps, DefaultsConfig::default().grid_steps);
        assert_eq!(app.variables[1].steps, 5);
        assert_eq!(app.variable_names(), vec!["m0", "tanb"]);
    }

    #[test]
    fn scan_without_setup_section_falls_back_to_defaults() {
        let (_dir, mut args) = scan_file(
            r#"
            [primary]
            name = "SPheno"
            path = "/opt"
            binary = "SPheno"

            [[variables]]
            name = "m0"
            range = [0.0, 1.0]

            [input]
            template = "t"
            "#,
        );
        args.set_values = vec!["setup.queue-errors.policy=retry".to_string()];

        let app = build_config(&args).expect("build ok");
        let defaults = DefaultsConfig::default();

        assert_eq!(app.scan.name, defaults.name);
        assert_eq!(app.scan.temp_dir, defaults.temp_root.join("scan"));
        assert_eq!(app.scan.output_dir, defaults.output_root.join("scan"));
        assert_eq!(app.variables[0].steps, defaults.grid_steps);
        assert_eq!(
            app.scan.queue_error_policy,
            QueueErrorPolicy::Retry {
                max_attempts: defaults.retry_attempts
            }
        );
    }

    #[test]
    fn cli_flags_override_file_values() {
        let (_dir, mut args) = scan_file(SCAN_FILE);
        args.name = Some("override".to_string());
        args.cores = Some(8);
        args.short = true;
        args.temp_dir = Some(PathBuf::from("/scratch"));

        let app = build_config(&args).expect("build ok");

        assert_eq!(app.scan.cores, 8);
        assert_eq!(app.scan.record_mode, RecordMode::Compact);
        assert_eq!(app.scan.temp_dir, PathBuf::from("/scratch/override"));
        assert_eq!(app.scan.output_dir, PathBuf::from("Output/override"));
    }

    #[test]
    fn set_values_override() {
        let (_dir, mut args) = scan_file(SCAN_FILE);
        args.set_values = vec![
            "setup.type=MCMC".to_string(),
            "setup.iterations=4".to_string(),
            "setup.record=compact".to_string(),
            "setup.early-stop.threshold=0.25".to_string(),
            "setup.queue-errors.policy=retry".to_string(),
        ];

        let app = build_config(&args).expect("build ok");

        assert_eq!(app.scan.scan_type, ScanType::Mcmc);
        assert_eq!(app.iterations, 4);
        assert_eq!(app.scan.record_mode, RecordMode::Compact);
        assert_eq!(app.scan.early_stop, Some(EarlyStopConfig { threshold: 0.25 }));
        assert_eq!(
            app.scan.queue_error_policy,
            QueueErrorPolicy::Retry {
                max_attempts: DefaultsConfig::default().retry_attempts
            }
        );
    }

    #[test]
    fn unknown_scan_type_is_an_engine_error() {
        let (_dir, mut args) = scan_file(SCAN_FILE);
        args.set_values = vec!["setup.type=Annealing".to_string()];

        assert!(matches!(
            build_config(&args),
            Err(CliError::Engine(EngineError::ScanType(_)))
        ));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        let (_dir, mut args) = scan_file(SCAN_FILE);
        args.set_values = vec!["setup.cores".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));

        args.set_values = vec!["setup.threads=3".to_string()];
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn missing_primary_tool_is_reported() {
        let (_dir, args) = scan_file(
            r#"
            [[variables]]
            name = "m0"
            range = [0.0, 1.0]
            [input]
            template = "t"
            "#,
        );
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn inverted_variable_range_is_rejected() {
        let (_dir, args) = scan_file(&SCAN_FILE.replace("[2.0, 50.0]", "[50.0, 2.0]"));
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }
}
