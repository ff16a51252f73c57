use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

/// Argument definitions of the `stroke` binary.
pub fn build_cli() -> Command {
    Command::new("stroke")
        .version(clap::crate_version!())
        .about("Stroke prediction: logistic regression on tabular health records")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Load, preprocess, split, train and evaluate in one pass")
                .arg(
                    Arg::new("config")
                        .help("Path to the JSON run configuration. Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help(
                            "Path to the input CSV/TSV file. \
                             Overrides data_path from the configuration file.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .help("Name of the binary outcome column.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("test_size")
                        .long("test-size")
                        .help("Fraction of rows held out for evaluation, in (0, 1).")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the split and the solver.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("penalty")
                        .long("penalty")
                        .help("Override the regularization penalty from the JSON config.")
                        .value_parser(["l1", "l2", "elastic_net", "none"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("solver")
                        .long("solver")
                        .help("Override the solver from the JSON config.")
                        .value_parser(["coordinate_descent", "proximal_gradient"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("c")
                        .short('C')
                        .long("inverse-regularization")
                        .help("Inverse regularization strength C (> 0).")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("class_weight")
                        .long("class-weight")
                        .help("Class weighting policy.")
                        .value_parser(["balanced", "uniform"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory for metrics.json and the HTML report.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("config").about("Print the default run configuration as JSON"))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}
