//! rubricforge command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use rubricforge_core::model::Domain;

mod commands;

use commands::evaluate::{EvalOptions, Target};

#[derive(Parser)]
#[command(
    name = "rubricforge",
    version,
    about = "Weighted rubric evaluation for AI-generated artifacts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a requirement document
    Requirement {
        /// Requirement document (or directory of documents)
        file: PathBuf,

        /// Report path (default: <output_dir>/需求分析评估报告.md)
        output: Option<PathBuf>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate frontend code
    Frontend {
        /// Frontend source file or directory
        file: PathBuf,

        /// Report path (default: <output_dir>/前端开发评估报告.md)
        output: Option<PathBuf>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate a backend code directory
    Backend {
        /// Backend source directory
        dir: PathBuf,

        /// Report path (default: <output_dir>/后端开发评估报告.md)
        output: Option<PathBuf>,

        /// Swagger/OpenAPI document; its operation count is the expected API total
        #[arg(long)]
        swagger: Option<PathBuf>,

        /// Directory of test sources (default: files under DIR named *test*)
        #[arg(long)]
        tests: Option<PathBuf>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate a bug fix
    Bug {
        /// Code containing the bug
        buggy: PathBuf,

        /// Fixed code
        fixed: PathBuf,

        /// Report path (default: <output_dir>/BUG修复评估报告.md)
        output: Option<PathBuf>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate a whole project directory
    Project {
        /// Project directory
        dir: PathBuf,

        /// Report path (default: <output_dir>/综合项目开发评估报告.md)
        output: Option<PathBuf>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate every matching file in a directory and rank them
    Batch {
        /// Directory containing the inputs
        dir: PathBuf,

        /// Domain rubric to apply
        #[arg(long, default_value = "requirement")]
        domain: Domain,

        /// File name prefix of inputs (default from config: 需求说明_)
        #[arg(long)]
        prefix: Option<String>,

        /// File extension of inputs (default from config: md)
        #[arg(long)]
        extension: Option<String>,

        /// Write the ranking as a score table to this file
        #[arg(long)]
        table: Option<PathBuf>,

        /// Write each input's report into this directory
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Merge two score tables by name
    Merge {
        /// First score table
        table_a: PathBuf,

        /// Second score table
        table_b: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the merged table to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate rubric files
    Validate {
        /// Rubric file to validate
        #[arg(long, conflicts_with = "domain")]
        rubric: Option<PathBuf>,

        /// Validate one built-in rubric (default: all)
        #[arg(long)]
        domain: Option<Domain>,
    },

    /// Create starter config and export the built-in rubrics
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rubricforge=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Requirement {
            file,
            output,
            options,
        } => commands::evaluate::execute(Target::Requirement { file }, output, options),
        Commands::Frontend {
            file,
            output,
            options,
        } => commands::evaluate::execute(Target::Frontend { file }, output, options),
        Commands::Backend {
            dir,
            output,
            swagger,
            tests,
            options,
        } => commands::evaluate::execute(
            Target::Backend {
                dir,
                swagger,
                tests,
            },
            output,
            options,
        ),
        Commands::Bug {
            buggy,
            fixed,
            output,
            options,
        } => commands::evaluate::execute(Target::Bug { buggy, fixed }, output, options),
        Commands::Project {
            dir,
            output,
            options,
        } => commands::evaluate::execute(Target::Project { dir }, output, options),
        Commands::Batch {
            dir,
            domain,
            prefix,
            extension,
            table,
            reports_dir,
            options,
        } => commands::batch::execute(
            dir,
            domain,
            prefix,
            extension,
            table,
            reports_dir,
            options,
        ),
        Commands::Merge {
            table_a,
            table_b,
            format,
            output,
        } => commands::merge::execute(table_a, table_b, format, output),
        Commands::Validate { rubric, domain } => commands::validate::execute(rubric, domain),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
