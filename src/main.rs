use anyhow::Result;
use clap::Parser;
use needle_submit::agents::AgentRegistry;
use needle_submit::cli::{self, Args, Command};
use needle_submit::collect::ModuleGraph;
use needle_submit::eval::{default_evaluator_factory, LocalEvalRunner, MultiNeedleHaystack};
use needle_submit::pipeline::{self, PipelineOptions, SubmissionPipeline};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Values already in the environment win over .env
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match args.command {
        Command::Submit(submit_args) => submit(submit_args).await,
        Command::Run(run_args) => run_local(run_args).await,
        Command::Collect(collect_args) => report(list_files(collect_args)),
        Command::Init(init_args) => report(generate_sample_manifest(init_args)),
    };

    ExitCode::from(code as u8)
}

fn build_pipeline(options: PipelineOptions) -> SubmissionPipeline<MultiNeedleHaystack> {
    let haystack_dir = options.project_path(&options.haystack_dir);
    let runner = LocalEvalRunner::new(
        MultiNeedleHaystack::new()
            .with_context_length(options.context_length)
            .with_depth_percent(options.depth_percent),
        AgentRegistry::builtin(),
        default_evaluator_factory(),
        haystack_dir,
    )
    .with_models(options.models.clone());

    SubmissionPipeline::new(options, runner)
}

async fn submit(args: cli::SubmitArgs) -> i32 {
    let options = match PipelineOptions::from_args(&args.project, Some(&args.eval)) {
        Ok(mut options) => {
            options.leaderboard_url = args.leaderboard_url;
            options.assignment_id = args.assignment_id;
            options
        }
        Err(e) => return report(Err(e)),
    };

    build_pipeline(options).run(pipeline::ctrl_c()).await
}

async fn run_local(args: cli::RunArgs) -> i32 {
    let options = match PipelineOptions::from_args(&args.project, Some(&args.eval)) {
        Ok(options) => options,
        Err(e) => return report(Err(e)),
    };

    build_pipeline(options).run_local(pipeline::ctrl_c()).await
}

fn list_files(args: cli::CollectArgs) -> Result<()> {
    let options = PipelineOptions::from_args(&args.project, None)?;
    let files = pipeline::collect_files(&options)?;

    println!("Files collected for {}:", options.agent_spec);
    for (path, content) in &files {
        println!("  {} ({} bytes)", path, content.len());
    }
    println!("Total: {} files", files.len());

    Ok(())
}

fn generate_sample_manifest(args: cli::InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{:?} already exists (use --force to overwrite)",
            args.output
        );
    }

    ModuleGraph::sample().save(&args.output)?;
    info!("Wrote sample manifest");
    println!("Generated sample manifest at: {:?}", args.output);

    Ok(())
}

fn report(outcome: Result<()>) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            println!("\n✗ Error: {}", e);
            eprintln!("{:?}", e);
            1
        }
    }
}
