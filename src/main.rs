use anyhow::Result;
use clap::{Parser, Subcommand};
use std::str::FromStr;
use testwright::framework::FrameworkType;
use testwright::synthesis::GenerationRequest;
use testwright::{Config, FrameworkExpert};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testwright", about = "Framework expert: analyze once, generate cheaply")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show knowledge artifact status for a framework
    Stats {
        /// Framework type: pstaff or client
        framework: String,
    },
    /// Run the one-time framework analysis (expensive; idempotent unless forced)
    Analyze {
        framework: String,
        /// Re-run even when an analyzed artifact exists
        #[arg(long)]
        force: bool,
    },
    /// Generate a test script from a natural-language description
    Generate {
        framework: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        test_name: String,
        /// Write the script here instead of embedding it in the JSON output
        #[arg(long)]
        out: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    testwright::load_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("testwright=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let generator = testwright::llm::create_generator(&config)?;
    let expert = FrameworkExpert::new(config, generator)?;

    match cli.command {
        Command::Stats { framework } => {
            let framework = FrameworkType::from_str(&framework)?;
            let stats = expert.knowledge_stats(framework);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Analyze { framework, force } => {
            let framework = FrameworkType::from_str(&framework)?;
            info!(%framework, force, "starting analysis (this can take tens of seconds)");
            let stats = expert.analyze(framework, force).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Generate {
            framework,
            description,
            test_name,
            out,
        } => {
            let framework_type = FrameworkType::from_str(&framework)?;
            let result = expert
                .generate_script(GenerationRequest {
                    description,
                    test_name,
                    framework_type,
                })
                .await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &result.text)?;
                    info!("script written to {}", path.display());
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "script_path": path,
                            "structural_flags": result.structural_flags,
                            "context_source": result.context_source,
                        }))?
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }
    }

    Ok(())
}
