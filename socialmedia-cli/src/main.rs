//! socialmedia-cli - Log in to and post on social media platforms

use std::io::{BufRead, Write};

use clap::{Parser, Subcommand, ValueEnum};
use libsocialmedia::logging::{LogFormat, LoggingConfig};
use libsocialmedia::{
    Config, Dispatcher, LoginEvent, LoginInteraction, PlatformId, PostResult, Result,
    SmokeTestOutcome,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "socialmedia-cli")]
#[command(version)]
#[command(about = "Post to social media platforms from the command line", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (text, json, pretty)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Authenticate with a social media platform
    Login {
        /// Platform name (twitter)
        platform: String,
    },

    /// Post a message to a social media platform
    Post {
        /// Platform name (twitter)
        platform: String,

        /// Message to post
        message: String,

        /// Output format for the post result
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors exit 1
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    LoggingConfig::from_env(cli.log_format, cli.verbose).init();

    if let Err(e) = run(cli).await {
        tracing::debug!("Command failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { platform } => login(&platform).await,
        Commands::Post {
            platform,
            message,
            format,
        } => post(&platform, &message, format).await,
    }
}

async fn post(name: &str, message: &str, format: OutputFormat) -> Result<()> {
    // Unknown platforms fail before the config or token file is read
    let platform = Dispatcher::resolve(name)?;
    let dispatcher = Dispatcher::from_config(Config::load()?)?;

    let result = dispatcher.post(platform.as_str(), message).await?;
    print_post_result(platform, &result, format)
}

/// JSON shape of a post result: `{"platform","id","url"}`
#[derive(Serialize)]
struct PostOutput<'a> {
    platform: PlatformId,
    #[serde(flatten)]
    result: &'a PostResult,
}

fn print_post_result(
    platform: PlatformId,
    result: &PostResult,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Posted to {}: {}", platform, result.id);
            println!("URL: {}", result.url);
        }
        OutputFormat::Json => {
            let output = PostOutput { platform, result };
            let json = serde_json::to_string(&output).map_err(std::io::Error::from)?;
            println!("{}", json);
        }
    }
    Ok(())
}

async fn login(name: &str) -> Result<()> {
    let platform = Dispatcher::resolve(name)?;
    let dispatcher = Dispatcher::from_config(Config::load()?)?;

    let mut terminal = TerminalInteraction::new();
    let report = dispatcher.login(platform.as_str(), &mut terminal).await?;

    match &report.screen_name {
        Some(screen_name) => println!("Logged in to {} as @{}", report.platform, screen_name),
        None => println!("Logged in to {}", report.platform),
    }

    match &report.smoke_test {
        SmokeTestOutcome::Passed(result) => {
            println!("Smoke test posted: {}", result.url);
        }
        SmokeTestOutcome::Failed(e) => {
            // Tokens stay saved; the post may fail for reasons unrelated to auth
            eprintln!("Warning: smoke test post failed: {}", e);
            eprintln!(
                "Credentials remain saved at {}",
                report.token_path.display()
            );
        }
    }

    Ok(())
}

/// Login prompts on the controlling terminal
struct TerminalInteraction {
    stdin: std::io::Stdin,
}

impl TerminalInteraction {
    fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
        }
    }
}

impl LoginInteraction for TerminalInteraction {
    fn verifier(&mut self, platform: PlatformId, authorization_url: &str) -> Result<String> {
        println!("Open this URL to authorize socialmedia-cli on {}:", platform);
        println!();
        println!("  {}", authorization_url);
        println!();
        print!("Enter the PIN shown after authorizing: ");
        std::io::stdout().flush()?;

        let mut pin = String::new();
        self.stdin.lock().read_line(&mut pin)?;
        Ok(pin.trim().to_string())
    }

    fn notify(&mut self, event: LoginEvent) {
        match event {
            LoginEvent::StageStarted(stage) => {
                tracing::info!("Login stage: {}", stage.label());
            }
            LoginEvent::TokensSaved(path) => {
                println!("Tokens saved to {}", path.display());
            }
            LoginEvent::WaitingBeforeSmokeTest(delay) => {
                println!(
                    "Waiting {} seconds before posting a test message...",
                    delay.as_secs()
                );
            }
        }
    }
}
