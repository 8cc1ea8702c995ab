use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use refmatch::lexical::LexicalPolicy;
use refmatch::{logging, Config, RankingMode};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Find relevant document references for a piece of text", long_about = None)]
struct Cli {
    /// Config file (default: ~/.refmatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank the corpus against a query and print the references
    Rank {
        /// Query text (knowledge-base answer or user question)
        query: String,

        /// Corpus file (CSV or JSON), overrides config
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Number of references to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Ranking mode (lexical, embedding)
        #[arg(long)]
        mode: Option<RankingMode>,

        /// Lexical matching policy (substring, token-overlap, any-token)
        #[arg(long)]
        policy: Option<LexicalPolicy>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Inspect or precompute the reference corpus
    Corpus {
        #[command(subcommand)]
        command: CorpusCommands,
    },

    /// Run the webhook server
    Serve {
        /// Host to bind to (default from config: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config or $PORT: 8080)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum CorpusCommands {
    /// Load the corpus and report what was kept
    Check {
        /// Corpus file (CSV or JSON), overrides config
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// Embed every document and write a JSON corpus with vectors
    Embed {
        /// Output JSON file
        output: PathBuf,

        /// Corpus file (CSV or JSON), overrides config
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Rank {
            query,
            corpus,
            top_k,
            mode,
            policy,
            json,
        } => {
            commands::set_corpus(&mut config, corpus);
            if let Some(k) = top_k {
                config.ranking.top_k = k;
            }
            if let Some(mode) = mode {
                config.ranking.mode = mode;
            }
            if let Some(policy) = policy {
                config.ranking.lexical_policy = policy;
            }
            commands::rank::execute(&config, &query, json)?;
        }
        Commands::Corpus { command } => match command {
            CorpusCommands::Check { corpus } => {
                commands::set_corpus(&mut config, corpus);
                commands::corpus::check(&config)?;
            }
            CorpusCommands::Embed { output, corpus } => {
                commands::set_corpus(&mut config, corpus);
                commands::corpus::embed(&config, &output)?;
            }
        },
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.serve.host = host;
            }
            if let Some(port) = port {
                config.serve.port = port;
            }
            commands::serve::execute(&config)?;
        }
    }

    Ok(())
}
