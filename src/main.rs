use clap::{Parser, Subcommand};
use lance_peek::Result;
use lance_peek::backend::IncludeFields;
use lance_peek::commands::{list_collections, run_query, show_collection, show_config};
use lance_peek::peek::DEFAULT_QUERY_RESULTS;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lance-peek")]
#[command(about = "Inspect the collections stored in a local LanceDB persistence directory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the collections in a persistence directory
    Collections {
        /// Path to the persistence directory
        path: PathBuf,
    },
    /// Show the records of a collection as a table
    Show {
        /// Path to the persistence directory
        path: PathBuf,
        /// Name of the collection to view
        collection: String,
        /// Include embedding vectors in the table
        #[arg(long)]
        embeddings: bool,
        /// Leave metadata columns out of the table
        #[arg(long)]
        no_metadata: bool,
        /// Print the table as JSON instead of a text grid
        #[arg(long)]
        json: bool,
    },
    /// Run a similarity query against a collection
    Query {
        /// Path to the persistence directory
        path: PathBuf,
        /// Name of the collection to query
        collection: String,
        /// Free-text probe to search with
        text: String,
        /// Maximum number of matches to return
        #[arg(short = 'k', long = "results", default_value_t = DEFAULT_QUERY_RESULTS)]
        results: usize,
        /// Include embedding vectors in the table
        #[arg(long)]
        embeddings: bool,
        /// Leave metadata columns out of the table
        #[arg(long)]
        no_metadata: bool,
        /// Print the table as JSON instead of a text grid
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}

fn include_fields(embeddings: bool, no_metadata: bool) -> IncludeFields {
    IncludeFields {
        metadatas: !no_metadata,
        embeddings,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collections { path } => {
            list_collections(&path).await?;
        }
        Commands::Show {
            path,
            collection,
            embeddings,
            no_metadata,
            json,
        } => {
            show_collection(
                &path,
                &collection,
                include_fields(embeddings, no_metadata),
                json,
            )
            .await?;
        }
        Commands::Query {
            path,
            collection,
            text,
            results,
            embeddings,
            no_metadata,
            json,
        } => {
            run_query(
                &path,
                &collection,
                &text,
                results,
                include_fields(embeddings, no_metadata),
                json,
            )
            .await?;
        }
        Commands::Config => {
            show_config()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["lance-peek", "collections", "/tmp/store"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Collections { .. });
        }
    }

    #[test]
    fn show_command_defaults() {
        let cli = Cli::try_parse_from(["lance-peek", "show", "/tmp/store", "articles"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Show {
                collection,
                embeddings,
                no_metadata,
                ..
            } = parsed.command
            {
                assert_eq!(collection, "articles");
                // Mirrors the original controls: embeddings off, metadata on.
                assert!(!embeddings);
                assert!(!no_metadata);
            }
        }
    }

    #[test]
    fn query_command_default_k() {
        let cli = Cli::try_parse_from(["lance-peek", "query", "/tmp/store", "articles", "hello"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Query { results, text, .. } = parsed.command {
                assert_eq!(results, DEFAULT_QUERY_RESULTS);
                assert_eq!(text, "hello");
            }
        }
    }

    #[test]
    fn query_command_custom_k() {
        let cli = Cli::try_parse_from([
            "lance-peek",
            "query",
            "/tmp/store",
            "articles",
            "hello",
            "-k",
            "10",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Query { results, .. } = parsed.command {
                assert_eq!(results, 10);
            }
        }
    }

    #[test]
    fn include_flag_mapping() {
        let include = include_fields(true, true);
        assert!(include.embeddings);
        assert!(!include.metadatas);

        let include = include_fields(false, false);
        assert!(!include.embeddings);
        assert!(include.metadatas);
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["lance-peek", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["lance-peek", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
