// CLI module for argument parsing and configuration

use crate::config::UserConfig;
use crate::organizer::{validate_folder_name, Request};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Sortdir - sort the files of a directory into subfolders
///
/// Files are classified by first letter, by a keyword in their name, or by
/// keywords found in their content, then moved in parallel.
#[derive(Parser, Debug, Clone)]
#[command(name = "sortdir")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Number of worker threads moving files (overrides the config file)
    #[arg(short = 'w', long = "workers", global = true)]
    pub workers: Option<usize>,

    /// Print the outcome as JSON
    #[arg(long = "json", action = ArgAction::SetTrue, global = true)]
    pub json: bool,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move files into A-Z folders by the first letter of their name
    Alpha {
        /// Directory to organize
        directory: PathBuf,
    },
    /// Move files whose name contains KEYWORD into a folder named KEYWORD
    Keyword {
        /// Directory to organize
        directory: PathBuf,
        /// Case-sensitive text to look for in file names
        keyword: String,
    },
    /// Move files into the folder of the first keyword found in their content
    Content {
        /// Directory to organize
        directory: PathBuf,
        /// Comma-separated keywords, checked in the given order
        ///
        /// Example: "invoice,order,receipt"
        keywords: String,
    },
}

impl Command {
    pub fn directory(&self) -> &Path {
        match self {
            Command::Alpha { directory }
            | Command::Keyword { directory, .. }
            | Command::Content { directory, .. } => directory,
        }
    }
}

/// Splits a comma-separated keyword string, trimming each item and dropping empty ones.
pub fn parse_keyword_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        let directory = self.command.directory();

        if directory.as_os_str().is_empty() {
            return Err("Please enter the directory.".to_string());
        }

        if !directory.exists() {
            return Err(format!(
                "Directory does not exist: {}",
                directory.display()
            ));
        }

        if !directory.is_dir() {
            return Err(format!("Path is not a directory: {}", directory.display()));
        }

        if self.workers == Some(0) {
            return Err("--workers must be at least 1".to_string());
        }

        match &self.command {
            Command::Alpha { .. } => {}
            Command::Keyword { keyword, .. } => {
                if keyword.is_empty() {
                    return Err("Please enter the directory and keyword.".to_string());
                }
                validate_folder_name("keyword", keyword).map_err(|e| e.to_string())?;
            }
            Command::Content { keywords, .. } => {
                let list = parse_keyword_list(keywords);
                if list.is_empty() {
                    return Err(format!(
                        "No keywords found in '{}'. Use a comma-separated list like 'invoice,order'",
                        keywords
                    ));
                }
                for keyword in &list {
                    validate_folder_name("keyword", keyword).map_err(|e| e.to_string())?;
                }
            }
        }

        Ok(())
    }

    /// The library request this invocation describes
    pub fn to_request(&self) -> Request {
        match &self.command {
            Command::Alpha { directory } => Request::Alphabetical {
                directory: directory.clone(),
            },
            Command::Keyword { directory, keyword } => Request::Keyword {
                directory: directory.clone(),
                keyword: keyword.clone(),
            },
            Command::Content {
                directory,
                keywords,
            } => Request::Content {
                directory: directory.clone(),
                keywords: parse_keyword_list(keywords),
            },
        }
    }
}

/// Configuration derived from CLI arguments and the user config file
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub request: Request,
    pub workers: usize,
    pub json: bool,
    pub verbose: u8,
}

impl AppConfig {
    /// Command line flags win over the config file
    pub fn new(args: &Args, user_config: &UserConfig) -> Self {
        AppConfig {
            request: args.to_request(),
            workers: args.workers.unwrap_or(user_config.workers),
            json: args.json || user_config.json_output,
            verbose: args.verbose,
        }
    }
}
