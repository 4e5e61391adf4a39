//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vahan - chat with your product documents from the terminal
#[derive(Parser, Debug)]
#[command(name = "vahan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the HTTP API
    #[arg(long, global = true, env = "VAHAN_API_URL")]
    pub api_url: Option<String>,

    /// Base URL of the chat socket (derived from --api-url by default)
    #[arg(long, global = true, env = "VAHAN_WS_URL")]
    pub ws_url: Option<String>,

    /// Directory holding the token and chat histories
    #[arg(long, global = true, env = "VAHAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file to use instead of ~/.vahan/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the access token
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        /// Prompted for (twice) when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Start an interactive chat
    Chat {
        /// Resume an existing session instead of waiting for /new
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Manage uploaded documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Show model metrics, or the summary of one session
    Metrics {
        /// Session ID to summarize
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Print the locally stored history of a session
    History {
        /// Session ID
        session: String,
    },

    /// Show login state and resolved configuration
    Status,
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// List uploaded documents
    List,

    /// Upload a .pdf, .doc, .docx or .txt file
    Upload {
        path: PathBuf,
    },

    /// Delete an uploaded document
    Delete {
        filename: String,
    },
}
