//! CLI argument parsing using clap.
//!
//! The same subcommand vocabulary backs one-shot invocations
//! (`conch ls -l /tmp`) and lines typed into the interactive shell.

use clap::{Parser, Subcommand};

/// Shell-emulation console for local filesystem work.
///
/// Without a subcommand, conch starts an interactive shell.
#[derive(Parser, Debug)]
#[command(name = "conch")]
#[command(about = "Filesystem navigation, transfer, archiving, and search")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available console commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List directory contents.
    Ls {
        /// Directory to list (defaults to the working directory).
        path: Option<String>,

        /// Long format: type, permissions, size, modification time.
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Print file contents.
    Cat {
        /// File to print.
        file: String,

        /// Read raw bytes instead of UTF-8 text.
        #[arg(short = 'b', long)]
        bytes: bool,
    },

    /// Change the working directory and print the canonical target.
    Cd {
        /// Target directory; supports `.`, `..`, and `~` shorthand.
        path: String,
    },

    /// Copy a file or directory.
    Cp {
        src: String,
        dst: String,

        /// Copy directories recursively.
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// Move or rename a file or directory.
    Mv { src: String, dst: String },

    /// Remove a file or directory.
    Rm {
        path: String,

        /// Remove directories and their contents recursively.
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// Pack a directory into a zip archive.
    Zip {
        /// Directory to archive.
        dir: String,
        /// Archive to create.
        archive: String,
    },

    /// Extract a zip archive.
    Unzip {
        /// Archive to extract.
        archive: String,
        /// Destination directory (defaults to the working directory).
        dest: Option<String>,
    },

    /// Pack a directory into a gzip-compressed tar archive.
    Tar {
        /// Directory to archive.
        dir: String,
        /// Archive to create.
        archive: String,
    },

    /// Extract a gzip-compressed tar archive.
    Untar {
        /// Archive to extract.
        archive: String,
        /// Destination directory (defaults to the working directory).
        dest: Option<String>,
    },

    /// Search file contents with a regular expression.
    Grep {
        /// Pattern to search for.
        pattern: String,
        /// File or directory to search.
        path: String,

        /// Descend into subdirectories.
        #[arg(short = 'r', long)]
        recursive: bool,

        /// Case-insensitive matching.
        #[arg(short = 'i', long)]
        ignore_case: bool,
    },
}
