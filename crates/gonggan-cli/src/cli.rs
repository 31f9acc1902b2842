use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "gonggan")]
#[command(version, about = "Gonggan - AI workspaces in portable .gonggan archives")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Summarize an archive
    Inspect(InspectArgs),

    /// Read an archive and write it back in the current format
    Repack(RepackArgs),

    /// Send a message in a space and save the result
    Chat(ChatArgs),

    /// Re-run an AI reply and save the result
    Regenerate(RegenerateArgs),

    /// Generate a batch of gallery images
    Images(ImagesArgs),

    /// Note management
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Where a modified space is written.
#[derive(Args, Clone, Debug, Default)]
pub struct OutputDirArgs {
    /// Output directory (defaults to the configured export directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Which generators back the command.
#[derive(Args, Clone, Debug, Default)]
pub struct GeneratorArgs {
    /// Use offline mock generators instead of Gemini
    #[arg(long)]
    pub mock: bool,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Archive to read
    pub archive: PathBuf,

    /// Also list the messages of this thread
    #[arg(long)]
    pub thread: Option<String>,
}

#[derive(Args)]
pub struct RepackArgs {
    /// Archive to read
    pub archive: PathBuf,

    #[command(flatten)]
    pub output: OutputDirArgs,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Archive holding the space
    pub archive: PathBuf,

    /// Message text
    pub message: String,

    /// Continue this thread instead of starting a new one
    #[arg(long)]
    pub thread: Option<String>,

    /// Quoted text the message refers to
    #[arg(long)]
    pub quote: Option<String>,

    /// Files sent with this message only
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// Answer with a generated image
    #[arg(long)]
    pub image: bool,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    #[command(flatten)]
    pub output: OutputDirArgs,
}

#[derive(Args)]
pub struct RegenerateArgs {
    /// Archive holding the space
    pub archive: PathBuf,

    /// Thread ID
    pub thread: String,

    /// AI message ID
    pub message: String,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    #[command(flatten)]
    pub output: OutputDirArgs,
}

#[derive(Args)]
pub struct ImagesArgs {
    /// Archive holding the space
    pub archive: PathBuf,

    /// Image prompt
    pub prompt: String,

    /// Number of images (1-4)
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// Aspect ratio, e.g. 16:9 or Auto
    #[arg(long, default_value = "1:1")]
    pub ratio: String,

    /// Quality tier (1K, 2K, 4K)
    #[arg(long, default_value = "1K")]
    pub quality: String,

    /// Gallery image IDs to use as references
    #[arg(long = "reference")]
    pub references: Vec<String>,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    #[command(flatten)]
    pub output: OutputDirArgs,
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Add a note
    Add {
        archive: PathBuf,
        content: String,
        #[command(flatten)]
        output: OutputDirArgs,
    },
    /// Delete a note
    Delete {
        archive: PathBuf,
        id: String,
        #[command(flatten)]
        output: OutputDirArgs,
    },
    /// Copy a note into the space's files
    ToFile {
        archive: PathBuf,
        id: String,
        #[command(flatten)]
        output: OutputDirArgs,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default config file if none exists
    Init,
}
