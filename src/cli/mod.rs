pub mod commands;

use clap::Parser;
use delovable::deploy::Platform;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "delovable")]
#[command(about = "Strip Lovable vendor metadata from a web project", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(help = "Project directory, or a GitHub repository URL to clone first")]
    pub input: String,

    #[arg(
        short,
        long,
        default_value = "none",
        env = "DELOVABLE_PLATFORM",
        help = "Deployment target (cloudflare, vercel, netlify, none)"
    )]
    pub platform: Platform,

    #[arg(short, long, help = "Show every change and debug logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Clone destination for repository URLs (defaults to ./<repo>)")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Report what would change without writing anything")]
    pub dry_run: bool,

    #[arg(long, value_name = "FILE", help = "TOML file describing an alternative vendor signature set")]
    pub signatures: Option<PathBuf>,

    #[arg(long, help = "Clean markup files on a single thread")]
    pub no_parallel: bool,

    #[arg(long, help = "Follow symbolic links while looking for markup files")]
    pub follow_links: bool,
}
