//! Command line arguments

use clap::Parser;
use stackask::config::Config;
use std::path::PathBuf;

/// Ask Stack Exchange a question and browse the answers
#[derive(Parser, Debug)]
#[command(name = "stackask")]
#[command(version)]
#[command(about = "Ask Stack Exchange questions and browse the answers from your terminal")]
pub struct Args {
    /// Question to search for right away
    pub query: Vec<String>,

    /// Stack Exchange site to search, e.g. stackoverflow, superuser
    #[arg(long)]
    pub site: Option<String>,

    /// Semicolon separated tags every result must have
    #[arg(long)]
    pub tags: Option<String>,

    /// Result ordering
    #[arg(long, value_parser = ["relevance", "votes", "activity", "creation"])]
    pub sort: Option<String>,

    /// Sort direction
    #[arg(long, value_parser = ["desc", "asc"])]
    pub order: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs here instead of the cache directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start with mouse capture off
    #[arg(long)]
    pub no_mouse: bool,
}

impl Args {
    /// Question given on the command line, if any
    pub fn initial_query(&self) -> Option<String> {
        let query = self.query.join(" ");
        let query = query.trim();
        (!query.is_empty()).then(|| query.to_string())
    }

    /// Flags win over whatever the config file says
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(site) = &self.site {
            config.params.site = site.clone();
        }
        if let Some(tags) = &self.tags {
            config.params.tags = tags.clone();
        }
        if let Some(sort) = &self.sort {
            config.params.sort = sort.clone();
        }
        if let Some(order) = &self.order {
            config.params.order = order.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        if self.no_mouse {
            config.mouse = false;
        }
        config
    }
}
