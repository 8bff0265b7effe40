//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. user file: `<platform config dir>/todoboard/config.toml`
//! 3. workspace file: `<root>/.todo-board.toml`
//! 4. an explicit `--config` file
//! 5. `TODOBOARD_*` environment variables
//! 6. command-line flags ([`Config::merge_scan_args`])

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cache::STATE_DIR;
use crate::cli::ScanArgs;
use crate::pattern::{validate_terms, DEFAULT_TERM};
use crate::scanner::{ScannerConfig, WalkerConfig};

/// Extensions scanned by default.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &[
    "html", "css", "scss", "sass", "ts", "tsx", "js", "jsx", "vue", "mjs", "cjs", "md", "mdx",
    "json", "yaml", "yml", "java", "py", "go", "rb", "php", "rs", "swift", "kt", "kts", "dart",
    "cs",
];

/// Directories and files never scanned.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "node_modules",
    "assets",
    ".git",
    ".svn",
    ".hg",
    ".DS_Store",
    ".idea",
    ".vscode",
    ".angular",
    "dist",
    "out",
    "build",
    "coverage",
    "tmp",
    ".cache",
    STATE_DIR,
];

/// Default worker pool width.
pub const DEFAULT_CONCURRENCY: usize = 25;

/// Default candidate cap.
pub const DEFAULT_MAX_FILES: usize = 12_000;

/// Files with more lines are skipped.
pub const DEFAULT_MAX_FILE_LINES: usize = 6_000;

/// Workspace-level configuration file name.
pub const WORKSPACE_CONFIG_FILE: &str = ".todo-board.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TODOBOARD_";

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extensions of candidate files, without the dot.
    pub file_extensions: Vec<String>,
    /// Annotation marker terms.
    pub search_patterns: Vec<String>,
    /// Lines per annotation, start line included.
    pub max_todo_lines: usize,
    /// Worker pool width.
    pub concurrency: usize,
    /// Candidate cap.
    pub max_files: usize,
    /// Oversized-file ceiling in lines.
    pub max_file_lines: usize,
    /// Built-in exclusion list (gitignore syntax).
    pub exclude_patterns: Vec<String>,
    /// User additions to the exclusion list.
    pub extra_excludes: Vec<String>,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_extensions: DEFAULT_FILE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            search_patterns: vec![DEFAULT_TERM.to_string()],
            max_todo_lines: crate::continuation::DEFAULT_MAX_LINES,
            concurrency: DEFAULT_CONCURRENCY,
            max_files: DEFAULT_MAX_FILES,
            max_file_lines: DEFAULT_MAX_FILE_LINES,
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            extra_excludes: Vec::new(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Platform-specific user configuration file, if a home is known.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "todoboard", "todoboard")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The figment for a workspace, without CLI flags.
    #[must_use]
    pub fn figment(workspace: &Path, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(user) = Self::user_config_path() {
            figment = figment.merge(Toml::file(user));
        }
        figment = figment.merge(Toml::file(workspace.join(WORKSPACE_CONFIG_FILE)));
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the layered configuration for `workspace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any layer holds
    /// a value of the wrong type.
    pub fn load(workspace: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }
        let config: Self = Self::figment(workspace, explicit)
            .extract()
            .context("Failed to load configuration")?;
        Ok(config.normalized())
    }

    /// Apply command-line overrides.
    pub fn merge_scan_args(&mut self, args: &ScanArgs) {
        if !args.patterns.is_empty() {
            self.search_patterns.clone_from(&args.patterns);
        }
        if let Some(lines) = args.max_lines {
            self.max_todo_lines = lines;
        }
        if let Some(threads) = args.concurrency {
            self.concurrency = threads;
        }
        self.extra_excludes.extend(args.exclude.iter().cloned());
        *self = std::mem::take(self).normalized();
    }

    /// Clamp limits, drop blank terms, canonicalize extensions.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_todo_lines = self.max_todo_lines.max(1);
        self.concurrency = self.concurrency.max(1);
        self.max_files = self.max_files.max(1);

        self.search_patterns = validate_terms(&self.search_patterns);
        if self.search_patterns.is_empty() {
            self.search_patterns.push(DEFAULT_TERM.to_string());
        }

        let mut seen = HashSet::new();
        self.file_extensions = self
            .file_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && seen.insert(ext.clone()))
            .collect();
        self
    }

    /// Built-in and user exclusions together.
    #[must_use]
    pub fn all_excludes(&self) -> Vec<String> {
        self.exclude_patterns
            .iter()
            .chain(&self.extra_excludes)
            .cloned()
            .collect()
    }

    /// Include glob in `**/*.{ext,...}` form.
    #[must_use]
    pub fn include_glob(&self) -> String {
        format!("**/*.{{{}}}", self.file_extensions.join(","))
    }

    /// Exclude glob in `{**/dir/**,...}` form.
    #[must_use]
    pub fn exclude_glob(&self) -> String {
        let parts: Vec<String> = self
            .all_excludes()
            .iter()
            .map(|pattern| format!("**/{}/**", pattern.trim_matches('/')))
            .collect();
        format!("{{{}}}", parts.join(","))
    }

    /// Enumeration settings for the walker.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            extensions: self.file_extensions.clone(),
            exclude_patterns: self.all_excludes(),
            max_files: self.max_files,
            follow_symlinks: self.follow_symlinks,
        }
    }

    /// Scanner settings; progress and cancellation are attached by the
    /// caller.
    #[must_use]
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .with_search_patterns(self.search_patterns.clone())
            .with_max_todo_lines(self.max_todo_lines)
            .with_concurrency(self.concurrency)
            .with_max_file_lines(self.max_file_lines)
            .with_walker_config(self.walker_config())
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
