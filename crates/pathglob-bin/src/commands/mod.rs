pub mod match_paths;
pub mod regex;
pub mod scan;

use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use pathglob::GlobOptions;

/// Flags shared by every command that compiles a pattern.
#[derive(Debug, Default, clap::Args)]
pub struct GlobArgs {
    /// Read options from a TOML file, flags are applied on top of it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Let wildcards match segments that start with a dot
    #[arg(long)]
    pub dot: bool,

    /// Match case-insensitively
    #[arg(long)]
    pub nocase: bool,

    /// Treat both `/` and `\` as path separators
    #[arg(long)]
    pub windows: bool,

    /// Match against the last segment of each path only
    #[arg(long)]
    pub basename: bool,

    /// Report an error for unterminated brackets, braces and parens
    #[arg(long)]
    pub strict_brackets: bool,

    /// Report an error if the expression is rejected by the regex engine
    #[arg(long)]
    pub debug: bool,
}

impl GlobArgs {
    /// Builds the options from the config file, if any, and the flags.
    pub fn options(&self) -> miette::Result<GlobOptions> {
        let mut options = match &self.config {
            Some(path) => read_config(path)?,
            None => GlobOptions::default(),
        };

        if self.dot {
            options = options.with_dot(true);
        }
        if self.nocase {
            options = options.with_nocase(true);
        }
        if self.windows {
            options = options.with_windows(true);
        }
        if self.basename {
            options = options.with_match_base(true);
        }
        if self.strict_brackets {
            options = options.with_strict_brackets(true);
        }
        if self.debug {
            options = options.with_debug(true);
        }
        Ok(options)
    }
}

fn read_config(path: &Path) -> miette::Result<GlobOptions> {
    let contents = fs_err::read_to_string(path).into_diagnostic()?;
    let options = toml::from_str(&contents)
        .into_diagnostic()
        .with_context(|| format!("failed to parse options from {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?options, "loaded options");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let dir = std::env::temp_dir().join(format!("pathglob-config-{}", std::process::id()));
        fs_err::create_dir_all(&dir).unwrap();
        let path = dir.join("options.toml");
        fs_err::write(&path, "nocase = true\nignore = [\"*.md\"]\n").unwrap();

        let args = GlobArgs {
            config: Some(path),
            dot: true,
            ..GlobArgs::default()
        };
        let options = args.options().unwrap();
        assert!(options.nocase);
        assert!(options.dot);
        assert_eq!(options.ignore, vec!["*.md".to_string()]);

        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_config() {
        let dir = std::env::temp_dir().join(format!("pathglob-invalid-{}", std::process::id()));
        fs_err::create_dir_all(&dir).unwrap();
        let path = dir.join("options.toml");
        fs_err::write(&path, "dot = \"yes\"\n").unwrap();

        let args = GlobArgs {
            config: Some(path),
            ..GlobArgs::default()
        };
        assert!(args.options().is_err());

        fs_err::remove_dir_all(&dir).unwrap();
    }
}
