use std::io::BufRead;
use std::process::ExitCode;

use miette::IntoDiagnostic;
use pathglob::{GlobInput, Matcher};

use super::GlobArgs;

#[derive(Debug, clap::Parser)]
pub struct Opt {
    /// The patterns to match against, a path matches if any pattern matches
    #[arg(required = true)]
    patterns: Vec<String>,

    /// A path to test, read paths from stdin if none are given
    #[arg(long = "path", short)]
    paths: Vec<String>,

    /// Patterns of paths that never match
    #[arg(long)]
    ignore: Vec<String>,

    /// Print the full match result of every path as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    glob: GlobArgs,
}

pub fn match_paths(opt: Opt) -> miette::Result<ExitCode> {
    let mut options = opt.glob.options()?;
    options.ignore.extend(opt.ignore);

    let input = match <[String; 1]>::try_from(opt.patterns) {
        Ok([pattern]) => GlobInput::Pattern(pattern),
        Err(patterns) => GlobInput::Patterns(patterns),
    };
    let matcher = Matcher::new(input, &options).into_diagnostic()?;

    let paths: Vec<String> = if opt.paths.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<_, _>>()
            .into_diagnostic()?
    } else {
        opt.paths
    };

    let mut matched = 0usize;
    for path in &paths {
        let result = matcher.match_details(path);
        if result.is_match {
            matched += 1;
        }
        if opt.json {
            println!("{}", serde_json::to_string(&result).into_diagnostic()?);
        } else if result.is_match {
            println!("{path}");
        }
    }

    tracing::info!("{matched} of {} paths matched", paths.len());

    Ok(if matched > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
