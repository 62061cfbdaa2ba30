use miette::IntoDiagnostic;

use super::GlobArgs;

#[derive(Debug, clap::Parser)]
pub struct Opt {
    /// The pattern to compile
    pattern: String,

    /// Print the full scan state as JSON instead of the expression
    #[arg(long)]
    state: bool,

    #[command(flatten)]
    glob: GlobArgs,
}

pub fn regex(opt: Opt) -> miette::Result<()> {
    let options = opt.glob.options()?;
    let compiled = pathglob::compile(&opt.pattern, &options).into_diagnostic()?;
    if compiled.never_matches() {
        tracing::warn!("the expression was rejected by the regex engine, the pattern never matches");
    }

    if opt.state {
        let json = serde_json::to_string_pretty(compiled.state()).into_diagnostic()?;
        println!("{json}");
    } else {
        println!("{}", compiled.source());
    }
    Ok(())
}
