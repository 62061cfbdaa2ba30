use miette::IntoDiagnostic;
use pathglob::ScanOptions;

#[derive(Debug, clap::Parser)]
pub struct Opt {
    /// The pattern to scan
    pattern: String,

    /// Include the path segments
    #[arg(long)]
    parts: bool,

    /// Include one token per path segment
    #[arg(long)]
    tokens: bool,

    /// Keep scanning after the first glob character
    #[arg(long)]
    scan_to_end: bool,

    /// Remove escaping backslashes from the base and glob
    #[arg(long)]
    unescape: bool,
}

pub fn scan(opt: Opt) -> miette::Result<()> {
    let options = ScanOptions::default()
        .with_parts(opt.parts)
        .with_tokens(opt.tokens)
        .with_scan_to_end(opt.scan_to_end)
        .with_unescape(opt.unescape);
    let state = pathglob::scan(&opt.pattern, &options);
    println!("{}", serde_json::to_string_pretty(&state).into_diagnostic()?);
    Ok(())
}
