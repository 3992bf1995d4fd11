//! Prints the primary emotion for each file given on the command line (or stdin).
//! Handy for checking saved LLM output against the extractor.

use std::io::Read;

use dream_journal_analyzer::emotion::resolve_from_text;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        let (label, source) = resolve_from_text(&text);
        println!("{label}\t({})", source.as_str());
        return Ok(());
    }

    for p in paths {
        let text = std::fs::read_to_string(&p)
            .map_err(|e| anyhow::anyhow!("reading {p}: {e}"))?;
        let (label, source) = resolve_from_text(&text);
        println!("{p}\t{label}\t({})", source.as_str());
    }
    Ok(())
}
